//! HTTP request extractors with structured error handling.
//!
//! All extractors reject with the handler [`Error`] type so failures
//! serialize to the same JSON error shape as handler-level errors.
//!
//! - [`Caller`] resolves the authenticated account from gateway headers
//! - [`CallbackGuard`] verifies the shared token on worker callbacks
//! - [`PgPool`] acquires a database connection from the pool
//! - [`Json`], [`Path`] and [`ValidateJson`] wrap the stock axum
//!   extractors with richer rejections
//!
//! [`Error`]: crate::handler::Error

mod callback;
mod caller;
mod pg_connection;
pub mod reject;

pub use crate::extract::callback::{CALLBACK_TOKEN_HEADER, CallbackGuard};
pub use crate::extract::caller::{ACCOUNT_ID_HEADER, Caller};
pub use crate::extract::pg_connection::PgPool;
pub use crate::extract::reject::{Json, Path, ValidateJson};
