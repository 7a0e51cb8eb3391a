//! Middleware for `axum::Router` and HTTP request processing.
//!
//! This module provides middleware for:
//! - Error handling (panics, timeouts, service errors)
//! - Observability (tracing, request IDs, sensitive header redaction)
//! - Request limits (body size caps, response compression)
//! - OpenAPI documentation with Scalar UI
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use axum::Router;
//! use padma_server::middleware::RouterExt;
//!
//! let app: Router<()> = Router::new()
//!     .with_error_handling_layer(Duration::from_secs(30))
//!     .with_observability_layer()
//!     .with_limits_layer(2 * 1024 * 1024);
//! ```

mod error_handling;
mod extensions;
mod observability;
mod specification;

pub use extensions::RouterExt;
pub use specification::{OpenApiConfig, RouterOpenApiExt};
