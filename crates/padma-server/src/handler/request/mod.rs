//! Request types for HTTP handlers.

mod downloads;
mod paths;
mod webhooks;

pub use downloads::*;
pub use paths::*;
pub use webhooks::*;
