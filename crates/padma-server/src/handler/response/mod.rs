//! Response types for HTTP handlers.

mod downloads;
mod errors;
mod monitors;
mod webhooks;

pub use downloads::*;
pub use errors::*;
pub use monitors::*;
pub use webhooks::*;
