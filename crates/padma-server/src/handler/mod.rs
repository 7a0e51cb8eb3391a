//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! Routes are grouped per concern and merged into a single [`ApiRouter`]
//! so the OpenAPI document covers the whole surface. Requests that match
//! no route answer the standard JSON 404.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod downloads;
mod error;
mod monitors;
pub mod request;
pub mod response;
mod webhooks;

use aide::axum::ApiRouter;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

#[inline]
async fn fallback_handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns an [`ApiRouter`] with all routes.
pub fn routes() -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(downloads::routes())
        .merge(webhooks::routes())
        .merge(monitors::routes())
        .fallback(fallback_handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_routes_are_documented() {
        let mut api = aide::openapi::OpenApi::default();
        let _router = routes().finish_api(&mut api);

        let paths = api.paths.expect("generated API must have paths");
        for route in [
            "/retreats/{retreatId}/request-download",
            "/download-requests/{requestId}/status",
            "/download-requests/{requestId}/download",
            "/download-requests/{requestId}/extend-lifecycle",
            "/download-webhook",
            "/monitors/health",
            "/monitors/downloads",
        ] {
            assert!(paths.paths.contains_key(route), "missing route {route}");
        }
    }
}
