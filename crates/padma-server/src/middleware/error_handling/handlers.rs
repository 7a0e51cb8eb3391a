use std::future::ready;

use axum::response::{IntoResponse, Response};
use futures::future::{BoxFuture, FutureExt};

use crate::handler::{Error, ErrorKind};

type ResponseFut = BoxFuture<'static, Response>;

/// Transforms any known [`tower::BoxError`] into a custom [`Error`] response.
///
/// This function attempts to downcast known error types and provide appropriate
/// error responses with context. For unknown errors, it returns a generic
/// internal server error.
pub fn handle_error(err: tower::BoxError) -> ResponseFut {
    use tower::timeout::error::Elapsed;

    let error = if let Some(_elapsed) = err.downcast_ref::<Elapsed>() {
        tracing::error!(
            target: "padma_server::middleware",
            error = %err,
            "Request timeout exceeded"
        );

        Error::new(ErrorKind::InternalServerError)
            .with_message("Request timeout")
            .with_context("The request took too long to process and was terminated")
    } else {
        tracing::error!(
            target: "padma_server::middleware",
            error = %err,
            "Unknown middleware error"
        );

        Error::new(ErrorKind::InternalServerError)
            .with_message("An unexpected error occurred")
            .with_context(err.to_string())
    };

    ready(error.into_response()).boxed()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[tokio::test]
    async fn timeout_maps_to_internal_server_error() {
        let err: tower::BoxError = Box::new(tower::timeout::error::Elapsed::new());
        let response = handle_error(err).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unknown_error_maps_to_internal_server_error() {
        let err: tower::BoxError = "something broke".into();
        let response = handle_error(err).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
