use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::handler::{Error, ErrorKind};

type Panic = Box<dyn Any + Send + 'static>;

/// Transforms any panic into the [`Error`] and then [`Response`].
pub fn catch_panic(err: Panic) -> Response {
    if let Some(panic) = err.downcast_ref::<String>() {
        tracing::error!(
            target: "padma_server::middleware",
            "service panic: {}", panic,
        );
    } else if let Some(panic) = err.downcast_ref::<&str>() {
        tracing::error!(
            target: "padma_server::middleware",
            "service panic: {}", panic,
        );
    } else if let Some(panic) = err.downcast_ref::<Error>() {
        tracing::error!(
            target: "padma_server::middleware",
            "service panic: {}", panic,
        );
    } else {
        tracing::error!(
            target: "padma_server::middleware",
            "service panic: unknown panic type",
        );
    }

    ErrorKind::InternalServerError.into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn string_panic_becomes_internal_server_error() {
        let payload: Panic = Box::new(String::from("boom"));
        let response = catch_panic(payload);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn str_panic_becomes_internal_server_error() {
        let payload: Panic = Box::new("boom");
        let response = catch_panic(payload);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn opaque_panic_becomes_internal_server_error() {
        let payload: Panic = Box::new(42_u64);
        let response = catch_panic(payload);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
