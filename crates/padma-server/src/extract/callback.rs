//! Shared-token guard for the worker callback endpoint.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

use crate::handler::{Error, ErrorKind, Result};
use crate::service::CallbackToken;

/// Tracing target for authentication events.
const TRACING_TARGET: &str = "padma_server::authentication";

/// Header carrying the shared callback token.
pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

/// Guards the callback endpoint with an optional shared token.
///
/// The callback route is reachable without a caller identity because the
/// archive worker is not a platform account. When a token is configured
/// the worker must echo it back in the `x-callback-token` header; without
/// a configured token the guard admits every request.
#[must_use]
#[derive(Debug, Clone, Copy)]
pub struct CallbackGuard;

impl<S> FromRequestParts<S> for CallbackGuard
where
    S: Send + Sync,
    CallbackToken: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CallbackToken(expected) = CallbackToken::from_ref(state);
        let Some(expected) = expected else {
            return Ok(Self);
        };

        let provided = parts
            .headers
            .get(CALLBACK_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        match provided {
            None => Err(ErrorKind::MissingAuthToken
                .with_message("Callback token required")
                .with_context(format!("Missing {} header", CALLBACK_TOKEN_HEADER))
                .with_resource("callback")),
            Some(token) if token == expected => Ok(Self),
            Some(_) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    header = CALLBACK_TOKEN_HEADER,
                    "rejecting callback with mismatched token"
                );
                Err(ErrorKind::Unauthorized
                    .with_message("Callback token mismatch")
                    .with_resource("callback"))
            }
        }
    }
}

impl aide::OperationInput for CallbackGuard {}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with_token(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(CALLBACK_TOKEN_HEADER, value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn admits_when_no_token_configured() {
        let state = CallbackToken(None);
        let mut parts = parts_with_token(None);

        let result =
            <CallbackGuard as FromRequestParts<CallbackToken>>::from_request_parts(
                &mut parts, &state,
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn admits_matching_token() {
        let state = CallbackToken(Some("sekrit".to_owned()));
        let mut parts = parts_with_token(Some("sekrit"));

        let result =
            <CallbackGuard as FromRequestParts<CallbackToken>>::from_request_parts(
                &mut parts, &state,
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn rejects_missing_token() {
        let state = CallbackToken(Some("sekrit".to_owned()));
        let mut parts = parts_with_token(None);

        let error =
            <CallbackGuard as FromRequestParts<CallbackToken>>::from_request_parts(
                &mut parts, &state,
            )
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingAuthToken);
    }

    #[tokio::test]
    async fn rejects_mismatched_token() {
        let state = CallbackToken(Some("sekrit".to_owned()));
        let mut parts = parts_with_token(Some("wrong"));

        let error =
            <CallbackGuard as FromRequestParts<CallbackToken>>::from_request_parts(
                &mut parts, &state,
            )
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthorized);
    }
}
