//! Caller identity extraction from gateway-injected headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::handler::{Error, ErrorKind, Result};

/// Tracing target for authentication events.
const TRACING_TARGET: &str = "padma_server::authentication";

/// Header carrying the authenticated account id.
///
/// The fronting gateway authenticates the session and injects this header
/// before proxying the request to this service.
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// The authenticated caller of a request.
///
/// Extracted from the `x-account-id` header. Requests without the header
/// are rejected with 401 before the handler runs, so handlers can rely on
/// the account id being present.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// Account id of the authenticated caller.
    pub account_id: Uuid,
}

impl Caller {
    /// Creates a caller from a known account id.
    #[inline]
    pub const fn new(account_id: Uuid) -> Self {
        Self { account_id }
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Cached by the first extractor to run within this request.
        if let Some(caller) = parts.extensions.get::<Self>() {
            return Ok(*caller);
        }

        let Some(value) = parts.headers.get(ACCOUNT_ID_HEADER) else {
            return Err(ErrorKind::MissingAuthToken
                .with_message("Authentication required")
                .with_context(format!("Missing {} header", ACCOUNT_ID_HEADER))
                .with_resource("authentication"));
        };

        let account_id = value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or_else(|| {
                tracing::warn!(
                    target: TRACING_TARGET,
                    header = ACCOUNT_ID_HEADER,
                    "rejecting request with unparseable account id header"
                );
                ErrorKind::MalformedAuthToken
                    .with_message("Invalid account identifier")
                    .with_context(format!("{} header must contain a UUID", ACCOUNT_ID_HEADER))
                    .with_resource("authentication")
            })?;

        let caller = Self::new(account_id);
        parts.extensions.insert(caller);
        Ok(caller)
    }
}

impl aide::OperationInput for Caller {}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(ACCOUNT_ID_HEADER, value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn extracts_account_id() {
        let account_id = Uuid::new_v4();
        let mut parts = parts_with_header(Some(&account_id.to_string()));

        let caller = <Caller as FromRequestParts<()>>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(caller.account_id, account_id);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let mut parts = parts_with_header(None);

        let error = <Caller as FromRequestParts<()>>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingAuthToken);
    }

    #[tokio::test]
    async fn malformed_header_is_rejected() {
        let mut parts = parts_with_header(Some("not-a-uuid"));

        let error = <Caller as FromRequestParts<()>>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedAuthToken);
    }

    #[tokio::test]
    async fn caches_in_request_extensions() {
        let account_id = Uuid::new_v4();
        let mut parts = parts_with_header(Some(&account_id.to_string()));

        let first = <Caller as FromRequestParts<()>>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(parts.extensions.get::<Caller>(), Some(&first));
    }
}
