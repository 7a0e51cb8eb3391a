//! Storage and archive-worker error to HTTP error conversions.

use padma_opendal::StorageError;
use padma_zipgen::ZipGenError;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for external service error conversions.
const TRACING_TARGET: &str = "padma_server::handler::external";

impl From<StorageError> for HttpError<'static> {
    fn from(error: StorageError) -> Self {
        if error.is_transient() {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %error,
                "transient storage backend error"
            );
            return ErrorKind::ServiceUnavailable
                .with_message("Storage is temporarily unavailable, try again shortly");
        }

        match error {
            StorageError::NotFound(path) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    path = %path,
                    "object not found in storage"
                );
                ErrorKind::NotFound
                    .with_message("Archive is no longer available")
                    .with_resource("archive")
            }
            StorageError::Backend(backend_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %backend_error,
                    "storage backend error"
                );
                ErrorKind::InternalServerError.into_error()
            }
            StorageError::PermissionDenied(message) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %message,
                    "storage credentials rejected"
                );
                ErrorKind::InternalServerError.into_error()
            }
            StorageError::Init(message) | StorageError::Unsupported(message) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %message,
                    "storage misconfiguration"
                );
                ErrorKind::InternalServerError.into_error()
            }
        }
    }
}

impl From<ZipGenError> for HttpError<'static> {
    fn from(error: ZipGenError) -> Self {
        let transient = error.is_transient();
        match error {
            ZipGenError::Rejected { status } => {
                tracing::error!(
                    target: TRACING_TARGET,
                    status = status,
                    "archive worker rejected the job"
                );
            }
            ZipGenError::Reqwest(ref request_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %request_error,
                    "archive worker request failed"
                );
            }
            ZipGenError::Serde(ref serde_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %serde_error,
                    "archive job serialization failed"
                );
                return ErrorKind::InternalServerError.into_error();
            }
        }

        if transient {
            ErrorKind::ServiceUnavailable
                .with_message("Archive generation service is temporarily unavailable")
        } else {
            ErrorKind::ServiceUnavailable
                .with_message("Archive generation could not be started, try again later")
        }
    }
}

// Background service errors that leak into a handler carry no client detail.
impl From<crate::Error> for HttpError<'static> {
    fn from(error: crate::Error) -> Self {
        tracing::error!(
            target: TRACING_TARGET,
            error = %error,
            kind = %error.kind,
            "internal service error in handler"
        );
        ErrorKind::InternalServerError.into_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_object_maps_to_not_found() {
        let error: HttpError<'static> =
            StorageError::not_found("archives/retreat.zip").into();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.resource(), Some("archive"));
    }

    #[test]
    fn storage_misconfiguration_stays_opaque() {
        let error: HttpError<'static> = StorageError::unsupported("presign").into();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
    }

    #[test]
    fn worker_rejection_maps_to_service_unavailable() {
        let error: HttpError<'static> = ZipGenError::Rejected { status: 503 }.into();
        assert_eq!(error.kind(), ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn internal_error_stays_opaque() {
        let error: HttpError<'static> = crate::Error::worker("submission failed").into();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
    }
}
