//! Error types for archive job submission.

use thiserror::Error;

/// Result type alias for archive job submission.
pub type ZipGenResult<T, E = ZipGenError> = std::result::Result<T, E>;

/// Error type for archive job submission.
#[derive(Debug, Error)]
pub enum ZipGenError {
    /// Worker answered the submission with a non-success status.
    #[error("archive worker rejected the job with status {status}")]
    Rejected {
        /// HTTP status code returned by the worker.
        status: u16,
    },
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ZipGenError {
    /// Whether a retry of the submission could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Rejected { status } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            Self::Reqwest(error) => error.is_timeout() || error.is_connect(),
            Self::Serde(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_side_rejections_are_transient() {
        assert!(ZipGenError::Rejected { status: 500 }.is_transient());
        assert!(ZipGenError::Rejected { status: 503 }.is_transient());
        assert!(ZipGenError::Rejected { status: 429 }.is_transient());
        assert!(ZipGenError::Rejected { status: 408 }.is_transient());
    }

    #[test]
    fn client_side_rejections_are_permanent() {
        assert!(!ZipGenError::Rejected { status: 400 }.is_transient());
        assert!(!ZipGenError::Rejected { status: 403 }.is_transient());
        assert!(!ZipGenError::Rejected { status: 404 }.is_transient());
    }

    #[test]
    fn serialization_failures_are_permanent() {
        let serde_error = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(!ZipGenError::from(serde_error).is_transient());
    }

    #[test]
    fn rejection_message_names_the_status() {
        let error = ZipGenError::Rejected { status: 502 };
        assert!(error.to_string().contains("502"));
    }
}
