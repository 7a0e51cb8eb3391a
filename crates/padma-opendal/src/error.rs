//! Storage error types.

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// The distinction between [`StorageError::NotFound`] and everything else
/// matters: an absent object means the archive vanished and may be
/// regenerated, while permission or backend failures must never be treated
/// as a missing archive.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to initialize the storage backend.
    #[error("storage initialization failed: {0}")]
    Init(String),

    /// Object not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Operation not supported by the backend.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(opendal::Error),
}

impl StorageError {
    /// Creates a new initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Creates a new not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Creates a new permission denied error.
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Creates a new unsupported operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Returns whether this error indicates the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns whether retrying the operation might succeed.
    ///
    /// Rate limiting and temporary backend failures are transient; missing
    /// objects, denied access, and unsupported operations are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Backend(err) => {
                err.is_temporary() || err.kind() == opendal::ErrorKind::RateLimited
            }
            _ => false,
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            ErrorKind::Unsupported => Self::Unsupported(err.to_string()),
            _ => Self::Backend(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_from_opendal() {
        let err = opendal::Error::new(opendal::ErrorKind::NotFound, "no such key");
        let storage_err = StorageError::from(err);

        assert!(storage_err.is_not_found());
        assert!(!storage_err.is_transient());
    }

    #[test]
    fn permission_denied_is_not_missing() {
        let err = opendal::Error::new(opendal::ErrorKind::PermissionDenied, "denied");
        let storage_err = StorageError::from(err);

        assert!(!storage_err.is_not_found());
        assert!(!storage_err.is_transient());
    }

    #[test]
    fn rate_limited_is_transient() {
        let err = opendal::Error::new(opendal::ErrorKind::RateLimited, "slow down");
        let storage_err = StorageError::from(err);

        assert!(storage_err.is_transient());
    }
}
