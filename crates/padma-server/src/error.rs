//! Error types for service construction and background work.
//!
//! HTTP handlers use [`crate::handler::Error`] instead; this type covers the
//! paths that run without a request context, such as state wiring, cleanup
//! cascades, and the sweeper.

use std::borrow::Cow;

use padma_opendal::StorageError;
use padma_postgres::PgError;
use padma_zipgen::ZipGenError;

/// Type-erased error used as an optional error source.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Specialized [`Result`] type with [`Error`] as the default error.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad classification of a server-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or inconsistent configuration.
    Config,
    /// Database connectivity or query failure.
    Database,
    /// Object storage failure.
    Storage,
    /// Archive worker submission failure.
    Worker,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Returns the kind as a human-readable string.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "configuration",
            ErrorKind::Database => "database",
            ErrorKind::Storage => "storage",
            ErrorKind::Worker => "worker",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side error with a kind, a message, and an optional source.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
#[must_use = "errors should be handled or propagated"]
pub struct Error {
    /// Failure classification.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: Cow<'static, str>,
    /// Underlying error, when one exists.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates a database error.
    pub fn database(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Creates an object storage error.
    pub fn storage(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Creates an archive worker error.
    pub fn worker(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Worker, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attaches the underlying error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl From<PgError> for Error {
    fn from(error: PgError) -> Self {
        Self::database(error.to_string()).with_source(error)
    }
}

impl From<StorageError> for Error {
    fn from(error: StorageError) -> Self {
        Self::storage(error.to_string()).with_source(error)
    }
}

impl From<ZipGenError> for Error {
    fn from(error: ZipGenError) -> Self {
        Self::worker(error.to_string()).with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let error = Error::config("sweep interval out of range");
        assert_eq!(
            error.to_string(),
            "configuration error: sweep interval out of range"
        );
    }

    #[test]
    fn database_errors_keep_their_source() {
        let pg_error = PgError::Config("bad url".to_owned());
        let error = Error::from(pg_error);

        assert_eq!(error.kind, ErrorKind::Database);
        assert!(error.source.is_some());
    }
}
