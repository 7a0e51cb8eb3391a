//! Database error to HTTP error conversions.
//!
//! Constraint violations map to client errors with actionable messages,
//! everything else maps to opaque server errors. All conversions are
//! implemented via `From` for use with `?` in handlers.

use padma_postgres::PgError;
use padma_postgres::types::{
    ConstraintViolation, DownloadRequestConstraints, RetreatConstraints, TrackConstraints,
};

use crate::handler::{Error, ErrorKind};

/// Tracing target for database failures surfaced to handlers.
const TRACING_TARGET: &str = "padma_server::postgres_constraints";

impl From<ConstraintViolation> for Error<'static> {
    fn from(constraint: ConstraintViolation) -> Self {
        match constraint {
            ConstraintViolation::DownloadRequest(c) => c.into(),
            ConstraintViolation::Retreat(c) => c.into(),
            ConstraintViolation::Track(c) => c.into(),
        }
    }
}

impl From<DownloadRequestConstraints> for Error<'static> {
    fn from(c: DownloadRequestConstraints) -> Self {
        let error = match c {
            DownloadRequestConstraints::PrimaryInFlight => ErrorKind::Conflict
                .with_message("An archive for this retreat is already being generated"),
            DownloadRequestConstraints::RetryCountMin
            | DownloadRequestConstraints::DownloadCountMin
            | DownloadRequestConstraints::PopularityScoreMin
            | DownloadRequestConstraints::FileSizeMin
            | DownloadRequestConstraints::CompletedAfterStarted => {
                ErrorKind::InternalServerError.into_error()
            }
        };

        error.with_resource("download_request")
    }
}

impl From<RetreatConstraints> for Error<'static> {
    fn from(c: RetreatConstraints) -> Self {
        let error = match c {
            RetreatConstraints::DisplayNameLengthMin | RetreatConstraints::DisplayNameLengthMax => {
                ErrorKind::BadRequest
                    .with_message("Retreat name must be between 1 and 255 characters long")
            }
            RetreatConstraints::EndsAfterStarts => {
                ErrorKind::BadRequest.with_message("Retreat cannot end before it starts")
            }
        };

        error.with_resource("retreat")
    }
}

impl From<TrackConstraints> for Error<'static> {
    fn from(c: TrackConstraints) -> Self {
        let error = match c {
            TrackConstraints::RetreatTrackNumberUnique => ErrorKind::Conflict
                .with_message("A track with this number already exists in the retreat"),
            TrackConstraints::TrackNumberMin => {
                ErrorKind::BadRequest.with_message("Track numbers start at 1")
            }
            TrackConstraints::AudioKeyLengthMin | TrackConstraints::FileSizeMin => {
                ErrorKind::InternalServerError.into_error()
            }
        };

        error.with_resource("track")
    }
}

impl From<PgError> for Error<'static> {
    fn from(error: PgError) -> Self {
        match error {
            PgError::Config(config_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %config_error,
                    "database configuration error"
                );
                ErrorKind::InternalServerError.into_error()
            }
            PgError::Timeout(timeout) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    timeout = ?timeout,
                    "database timeout",
                );
                ErrorKind::ServiceUnavailable
                    .with_message("Service is temporarily overloaded, try again shortly")
            }
            PgError::Connection(connection_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %connection_error,
                    "database connection error"
                );
                ErrorKind::InternalServerError.into_error()
            }
            PgError::Migration(migration_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %migration_error,
                    "database migration error"
                );
                ErrorKind::InternalServerError.into_error()
            }
            PgError::Query(ref query_error) => {
                if let Some(constraint_name) = error.constraint()
                    && let Some(constraint) = ConstraintViolation::new(constraint_name)
                {
                    tracing::error!(
                        target: TRACING_TARGET,
                        constraint = constraint_name,
                        error = %query_error,
                        "query error (constraint violation)"
                    );
                    return constraint.into();
                }

                tracing::error!(
                    target: TRACING_TARGET,
                    error = %query_error,
                    "query error"
                );
                ErrorKind::InternalServerError.into_error()
            }
            PgError::Unexpected(unexpected_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %unexpected_error,
                    "unexpected database error"
                );
                ErrorKind::InternalServerError.into_error()
            }
        }
    }
}

// Used only for transactions.
impl From<padma_postgres::error::DieselError> for Error<'static> {
    fn from(error: padma_postgres::error::DieselError) -> Self {
        let pg_error: PgError = error.into();
        pg_error.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_conflict_maps_to_conflict() {
        let violation = ConstraintViolation::new("download_requests_primary_in_flight_key")
            .expect("known constraint");

        let error: Error<'static> = violation.into();
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert_eq!(error.resource(), Some("download_request"));
    }

    #[test]
    fn internal_check_constraints_stay_opaque() {
        let violation = ConstraintViolation::new("download_requests_completed_after_started")
            .expect("known constraint");

        let error: Error<'static> = violation.into();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
    }

    #[test]
    fn timeout_maps_to_service_unavailable() {
        let error: Error<'static> =
            PgError::Timeout(padma_postgres::error::TimeoutType::Wait).into();
        assert_eq!(error.kind(), ErrorKind::ServiceUnavailable);
    }
}
