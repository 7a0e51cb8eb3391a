use serde::{Deserialize, Serialize};

use super::ConstraintCategory;

/// Constraint violations for the `download_requests` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString, strum::AsRefStr)]
pub enum DownloadRequestConstraints {
    /// Unique partial index: at most one in-flight primary request per retreat.
    #[strum(serialize = "download_requests_primary_in_flight_key")]
    PrimaryInFlight,
    /// Check constraint: retry count must be non-negative.
    #[strum(serialize = "download_requests_retry_count_min")]
    RetryCountMin,
    /// Check constraint: download count must be non-negative.
    #[strum(serialize = "download_requests_download_count_min")]
    DownloadCountMin,
    /// Check constraint: popularity score must be non-negative.
    #[strum(serialize = "download_requests_popularity_score_min")]
    PopularityScoreMin,
    /// Check constraint: archive size must be positive when present.
    #[strum(serialize = "download_requests_file_size_min")]
    FileSizeMin,
    /// Check constraint: processing cannot complete before it started.
    #[strum(serialize = "download_requests_completed_after_started")]
    CompletedAfterStarted,
}

impl DownloadRequestConstraints {
    /// Creates a new [`DownloadRequestConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            Self::PrimaryInFlight => ConstraintCategory::Uniqueness,
            Self::CompletedAfterStarted => ConstraintCategory::Chronological,
            Self::RetryCountMin
            | Self::DownloadCountMin
            | Self::PopularityScoreMin
            | Self::FileSizeMin => ConstraintCategory::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_constraints() {
        assert_eq!(
            DownloadRequestConstraints::new("download_requests_primary_in_flight_key"),
            Some(DownloadRequestConstraints::PrimaryInFlight)
        );
        assert_eq!(
            DownloadRequestConstraints::new("download_requests_file_size_min"),
            Some(DownloadRequestConstraints::FileSizeMin)
        );
        assert_eq!(DownloadRequestConstraints::new("no_such_constraint"), None);
    }

    #[test]
    fn display_matches_schema_names() {
        assert_eq!(
            DownloadRequestConstraints::PrimaryInFlight.to_string(),
            "download_requests_primary_in_flight_key"
        );
        assert_eq!(
            DownloadRequestConstraints::CompletedAfterStarted.to_string(),
            "download_requests_completed_after_started"
        );
    }
}
