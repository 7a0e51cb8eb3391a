//! Database constraint violations organized by table.
//!
//! This module provides an enumeration of all database constraint violations,
//! organized into logical groups for better maintainability. The handler layer
//! uses these to turn raw constraint names into precise HTTP errors.

mod download_requests;
mod retreats;
mod tracks;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::download_requests::DownloadRequestConstraints;
pub use self::retreats::RetreatConstraints;
pub use self::tracks::TrackConstraints;

/// Unified constraint violation enum that can represent any database constraint.
///
/// This enum wraps all specific constraint types, providing a single interface
/// for handling any constraint violation while maintaining type safety and
/// organizational benefits of the separate modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ConstraintViolation {
    DownloadRequest(DownloadRequestConstraints),
    Retreat(RetreatConstraints),
    Track(TrackConstraints),
}

/// Categories of database constraint violations.
///
/// This enum helps classify constraint violations by their purpose and type,
/// making it easier to handle different categories of errors appropriately.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintCategory {
    /// Data validation constraints (format, length, range checks).
    Validation,
    /// Chronological integrity constraints (timestamp relationships).
    Chronological,
    /// Uniqueness constraints (primary keys, unique indexes).
    Uniqueness,
}

impl ConstraintViolation {
    /// Creates a new [`ConstraintViolation`] from the constraint name.
    ///
    /// # Arguments
    ///
    /// * `constraint` - The name of the database constraint that was violated
    ///
    /// # Returns
    ///
    /// * `Some(ConstraintViolation)` if the constraint name is recognized
    /// * `None` if the constraint name is unknown
    ///
    /// # Examples
    ///
    /// ```
    /// use padma_postgres::types::ConstraintViolation;
    ///
    /// let violation = ConstraintViolation::new("download_requests_primary_in_flight_key");
    /// assert!(violation.is_some());
    ///
    /// let unknown = ConstraintViolation::new("unknown_constraint");
    /// assert!(unknown.is_none());
    /// ```
    pub fn new(constraint: &str) -> Option<Self> {
        let prefix = constraint.split('_').next()?;
        macro_rules! try_parse {
            ($($parser:expr => $variant:ident),+ $(,)?) => {
                None$(.or_else(|| $parser(constraint).map(Self::$variant)))+
            };
        }

        match prefix {
            "download" => try_parse!(DownloadRequestConstraints::new => DownloadRequest),
            "retreats" => try_parse!(RetreatConstraints::new => Retreat),
            "tracks" => try_parse!(TrackConstraints::new => Track),
            _ => None,
        }
    }

    /// Returns the table name associated with this constraint.
    ///
    /// This is useful for categorizing errors by the table they affect.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConstraintViolation::DownloadRequest(_) => "download_requests",
            ConstraintViolation::Retreat(_) => "retreats",
            ConstraintViolation::Track(_) => "tracks",
        }
    }

    /// Returns the full constraint name as declared in the schema.
    pub fn constraint_name(&self) -> String {
        self.to_string()
    }

    /// Returns the category of this constraint violation.
    pub fn constraint_category(&self) -> ConstraintCategory {
        match self {
            ConstraintViolation::DownloadRequest(c) => c.categorize(),
            ConstraintViolation::Retreat(c) => c.categorize(),
            ConstraintViolation::Track(c) => c.categorize(),
        }
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintViolation::DownloadRequest(c) => write!(f, "{}", c),
            ConstraintViolation::Retreat(c) => write!(f, "{}", c),
            ConstraintViolation::Track(c) => write!(f, "{}", c),
        }
    }
}

impl From<ConstraintViolation> for String {
    #[inline]
    fn from(val: ConstraintViolation) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for ConstraintViolation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or_else(|| format!("Unknown constraint: {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_parsing() {
        assert_eq!(
            ConstraintViolation::new("download_requests_primary_in_flight_key"),
            Some(ConstraintViolation::DownloadRequest(
                DownloadRequestConstraints::PrimaryInFlight
            ))
        );

        assert_eq!(
            ConstraintViolation::new("tracks_retreat_id_track_number_key"),
            Some(ConstraintViolation::Track(
                TrackConstraints::RetreatTrackNumberUnique
            ))
        );

        assert_eq!(ConstraintViolation::new("unknown_constraint"), None);
    }

    #[test]
    fn table_name_extraction() {
        let violation =
            ConstraintViolation::DownloadRequest(DownloadRequestConstraints::PrimaryInFlight);
        assert_eq!(violation.table_name(), "download_requests");

        let violation = ConstraintViolation::Retreat(RetreatConstraints::EndsAfterStarts);
        assert_eq!(violation.table_name(), "retreats");
    }

    #[test]
    fn constraint_categorization() {
        let violation =
            ConstraintViolation::DownloadRequest(DownloadRequestConstraints::PrimaryInFlight);
        assert_eq!(
            violation.constraint_category(),
            ConstraintCategory::Uniqueness
        );

        let violation = ConstraintViolation::DownloadRequest(
            DownloadRequestConstraints::CompletedAfterStarted,
        );
        assert_eq!(
            violation.constraint_category(),
            ConstraintCategory::Chronological
        );
    }

    #[test]
    fn constraint_name_round_trip() {
        let violation = ConstraintViolation::Track(TrackConstraints::TrackNumberMin);
        assert_eq!(violation.constraint_name(), "tracks_track_number_min");
        assert_eq!(
            ConstraintViolation::new(&violation.constraint_name()),
            Some(violation)
        );
    }
}
