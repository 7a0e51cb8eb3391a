use serde::{Deserialize, Serialize};

use super::ConstraintCategory;

/// Constraint violations for the `tracks` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString, strum::AsRefStr)]
pub enum TrackConstraints {
    /// Unique constraint: track numbers are unique within a retreat.
    #[strum(serialize = "tracks_retreat_id_track_number_key")]
    RetreatTrackNumberUnique,
    /// Check constraint: track numbers start at one.
    #[strum(serialize = "tracks_track_number_min")]
    TrackNumberMin,
    /// Check constraint: audio object key must not be empty.
    #[strum(serialize = "tracks_audio_key_length_min")]
    AudioKeyLengthMin,
    /// Check constraint: audio file size must be positive when present.
    #[strum(serialize = "tracks_file_size_min")]
    FileSizeMin,
}

impl TrackConstraints {
    /// Creates a new [`TrackConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            Self::RetreatTrackNumberUnique => ConstraintCategory::Uniqueness,
            Self::TrackNumberMin | Self::AudioKeyLengthMin | Self::FileSizeMin => {
                ConstraintCategory::Validation
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_constraints() {
        assert_eq!(
            TrackConstraints::new("tracks_retreat_id_track_number_key"),
            Some(TrackConstraints::RetreatTrackNumberUnique)
        );
        assert_eq!(
            TrackConstraints::new("tracks_audio_key_length_min"),
            Some(TrackConstraints::AudioKeyLengthMin)
        );
        assert_eq!(TrackConstraints::new("tracks_unknown"), None);
    }
}
