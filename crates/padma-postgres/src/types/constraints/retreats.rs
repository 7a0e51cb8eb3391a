use serde::{Deserialize, Serialize};

use super::ConstraintCategory;

/// Constraint violations for the `retreats` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString, strum::AsRefStr)]
pub enum RetreatConstraints {
    /// Check constraint: display name must not be empty.
    #[strum(serialize = "retreats_display_name_length_min")]
    DisplayNameLengthMin,
    /// Check constraint: display name must not exceed the maximum length.
    #[strum(serialize = "retreats_display_name_length_max")]
    DisplayNameLengthMax,
    /// Check constraint: a retreat cannot end before it starts.
    #[strum(serialize = "retreats_ends_after_starts")]
    EndsAfterStarts,
}

impl RetreatConstraints {
    /// Creates a new [`RetreatConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            Self::EndsAfterStarts => ConstraintCategory::Chronological,
            Self::DisplayNameLengthMin | Self::DisplayNameLengthMax => {
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
            RetreatConstraints::new("retreats_ends_after_starts"),
            Some(RetreatConstraints::EndsAfterStarts)
        );
        assert_eq!(RetreatConstraints::new("retreats_unknown"), None);
    }
}
