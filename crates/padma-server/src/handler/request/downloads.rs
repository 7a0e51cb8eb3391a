//! Download lifecycle request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for manually extending an archive's retention.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExtendLifecycle {
    /// Number of days to keep the archive from now (1-7).
    ///
    /// The resulting expiry is still capped by the retention ceiling and
    /// never moves backwards.
    #[validate(range(min = 1, max = 7))]
    pub days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_days_within_range() {
        assert!(ExtendLifecycle { days: 1 }.validate().is_ok());
        assert!(ExtendLifecycle { days: 7 }.validate().is_ok());
    }

    #[test]
    fn rejects_days_outside_range() {
        assert!(ExtendLifecycle { days: 0 }.validate().is_err());
        assert!(ExtendLifecycle { days: 8 }.validate().is_err());
    }
}
