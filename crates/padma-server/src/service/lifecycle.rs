//! Retention rules for generated archives.
//!
//! Every expiry change in the crate funnels through these functions: they
//! compute floors, the guarded repository update enforces monotonicity, and
//! [`clamp_to_cap`] bounds everything at the hard retention ceiling.

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};

/// How long a fresh archive is retained after generation.
pub const INITIAL_RETENTION: SignedDuration = days(7);

/// Hard ceiling on retention, measured from the moment of extension.
pub const RETENTION_CAP: SignedDuration = days(14);

/// Minimum remaining lifetime granted when an archive is reused.
pub const FAST_PATH_FLOOR: SignedDuration = days(2);

/// Downloads needed before the first popularity extension.
pub const POPULAR_THRESHOLD: i32 = 3;

/// Minimum remaining lifetime for archives past [`POPULAR_THRESHOLD`].
pub const POPULAR_FLOOR: SignedDuration = days(3);

/// Downloads needed before the larger popularity extension.
pub const HOT_THRESHOLD: i32 = 5;

/// Minimum remaining lifetime for archives past [`HOT_THRESHOLD`].
pub const HOT_FLOOR: SignedDuration = days(5);

/// Smallest manual extension a caller may request, in days.
pub const MIN_EXTENSION_DAYS: i64 = 1;

/// Largest manual extension a caller may request, in days.
pub const MAX_EXTENSION_DAYS: i64 = 7;

/// How long a job may sit in `pending` or `processing` without a callback
/// before the sweeps fail it.
pub const STUCK_THRESHOLD: SignedDuration = SignedDuration::from_mins(30);

/// Validity window of presigned delivery URLs.
pub const PRESIGN_TTL: Duration = Duration::from_secs(3600);

/// Expiry candidates processed per sweep cycle.
pub const SWEEP_BATCH_SIZE: i64 = 100;

/// Generation attempts allowed per request before retries are refused.
pub const MAX_RETRY_ATTEMPTS: i32 = 3;

/// Wall-clock estimate quoted to callers when a fresh generation starts.
pub const ESTIMATED_GENERATION_TIME: &str = "5-10 minutes";

const fn days(count: i64) -> SignedDuration {
    SignedDuration::from_hours(24 * count)
}

/// Returns the expiry stamped on an archive when it first becomes ready.
pub fn initial_expiry(now: Timestamp) -> Timestamp {
    now + INITIAL_RETENTION
}

/// Returns the minimum expiry owed to an archive reused via the fast path.
pub fn fast_path_floor(now: Timestamp) -> Timestamp {
    now + FAST_PATH_FLOOR
}

/// Returns the minimum expiry owed to an archive by download volume.
///
/// `None` below the first threshold; the repository's guarded update makes
/// applying the floor a no-op when the current expiry already exceeds it.
pub fn popularity_floor(download_count: i32, now: Timestamp) -> Option<Timestamp> {
    if download_count >= HOT_THRESHOLD {
        Some(now + HOT_FLOOR)
    } else if download_count >= POPULAR_THRESHOLD {
        Some(now + POPULAR_FLOOR)
    } else {
        None
    }
}

/// Returns the expiry target for a manual extension of `extension_days`.
///
/// The caller validates the day range; this only positions and caps the
/// target.
pub fn manual_floor(extension_days: i64, now: Timestamp) -> Timestamp {
    clamp_to_cap(now + days(extension_days), now)
}

/// Bounds an expiry target at the hard retention ceiling.
pub fn clamp_to_cap(target: Timestamp, now: Timestamp) -> Timestamp {
    target.min(now + RETENTION_CAP)
}

/// Returns the instant before which an in-flight job counts as abandoned.
pub fn stuck_cutoff(now: Timestamp) -> Timestamp {
    now - STUCK_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_retention_is_seven_days() {
        let now = Timestamp::now();
        assert_eq!(initial_expiry(now), now + SignedDuration::from_hours(168));
    }

    #[test]
    fn popularity_floors_follow_download_thresholds() {
        let now = Timestamp::now();

        assert_eq!(popularity_floor(0, now), None);
        assert_eq!(popularity_floor(2, now), None);
        assert_eq!(popularity_floor(3, now), Some(now + POPULAR_FLOOR));
        assert_eq!(popularity_floor(4, now), Some(now + POPULAR_FLOOR));
        assert_eq!(popularity_floor(5, now), Some(now + HOT_FLOOR));
        assert_eq!(popularity_floor(50, now), Some(now + HOT_FLOOR));
    }

    #[test]
    fn fast_path_floor_is_two_days_out() {
        let now = Timestamp::now();
        assert_eq!(fast_path_floor(now), now + SignedDuration::from_hours(48));
    }

    #[test]
    fn manual_floor_positions_by_requested_days() {
        let now = Timestamp::now();

        assert_eq!(manual_floor(1, now), now + days(1));
        assert_eq!(manual_floor(7, now), now + days(7));
    }

    #[test]
    fn cap_clamps_targets_beyond_the_ceiling() {
        let now = Timestamp::now();
        let far = now + days(30);

        assert_eq!(clamp_to_cap(far, now), now + RETENTION_CAP);
        assert_eq!(clamp_to_cap(now + days(3), now), now + days(3));
    }

    #[test]
    fn every_floor_stays_under_the_cap() {
        let now = Timestamp::now();
        let cap = now + RETENTION_CAP;

        assert!(initial_expiry(now) < cap);
        assert!(fast_path_floor(now) < cap);
        assert!(popularity_floor(5, now).unwrap() < cap);
        assert!(manual_floor(MAX_EXTENSION_DAYS, now) < cap);
    }

    #[test]
    fn stuck_cutoff_is_half_an_hour_back() {
        let now = Timestamp::now();
        assert_eq!(stuck_cutoff(now), now - SignedDuration::from_mins(30));
    }
}
