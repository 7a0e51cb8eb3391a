//! Download request status enumeration tracking the archive generation state.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Defines the state of a retreat archive download request.
///
/// This enumeration corresponds to the `DOWNLOAD_STATUS` PostgreSQL enum.
///
/// Requests move `pending -> processing -> ready | failed`. Terminal records
/// reach `expired` only through lifecycle management or delivery validation,
/// never through the completion webhook.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::DownloadStatus"]
pub enum DownloadStatus {
    /// Request accepted, generation job not yet dispatched
    #[db_rename = "pending"]
    #[serde(rename = "pending")]
    #[strum(serialize = "pending")]
    #[default]
    Pending,

    /// Generation job accepted by the external worker
    #[db_rename = "processing"]
    #[serde(rename = "processing")]
    #[strum(serialize = "processing")]
    Processing,

    /// Archive produced and available for delivery
    #[db_rename = "ready"]
    #[serde(rename = "ready")]
    #[strum(serialize = "ready")]
    Ready,

    /// Generation failed with an error
    #[db_rename = "failed"]
    #[serde(rename = "failed")]
    #[strum(serialize = "failed")]
    Failed,

    /// Retention ended, backing object no longer guaranteed
    #[db_rename = "expired"]
    #[serde(rename = "expired")]
    #[strum(serialize = "expired")]
    Expired,
}

impl DownloadStatus {
    /// Returns whether the request is waiting for job dispatch.
    #[inline]
    pub fn is_pending(self) -> bool {
        matches!(self, DownloadStatus::Pending)
    }

    /// Returns whether the generation job is running.
    #[inline]
    pub fn is_processing(self) -> bool {
        matches!(self, DownloadStatus::Processing)
    }

    /// Returns whether the archive is available for delivery.
    #[inline]
    pub fn is_ready(self) -> bool {
        matches!(self, DownloadStatus::Ready)
    }

    /// Returns whether the request failed.
    #[inline]
    pub fn is_failed(self) -> bool {
        matches!(self, DownloadStatus::Failed)
    }

    /// Returns whether the request expired.
    #[inline]
    pub fn is_expired(self) -> bool {
        matches!(self, DownloadStatus::Expired)
    }

    /// Returns whether a generation is still under way (pending or processing).
    #[inline]
    pub fn is_in_flight(self) -> bool {
        matches!(self, DownloadStatus::Pending | DownloadStatus::Processing)
    }

    /// Returns whether the request has settled (ready, failed, or expired).
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DownloadStatus::Ready | DownloadStatus::Failed | DownloadStatus::Expired
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_classes_are_disjoint() {
        for status in [
            DownloadStatus::Pending,
            DownloadStatus::Processing,
            DownloadStatus::Ready,
            DownloadStatus::Failed,
            DownloadStatus::Expired,
        ] {
            assert_ne!(status.is_in_flight(), status.is_terminal());
        }
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(DownloadStatus::Pending.to_string(), "pending");
        assert_eq!(DownloadStatus::Processing.to_string(), "processing");
        assert_eq!(DownloadStatus::Ready.to_string(), "ready");
        assert_eq!(DownloadStatus::Failed.to_string(), "failed");
        assert_eq!(DownloadStatus::Expired.to_string(), "expired");
    }

    #[test]
    fn parses_from_wire_names() {
        assert_eq!(
            "processing".parse::<DownloadStatus>().unwrap(),
            DownloadStatus::Processing
        );
        assert!("unknown".parse::<DownloadStatus>().is_err());
    }
}
