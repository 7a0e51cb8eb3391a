//! Worker callback acknowledgement types.

use padma_postgres::types::DownloadStatus;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Acknowledgement returned to the archive worker.
///
/// Field names stay snake_case because this is the worker's wire contract,
/// not a browser-facing payload.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WebhookAck {
    /// Whether the callback was applied (or already had been).
    pub success: bool,
    /// Request the callback addressed.
    pub request_id: Uuid,
    /// Status of the request after processing the callback.
    pub status: DownloadStatus,
    /// Number of follower requests updated by fan-out.
    pub followers_updated: usize,
}

impl WebhookAck {
    /// Creates an acknowledgement for an applied callback.
    pub fn applied(request_id: Uuid, status: DownloadStatus, followers_updated: usize) -> Self {
        Self {
            success: true,
            request_id,
            status,
            followers_updated,
        }
    }

    /// Creates an acknowledgement for a callback that changed nothing.
    ///
    /// Sent for duplicate deliveries against terminal records so the worker
    /// stops retrying.
    pub fn unchanged(request_id: Uuid, status: DownloadStatus) -> Self {
        Self {
            success: true,
            request_id,
            status,
            followers_updated: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_keeps_snake_case_wire_names() {
        let ack = WebhookAck::applied(Uuid::new_v4(), DownloadStatus::Ready, 2);

        let json = serde_json::to_string(&ack).unwrap();
        assert!(json.contains("request_id"));
        assert!(json.contains("followers_updated"));
        assert!(json.contains("\"success\":true"));
    }
}
