//! Download request response types.

use std::time::Duration;

use jiff::Timestamp;
use padma_postgres::model;
use padma_postgres::types::{DownloadStatus, PerformanceMetrics, ProgressInfo};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::lifecycle;
use crate::service::{RequestDisposition, RequestOutcome};

/// Response to an archive download request.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequested {
    /// Identifier of the caller's download request.
    pub request_id: Uuid,
    /// Current lifecycle status of the request.
    pub status: DownloadStatus,
    /// Whether the request reuses an archive generated for another request.
    pub shared: bool,
    /// Whether an already-active request was returned instead of a new one.
    pub existing: bool,
    /// Rough wall-clock estimate, present only when a generation started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    /// Human-readable summary of what happened.
    pub message: String,
}

impl DownloadRequested {
    /// Creates a response from an orchestration outcome.
    pub fn from_outcome(outcome: &RequestOutcome) -> Self {
        let request = &outcome.request;
        let (existing, estimated_time, message) = match outcome.disposition {
            RequestDisposition::Existing => (
                true,
                None,
                "You already have an active request for this retreat".to_owned(),
            ),
            RequestDisposition::FastPath => {
                (false, None, "Archive is ready for download".to_owned())
            }
            RequestDisposition::Follower => (
                false,
                None,
                "Archive generation is already in progress, poll the status endpoint".to_owned(),
            ),
            RequestDisposition::Generating => (
                false,
                Some(lifecycle::ESTIMATED_GENERATION_TIME.to_owned()),
                "Archive generation started".to_owned(),
            ),
        };

        Self {
            request_id: request.id,
            status: request.status,
            shared: request.is_shared,
            existing,
            estimated_time,
            message,
        }
    }
}

/// Full projection of a download request for the status endpoint.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequestStatus {
    /// Unique request identifier.
    pub request_id: Uuid,
    /// Retreat this request archives.
    pub retreat_id: Uuid,
    /// Current lifecycle status.
    pub status: DownloadStatus,
    /// Whether the archive is shared with other requests.
    pub shared: bool,
    /// Primary request this one follows, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_request_id: Option<Uuid>,
    /// Worker progress, present while processing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressInfo>,
    /// Download URL, present when ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Archive size in bytes, present when ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    /// Worker performance figures, present after completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,
    /// Failure detail, present when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Generation attempts consumed so far.
    pub retry_count: i32,
    /// Whether a failed request may be retried by requesting again.
    pub can_retry: bool,
    /// Number of times the archive was delivered.
    pub download_count: i32,
    /// When the request was created.
    pub created_at: Timestamp,
    /// When the worker accepted the job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_started_at: Option<Timestamp>,
    /// When the worker finished the job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_completed_at: Option<Timestamp>,
    /// When the archive stops being served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}

impl DownloadRequestStatus {
    /// Creates a status projection from a database model.
    pub fn from_model(request: model::DownloadRequest) -> Self {
        let progress = request.progress();
        let performance = request.performance();
        let can_retry =
            request.is_failed() && request.retry_count < lifecycle::MAX_RETRY_ATTEMPTS;

        Self {
            request_id: request.id,
            retreat_id: request.retreat_id,
            status: request.status,
            shared: request.is_shared,
            primary_request_id: request.primary_request_id,
            progress,
            download_url: request.download_url,
            file_size: request.file_size,
            performance,
            error_message: request.error_message,
            retry_count: request.retry_count,
            can_retry,
            download_count: request.download_count,
            created_at: request.created_at.into(),
            processing_started_at: request.processing_started_at.map(Into::into),
            processing_completed_at: request.processing_completed_at.map(Into::into),
            expires_at: request.expires_at.map(Into::into),
        }
    }

    /// Creates status projections from a list of database models.
    pub fn from_models(models: Vec<model::DownloadRequest>) -> Vec<Self> {
        models.into_iter().map(Self::from_model).collect()
    }
}

/// Response to a download link request.
///
/// Served with 200 when a link was issued and 202 when the backing object
/// vanished and a regeneration was started in its place.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadDelivery {
    /// Identifier of the request the link was asked for.
    pub request_id: Uuid,
    /// Status of the request serving this response.
    pub status: DownloadStatus,
    /// Whether the archive is being regenerated instead of delivered.
    pub regenerating: bool,
    /// URL to fetch the archive from, present when delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Seconds the download URL stays valid, present for presigned links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_expires_in_secs: Option<u64>,
    /// When the archive itself stops being served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_expires_at: Option<Timestamp>,
    /// Replacement request to poll, present when regenerating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_request_id: Option<Uuid>,
    /// Human-readable summary of what happened.
    pub message: String,
}

impl DownloadDelivery {
    /// Creates a delivery response with a usable download link.
    pub fn delivered(
        request: &model::DownloadRequest,
        download_url: String,
        url_ttl: Option<Duration>,
    ) -> Self {
        Self {
            request_id: request.id,
            status: request.status,
            regenerating: false,
            download_url: Some(download_url),
            url_expires_in_secs: url_ttl.map(|ttl| ttl.as_secs()),
            archive_expires_at: request.expires_at.map(Into::into),
            new_request_id: None,
            message: "Archive ready".to_owned(),
        }
    }

    /// Creates a regenerating response pointing at the replacement request.
    pub fn regenerating(
        original: &model::DownloadRequest,
        replacement: &model::DownloadRequest,
    ) -> Self {
        Self {
            request_id: original.id,
            status: replacement.status,
            regenerating: true,
            download_url: None,
            url_expires_in_secs: None,
            archive_expires_at: None,
            new_request_id: Some(replacement.id),
            message: "Archive is being regenerated, retry shortly".to_owned(),
        }
    }
}

/// Response to a lifecycle extension request.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleExtended {
    /// Identifier of the extended request.
    pub request_id: Uuid,
    /// Expiry after the extension attempt.
    pub expires_at: Timestamp,
    /// Whether the expiry actually moved forward.
    pub extended: bool,
}

#[cfg(test)]
mod tests {
    use padma_postgres::model::DownloadRequest;

    use super::*;

    fn ready_request() -> DownloadRequest {
        let now = Timestamp::now();
        DownloadRequest {
            id: Uuid::new_v4(),
            retreat_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            status: DownloadStatus::Ready,
            is_shared: true,
            primary_request_id: None,
            object_key: Some("archives/retreat.zip".to_owned()),
            download_url: Some("https://cdn.example.com/archives/retreat.zip".to_owned()),
            file_size: Some(1024),
            error_message: None,
            external_job_id: Some("job-1".to_owned()),
            progress: None,
            performance: None,
            retry_count: 0,
            download_count: 2,
            popularity_score: 0.5,
            last_accessed_at: None,
            created_at: now.into(),
            processing_started_at: Some(now.into()),
            processing_completed_at: Some(now.into()),
            expires_at: Some(now.into()),
        }
    }

    #[test]
    fn status_projection_carries_delivery_fields() {
        let request = ready_request();
        let request_id = request.id;

        let status = DownloadRequestStatus::from_model(request);
        assert_eq!(status.request_id, request_id);
        assert_eq!(status.status, DownloadStatus::Ready);
        assert!(status.download_url.is_some());
        assert!(!status.can_retry);
    }

    #[test]
    fn failed_request_with_budget_can_retry() {
        let mut request = ready_request();
        request.status = DownloadStatus::Failed;
        request.error_message = Some("worker crashed".to_owned());
        request.retry_count = 1;

        let status = DownloadRequestStatus::from_model(request);
        assert!(status.can_retry);
    }

    #[test]
    fn exhausted_retry_budget_blocks_retry() {
        let mut request = ready_request();
        request.status = DownloadStatus::Failed;
        request.retry_count = lifecycle::MAX_RETRY_ATTEMPTS;

        let status = DownloadRequestStatus::from_model(request);
        assert!(!status.can_retry);
    }

    #[test]
    fn delivery_serializes_camel_case() {
        let request = ready_request();
        let delivery = DownloadDelivery::delivered(
            &request,
            "https://signed.example.com/archive.zip".to_owned(),
            Some(Duration::from_secs(3600)),
        );

        let json = serde_json::to_string(&delivery).unwrap();
        assert!(json.contains("requestId"));
        assert!(json.contains("urlExpiresInSecs"));
        assert!(json.contains("\"regenerating\":false"));
        assert!(!json.contains("newRequestId"));
    }

    #[test]
    fn regenerating_points_at_replacement() {
        let original = ready_request();
        let mut replacement = ready_request();
        replacement.id = Uuid::new_v4();
        replacement.status = DownloadStatus::Pending;

        let delivery = DownloadDelivery::regenerating(&original, &replacement);
        assert!(delivery.regenerating);
        assert_eq!(delivery.new_request_id, Some(replacement.id));
        assert_eq!(delivery.status, DownloadStatus::Pending);
        assert!(delivery.download_url.is_none());
    }
}
