//! Worker callback request types.
//!
//! Field names stay snake_case because they are the archive worker's wire
//! contract. Progress arrives as flat fields and is folded into the typed
//! [`ProgressInfo`] sub-record before storage.

use padma_postgres::query::ReadyOutcome;
use padma_postgres::types::{DownloadStatus, PerformanceMetrics, ProgressInfo};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status reported by the archive worker in a callback.
///
/// Deliberately narrower than [`DownloadStatus`]: the worker never reports
/// `expired`, that transition belongs to lifecycle management alone.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    /// Job queued but not started.
    Pending,
    /// Job running, payload may carry progress.
    Processing,
    /// Archive produced and uploaded.
    Ready,
    /// Job failed, payload carries the error.
    Failed,
}

impl CallbackStatus {
    /// Maps the callback status onto the stored request status.
    pub fn as_download_status(self) -> DownloadStatus {
        match self {
            Self::Pending => DownloadStatus::Pending,
            Self::Processing => DownloadStatus::Processing,
            Self::Ready => DownloadStatus::Ready,
            Self::Failed => DownloadStatus::Failed,
        }
    }
}

/// Performance block sent by the worker on completion.
#[must_use]
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerPerformance {
    /// Seconds spent compressing the audio files.
    #[serde(default)]
    pub compression_time: Option<f64>,
    /// Seconds spent uploading the finished archive.
    #[serde(default)]
    pub upload_time: Option<f64>,
    /// Number of files packed into the archive.
    #[serde(default)]
    pub total_files: Option<i32>,
}

/// Callback payload posted by the archive worker.
///
/// Every field except `request_id` and `status` is optional on the wire;
/// which ones are required depends on the reported status.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebhookPayload {
    /// Request this callback addresses.
    pub request_id: Uuid,
    /// Reported job status.
    pub status: CallbackStatus,
    /// Worker-side invocation id, stored for traceability.
    #[serde(default)]
    pub lambda_request_id: Option<String>,

    // Progress fields, sent while processing.
    /// Completion percentage in the `0..=100` range.
    #[serde(default)]
    pub progress_percent: Option<i32>,
    /// Number of audio files already packed.
    #[serde(default)]
    pub processed_files: Option<i32>,
    /// Total number of audio files in the job.
    #[serde(default)]
    pub total_files: Option<i32>,
    /// Cumulative uncompressed size processed so far, in megabytes.
    #[serde(default)]
    pub total_size_mb: Option<f64>,

    // Outcome fields, required when ready.
    /// Object storage key of the finished archive.
    #[serde(default)]
    pub s3_key: Option<String>,
    /// URL the archive can be fetched from.
    #[serde(default)]
    pub download_url: Option<String>,
    /// Archive size in bytes.
    #[serde(default)]
    pub file_size: Option<i64>,
    /// Total uncompressed input size in bytes.
    #[serde(default)]
    pub original_size: Option<i64>,
    /// Compressed size divided by original size.
    #[serde(default)]
    pub compression_ratio: Option<f64>,
    /// End-to-end processing time in seconds.
    #[serde(default)]
    pub processing_time_seconds: Option<f64>,
    /// Timing breakdown for the completed job.
    #[serde(default)]
    pub performance: Option<WorkerPerformance>,

    // Failure detail, expected when failed.
    /// Why the job failed.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl WebhookPayload {
    /// Folds the flat progress fields into a typed sub-record.
    ///
    /// Returns `None` when the payload carried no progress at all.
    pub fn progress_info(&self) -> Option<ProgressInfo> {
        self.progress_percent.map(|percent| ProgressInfo {
            percent,
            processed_files: self.processed_files.unwrap_or_default(),
            total_files: self.total_files.unwrap_or_default(),
            total_size_mb: self.total_size_mb,
        })
    }

    /// Folds the completion figures into a typed sub-record.
    pub fn performance_metrics(&self) -> Option<PerformanceMetrics> {
        let timing = self.performance.clone().unwrap_or_default();
        let metrics = PerformanceMetrics {
            compression_secs: timing.compression_time,
            upload_secs: timing.upload_time,
            processing_secs: self.processing_time_seconds,
            original_size: self.original_size,
            compression_ratio: self.compression_ratio,
            files_processed: timing.total_files,
        };

        (metrics != PerformanceMetrics::default()).then_some(metrics)
    }

    /// Builds the ready outcome when every required delivery field is present.
    ///
    /// Returns `None` when `s3_key`, `download_url` or `file_size` is
    /// missing; such a payload is a worker bug and must not touch the record.
    pub fn ready_outcome(&self, expires_at: jiff::Timestamp) -> Option<ReadyOutcome> {
        let object_key = self.s3_key.clone()?;
        let download_url = self.download_url.clone()?;
        let file_size = self.file_size?;

        Some(ReadyOutcome {
            object_key,
            download_url,
            file_size,
            performance: self.performance_metrics().map(|m| m.to_value()),
            expires_at,
        })
    }

    /// Returns the failure message, defaulting when the worker sent none.
    pub fn failure_message(&self) -> &str {
        self.error_message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or("Archive generation failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_payload(status: CallbackStatus) -> WebhookPayload {
        WebhookPayload {
            request_id: Uuid::new_v4(),
            status,
            lambda_request_id: None,
            progress_percent: None,
            processed_files: None,
            total_files: None,
            total_size_mb: None,
            s3_key: None,
            download_url: None,
            file_size: None,
            original_size: None,
            compression_ratio: None,
            processing_time_seconds: None,
            performance: None,
            error_message: None,
        }
    }

    #[test]
    fn parses_processing_payload_from_worker_wire() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "request_id": "6e7f3a44-5f30-4f57-9a41-a2a6a35cbe0b",
            "status": "processing",
            "lambda_request_id": "lambda-123",
            "progress_percent": 25,
            "processed_files": 2,
            "total_files": 7,
            "total_size_mb": 150.5,
        }))
        .unwrap();

        assert_eq!(payload.status, CallbackStatus::Processing);
        let progress = payload.progress_info().unwrap();
        assert_eq!(progress.percent, 25);
        assert_eq!(progress.total_files, 7);
        assert_eq!(progress.total_size_mb, Some(150.5));
    }

    #[test]
    fn ready_outcome_requires_all_delivery_fields() {
        let mut payload = bare_payload(CallbackStatus::Ready);
        payload.s3_key = Some("archives/retreat.zip".to_owned());
        payload.download_url = Some("https://bucket.s3.amazonaws.com/retreat.zip".to_owned());

        let expires_at = jiff::Timestamp::now();
        assert!(payload.ready_outcome(expires_at).is_none());

        payload.file_size = Some(50_000_000);
        let outcome = payload.ready_outcome(expires_at).unwrap();
        assert_eq!(outcome.object_key, "archives/retreat.zip");
        assert_eq!(outcome.file_size, 50_000_000);
    }

    #[test]
    fn performance_merges_flat_and_nested_fields() {
        let mut payload = bare_payload(CallbackStatus::Ready);
        payload.processing_time_seconds = Some(45.0);
        payload.compression_ratio = Some(66.7);
        payload.performance = Some(WorkerPerformance {
            compression_time: Some(30.0),
            upload_time: Some(15.0),
            total_files: Some(7),
        });

        let metrics = payload.performance_metrics().unwrap();
        assert_eq!(metrics.compression_secs, Some(30.0));
        assert_eq!(metrics.upload_secs, Some(15.0));
        assert_eq!(metrics.processing_secs, Some(45.0));
        assert_eq!(metrics.files_processed, Some(7));
    }

    #[test]
    fn performance_absent_when_worker_sent_nothing() {
        let payload = bare_payload(CallbackStatus::Ready);
        assert!(payload.performance_metrics().is_none());
    }

    #[test]
    fn failure_message_defaults_when_empty() {
        let mut payload = bare_payload(CallbackStatus::Failed);
        assert_eq!(payload.failure_message(), "Archive generation failed");

        payload.error_message = Some("   ".to_owned());
        assert_eq!(payload.failure_message(), "Archive generation failed");

        payload.error_message = Some("Lambda timed out".to_owned());
        assert_eq!(payload.failure_message(), "Lambda timed out");
    }

    #[test]
    fn callback_status_never_maps_to_expired() {
        let statuses = [
            CallbackStatus::Pending,
            CallbackStatus::Processing,
            CallbackStatus::Ready,
            CallbackStatus::Failed,
        ];

        for status in statuses {
            assert_ne!(status.as_download_status(), DownloadStatus::Expired);
        }
    }
}
