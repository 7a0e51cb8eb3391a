//! Download request model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::download_requests;
use crate::types::{DownloadStatus, PerformanceMetrics, ProgressInfo};

/// Download request model representing one account's claim on a retreat archive.
///
/// Requests for the same retreat share a single generation job: the first
/// in-flight request is the primary, later ones reference it through
/// `primary_request_id` and inherit its outcome.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = download_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DownloadRequest {
    /// Unique request identifier.
    pub id: Uuid,
    /// Reference to the retreat being archived.
    pub retreat_id: Uuid,
    /// Account that requested the archive.
    pub account_id: Uuid,
    /// Current lifecycle status.
    pub status: DownloadStatus,
    /// Whether this request reuses an archive produced for another request.
    pub is_shared: bool,
    /// Primary request this one follows, if any.
    pub primary_request_id: Option<Uuid>,
    /// Object storage key of the finished archive.
    pub object_key: Option<String>,
    /// Download URL reported by the archive worker.
    pub download_url: Option<String>,
    /// Archive size in bytes.
    pub file_size: Option<i64>,
    /// Failure detail when the request failed.
    pub error_message: Option<String>,
    /// Identifier assigned by the external archive worker.
    pub external_job_id: Option<String>,
    /// Latest progress payload from the worker.
    pub progress: Option<serde_json::Value>,
    /// Performance figures reported on completion.
    pub performance: Option<serde_json::Value>,
    /// Number of generation attempts consumed.
    pub retry_count: i32,
    /// Number of times the archive was delivered.
    pub download_count: i32,
    /// Downloads per hour since creation.
    pub popularity_score: f64,
    /// When the archive was last delivered.
    pub last_accessed_at: Option<Timestamp>,
    /// When the request was created.
    pub created_at: Timestamp,
    /// When the worker accepted the job.
    pub processing_started_at: Option<Timestamp>,
    /// When the worker finished the job.
    pub processing_completed_at: Option<Timestamp>,
    /// When the archive stops being served.
    pub expires_at: Option<Timestamp>,
}

/// Data for creating a new download request.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = download_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDownloadRequest {
    /// Retreat ID (required).
    pub retreat_id: Uuid,
    /// Account ID (required).
    pub account_id: Uuid,
    /// Initial status.
    pub status: Option<DownloadStatus>,
    /// Whether the request reuses another request's archive.
    pub is_shared: Option<bool>,
    /// Primary request to follow.
    pub primary_request_id: Option<Uuid>,
    /// Object storage key, for requests born from an existing archive.
    pub object_key: Option<String>,
    /// Download URL, for requests born from an existing archive.
    pub download_url: Option<String>,
    /// Archive size in bytes.
    pub file_size: Option<i64>,
    /// Expiry inherited from an existing archive.
    pub expires_at: Option<Timestamp>,
}

/// Data for updating a download request.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = download_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateDownloadRequest {
    /// Lifecycle status.
    pub status: Option<DownloadStatus>,
    /// Object storage key of the finished archive.
    pub object_key: Option<Option<String>>,
    /// Download URL reported by the worker.
    pub download_url: Option<Option<String>>,
    /// Archive size in bytes.
    pub file_size: Option<Option<i64>>,
    /// Failure detail.
    pub error_message: Option<Option<String>>,
    /// Identifier assigned by the external worker.
    pub external_job_id: Option<Option<String>>,
    /// Latest progress payload.
    pub progress: Option<Option<serde_json::Value>>,
    /// Performance figures.
    pub performance: Option<Option<serde_json::Value>>,
    /// Number of generation attempts consumed.
    pub retry_count: Option<i32>,
    /// Downloads per hour since creation.
    pub popularity_score: Option<f64>,
    /// When the archive was last delivered.
    pub last_accessed_at: Option<Option<Timestamp>>,
    /// When the worker accepted the job.
    pub processing_started_at: Option<Option<Timestamp>>,
    /// When the worker finished the job.
    pub processing_completed_at: Option<Option<Timestamp>>,
    /// When the archive stops being served.
    pub expires_at: Option<Option<Timestamp>>,
}

impl DownloadRequest {
    /// Returns whether the request is waiting for the worker to accept it.
    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    /// Returns whether the worker is generating the archive.
    pub fn is_processing(&self) -> bool {
        self.status.is_processing()
    }

    /// Returns whether the archive is available for delivery.
    pub fn is_ready(&self) -> bool {
        self.status.is_ready()
    }

    /// Returns whether generation failed.
    pub fn is_failed(&self) -> bool {
        self.status.is_failed()
    }

    /// Returns whether the archive passed its expiry.
    pub fn is_expired(&self) -> bool {
        self.status.is_expired()
    }

    /// Returns whether the request still has a job in flight.
    pub fn is_in_flight(&self) -> bool {
        self.status.is_in_flight()
    }

    /// Returns whether the request reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns whether this request owns its generation job.
    pub fn is_primary(&self) -> bool {
        self.primary_request_id.is_none()
    }

    /// Returns whether this request follows another request's job.
    pub fn is_follower(&self) -> bool {
        self.primary_request_id.is_some()
    }

    /// Returns the typed progress payload, if present and well-formed.
    pub fn progress(&self) -> Option<ProgressInfo> {
        self.progress.as_ref().and_then(ProgressInfo::from_value)
    }

    /// Returns the typed performance payload, if present and well-formed.
    pub fn performance(&self) -> Option<PerformanceMetrics> {
        self.performance
            .as_ref()
            .and_then(PerformanceMetrics::from_value)
    }

    /// Returns the duration of the generation job in seconds, if available.
    pub fn processing_duration_secs(&self) -> Option<f64> {
        let started: jiff::Timestamp = self.processing_started_at?.into();
        let completed: jiff::Timestamp = self.processing_completed_at?.into();
        Some(completed.duration_since(started).as_secs_f64())
    }

    /// Returns whether the archive expiry has passed at the given instant.
    ///
    /// Requests without an expiry never report as lapsed.
    pub fn is_expired_at(&self, now: jiff::Timestamp) -> bool {
        self.expires_at
            .map(|at| jiff::Timestamp::from(at) <= now)
            .unwrap_or(false)
    }

    /// Returns whether the archive is still deliverable at the given instant.
    pub fn is_deliverable_at(&self, now: jiff::Timestamp) -> bool {
        self.is_ready() && !self.is_expired_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> DownloadRequest {
        let now = jiff::Timestamp::now();
        DownloadRequest {
            id: Uuid::new_v4(),
            retreat_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            status: DownloadStatus::Ready,
            is_shared: false,
            primary_request_id: None,
            object_key: Some("archives/retreat.zip".to_owned()),
            download_url: None,
            file_size: Some(1024),
            error_message: None,
            external_job_id: Some("job-1".to_owned()),
            progress: None,
            performance: None,
            retry_count: 0,
            download_count: 0,
            popularity_score: 0.0,
            last_accessed_at: None,
            created_at: now.into(),
            processing_started_at: None,
            processing_completed_at: None,
            expires_at: None,
        }
    }

    #[test]
    fn primary_and_follower_are_mutually_exclusive() {
        let mut request = sample_request();
        assert!(request.is_primary());
        assert!(!request.is_follower());

        request.primary_request_id = Some(Uuid::new_v4());
        assert!(!request.is_primary());
        assert!(request.is_follower());
    }

    #[test]
    fn missing_expiry_never_lapses() {
        let request = sample_request();
        assert!(!request.is_expired_at(jiff::Timestamp::now()));
        assert!(request.is_deliverable_at(jiff::Timestamp::now()));
    }

    #[test]
    fn past_expiry_blocks_delivery() {
        let now = jiff::Timestamp::now();
        let mut request = sample_request();
        request.expires_at = Some(now.checked_sub(jiff::Span::new().hours(1)).unwrap().into());

        assert!(request.is_expired_at(now));
        assert!(!request.is_deliverable_at(now));
    }

    #[test]
    fn typed_progress_survives_the_jsonb_column() {
        let mut request = sample_request();
        let progress = ProgressInfo {
            percent: 55,
            processed_files: 11,
            total_files: 20,
            total_size_mb: None,
        };
        request.progress = Some(progress.to_value());

        assert_eq!(request.progress(), Some(progress));
    }
}
