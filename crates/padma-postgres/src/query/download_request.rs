//! Download requests repository for the shared archive pipeline.
//!
//! Requests move through `pending -> processing -> ready | failed`, with
//! `expired` entered only from `ready` by the lifecycle sweep or the delivery
//! validator. All terminal transitions are guarded updates so repeated calls
//! never double-apply.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{DownloadRequest, NewDownloadRequest, UpdateDownloadRequest};
use crate::query::Pagination;
use crate::types::DownloadStatus;
use crate::{PgConnection, PgError, PgResult, schema};

/// Final artifact facts applied when a generation job completes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyOutcome {
    /// Object storage key of the finished archive.
    pub object_key: String,
    /// Download URL reported by the archive worker.
    pub download_url: String,
    /// Archive size in bytes.
    pub file_size: i64,
    /// Performance figures reported by the worker, if any.
    pub performance: Option<serde_json::Value>,
    /// When the archive stops being served.
    pub expires_at: jiff::Timestamp,
}

/// Per-status request counts for the monitoring surface.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadStatistics {
    /// Total number of download requests.
    pub total_count: i64,
    /// Requests waiting for the worker to accept them.
    pub pending_count: i64,
    /// Requests with a generation job in progress.
    pub processing_count: i64,
    /// Requests with a deliverable archive.
    pub ready_count: i64,
    /// Requests whose generation failed.
    pub failed_count: i64,
    /// Requests whose archive lapsed.
    pub expired_count: i64,
}

impl DownloadStatistics {
    /// Returns the number of requests with a job still in flight.
    pub fn in_flight_count(&self) -> i64 {
        self.pending_count + self.processing_count
    }

    /// Returns the failure rate as a percentage (0-100).
    pub fn failure_rate(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            (self.failed_count as f64 / self.total_count as f64) * 100.0
        }
    }
}

/// Computes downloads per hour since the record was created.
///
/// The elapsed time is floored at one hour so young records do not get
/// outsized scores from their first few downloads.
pub fn popularity_score(
    download_count: i32,
    created_at: jiff::Timestamp,
    as_of: jiff::Timestamp,
) -> f64 {
    let hours = (as_of.duration_since(created_at).as_secs_f64() / 3600.0).max(1.0);
    f64::from(download_count.max(0)) / hours
}

/// Repository for download request database operations.
///
/// Handles request lifecycle management including creation, shared-generation
/// lookup, terminal transitions, popularity tracking, and sweeps.
pub trait DownloadRequestRepository {
    /// Creates a new download request record.
    fn create_download_request(
        &mut self,
        new_request: NewDownloadRequest,
    ) -> impl Future<Output = PgResult<DownloadRequest>> + Send;

    /// Finds a download request by its unique identifier.
    fn find_download_request(
        &mut self,
        request_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<DownloadRequest>>> + Send;

    /// Finds the in-flight primary request for a retreat, locking the row.
    ///
    /// The row lock serializes follower attachment against webhook fan-out,
    /// so this must run inside a transaction to be effective. The partial
    /// unique index guarantees at most one such row exists.
    fn find_in_flight_primary(
        &mut self,
        retreat_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<DownloadRequest>>> + Send;

    /// Finds the freshest reusable archive for a retreat.
    ///
    /// Returns the `ready` record with the latest expiry that still has an
    /// object key and has not lapsed at `as_of`.
    fn find_active_artifact(
        &mut self,
        retreat_id: Uuid,
        as_of: jiff::Timestamp,
    ) -> impl Future<Output = PgResult<Option<DownloadRequest>>> + Send;

    /// Finds the caller's newest usable request for a retreat.
    ///
    /// Failed and lapsed records are skipped so a re-request after a failure
    /// starts a fresh generation instead of echoing the old outcome.
    fn find_account_request(
        &mut self,
        account_id: Uuid,
        retreat_id: Uuid,
        as_of: jiff::Timestamp,
    ) -> impl Future<Output = PgResult<Option<DownloadRequest>>> + Send;

    /// Lists in-flight followers attached to a primary request.
    fn list_followers(
        &mut self,
        primary_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<DownloadRequest>>> + Send;

    /// Lists all download requests of a retreat, newest first.
    fn list_retreat_requests(
        &mut self,
        retreat_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<DownloadRequest>>> + Send;

    /// Lists recent download requests across all retreats, newest first.
    fn list_recent_requests(
        &mut self,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<DownloadRequest>>> + Send;

    /// Updates a download request with new data.
    fn update_download_request(
        &mut self,
        request_id: Uuid,
        updates: UpdateDownloadRequest,
    ) -> impl Future<Output = PgResult<DownloadRequest>> + Send;

    /// Moves a request into `processing`, or refreshes its progress.
    ///
    /// A `pending` record transitions and gets its `processing_started_at`
    /// stamped; a record already `processing` only absorbs the new job id and
    /// progress payload. Returns `None` when the record is unknown or already
    /// terminal, leaving it untouched.
    fn mark_processing(
        &mut self,
        request_id: Uuid,
        job_id: Option<&str>,
        progress: Option<serde_json::Value>,
    ) -> impl Future<Output = PgResult<Option<DownloadRequest>>> + Send;

    /// Completes an in-flight request with the finished artifact.
    ///
    /// Returns `None` when the record is unknown or already terminal.
    fn mark_ready(
        &mut self,
        request_id: Uuid,
        outcome: ReadyOutcome,
    ) -> impl Future<Output = PgResult<Option<DownloadRequest>>> + Send;

    /// Fails an in-flight request with an error message.
    ///
    /// Returns `None` when the record is unknown or already terminal.
    fn mark_failed(
        &mut self,
        request_id: Uuid,
        error_message: &str,
    ) -> impl Future<Output = PgResult<Option<DownloadRequest>>> + Send;

    /// Expires a `ready` request whose archive is no longer served.
    ///
    /// Returns `None` when the record is not `ready`, which makes repeated
    /// expiry attempts no-ops.
    fn mark_expired(
        &mut self,
        request_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<DownloadRequest>>> + Send;

    /// Copies a primary's terminal outcome onto its in-flight followers.
    ///
    /// Must run in the same transaction as the primary's own transition so a
    /// follower can never observe a half-applied fan-out.
    fn propagate_outcome_to_followers(
        &mut self,
        primary: &DownloadRequest,
    ) -> impl Future<Output = PgResult<Vec<DownloadRequest>>> + Send;

    /// Fails abandoned in-flight requests across all retreats.
    ///
    /// A request counts as abandoned when it has been `processing` since
    /// before `stale_before`, or `pending` for as long without the worker
    /// ever accepting the job.
    fn sweep_stuck_requests(
        &mut self,
        stale_before: jiff::Timestamp,
    ) -> impl Future<Output = PgResult<Vec<DownloadRequest>>> + Send;

    /// Fails abandoned in-flight requests for one retreat.
    ///
    /// Used in the request path so an abandoned primary does not block new
    /// generations for its retreat.
    fn sweep_stuck_for_retreat(
        &mut self,
        retreat_id: Uuid,
        stale_before: jiff::Timestamp,
    ) -> impl Future<Output = PgResult<u64>> + Send;

    /// Counts a delivery: bumps `download_count`, stamps `last_accessed_at`,
    /// and recomputes `popularity_score`.
    fn record_download(
        &mut self,
        request_id: Uuid,
    ) -> impl Future<Output = PgResult<DownloadRequest>> + Send;

    /// Extends a `ready` request's expiry, never shortening it.
    ///
    /// Returns `None` when the record is not `ready` or already expires at or
    /// after `new_expiry`. Capping against the retention ceiling is the
    /// caller's responsibility.
    fn extend_expiry(
        &mut self,
        request_id: Uuid,
        new_expiry: jiff::Timestamp,
    ) -> impl Future<Output = PgResult<Option<DownloadRequest>>> + Send;

    /// Lists `ready` requests whose expiry has passed, oldest expiry first.
    fn list_expired_candidates(
        &mut self,
        as_of: jiff::Timestamp,
        limit: i64,
    ) -> impl Future<Output = PgResult<Vec<DownloadRequest>>> + Send;

    /// Counts other `ready` requests still referencing an object key.
    ///
    /// Used before deleting a backing object to keep shared archives alive
    /// while any live record still points at them.
    fn count_live_object_references(
        &mut self,
        object_key: &str,
        exclude_request: Uuid,
    ) -> impl Future<Output = PgResult<i64>> + Send;

    /// Deletes all download requests of a retreat, returning the number removed.
    fn delete_requests_for_retreat(
        &mut self,
        retreat_id: Uuid,
    ) -> impl Future<Output = PgResult<u64>> + Send;

    /// Collects per-status request counts.
    fn collect_download_statistics(
        &mut self,
    ) -> impl Future<Output = PgResult<DownloadStatistics>> + Send;
}

impl DownloadRequestRepository for PgConnection {
    async fn create_download_request(
        &mut self,
        new_request: NewDownloadRequest,
    ) -> PgResult<DownloadRequest> {
        use schema::download_requests;

        let request = diesel::insert_into(download_requests::table)
            .values(&new_request)
            .returning(DownloadRequest::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(request)
    }

    async fn find_download_request(
        &mut self,
        request_id: Uuid,
    ) -> PgResult<Option<DownloadRequest>> {
        use schema::download_requests::{self, dsl};

        let request = download_requests::table
            .filter(dsl::id.eq(request_id))
            .select(DownloadRequest::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(request)
    }

    async fn find_in_flight_primary(
        &mut self,
        retreat_id: Uuid,
    ) -> PgResult<Option<DownloadRequest>> {
        use schema::download_requests::{self, dsl};

        let request = download_requests::table
            .filter(dsl::retreat_id.eq(retreat_id))
            .filter(dsl::primary_request_id.is_null())
            .filter(
                dsl::status
                    .eq(DownloadStatus::Pending)
                    .or(dsl::status.eq(DownloadStatus::Processing)),
            )
            .for_update()
            .select(DownloadRequest::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(request)
    }

    async fn find_active_artifact(
        &mut self,
        retreat_id: Uuid,
        as_of: jiff::Timestamp,
    ) -> PgResult<Option<DownloadRequest>> {
        use schema::download_requests::{self, dsl};

        let cutoff = jiff_diesel::Timestamp::from(as_of);
        let request = download_requests::table
            .filter(dsl::retreat_id.eq(retreat_id))
            .filter(dsl::status.eq(DownloadStatus::Ready))
            .filter(dsl::object_key.is_not_null())
            .filter(dsl::expires_at.gt(&cutoff))
            .order(dsl::expires_at.desc())
            .select(DownloadRequest::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(request)
    }

    async fn find_account_request(
        &mut self,
        account_id: Uuid,
        retreat_id: Uuid,
        as_of: jiff::Timestamp,
    ) -> PgResult<Option<DownloadRequest>> {
        use schema::download_requests::{self, dsl};

        let cutoff = jiff_diesel::Timestamp::from(as_of);
        let request = download_requests::table
            .filter(dsl::account_id.eq(account_id))
            .filter(dsl::retreat_id.eq(retreat_id))
            .filter(
                dsl::status
                    .eq(DownloadStatus::Pending)
                    .or(dsl::status.eq(DownloadStatus::Processing))
                    .or(dsl::status.eq(DownloadStatus::Ready)),
            )
            .filter(dsl::expires_at.is_null().or(dsl::expires_at.gt(&cutoff)))
            .order(dsl::created_at.desc())
            .select(DownloadRequest::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(request)
    }

    async fn list_followers(&mut self, primary_id: Uuid) -> PgResult<Vec<DownloadRequest>> {
        use schema::download_requests::{self, dsl};

        let followers = download_requests::table
            .filter(dsl::primary_request_id.eq(primary_id))
            .filter(
                dsl::status
                    .eq(DownloadStatus::Pending)
                    .or(dsl::status.eq(DownloadStatus::Processing)),
            )
            .order(dsl::created_at.asc())
            .select(DownloadRequest::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(followers)
    }

    async fn list_retreat_requests(&mut self, retreat_id: Uuid) -> PgResult<Vec<DownloadRequest>> {
        use schema::download_requests::{self, dsl};

        let requests = download_requests::table
            .filter(dsl::retreat_id.eq(retreat_id))
            .order(dsl::created_at.desc())
            .select(DownloadRequest::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(requests)
    }

    async fn list_recent_requests(
        &mut self,
        pagination: Pagination,
    ) -> PgResult<Vec<DownloadRequest>> {
        use schema::download_requests::{self, dsl};

        let requests = download_requests::table
            .order(dsl::created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(DownloadRequest::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(requests)
    }

    async fn update_download_request(
        &mut self,
        request_id: Uuid,
        updates: UpdateDownloadRequest,
    ) -> PgResult<DownloadRequest> {
        use schema::download_requests::{self, dsl};

        let request = diesel::update(download_requests::table.filter(dsl::id.eq(request_id)))
            .set(&updates)
            .returning(DownloadRequest::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(request)
    }

    async fn mark_processing(
        &mut self,
        request_id: Uuid,
        job_id: Option<&str>,
        progress: Option<serde_json::Value>,
    ) -> PgResult<Option<DownloadRequest>> {
        use diesel::dsl::now;
        use schema::download_requests::{self, dsl};

        let changes = UpdateDownloadRequest {
            external_job_id: job_id.map(|id| Some(id.to_owned())),
            progress: progress.map(Some),
            ..Default::default()
        };

        let accepted = diesel::update(
            download_requests::table
                .filter(dsl::id.eq(request_id))
                .filter(dsl::status.eq(DownloadStatus::Pending)),
        )
        .set((
            &changes,
            dsl::status.eq(DownloadStatus::Processing),
            dsl::processing_started_at.eq(now),
        ))
        .returning(DownloadRequest::as_returning())
        .get_result(self)
        .await
        .optional()
        .map_err(PgError::from)?;

        if let Some(request) = accepted {
            return Ok(Some(request));
        }

        // Already processing: refresh progress without touching the start stamp.
        let refreshed = diesel::update(
            download_requests::table
                .filter(dsl::id.eq(request_id))
                .filter(dsl::status.eq(DownloadStatus::Processing)),
        )
        .set((&changes, dsl::status.eq(DownloadStatus::Processing)))
        .returning(DownloadRequest::as_returning())
        .get_result(self)
        .await
        .optional()
        .map_err(PgError::from)?;

        Ok(refreshed)
    }

    async fn mark_ready(
        &mut self,
        request_id: Uuid,
        outcome: ReadyOutcome,
    ) -> PgResult<Option<DownloadRequest>> {
        use diesel::dsl::now;
        use schema::download_requests::{self, dsl};

        let expires = jiff_diesel::Timestamp::from(outcome.expires_at);
        let request = diesel::update(
            download_requests::table
                .filter(dsl::id.eq(request_id))
                .filter(
                    dsl::status
                        .eq(DownloadStatus::Pending)
                        .or(dsl::status.eq(DownloadStatus::Processing)),
                ),
        )
        .set((
            dsl::status.eq(DownloadStatus::Ready),
            dsl::object_key.eq(Some(outcome.object_key)),
            dsl::download_url.eq(Some(outcome.download_url)),
            dsl::file_size.eq(Some(outcome.file_size)),
            dsl::performance.eq(outcome.performance),
            dsl::error_message.eq(None::<String>),
            dsl::processing_completed_at.eq(now),
            dsl::expires_at.eq(Some(expires)),
        ))
        .returning(DownloadRequest::as_returning())
        .get_result(self)
        .await
        .optional()
        .map_err(PgError::from)?;

        Ok(request)
    }

    async fn mark_failed(
        &mut self,
        request_id: Uuid,
        error_message: &str,
    ) -> PgResult<Option<DownloadRequest>> {
        use diesel::dsl::now;
        use schema::download_requests::{self, dsl};

        let request = diesel::update(
            download_requests::table
                .filter(dsl::id.eq(request_id))
                .filter(
                    dsl::status
                        .eq(DownloadStatus::Pending)
                        .or(dsl::status.eq(DownloadStatus::Processing)),
                ),
        )
        .set((
            dsl::status.eq(DownloadStatus::Failed),
            dsl::error_message.eq(Some(error_message)),
            dsl::processing_completed_at.eq(now),
        ))
        .returning(DownloadRequest::as_returning())
        .get_result(self)
        .await
        .optional()
        .map_err(PgError::from)?;

        Ok(request)
    }

    async fn mark_expired(&mut self, request_id: Uuid) -> PgResult<Option<DownloadRequest>> {
        use schema::download_requests::{self, dsl};

        let request = diesel::update(
            download_requests::table
                .filter(dsl::id.eq(request_id))
                .filter(dsl::status.eq(DownloadStatus::Ready)),
        )
        .set(dsl::status.eq(DownloadStatus::Expired))
        .returning(DownloadRequest::as_returning())
        .get_result(self)
        .await
        .optional()
        .map_err(PgError::from)?;

        Ok(request)
    }

    async fn propagate_outcome_to_followers(
        &mut self,
        primary: &DownloadRequest,
    ) -> PgResult<Vec<DownloadRequest>> {
        use schema::download_requests::{self, dsl};

        let followers = diesel::update(
            download_requests::table
                .filter(dsl::primary_request_id.eq(primary.id))
                .filter(
                    dsl::status
                        .eq(DownloadStatus::Pending)
                        .or(dsl::status.eq(DownloadStatus::Processing)),
                ),
        )
        .set((
            dsl::status.eq(primary.status),
            dsl::object_key.eq(primary.object_key.clone()),
            dsl::download_url.eq(primary.download_url.clone()),
            dsl::file_size.eq(primary.file_size),
            dsl::error_message.eq(primary.error_message.clone()),
            dsl::processing_completed_at.eq(primary.processing_completed_at),
            dsl::expires_at.eq(primary.expires_at),
        ))
        .returning(DownloadRequest::as_returning())
        .get_results(self)
        .await
        .map_err(PgError::from)?;

        Ok(followers)
    }

    async fn sweep_stuck_requests(
        &mut self,
        stale_before: jiff::Timestamp,
    ) -> PgResult<Vec<DownloadRequest>> {
        use diesel::dsl::now;
        use schema::download_requests::{self, dsl};

        let cutoff = jiff_diesel::Timestamp::from(stale_before);
        let swept = diesel::update(
            download_requests::table.filter(
                dsl::status
                    .eq(DownloadStatus::Processing)
                    .and(dsl::processing_started_at.lt(&cutoff))
                    .or(dsl::status
                        .eq(DownloadStatus::Pending)
                        .and(dsl::created_at.lt(&cutoff))),
            ),
        )
        .set((
            dsl::status.eq(DownloadStatus::Failed),
            dsl::error_message.eq(Some("processing abandoned: no completion callback received")),
            dsl::processing_completed_at.eq(now),
        ))
        .returning(DownloadRequest::as_returning())
        .get_results(self)
        .await
        .map_err(PgError::from)?;

        Ok(swept)
    }

    async fn sweep_stuck_for_retreat(
        &mut self,
        retreat_id: Uuid,
        stale_before: jiff::Timestamp,
    ) -> PgResult<u64> {
        use diesel::dsl::now;
        use schema::download_requests::{self, dsl};

        let cutoff = jiff_diesel::Timestamp::from(stale_before);
        let swept = diesel::update(
            download_requests::table.filter(dsl::retreat_id.eq(retreat_id)).filter(
                dsl::status
                    .eq(DownloadStatus::Processing)
                    .and(dsl::processing_started_at.lt(&cutoff))
                    .or(dsl::status
                        .eq(DownloadStatus::Pending)
                        .and(dsl::created_at.lt(&cutoff))),
            ),
        )
        .set((
            dsl::status.eq(DownloadStatus::Failed),
            dsl::error_message.eq(Some("processing abandoned: no completion callback received")),
            dsl::processing_completed_at.eq(now),
        ))
        .execute(self)
        .await
        .map_err(PgError::from)?;

        Ok(swept as u64)
    }

    async fn record_download(&mut self, request_id: Uuid) -> PgResult<DownloadRequest> {
        use diesel::dsl::now;
        use schema::download_requests::{self, dsl};

        let request: DownloadRequest =
            diesel::update(download_requests::table.filter(dsl::id.eq(request_id)))
                .set((
                    dsl::download_count.eq(dsl::download_count + 1),
                    dsl::last_accessed_at.eq(now),
                ))
                .returning(DownloadRequest::as_returning())
                .get_result(self)
                .await
                .map_err(PgError::from)?;

        let score = popularity_score(
            request.download_count,
            request.created_at.into(),
            jiff::Timestamp::now(),
        );

        let request = diesel::update(download_requests::table.filter(dsl::id.eq(request_id)))
            .set(dsl::popularity_score.eq(score))
            .returning(DownloadRequest::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(request)
    }

    async fn extend_expiry(
        &mut self,
        request_id: Uuid,
        new_expiry: jiff::Timestamp,
    ) -> PgResult<Option<DownloadRequest>> {
        use schema::download_requests::{self, dsl};

        let target = jiff_diesel::Timestamp::from(new_expiry);
        let request = diesel::update(
            download_requests::table
                .filter(dsl::id.eq(request_id))
                .filter(dsl::status.eq(DownloadStatus::Ready))
                .filter(dsl::expires_at.is_null().or(dsl::expires_at.lt(&target))),
        )
        .set(dsl::expires_at.eq(Some(target)))
        .returning(DownloadRequest::as_returning())
        .get_result(self)
        .await
        .optional()
        .map_err(PgError::from)?;

        Ok(request)
    }

    async fn list_expired_candidates(
        &mut self,
        as_of: jiff::Timestamp,
        limit: i64,
    ) -> PgResult<Vec<DownloadRequest>> {
        use schema::download_requests::{self, dsl};

        let cutoff = jiff_diesel::Timestamp::from(as_of);
        let candidates = download_requests::table
            .filter(dsl::status.eq(DownloadStatus::Ready))
            .filter(dsl::expires_at.le(&cutoff))
            .order(dsl::expires_at.asc())
            .limit(limit)
            .select(DownloadRequest::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(candidates)
    }

    async fn count_live_object_references(
        &mut self,
        object_key: &str,
        exclude_request: Uuid,
    ) -> PgResult<i64> {
        use schema::download_requests::{self, dsl};

        let count = download_requests::table
            .filter(dsl::object_key.eq(object_key))
            .filter(dsl::id.ne(exclude_request))
            .filter(dsl::status.eq(DownloadStatus::Ready))
            .count()
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(count)
    }

    async fn delete_requests_for_retreat(&mut self, retreat_id: Uuid) -> PgResult<u64> {
        use schema::download_requests::{self, dsl};

        let deleted =
            diesel::delete(download_requests::table.filter(dsl::retreat_id.eq(retreat_id)))
                .execute(self)
                .await
                .map_err(PgError::from)?;

        Ok(deleted as u64)
    }

    async fn collect_download_statistics(&mut self) -> PgResult<DownloadStatistics> {
        use diesel::dsl::count_star;
        use schema::download_requests::{self, dsl};

        let rows: Vec<(DownloadStatus, i64)> = download_requests::table
            .group_by(dsl::status)
            .select((dsl::status, count_star()))
            .load(self)
            .await
            .map_err(PgError::from)?;

        let mut stats = DownloadStatistics::default();
        for (status, count) in rows {
            stats.total_count += count;
            match status {
                DownloadStatus::Pending => stats.pending_count = count,
                DownloadStatus::Processing => stats.processing_count = count,
                DownloadStatus::Ready => stats.ready_count = count,
                DownloadStatus::Failed => stats.failed_count = count,
                DownloadStatus::Expired => stats.expired_count = count,
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popularity_floors_elapsed_time_at_one_hour() {
        let now = jiff::Timestamp::now();
        let created = now.checked_sub(jiff::Span::new().minutes(5)).unwrap();

        // Five minutes old, three downloads: scored as if one hour elapsed.
        assert_eq!(popularity_score(3, created, now), 3.0);
    }

    #[test]
    fn popularity_decays_with_age() {
        let now = jiff::Timestamp::now();
        let created = now.checked_sub(jiff::Span::new().hours(10)).unwrap();

        let score = popularity_score(5, created, now);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn popularity_never_negative() {
        let now = jiff::Timestamp::now();
        assert_eq!(popularity_score(-1, now, now), 0.0);
    }

    #[test]
    fn statistics_totals_and_rates() {
        let stats = DownloadStatistics {
            total_count: 10,
            pending_count: 1,
            processing_count: 2,
            ready_count: 4,
            failed_count: 2,
            expired_count: 1,
        };

        assert_eq!(stats.in_flight_count(), 3);
        assert!((stats.failure_rate() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn statistics_empty_table_has_zero_failure_rate() {
        let stats = DownloadStatistics::default();
        assert_eq!(stats.failure_rate(), 0.0);
    }
}
