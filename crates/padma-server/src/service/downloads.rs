//! Download request orchestration.
//!
//! One generation job runs per retreat at a time: the first request becomes
//! the primary, concurrent requests attach as followers, and later requests
//! reuse the finished archive through the fast path. The partial unique index
//! on in-flight primaries backs the dedup; losing the insert race is handled
//! by retrying the claim and attaching as a follower.

use std::time::Duration;

use padma_opendal::{ObjectStore, StorageError};
use padma_postgres::model::{DownloadRequest, NewDownloadRequest, Retreat};
use padma_postgres::query::{
    DownloadRequestRepository, RetreatParticipantRepository, RetreatRepository, TrackRepository,
};
use padma_postgres::retry::RetryConfig;
use padma_postgres::scoped_futures::ScopedFutureExt;
use padma_postgres::types::DownloadStatus;
use padma_postgres::{PgClient, PgConn, PgError};
use padma_zipgen::ZipJobRequest;
use url::Url;
use uuid::Uuid;

use crate::handler::{Error, ErrorKind, Result};
use crate::service::{ZipJobService, lifecycle};

const TRACING_TARGET: &str = "padma_server::downloads";

const EMPTY_CATALOG_MESSAGE: &str = "Retreat has no recordings to archive";
const SUBMISSION_FAILED_MESSAGE: &str = "Archive job could not be submitted to the worker";

/// How a download request came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDisposition {
    /// The caller already held a usable request for this retreat.
    Existing,
    /// A shared archive was reused without starting a generation.
    FastPath,
    /// The request attached to a generation already in flight.
    Follower,
    /// A fresh generation job was claimed for this request.
    Generating,
}

/// Outcome of a download request, pairing the record with how it came to be.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    /// The caller's download request record.
    pub request: DownloadRequest,
    /// How the record was obtained.
    pub disposition: RequestDisposition,
}

/// Outcome of a delivery attempt against a ready request.
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    /// The archive is healthy and can be fetched through the given URL.
    Delivered {
        /// The delivered request, with its download counted.
        request: DownloadRequest,
        /// URL the archive can be fetched from.
        url: String,
        /// Validity window of the URL, when it was presigned.
        url_ttl: Option<Duration>,
    },
    /// The backing object vanished; a replacement generation was started.
    Regenerating {
        /// The original request, now expired.
        request: DownloadRequest,
        /// The replacement request to poll.
        replacement: DownloadRequest,
    },
}

/// Orchestrates archive generation, reuse, and delivery.
#[derive(Debug, Clone)]
pub struct DownloadService {
    pg_client: PgClient,
    object_store: ObjectStore,
    zip_jobs: ZipJobService,
    callback_url: Url,
    retry: RetryConfig,
}

impl DownloadService {
    /// Creates a new download orchestrator.
    pub fn new(
        pg_client: PgClient,
        object_store: ObjectStore,
        zip_jobs: ZipJobService,
        callback_url: Url,
    ) -> Self {
        Self {
            pg_client,
            object_store,
            zip_jobs,
            callback_url,
            retry: RetryConfig::default(),
        }
    }

    /// Requests an archive of a retreat for the given account.
    ///
    /// Resolution order: the caller's own usable request, then reuse of a
    /// shared ready archive, then attachment to an in-flight generation, and
    /// only then a fresh generation job.
    pub async fn request_download(
        &self,
        account_id: Uuid,
        retreat_id: Uuid,
    ) -> Result<RequestOutcome> {
        let now = jiff::Timestamp::now();
        let mut conn = self.pg_client.get_connection().await?;

        let retreat = conn.find_retreat(retreat_id).await?.ok_or_else(|| {
            ErrorKind::NotFound
                .with_message("Retreat does not exist")
                .with_resource("retreat")
        })?;

        if !conn.can_access_retreat(account_id, retreat_id).await? {
            return Err(ErrorKind::Forbidden
                .with_message("You did not participate in this retreat")
                .with_resource("retreat"));
        }

        if let Some(existing) = conn.find_account_request(account_id, retreat_id, now).await? {
            tracing::debug!(
                target: TRACING_TARGET,
                request_id = %existing.id,
                retreat_id = %retreat_id,
                status = %existing.status,
                "Caller already holds a usable request"
            );
            return Ok(RequestOutcome {
                request: existing,
                disposition: RequestDisposition::Existing,
            });
        }

        if let Some(outcome) = self
            .try_fast_path(&mut conn, account_id, &retreat, now)
            .await?
        {
            return Ok(outcome);
        }

        let swept = conn
            .sweep_stuck_for_retreat(retreat_id, lifecycle::stuck_cutoff(now))
            .await?;
        if swept > 0 {
            tracing::warn!(
                target: TRACING_TARGET,
                retreat_id = %retreat_id,
                swept,
                "Failed abandoned jobs before claiming a new generation"
            );
        }
        drop(conn);

        let (request, is_new_primary) = self.claim_generation(account_id, retreat_id).await?;
        if !is_new_primary {
            tracing::info!(
                target: TRACING_TARGET,
                request_id = %request.id,
                primary_request_id = ?request.primary_request_id,
                retreat_id = %retreat_id,
                "Attached to an in-flight generation"
            );
            return Ok(RequestOutcome {
                request,
                disposition: RequestDisposition::Follower,
            });
        }

        let request = self.start_generation(request, &retreat).await?;
        Ok(RequestOutcome {
            request,
            disposition: RequestDisposition::Generating,
        })
    }

    /// Loads a request for its owner, for the status endpoint.
    pub async fn status(&self, account_id: Uuid, request_id: Uuid) -> Result<DownloadRequest> {
        let mut conn = self.pg_client.get_connection().await?;
        self.load_owned(&mut conn, account_id, request_id).await
    }

    /// Validates a ready archive and issues a delivery URL for it.
    ///
    /// A vanished backing object expires the record and starts a replacement
    /// generation instead of failing the caller.
    pub async fn deliver(&self, account_id: Uuid, request_id: Uuid) -> Result<DeliveryOutcome> {
        let now = jiff::Timestamp::now();
        let mut conn = self.pg_client.get_connection().await?;
        let request = self.load_owned(&mut conn, account_id, request_id).await?;

        if !request.is_ready() {
            return Err(ErrorKind::Conflict
                .with_message(format!(
                    "Archive is not ready, current status is {}",
                    request.status
                ))
                .with_resource("download_request"));
        }

        if request.is_expired_at(now) {
            conn.mark_expired(request.id).await?;
            return Err(ErrorKind::Gone
                .with_message("Archive expired and is no longer available")
                .with_resource("archive"));
        }

        let Some(object_key) = request.object_key.clone() else {
            tracing::error!(
                target: TRACING_TARGET,
                request_id = %request.id,
                "Ready record has no object key"
            );
            return Err(ErrorKind::InternalServerError.into_error());
        };

        let probe = self.object_store.probe(&object_key).await?;
        if !probe.exists {
            tracing::warn!(
                target: TRACING_TARGET,
                request_id = %request.id,
                object_key = %object_key,
                "Archive vanished from storage, starting a replacement generation"
            );

            let request = conn.mark_expired(request.id).await?.unwrap_or(request);
            drop(conn);

            let replacement = self.recover(account_id, request.retreat_id).await?;
            return Ok(DeliveryOutcome::Regenerating {
                request,
                replacement,
            });
        }

        let request = conn.record_download(request.id).await?;
        let request = match lifecycle::popularity_floor(request.download_count, now) {
            Some(floor) => conn
                .extend_expiry(request.id, lifecycle::clamp_to_cap(floor, now))
                .await?
                .unwrap_or(request),
            None => request,
        };

        match self
            .object_store
            .presign_read(&object_key, lifecycle::PRESIGN_TTL)
            .await
        {
            Ok(presigned) => Ok(DeliveryOutcome::Delivered {
                request,
                url: presigned.url,
                url_ttl: Some(presigned.expires_in),
            }),
            Err(StorageError::Unsupported(_)) => {
                let Some(url) = request.download_url.clone() else {
                    tracing::error!(
                        target: TRACING_TARGET,
                        request_id = %request.id,
                        "No stored download URL to fall back to"
                    );
                    return Err(ErrorKind::InternalServerError.into_error());
                };
                Ok(DeliveryOutcome::Delivered {
                    request,
                    url,
                    url_ttl: None,
                })
            }
            Err(error) => Err(Error::from(error)),
        }
    }

    /// Extends the expiry of a ready archive by the requested number of days.
    ///
    /// Returns the record and whether the expiry actually moved; asking for
    /// less lifetime than the record already has is a no-op, not an error.
    pub async fn extend_lifecycle(
        &self,
        account_id: Uuid,
        request_id: Uuid,
        days: i64,
    ) -> Result<(DownloadRequest, bool)> {
        let now = jiff::Timestamp::now();
        let mut conn = self.pg_client.get_connection().await?;
        let request = self.load_owned(&mut conn, account_id, request_id).await?;

        if !request.is_ready() {
            return Err(ErrorKind::Conflict
                .with_message(format!(
                    "Only ready archives can be extended, current status is {}",
                    request.status
                ))
                .with_resource("download_request"));
        }

        if request.is_expired_at(now) {
            conn.mark_expired(request.id).await?;
            return Err(ErrorKind::Gone
                .with_message("Archive expired and is no longer available")
                .with_resource("archive"));
        }

        let target = lifecycle::manual_floor(days, now);
        match conn.extend_expiry(request.id, target).await? {
            Some(extended) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    request_id = %extended.id,
                    days,
                    "Archive lifecycle extended"
                );
                Ok((extended, true))
            }
            None => Ok((request, false)),
        }
    }

    /// Loads a request and enforces ownership. Owner mismatch reads as
    /// absence.
    async fn load_owned(
        &self,
        conn: &mut PgConn,
        account_id: Uuid,
        request_id: Uuid,
    ) -> Result<DownloadRequest> {
        let request = conn
            .find_download_request(request_id)
            .await?
            .filter(|request| request.account_id == account_id)
            .ok_or_else(|| {
                ErrorKind::NotFound
                    .with_message("Download request does not exist")
                    .with_resource("download_request")
            })?;

        Ok(request)
    }

    /// Reuses a live shared archive for the caller, when one exists.
    ///
    /// A vanished backing object expires the stale record and returns `None`
    /// so the caller falls through to a fresh generation.
    async fn try_fast_path(
        &self,
        conn: &mut PgConn,
        account_id: Uuid,
        retreat: &Retreat,
        now: jiff::Timestamp,
    ) -> Result<Option<RequestOutcome>> {
        let Some(artifact) = conn.find_active_artifact(retreat.id, now).await? else {
            return Ok(None);
        };
        let Some(object_key) = artifact.object_key.clone() else {
            return Ok(None);
        };

        let probe = self.object_store.probe(&object_key).await?;
        if !probe.exists {
            tracing::warn!(
                target: TRACING_TARGET,
                request_id = %artifact.id,
                object_key = %object_key,
                "Shared archive vanished from storage, expiring the stale record"
            );
            conn.mark_expired(artifact.id).await?;
            return Ok(None);
        }

        let source = conn
            .extend_expiry(artifact.id, lifecycle::fast_path_floor(now))
            .await?
            .unwrap_or(artifact);

        let request = conn
            .create_download_request(NewDownloadRequest {
                retreat_id: retreat.id,
                account_id,
                status: Some(DownloadStatus::Ready),
                is_shared: Some(true),
                object_key: source.object_key.clone(),
                download_url: source.download_url.clone(),
                file_size: source.file_size,
                expires_at: source.expires_at,
                ..Default::default()
            })
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            request_id = %request.id,
            retreat_id = %retreat.id,
            source_request_id = %source.id,
            "Reused a shared archive"
        );

        Ok(Some(RequestOutcome {
            request,
            disposition: RequestDisposition::FastPath,
        }))
    }

    /// Claims the retreat's generation slot, or attaches as a follower.
    ///
    /// The in-flight primary lookup locks the row, so the claim runs in a
    /// transaction. Losing the insert race on the in-flight uniqueness index
    /// retries the whole claim and lands on the follower branch.
    async fn claim_generation(
        &self,
        account_id: Uuid,
        retreat_id: Uuid,
    ) -> Result<(DownloadRequest, bool)> {
        let claim = self
            .retry
            .retry_if(
                || {
                    let pg_client = self.pg_client.clone();
                    async move {
                        let mut conn = pg_client.get_connection().await?;
                        conn.transaction(|conn| {
                            async move {
                                if let Some(primary) =
                                    conn.find_in_flight_primary(retreat_id).await?
                                {
                                    let follower = conn
                                        .create_download_request(NewDownloadRequest {
                                            retreat_id,
                                            account_id,
                                            status: Some(DownloadStatus::Processing),
                                            is_shared: Some(true),
                                            primary_request_id: Some(primary.id),
                                            ..Default::default()
                                        })
                                        .await?;
                                    return Ok((follower, false));
                                }

                                let primary = conn
                                    .create_download_request(NewDownloadRequest {
                                        retreat_id,
                                        account_id,
                                        status: Some(DownloadStatus::Pending),
                                        is_shared: Some(false),
                                        ..Default::default()
                                    })
                                    .await?;

                                Ok::<_, PgError>((primary, true))
                            }
                            .scope_boxed()
                        })
                        .await
                    }
                },
                |error| error.is_transient() || error.is_primary_in_flight_conflict(),
            )
            .await?;

        Ok(claim)
    }

    /// Submits the generation job for a freshly claimed primary.
    async fn start_generation(
        &self,
        request: DownloadRequest,
        retreat: &Retreat,
    ) -> Result<DownloadRequest> {
        let mut conn = self.pg_client.get_connection().await?;

        let tracks = conn.list_tracks(retreat.id).await?;
        let source_keys: Vec<String> = tracks.into_iter().map(|track| track.audio_key).collect();

        if source_keys.is_empty() {
            tracing::warn!(
                target: TRACING_TARGET,
                request_id = %request.id,
                retreat_id = %retreat.id,
                "Retreat has no recordings, failing the request"
            );
            conn.mark_failed(request.id, EMPTY_CATALOG_MESSAGE).await?;
            return Err(ErrorKind::UnprocessableEntity
                .with_message(EMPTY_CATALOG_MESSAGE)
                .with_resource("retreat"));
        }

        let job = ZipJobRequest::new(
            request.id,
            retreat.id,
            retreat.display_name.clone(),
            source_keys,
            self.callback_url.clone(),
        );

        match self.zip_jobs.submit(&job).await {
            Ok(submission) => {
                let processing = conn
                    .mark_processing(request.id, submission.job_id.as_deref(), None)
                    .await?;

                // A callback can land before the transition; serve the record
                // the webhook left behind in that case.
                let current = match processing {
                    Some(request) => request,
                    None => conn
                        .find_download_request(request.id)
                        .await?
                        .unwrap_or(request),
                };
                Ok(current)
            }
            Err(error) => {
                conn.mark_failed(request.id, SUBMISSION_FAILED_MESSAGE).await?;
                Err(Error::from(error))
            }
        }
    }

    /// Starts a replacement generation after a delivered archive vanished.
    async fn recover(&self, account_id: Uuid, retreat_id: Uuid) -> Result<DownloadRequest> {
        let mut conn = self.pg_client.get_connection().await?;
        let retreat = conn.find_retreat(retreat_id).await?.ok_or_else(|| {
            ErrorKind::NotFound
                .with_message("Retreat does not exist")
                .with_resource("retreat")
        })?;
        drop(conn);

        let (request, is_new_primary) = self.claim_generation(account_id, retreat_id).await?;
        if !is_new_primary {
            return Ok(request);
        }

        self.start_generation(request, &retreat).await
    }
}
