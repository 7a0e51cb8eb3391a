//! Retreat teardown and artifact removal.
//!
//! Deletion is an explicit cascade: database rows go first, inside one
//! transaction and in dependency order, then the backing objects best-effort.
//! A failed object delete is reported in the summary and never aborts the
//! rest of the cascade.

use std::collections::BTreeSet;

use padma_opendal::ObjectStore;
use padma_postgres::model::{DownloadRequest, Track};
use padma_postgres::query::{
    DownloadRequestRepository, RetreatParticipantRepository, RetreatRepository, TrackRepository,
};
use padma_postgres::scoped_futures::ScopedFutureExt;
use padma_postgres::{PgClient, PgError};
use uuid::Uuid;

use crate::Result;

const TRACING_TARGET: &str = "padma_server::cleanup";

/// One backing object that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    /// Key of the object left behind.
    pub object_key: String,
    /// Why the deletion failed.
    pub reason: String,
}

/// Summary of a retreat teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// The retreat that was torn down.
    pub retreat_id: Uuid,
    /// Download request rows removed.
    pub requests_deleted: u64,
    /// Track rows removed.
    pub tracks_deleted: u64,
    /// Participant rows removed.
    pub participants_deleted: u64,
    /// Backing objects removed from storage.
    pub objects_deleted: u64,
    /// Objects that could not be removed.
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Returns whether every backing object was removed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Collects the distinct object keys a retreat's rows point at.
fn collect_object_keys(tracks: &[Track], requests: &[DownloadRequest]) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();

    for track in tracks {
        keys.insert(track.audio_key.clone());
    }
    for request in requests {
        if let Some(key) = &request.object_key {
            keys.insert(key.clone());
        }
    }

    keys
}

/// Tears down retreats and removes archive artifacts.
#[derive(Debug, Clone)]
pub struct CleanupService {
    pg_client: PgClient,
    object_store: ObjectStore,
}

impl CleanupService {
    /// Creates a new cleanup coordinator.
    pub fn new(pg_client: PgClient, object_store: ObjectStore) -> Self {
        Self {
            pg_client,
            object_store,
        }
    }

    /// Deletes a retreat with all of its rows and backing objects.
    ///
    /// Rows are removed in one transaction; object deletion runs after the
    /// commit and collects failures instead of aborting.
    pub async fn delete_retreat(&self, retreat_id: Uuid) -> Result<CleanupReport> {
        let mut conn = self.pg_client.get_connection().await?;

        // Snapshot the keys before the rows disappear.
        let tracks = conn.list_tracks(retreat_id).await?;
        let requests = conn.list_retreat_requests(retreat_id).await?;
        let object_keys = collect_object_keys(&tracks, &requests);

        let (requests_deleted, participants_deleted, tracks_deleted) = conn
            .transaction(|conn| {
                async move {
                    let requests = conn.delete_requests_for_retreat(retreat_id).await?;
                    let participants = conn.delete_participants_for_retreat(retreat_id).await?;
                    let tracks = conn.delete_tracks_for_retreat(retreat_id).await?;
                    RetreatRepository::delete_retreat(&mut **conn, retreat_id).await?;

                    Ok::<_, PgError>((requests, participants, tracks))
                }
                .scope_boxed()
            })
            .await?;

        let mut objects_deleted = 0;
        let mut failures = Vec::new();
        for key in &object_keys {
            match self.object_store.delete(key).await {
                Ok(()) => objects_deleted += 1,
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        retreat_id = %retreat_id,
                        object_key = %key,
                        error = %error,
                        "Failed to delete backing object"
                    );
                    failures.push(CleanupFailure {
                        object_key: key.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        let report = CleanupReport {
            retreat_id,
            requests_deleted,
            tracks_deleted,
            participants_deleted,
            objects_deleted,
            failures,
        };

        tracing::info!(
            target: TRACING_TARGET,
            retreat_id = %retreat_id,
            requests_deleted = report.requests_deleted,
            tracks_deleted = report.tracks_deleted,
            participants_deleted = report.participants_deleted,
            objects_deleted = report.objects_deleted,
            failed_objects = report.failures.len(),
            "Retreat cleanup finished"
        );

        Ok(report)
    }

    /// Deletes a request's backing object unless other live records share it.
    ///
    /// Returns whether the object was actually removed.
    pub async fn delete_request_artifact(&self, request: &DownloadRequest) -> Result<bool> {
        let Some(object_key) = request.object_key.as_deref() else {
            return Ok(false);
        };

        let mut conn = self.pg_client.get_connection().await?;
        let live = conn
            .count_live_object_references(object_key, request.id)
            .await?;
        if live > 0 {
            tracing::debug!(
                target: TRACING_TARGET,
                request_id = %request.id,
                object_key = %object_key,
                live,
                "Keeping shared object, other live records still reference it"
            );
            return Ok(false);
        }

        self.object_store.delete(object_key).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use padma_postgres::types::DownloadStatus;

    use super::*;

    fn track(audio_key: &str) -> Track {
        Track {
            id: Uuid::new_v4(),
            retreat_id: Uuid::new_v4(),
            title: "Morning session".to_owned(),
            track_number: 1,
            audio_key: audio_key.to_owned(),
            file_size: None,
            created_at: jiff::Timestamp::now().into(),
        }
    }

    fn request(object_key: Option<&str>) -> DownloadRequest {
        let now = jiff::Timestamp::now();
        DownloadRequest {
            id: Uuid::new_v4(),
            retreat_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            status: DownloadStatus::Ready,
            is_shared: false,
            primary_request_id: None,
            object_key: object_key.map(str::to_owned),
            download_url: None,
            file_size: None,
            error_message: None,
            external_job_id: None,
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
    fn object_keys_are_deduplicated() {
        let tracks = vec![track("audio/one.mp3"), track("audio/two.mp3")];
        let requests = vec![
            request(Some("archives/shared.zip")),
            request(Some("archives/shared.zip")),
            request(None),
        ];

        let keys = collect_object_keys(&tracks, &requests);
        assert_eq!(keys.len(), 3);
        assert!(keys.contains("archives/shared.zip"));
        assert!(keys.contains("audio/one.mp3"));
    }

    #[test]
    fn report_is_clean_without_failures() {
        let report = CleanupReport {
            retreat_id: Uuid::new_v4(),
            requests_deleted: 2,
            tracks_deleted: 5,
            participants_deleted: 3,
            objects_deleted: 6,
            failures: Vec::new(),
        };
        assert!(report.is_clean());

        let mut dirty = report.clone();
        dirty.failures.push(CleanupFailure {
            object_key: "archives/stuck.zip".to_owned(),
            reason: "permission denied".to_owned(),
        });
        assert!(!dirty.is_clean());
    }
}
