//! Background lifecycle sweeper.
//!
//! Periodically fails generation jobs that never received a worker callback
//! and expires archives whose retention window has passed, removing their
//! backing objects once nothing references them.

use std::time::Duration;

use padma_postgres::PgClient;
use padma_postgres::query::DownloadRequestRepository;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::service::{CleanupService, lifecycle};

/// Tracing target for sweeper operations.
const TRACING_TARGET: &str = "padma_server::worker::sweeper";

/// What a single sweep cycle accomplished.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// In-flight requests failed for never receiving a callback.
    pub stuck_failed: usize,
    /// Ready requests moved to expired.
    pub expired: usize,
    /// Backing objects removed from storage.
    pub objects_removed: usize,
}

impl SweepStats {
    /// Returns `true` when the cycle changed nothing.
    pub fn is_idle(&self) -> bool {
        self.stuck_failed == 0 && self.expired == 0 && self.objects_removed == 0
    }
}

/// Periodic lifecycle sweeper.
///
/// Each cycle fails abandoned in-flight jobs, then expires up to
/// [`lifecycle::SWEEP_BATCH_SIZE`] overdue archives. The first cycle runs
/// as soon as the sweeper starts, which catches records that went overdue
/// while the server was down.
#[derive(Debug, Clone)]
pub struct DownloadSweeper {
    pg_client: PgClient,
    cleanup: CleanupService,
    interval: Duration,
}

impl DownloadSweeper {
    /// Creates a new sweeper ticking at `interval`.
    pub fn new(pg_client: PgClient, cleanup: CleanupService, interval: Duration) -> Self {
        Self {
            pg_client,
            cleanup,
            interval,
        }
    }

    /// Run the sweeper until cancelled.
    ///
    /// Cycle failures are logged and the loop keeps ticking. Logs lifecycle
    /// events (start, stop, errors) internally.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET,
            interval_secs = self.interval.as_secs(),
            "Starting lifecycle sweeper"
        );

        let result = self.run_inner(cancel).await;

        match &result {
            Ok(()) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    "Lifecycle sweeper stopped"
                );
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "Lifecycle sweeper failed"
                );
            }
        }

        result
    }

    /// Internal run loop.
    async fn run_inner(&self, cancel: CancellationToken) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(
                        target: TRACING_TARGET,
                        "Sweeper shutdown requested"
                    );
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(stats) if stats.is_idle() => {
                            tracing::debug!(
                                target: TRACING_TARGET,
                                "Sweep cycle found nothing to do"
                            );
                        }
                        Ok(stats) => {
                            tracing::info!(
                                target: TRACING_TARGET,
                                stuck_failed = stats.stuck_failed,
                                expired = stats.expired,
                                objects_removed = stats.objects_removed,
                                "Sweep cycle finished"
                            );
                        }
                        Err(err) => {
                            tracing::error!(
                                target: TRACING_TARGET,
                                error = %err,
                                "Sweep cycle failed"
                            );
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Runs one sweep cycle and reports what it changed.
    ///
    /// Also usable on its own for a one-off catch-up sweep.
    pub async fn run_cycle(&self) -> Result<SweepStats> {
        let now = jiff::Timestamp::now();
        let mut conn = self.pg_client.get_connection().await?;
        let mut stats = SweepStats::default();

        let stuck = conn
            .sweep_stuck_requests(lifecycle::stuck_cutoff(now))
            .await?;
        stats.stuck_failed = stuck.len();
        for request in &stuck {
            tracing::warn!(
                target: TRACING_TARGET,
                request_id = %request.id,
                retreat_id = %request.retreat_id,
                "Failed an abandoned generation job"
            );
        }

        let candidates = conn
            .list_expired_candidates(now, lifecycle::SWEEP_BATCH_SIZE)
            .await?;
        for request in candidates {
            // The record stays ready until after the object delete, so the
            // reference count inside the delete still sees concurrent sharers.
            match self.cleanup.delete_request_artifact(&request).await {
                Ok(true) => stats.objects_removed += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        request_id = %request.id,
                        error = %err,
                        "Leaving a backing object behind, expiring the record anyway"
                    );
                }
            }

            if conn.mark_expired(request.id).await?.is_some() {
                stats.expired += 1;
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %request.id,
                    retreat_id = %request.retreat_id,
                    "Expired an archive past its retention window"
                );
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stats_are_idle() {
        assert!(SweepStats::default().is_idle());
    }

    #[test]
    fn any_change_makes_stats_busy() {
        let stuck = SweepStats {
            stuck_failed: 1,
            ..SweepStats::default()
        };
        let expired = SweepStats {
            expired: 2,
            ..SweepStats::default()
        };
        let removed = SweepStats {
            objects_removed: 3,
            ..SweepStats::default()
        };

        assert!(!stuck.is_idle());
        assert!(!expired.is_idle());
        assert!(!removed.is_idle());
    }
}
