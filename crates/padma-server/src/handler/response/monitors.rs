//! Monitor response types.

use jiff::Timestamp;
use padma_postgres::model;
use padma_postgres::query::DownloadStatistics;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::downloads::DownloadRequestStatus;

/// Overall health of the service.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceHealth {
    /// All checked dependencies responded.
    Healthy,
    /// At least one dependency is unavailable.
    Degraded,
}

impl ServiceHealth {
    /// Returns whether the service is fully operational.
    #[inline]
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Health probe response.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Timestamp when this status was generated.
    pub checked_at: Timestamp,
    /// Overall service health.
    pub status: ServiceHealth,
    /// Application version.
    pub version: String,
}

impl HealthStatus {
    /// Creates a health status with the given overall health.
    pub fn new(status: ServiceHealth) -> Self {
        Self {
            checked_at: Timestamp::now(),
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new(ServiceHealth::Healthy)
    }
}

/// Aggregate download activity for the monitoring endpoint.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadsMonitor {
    /// Timestamp when these figures were collected.
    pub generated_at: Timestamp,
    /// Total number of download requests.
    pub total: i64,
    /// Requests waiting for the worker to accept them.
    pub pending: i64,
    /// Requests with a generation job in progress.
    pub processing: i64,
    /// Requests with a deliverable archive.
    pub ready: i64,
    /// Requests whose generation failed.
    pub failed: i64,
    /// Requests whose archive lapsed.
    pub expired: i64,
    /// Requests with a job still in flight.
    pub in_flight: i64,
    /// Share of requests that failed, as a percentage.
    pub failure_rate: f64,
    /// Most recently created requests.
    pub recent: Vec<DownloadRequestStatus>,
}

impl DownloadsMonitor {
    /// Creates the monitor payload from collected statistics.
    pub fn from_statistics(
        statistics: DownloadStatistics,
        recent: Vec<model::DownloadRequest>,
    ) -> Self {
        Self {
            generated_at: Timestamp::now(),
            total: statistics.total_count,
            pending: statistics.pending_count,
            processing: statistics.processing_count,
            ready: statistics.ready_count,
            failed: statistics.failed_count,
            expired: statistics.expired_count,
            in_flight: statistics.in_flight_count(),
            failure_rate: statistics.failure_rate(),
            recent: DownloadRequestStatus::from_models(recent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_derives_in_flight_and_failure_rate() {
        let statistics = DownloadStatistics {
            total_count: 10,
            pending_count: 1,
            processing_count: 2,
            ready_count: 4,
            failed_count: 2,
            expired_count: 1,
        };

        let monitor = DownloadsMonitor::from_statistics(statistics, Vec::new());
        assert_eq!(monitor.in_flight, 3);
        assert!((monitor.failure_rate - 20.0).abs() < f64::EPSILON);
        assert!(monitor.recent.is_empty());
    }

    #[test]
    fn health_status_serializes_lowercase() {
        let health = HealthStatus::new(ServiceHealth::Degraded);
        let json = serde_json::to_string(&health).unwrap();
        assert!(json.contains("\"degraded\""));
        assert!(json.contains("checkedAt"));
    }
}
