//! System health and download activity monitors.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use padma_postgres::PgClient;
use padma_postgres::query::{DownloadRequestRepository, Pagination};

use crate::extract::{Caller, Json, PgPool};
use crate::handler::Result;
use crate::handler::response::{DownloadsMonitor, ErrorResponse, HealthStatus, ServiceHealth};
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "padma_server::handler::monitors";

/// Number of recent requests included in the downloads monitor.
const RECENT_REQUESTS: i64 = 20;

/// Reports whether the service can reach its database.
///
/// Public and unauthenticated. Answers 503 when the database is
/// unreachable so load balancers can rotate the instance out.
#[tracing::instrument(skip_all)]
async fn health_status(State(pg_client): State<PgClient>) -> (StatusCode, Json<HealthStatus>) {
    let health = match pg_client.get_connection().await {
        Ok(_conn) => ServiceHealth::Healthy,
        Err(error) => {
            tracing::error!(
                target: TRACING_TARGET,
                error = %error,
                "Health probe cannot reach the database"
            );
            ServiceHealth::Degraded
        }
    };

    let status_code = if health.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(HealthStatus::new(health)))
}

fn health_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Health probe")
        .description("Reports service health. Answers 503 when the database is unreachable.")
        .response::<200, Json<HealthStatus>>()
        .response::<503, Json<HealthStatus>>()
}

/// Reports aggregate download activity.
///
/// Figures are service-wide, not scoped to the caller: per-status counts,
/// the failure rate, and the most recently created requests.
#[tracing::instrument(skip_all, fields(account_id = %caller.account_id))]
async fn downloads_monitor(
    PgPool(mut conn): PgPool,
    caller: Caller,
) -> Result<(StatusCode, Json<DownloadsMonitor>)> {
    tracing::debug!(target: TRACING_TARGET, "Collecting download statistics");

    let statistics = conn.collect_download_statistics().await?;
    let recent = conn
        .list_recent_requests(Pagination::new(RECENT_REQUESTS, 0))
        .await?;

    Ok((
        StatusCode::OK,
        Json(DownloadsMonitor::from_statistics(statistics, recent)),
    ))
}

fn downloads_monitor_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Download activity")
        .description(
            "Returns per-status request counts, the failure rate, and the most \
             recently created download requests.",
        )
        .response::<200, Json<DownloadsMonitor>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Returns routes for health and activity monitoring.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/monitors/health", get_with(health_status, health_status_docs))
        .api_route(
            "/monitors/downloads",
            get_with(downloads_monitor, downloads_monitor_docs),
        )
        .with_path_items(|item| item.tag("Monitors"))
}
