//! Retreat archive download handlers.
//!
//! Covers the full caller-facing lifecycle: requesting an archive, polling
//! its status, fetching the finished file, and extending its retention.
//! All routes resolve the caller from the gateway-injected account header
//! and only ever expose the caller's own requests.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::{Caller, Json, Path, ValidateJson};
use crate::handler::request::{DownloadRequestPathParams, ExtendLifecycle, RetreatPathParams};
use crate::handler::response::{
    DownloadDelivery, DownloadRequestStatus, DownloadRequested, ErrorResponse, LifecycleExtended,
};
use crate::handler::{ErrorKind, Result};
use crate::service::{DeliveryOutcome, DownloadService, RequestDisposition, ServiceState};

/// Tracing target for download request operations.
const TRACING_TARGET: &str = "padma_server::handler::downloads";

/// Requests a downloadable archive of a retreat.
///
/// Reuses the caller's active request or a shared ready archive when one
/// exists, otherwise attaches to the in-flight generation or starts a new
/// job. Requires participation in the retreat.
#[tracing::instrument(
    skip_all,
    fields(
        account_id = %caller.account_id,
        retreat_id = %path_params.retreat_id,
    )
)]
async fn request_download(
    State(downloads): State<DownloadService>,
    caller: Caller,
    Path(path_params): Path<RetreatPathParams>,
) -> Result<(StatusCode, Json<DownloadRequested>)> {
    tracing::debug!(target: TRACING_TARGET, "Requesting retreat archive");

    let outcome = downloads
        .request_download(caller.account_id, path_params.retreat_id)
        .await?;

    let status_code = match outcome.disposition {
        RequestDisposition::Existing | RequestDisposition::FastPath => StatusCode::OK,
        RequestDisposition::Follower | RequestDisposition::Generating => StatusCode::ACCEPTED,
    };

    tracing::info!(
        target: TRACING_TARGET,
        request_id = %outcome.request.id,
        status = %outcome.request.status,
        shared = outcome.request.is_shared,
        "Download request resolved"
    );

    Ok((status_code, Json(DownloadRequested::from_outcome(&outcome))))
}

fn request_download_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Request archive")
        .description(
            "Requests a ZIP archive of all retreat recordings. Reuses an existing \
             request or shared archive when one is available instead of starting \
             a new generation job.",
        )
        .response::<200, Json<DownloadRequested>>()
        .response::<202, Json<DownloadRequested>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<422, Json<ErrorResponse>>()
}

/// Returns the full status of the caller's download request.
///
/// Carries progress fields while processing, delivery fields when ready,
/// and failure detail with the remaining retry budget when failed.
#[tracing::instrument(
    skip_all,
    fields(
        account_id = %caller.account_id,
        request_id = %path_params.request_id,
    )
)]
async fn download_status(
    State(downloads): State<DownloadService>,
    caller: Caller,
    Path(path_params): Path<DownloadRequestPathParams>,
) -> Result<(StatusCode, Json<DownloadRequestStatus>)> {
    tracing::debug!(target: TRACING_TARGET, "Reading download request status");

    let request = downloads
        .status(caller.account_id, path_params.request_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(DownloadRequestStatus::from_model(request)),
    ))
}

fn download_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get request status")
        .description(
            "Returns the full projection of a download request, including worker \
             progress while the archive is being generated.",
        )
        .response::<200, Json<DownloadRequestStatus>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Issues a download URL for a ready archive.
///
/// Validates that the backing object still exists before handing out the
/// link. When the object vanished the record is expired and a replacement
/// generation starts, answered with 202 and the replacement's id.
#[tracing::instrument(
    skip_all,
    fields(
        account_id = %caller.account_id,
        request_id = %path_params.request_id,
    )
)]
async fn download_artifact(
    State(downloads): State<DownloadService>,
    caller: Caller,
    Path(path_params): Path<DownloadRequestPathParams>,
) -> Result<(StatusCode, Json<DownloadDelivery>)> {
    tracing::debug!(target: TRACING_TARGET, "Issuing archive download");

    let outcome = downloads
        .deliver(caller.account_id, path_params.request_id)
        .await?;

    let (status_code, delivery) = match outcome {
        DeliveryOutcome::Delivered {
            request,
            url,
            url_ttl,
        } => {
            tracing::info!(
                target: TRACING_TARGET,
                request_id = %request.id,
                download_count = request.download_count,
                "Archive delivered"
            );
            (
                StatusCode::OK,
                DownloadDelivery::delivered(&request, url, url_ttl),
            )
        }
        DeliveryOutcome::Regenerating {
            request,
            replacement,
        } => {
            tracing::warn!(
                target: TRACING_TARGET,
                request_id = %request.id,
                replacement_id = %replacement.id,
                "Archive vanished, replacement generation started"
            );
            (
                StatusCode::ACCEPTED,
                DownloadDelivery::regenerating(&request, &replacement),
            )
        }
    };

    Ok((status_code, Json(delivery)))
}

fn download_artifact_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Download archive")
        .description(
            "Issues a download URL for a ready archive. Answers 202 with a \
             replacement request id when the backing object vanished and a \
             regeneration was started instead.",
        )
        .response::<200, Json<DownloadDelivery>>()
        .response::<202, Json<DownloadDelivery>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
        .response::<410, Json<ErrorResponse>>()
}

/// Extends the retention of a ready archive.
///
/// The new expiry is `now + days`, clamped to the retention ceiling, and
/// never moves an expiry backwards.
#[tracing::instrument(
    skip_all,
    fields(
        account_id = %caller.account_id,
        request_id = %path_params.request_id,
    )
)]
async fn extend_lifecycle(
    State(downloads): State<DownloadService>,
    caller: Caller,
    Path(path_params): Path<DownloadRequestPathParams>,
    ValidateJson(request): ValidateJson<ExtendLifecycle>,
) -> Result<(StatusCode, Json<LifecycleExtended>)> {
    tracing::debug!(target: TRACING_TARGET, "Extending archive lifecycle");

    let (extended, moved) = downloads
        .extend_lifecycle(caller.account_id, path_params.request_id, request.days)
        .await?;

    let expires_at = extended.expires_at.ok_or_else(|| {
        tracing::error!(
            target: TRACING_TARGET,
            request_id = %extended.id,
            "Ready archive record is missing its expiry"
        );
        ErrorKind::InternalServerError.into_error()
    })?;

    let response = LifecycleExtended {
        request_id: extended.id,
        expires_at: expires_at.into(),
        extended: moved,
    };

    Ok((StatusCode::OK, Json(response)))
}

fn extend_lifecycle_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Extend lifecycle")
        .description(
            "Moves a ready archive's expiry to now plus the requested number of \
             days, capped by the retention ceiling. Expiries never move backwards.",
        )
        .response::<200, Json<LifecycleExtended>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
        .response::<410, Json<ErrorResponse>>()
}

/// Returns routes for retreat archive downloads.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/retreats/{retreatId}/request-download",
            post_with(request_download, request_download_docs),
        )
        .api_route(
            "/download-requests/{requestId}/status",
            get_with(download_status, download_status_docs),
        )
        .api_route(
            "/download-requests/{requestId}/download",
            get_with(download_artifact, download_artifact_docs),
        )
        .api_route(
            "/download-requests/{requestId}/extend-lifecycle",
            post_with(extend_lifecycle, extend_lifecycle_docs),
        )
        .with_path_items(|item| item.tag("Downloads"))
}
