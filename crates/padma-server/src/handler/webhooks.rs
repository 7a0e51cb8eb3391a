//! Archive worker callback handler.
//!
//! The external worker reports job progress and outcomes by POSTing to
//! `/download-webhook`. Deliveries are at-least-once, so the handler is
//! idempotent: callbacks against terminal records acknowledge without
//! changing anything, and status transitions are guarded at the database
//! level. Terminal outcomes fan out to follower requests inside the same
//! transaction, so followers never observe a half-applied outcome.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::http::StatusCode;
use padma_postgres::model::DownloadRequest;
use padma_postgres::query::DownloadRequestRepository;
use padma_postgres::scoped_futures::ScopedFutureExt;

use crate::extract::{CallbackGuard, Json, PgPool};
use crate::handler::request::{CallbackStatus, WebhookPayload};
use crate::handler::response::{ErrorResponse, WebhookAck};
use crate::handler::{Error, ErrorKind, Result};
use crate::service::{ServiceState, lifecycle};

/// Tracing target for worker callback operations.
const TRACING_TARGET: &str = "padma_server::handler::webhooks";

/// Applies a worker callback to the addressed download request.
///
/// Unknown request ids answer 404 so the worker can stop retrying a
/// callback that will never apply. Ready callbacks missing any delivery
/// field answer 422 and leave the record untouched.
#[tracing::instrument(
    skip_all,
    fields(
        request_id = %payload.request_id,
        callback_status = ?payload.status,
    )
)]
async fn download_webhook(
    _guard: CallbackGuard,
    PgPool(mut conn): PgPool,
    Json(payload): Json<WebhookPayload>,
) -> Result<(StatusCode, Json<WebhookAck>)> {
    tracing::debug!(target: TRACING_TARGET, "Processing worker callback");

    let request_id = payload.request_id;
    let Some(request) = conn.find_download_request(request_id).await? else {
        tracing::warn!(
            target: TRACING_TARGET,
            "Callback addressed an unknown download request"
        );
        return Err(ErrorKind::NotFound
            .with_message("Download request does not exist")
            .with_resource("download_request"));
    };

    // Duplicate delivery against a finished record: acknowledge as-is so
    // the worker stops retrying.
    if request.is_terminal() {
        tracing::debug!(
            target: TRACING_TARGET,
            status = %request.status,
            "Ignoring callback against a terminal record"
        );
        return Ok((
            StatusCode::OK,
            Json(WebhookAck::unchanged(request.id, request.status)),
        ));
    }

    let ack = match payload.status {
        CallbackStatus::Pending => WebhookAck::unchanged(request.id, request.status),
        CallbackStatus::Processing => {
            let progress = payload.progress_info().map(|progress| progress.to_value());
            let updated = conn
                .mark_processing(request_id, payload.lambda_request_id.as_deref(), progress)
                .await?
                .unwrap_or(request);

            tracing::debug!(
                target: TRACING_TARGET,
                progress_percent = payload.progress_percent,
                "Recorded worker progress"
            );
            WebhookAck::applied(updated.id, updated.status, 0)
        }
        CallbackStatus::Ready => {
            let expires_at = lifecycle::initial_expiry(jiff::Timestamp::now());
            let Some(outcome) = payload.ready_outcome(expires_at) else {
                tracing::warn!(
                    target: TRACING_TARGET,
                    "Rejecting ready callback with missing delivery fields"
                );
                return Err(ErrorKind::UnprocessableEntity
                    .with_message("Ready callback is missing delivery fields")
                    .with_context("s3_key, download_url and file_size are required")
                    .with_resource("download_request"));
            };

            let (updated, followers) = conn
                .transaction(|conn| {
                    async move {
                        let Some(updated) = conn.mark_ready(request_id, outcome).await? else {
                            return Ok::<_, Error<'static>>((None, 0));
                        };
                        let followers = fan_out(conn, &updated).await?;
                        Ok((Some(updated), followers))
                    }
                    .scope_boxed()
                })
                .await?;

            match updated {
                Some(updated) => {
                    tracing::info!(
                        target: TRACING_TARGET,
                        file_size = updated.file_size,
                        followers_updated = followers,
                        "Archive generation completed"
                    );
                    WebhookAck::applied(updated.id, updated.status, followers)
                }
                None => refreshed_ack(&mut conn, request).await?,
            }
        }
        CallbackStatus::Failed => {
            let message = payload.failure_message().to_owned();
            let (updated, followers) = conn
                .transaction(|conn| {
                    async move {
                        let Some(updated) = conn.mark_failed(request_id, &message).await? else {
                            return Ok::<_, Error<'static>>((None, 0));
                        };
                        let followers = fan_out(conn, &updated).await?;
                        Ok((Some(updated), followers))
                    }
                    .scope_boxed()
                })
                .await?;

            match updated {
                Some(updated) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        error_message = updated.error_message.as_deref(),
                        followers_updated = followers,
                        "Archive generation failed"
                    );
                    WebhookAck::applied(updated.id, updated.status, followers)
                }
                None => refreshed_ack(&mut conn, request).await?,
            }
        }
    };

    Ok((StatusCode::OK, Json(ack)))
}

/// Copies a primary's terminal outcome to its in-flight followers.
///
/// Follower records carry no job of their own, so a callback addressed at
/// a follower updates only that follower.
async fn fan_out(
    conn: &mut padma_postgres::PooledConnection,
    updated: &DownloadRequest,
) -> Result<usize> {
    if !updated.is_primary() {
        return Ok(0);
    }

    let followers = conn.propagate_outcome_to_followers(updated).await?;
    Ok(followers.len())
}

/// Re-reads the record after a guarded update matched nothing.
///
/// Happens when another delivery of the same callback won the race; the
/// record is terminal by now and the duplicate is acknowledged unchanged.
async fn refreshed_ack(
    conn: &mut padma_postgres::PgConn,
    request: DownloadRequest,
) -> Result<WebhookAck> {
    let current = conn
        .find_download_request(request.id)
        .await?
        .unwrap_or(request);

    tracing::debug!(
        target: TRACING_TARGET,
        status = %current.status,
        "Callback lost the transition race, acknowledging current state"
    );
    Ok(WebhookAck::unchanged(current.id, current.status))
}

fn download_webhook_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Worker callback")
        .description(
            "Receives progress and outcome callbacks from the external archive \
             worker. Terminal outcomes fan out to follower requests. Safe to \
             retry: duplicate deliveries acknowledge without changes.",
        )
        .response::<200, Json<WebhookAck>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<422, Json<ErrorResponse>>()
}

/// Returns routes for worker callbacks.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/download-webhook",
            post_with(download_webhook, download_webhook_docs),
        )
        .with_path_items(|item| item.tag("Webhooks"))
}
