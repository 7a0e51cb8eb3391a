#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use padma_server::handler::routes;
use padma_server::middleware::{RouterExt, RouterOpenApiExt};
use padma_server::service::ServiceState;
use padma_server::worker::DownloadSweeper;
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "padma_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "padma_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "padma_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    log_startup_info();

    cli.validate().context("invalid configuration")?;
    cli.log();

    let state = ServiceState::from_config(&cli.service)
        .await
        .context("failed to initialize services")?;

    let cancel = CancellationToken::new();
    let sweeper_task = spawn_sweeper(&state, &cli, cancel.clone());

    let router = create_router(state, &cli);
    let result = server::serve(router, cli.server).await;

    // Stop the sweeper once the listener has drained
    cancel.cancel();
    match sweeper_task.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::warn!(
                target: TRACING_TARGET_SHUTDOWN,
                error = %err,
                "Sweeper exited with error"
            );
        }
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET_SHUTDOWN,
                error = %err,
                "Sweeper task aborted abnormally"
            );
        }
    }

    result.context("server terminated with error")
}

/// Spawns the background lifecycle sweeper.
fn spawn_sweeper(
    state: &ServiceState,
    cli: &Cli,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<padma_server::Result<()>> {
    let sweeper = DownloadSweeper::new(
        state.postgres.clone(),
        state.cleanup.clone(),
        cli.service.sweep_interval(),
    );

    tokio::spawn(async move { sweeper.run(cancel).await })
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Error handling (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. Limits - body size cap and response compression
/// 4. Routes (innermost) - actual request handlers
fn create_router(state: ServiceState, cli: &Cli) -> Router {
    let api_routes: Router = routes()
        .with_open_api(cli.openapi.clone())
        .with_state(state);

    api_routes
        .with_limits_layer(cli.server.max_body_size)
        .with_observability_layer()
        .with_error_handling_layer(cli.server.request_timeout())
}

/// Logs startup information.
fn log_startup_info() {
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting padmakara archive server"
    );
}
