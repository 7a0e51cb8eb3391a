//! HTTP server startup and lifecycle management.

use std::io;

use axum::Router;
use tokio::net::TcpListener;

use crate::TRACING_TARGET_STARTUP;
use crate::config::ServerConfig;
use crate::server::lifecycle::{error_suggestion, serve_with_shutdown};
use crate::server::shutdown::shutdown_signal;

/// Starts an HTTP server with graceful shutdown.
///
/// Binds to the configured address and serves requests until a shutdown
/// signal arrives, then drains in-flight requests.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server encounters
/// a fatal error during operation.
pub(crate) async fn serve_http(app: Router, server_config: ServerConfig) -> io::Result<()> {
    let server_addr = server_config.server_addr();

    let listener = match TcpListener::bind(server_addr).await {
        Ok(listener) => {
            tracing::info!(
                target: TRACING_TARGET_STARTUP,
                addr = %server_addr,
                "Server is ready and listening for connections"
            );

            listener
        }
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET_STARTUP,
                addr = %server_addr,
                error = %err,
                "Failed to bind to address"
            );

            if let Some(suggestion) = error_suggestion(&err) {
                tracing::info!(
                    target: TRACING_TARGET_STARTUP,
                    suggestion = suggestion,
                    "Recovery suggestion"
                );
            }

            return Err(err);
        }
    };

    let shutdown = shutdown_signal(server_config.shutdown_timeout());
    serve_with_shutdown(&server_config, || async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    })
    .await
}
