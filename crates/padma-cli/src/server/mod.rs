//! HTTP server startup with comprehensive lifecycle management.
//!
//! This module provides a clean API for starting the HTTP server with
//! graceful shutdown, startup logging, and recovery suggestions for
//! common bind failures.

mod http_server;
mod lifecycle;
mod shutdown;

use std::io;

use axum::Router;
use http_server::serve_http;

use crate::config::ServerConfig;

/// Starts the HTTP server and runs it until a shutdown signal arrives.
///
/// # Arguments
///
/// * `app` - The Axum router to serve
/// * `config` - Server configuration with binding and timeout settings
///
/// # Errors
///
/// Returns an error if:
/// - Cannot bind to the specified address/port
/// - Server encounters a fatal error during operation
pub async fn serve(app: Router, config: ServerConfig) -> io::Result<()> {
    serve_http(app, config).await
}
