//! Extension traits for `axum::Router` to easily apply middleware layers.

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::middleware::error_handling::{catch_panic, handle_error};
use crate::middleware::observability::{
    create_propagate_request_id_layer, create_request_id_layer, create_sensitive_headers_layer,
    create_trace_layer,
};

/// Extension trait for `axum::`[`Router`] for layering middleware.
///
/// This trait provides convenient methods to add common middleware stacks
/// to your Axum router in a composable way.
pub trait RouterExt<S> {
    /// Layers [`HandleError`], [`CatchPanic`] and [`Timeout`] middlewares.
    ///
    /// This middleware stack handles various error conditions:
    /// - Request timeouts
    /// - Panics in handlers
    /// - Tower service errors
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum duration to wait for a request to complete
    ///
    /// [`HandleError`]: axum::error_handling::HandleErrorLayer
    /// [`CatchPanic`]: tower_http::catch_panic::CatchPanicLayer
    /// [`Timeout`]: tower::timeout::TimeoutLayer
    fn with_error_handling_layer(self, timeout: Duration) -> Self;

    /// Layers [`SetRequestId`], [`Trace`] and [`PropagateRequestId`] middlewares.
    ///
    /// This middleware stack provides observability features:
    /// - Generates unique request IDs
    /// - Adds structured logging for requests
    /// - Propagates request IDs through the request lifecycle
    /// - Marks sensitive headers for redaction
    ///
    /// [`SetRequestId`]: tower_http::request_id::SetRequestIdLayer
    /// [`Trace`]: tower_http::trace::TraceLayer
    /// [`PropagateRequestId`]: tower_http::request_id::PropagateRequestIdLayer
    fn with_observability_layer(self) -> Self;

    /// Layers [`RequestBodyLimit`] and [`Compression`] middlewares.
    ///
    /// Requests with bodies larger than `max_body_size` bytes are rejected
    /// with `413 Payload Too Large` before reaching any handler.
    ///
    /// # Arguments
    ///
    /// * `max_body_size` - Maximum accepted request body size in bytes
    ///
    /// [`RequestBodyLimit`]: tower_http::limit::RequestBodyLimitLayer
    /// [`Compression`]: tower_http::compression::CompressionLayer
    fn with_limits_layer(self, max_body_size: usize) -> Self;
}

impl<S> RouterExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_error_handling_layer(self, timeout: Duration) -> Self {
        let middlewares = ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_error))
            .layer(CatchPanicLayer::custom(catch_panic))
            .layer(TimeoutLayer::new(timeout));

        self.layer(middlewares)
    }

    fn with_observability_layer(self) -> Self {
        // Apply layers in reverse order (last layer wraps first)
        self.layer(create_propagate_request_id_layer())
            .layer(create_sensitive_headers_layer())
            .layer(create_trace_layer())
            .layer(create_request_id_layer())
    }

    fn with_limits_layer(self, max_body_size: usize) -> Self {
        self.layer(RequestBodyLimitLayer::new(max_body_size))
            .layer(CompressionLayer::new())
    }
}
