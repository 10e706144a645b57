//! Special endpoint handlers for the proxy.
//!
//! This module provides response generators for built-in endpoints:
//! - `/health` - Health check endpoint
//! - `/metrics` - Prometheus metrics export
//!
//! plus the canned 405 and 503 bodies.
//!
//! Functions return `EndpointResponse` instead of writing directly to the
//! session, which keeps response generation testable.

use std::time::Instant;

use crate::constants::OVERLOAD_RETRY_AFTER_SECS;

/// Response from a special endpoint handler.
#[derive(Debug, Clone)]
pub struct EndpointResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: &'static str,
    /// Response body
    pub body: String,
}

impl EndpointResponse {
    /// Create a JSON response with the given status and body.
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    /// Create a plain text response (for Prometheus metrics).
    pub fn prometheus(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/plain; version=0.0.4",
            body,
        }
    }
}

/// Liveness plus how many image requests could start right now.
pub fn handle_health(started: Instant, available_permits: usize) -> EndpointResponse {
    EndpointResponse::json(
        200,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": started.elapsed().as_secs(),
            "available_permits": available_permits
        })
        .to_string(),
    )
}

/// Generate response for /metrics endpoint.
pub fn handle_metrics() -> EndpointResponse {
    EndpointResponse::prometheus(crate::metrics::export_prometheus())
}

/// 503 sent when `server.max_concurrent_requests` is reached.
pub fn handle_overloaded() -> EndpointResponse {
    let body = serde_json::json!({
        "error": "Service Temporarily Unavailable",
        "message": format!(
            "Server has reached maximum concurrent request limit. Please retry after {} seconds.",
            OVERLOAD_RETRY_AFTER_SECS
        ),
        "status": 503
    })
    .to_string();

    EndpointResponse::json(503, body)
}

/// 405 for anything but GET and HEAD.
pub fn handle_method_not_allowed(method: &str) -> EndpointResponse {
    let body = serde_json::json!({
        "error": "Method Not Allowed",
        "message": format!("{} is not supported, use GET or HEAD", method),
        "status": 405
    })
    .to_string();

    EndpointResponse::json(405, body)
}
