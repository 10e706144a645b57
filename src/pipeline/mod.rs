// Request pipeline module - per-request context carried through the proxy hooks

use std::time::{Duration, Instant};
use tokio::sync::OwnedSemaphorePermit;
use uuid::Uuid;

/// Request context that holds all information about an HTTP request
/// while it is being served
#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    method: String,
    path: String,
    started: Instant,
    status: Option<u16>,
    // Held for the lifetime of the request; dropping it frees the slot
    permit: Option<OwnedSemaphorePermit>,
}

impl RequestContext {
    /// Create a new RequestContext from HTTP request information
    /// Automatically generates a unique request ID (UUID v4) and starts the clock
    pub fn new(method: String, path: String) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            path,
            started: Instant::now(),
            status: None,
            permit: None,
        }
    }

    /// Get the unique request ID
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Get the HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Get the request path as received (still percent-encoded)
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_request_info(&mut self, method: String, path: String) {
        self.method = method;
        self.path = path;
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// Status written to the client, if a response was sent
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn hold_permit(&mut self, permit: OwnedSemaphorePermit) {
        self.permit = Some(permit);
    }

    pub fn has_permit(&self) -> bool {
        self.permit.is_some()
    }
}
