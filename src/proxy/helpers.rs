//! Proxy utility functions.
//!
//! - Routing of an inbound request to a built-in endpoint or the dispatcher
//! - Request path decoding
//! - Writing a complete response to a Pingora session

use bytes::Bytes;
use pingora_core::Result;
use pingora_http::ResponseHeader;
use pingora_proxy::Session;

/// What an inbound request is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    Metrics,
    Image,
    MethodNotAllowed,
}

/// Pick the handler for `method` and raw `path`.
pub fn route(method: &str, path: &str) -> Route {
    if !matches!(method, "GET" | "HEAD") {
        return Route::MethodNotAllowed;
    }

    match path {
        "/health" => Route::Health,
        "/metrics" => Route::Metrics,
        _ => Route::Image,
    }
}

/// Percent-decode the request path once, keeping the raw text when the
/// result would not be valid UTF-8.
pub fn decode_request_path(path: &str) -> String {
    urlencoding::decode(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Write a full response. HEAD requests get the headers only.
pub async fn write_response(
    session: &mut Session,
    status: u16,
    content_type: &str,
    body: Bytes,
    extra_headers: &[(&'static str, String)],
) -> Result<()> {
    let mut header = ResponseHeader::build(status, None)?;
    header.insert_header("Content-Type", content_type)?;
    header.insert_header("Content-Length", body.len().to_string())?;
    for (name, value) in extra_headers {
        header.insert_header(*name, value.as_str())?;
    }

    let head_only = session.req_header().method.as_str() == "HEAD";

    session
        .write_response_header(Box::new(header), head_only)
        .await?;
    if !head_only {
        session.write_response_body(Some(body), true).await?;
    }

    Ok(())
}
