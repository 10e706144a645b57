use thiserror::Error;

/// Errors from retrieving and decoding a remote image
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Request(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("image is {width}x{height}, more than {limit} pixels")]
    TooManyPixels { width: u32, height: u32, limit: u64 },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("client setup failed: {0}")]
    Client(String),
}
