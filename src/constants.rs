// Constants module - centralized default values for configuration
//
// Every serde `default_*` helper and every hard limit in the crate reads
// from here.

// =============================================================================
// Server defaults
// =============================================================================

/// Default listen address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of worker threads
pub const DEFAULT_THREADS: usize = 4;

/// Default maximum concurrent requests
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 1000;

/// Retry-After value sent with 503 responses when the limit is hit
pub const OVERLOAD_RETRY_AFTER_SECS: u64 = 1;

// =============================================================================
// Fetch defaults
// =============================================================================

/// Default source fetch timeout in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default maximum source body size (50 MB)
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 50 * 1024 * 1024;

/// Default User-Agent for outbound fetches
pub const DEFAULT_USER_AGENT: &str = concat!("kagami/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Transform defaults
// =============================================================================

/// Output quality used when none (or a non-positive one) is requested
pub const DEFAULT_QUALITY: u32 = 75;

/// Default maximum output width in pixels
pub const DEFAULT_MAX_OUTPUT_WIDTH: u32 = 4096;

/// Default maximum output height in pixels
pub const DEFAULT_MAX_OUTPUT_HEIGHT: u32 = 4096;

/// Decoded source images above this many pixels are rejected before decoding
pub const DEFAULT_MAX_SOURCE_PIXELS: u64 = 100_000_000;

/// Longest edge of the luma thumbnail used for smart-crop energy
pub const SMART_CROP_SAMPLE_SIZE: u32 = 256;

/// Upper bound for `blur(sigma)`
pub const MAX_BLUR_SIGMA: f64 = 100.0;

/// Upper bound for `sharpen(sigma)`
pub const MAX_SHARPEN_SIGMA: f64 = 10.0;

/// Unsharp mask threshold
pub const SHARPEN_THRESHOLD: i32 = 1;

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default overlay opacity
pub const DEFAULT_WATERMARK_OPACITY: f32 = 0.5;

/// Default distance from the bottom-right corner in pixels
pub const DEFAULT_WATERMARK_MARGIN: u32 = 10;

/// Default number of cached overlay images
pub const DEFAULT_WATERMARK_CACHE_ENTRIES: u64 = 100;

/// Default overlay cache TTL in seconds
pub const DEFAULT_WATERMARK_CACHE_TTL_SECS: u64 = 3600;

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log level filter
pub const DEFAULT_LOG_LEVEL: &str = "info";
