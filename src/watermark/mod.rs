//! Image watermarks requested with `watermark("URL")`.
//!
//! The overlay itself is fetched by the processor through the caching
//! fetcher; this module only decides placement and blending.
//!
//! ```yaml
//! watermark:
//!   opacity: 0.5
//!   margin: 10
//!   cache_entries: 100
//!   cache_ttl_secs: 3600
//! ```

pub mod compositor;
pub mod config;

pub use compositor::{apply_watermark, PlacementPosition};
pub use config::WatermarkConfig;

use crate::constants::{DEFAULT_WATERMARK_MARGIN, DEFAULT_WATERMARK_OPACITY};

/// Blend parameters for one overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkStyle {
    /// Multiplied into the overlay's own alpha (0.0 - 1.0)
    pub opacity: f32,
    /// Inset from the bottom and right edges in pixels
    pub margin: u32,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            opacity: DEFAULT_WATERMARK_OPACITY,
            margin: DEFAULT_WATERMARK_MARGIN,
        }
    }
}
