//! Watermark configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::WatermarkStyle;
use crate::constants::{
    DEFAULT_WATERMARK_CACHE_ENTRIES, DEFAULT_WATERMARK_CACHE_TTL_SECS, DEFAULT_WATERMARK_MARGIN,
    DEFAULT_WATERMARK_OPACITY,
};

fn default_opacity() -> f32 {
    DEFAULT_WATERMARK_OPACITY
}

fn default_margin() -> u32 {
    DEFAULT_WATERMARK_MARGIN
}

fn default_cache_entries() -> u64 {
    DEFAULT_WATERMARK_CACHE_ENTRIES
}

fn default_cache_ttl() -> u64 {
    DEFAULT_WATERMARK_CACHE_TTL_SECS
}

/// How `watermark("URL")` overlays are drawn and cached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatermarkConfig {
    /// Overlay opacity (0.0 - 1.0)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Distance from the bottom-right corner in pixels
    #[serde(default = "default_margin")]
    pub margin: u32,

    /// Maximum overlays kept in memory
    #[serde(default = "default_cache_entries")]
    pub cache_entries: u64,

    /// Overlay cache TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            opacity: default_opacity(),
            margin: default_margin(),
            cache_entries: default_cache_entries(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl WatermarkConfig {
    pub fn style(&self) -> WatermarkStyle {
        WatermarkStyle {
            opacity: self.opacity,
            margin: self.margin,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!(
                "watermark.opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            ));
        }
        if self.cache_ttl_secs == 0 {
            return Err("watermark.cache_ttl_secs must be at least 1".to_string());
        }
        Ok(())
    }
}
