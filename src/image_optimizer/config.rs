use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_OUTPUT_HEIGHT, DEFAULT_MAX_OUTPUT_WIDTH, DEFAULT_MAX_SOURCE_PIXELS,
};

/// Limits applied by the image processor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformConfig {
    /// Maximum width a resize may produce (requested widths are clamped)
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Maximum height a resize may produce
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Sources whose header declares more pixels are refused unread
    #[serde(default = "default_max_source_pixels")]
    pub max_source_pixels: u64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_OUTPUT_WIDTH,
            max_height: DEFAULT_MAX_OUTPUT_HEIGHT,
            max_source_pixels: DEFAULT_MAX_SOURCE_PIXELS,
        }
    }
}

impl TransformConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(
                "transform.max_width and transform.max_height must be at least 1".to_string(),
            );
        }
        if self.max_source_pixels == 0 {
            return Err("transform.max_source_pixels must be at least 1".to_string());
        }
        Ok(())
    }
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_OUTPUT_WIDTH
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_OUTPUT_HEIGHT
}

fn default_max_source_pixels() -> u64 {
    DEFAULT_MAX_SOURCE_PIXELS
}
