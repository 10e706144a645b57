//! Parsed transform request types
//!
//! `TransformRequest` is the structured form of one option segment. It is
//! produced by the option parser, read by the dispatcher and the image
//! processor, and never mutated after parsing.

use std::collections::HashMap;
use std::fmt;

use crate::constants::DEFAULT_QUALITY;
use crate::image_optimizer::format::OutputFormat;

/// Explicit crop rectangle given as two corners `(x0, y0)` and `(x1, y1)`.
///
/// The all-zero rectangle means "no explicit crop".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRegion {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CropRegion {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// True when no coordinate was set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Width and height of the rectangle, if it spans a positive area.
    pub fn extent(&self) -> Option<(u32, u32)> {
        if self.x1 > self.x0 && self.y1 > self.y0 {
            Some((self.x1 - self.x0, self.y1 - self.y0))
        } else {
            None
        }
    }

    pub(crate) fn as_array(&self) -> [u32; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }

    pub(crate) fn from_array(coords: [u32; 4]) -> Self {
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }
}

/// Structured, validated representation of one transform request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    /// Target width in pixels, 0 = unconstrained
    pub width: u32,
    /// Target height in pixels, 0 = unconstrained
    pub height: u32,
    /// Mirror horizontally (requested with a negative width)
    pub flip: bool,
    /// Prefer content-aware cropping over a centered crop
    pub smart_crop: bool,
    /// Explicit crop rectangle
    pub crop_region: CropRegion,
    /// Generic filter list, `name -> value` (1.0 when no numeric parameter)
    pub filters: HashMap<String, f64>,
    /// Requested output container, lowercased; empty when not requested
    pub format: String,
    /// Encode quality, always positive
    pub quality: u32,
    /// Overlay image URL
    pub watermark: Option<String>,
}

impl Default for TransformRequest {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            flip: false,
            smart_crop: false,
            crop_region: CropRegion::default(),
            filters: HashMap::new(),
            format: String::new(),
            quality: DEFAULT_QUALITY,
            watermark: None,
        }
    }
}

impl TransformRequest {
    /// Output container the encoder stage will use.
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::resolve(&self.format)
    }

    /// Value of a generic filter, if requested.
    pub fn filter(&self, name: &str) -> Option<f64> {
        self.filters.get(name).copied()
    }

    /// Check if any resize was requested
    pub fn has_resize(&self) -> bool {
        self.width > 0 || self.height > 0
    }
}

/// A field that kept its default because its token was absent or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DefaultedField {
    Size,
    CropRegion,
    Format,
    Quality,
    Watermark,
}

impl DefaultedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::CropRegion => "crop_region",
            Self::Format => "format",
            Self::Quality => "quality",
            Self::Watermark => "watermark",
        }
    }
}

impl fmt::Display for DefaultedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the option parser.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub request: TransformRequest,
    /// Scheme-qualified source image URL
    pub source_url: String,
    /// Fields left at their default, in declaration order
    pub defaulted: Vec<DefaultedField>,
}

impl ParsedRequest {
    pub fn was_defaulted(&self, field: DefaultedField) -> bool {
        self.defaulted.contains(&field)
    }
}
