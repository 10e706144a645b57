//! Image processing and encoding error types
//!
//! Every variant surfaces to the client as a server error; which stage
//! produced it (process or encode) is decided by the dispatcher.

use std::fmt;

/// Errors that can occur while transforming or encoding an image
#[derive(Debug, Clone)]
pub enum ImageError {
    /// Requested container is not supported
    UnsupportedFormat { format: String },
    /// Resize operation failed
    ResizeFailed { message: String },
    /// Target dimensions cannot be produced
    InvalidDimensions {
        width: u32,
        height: u32,
        reason: String,
    },
    /// Watermark overlay could not be fetched or applied
    WatermarkFailed { message: String },
    /// Encoding to output format failed
    EncodeFailed { format: String, message: String },
    /// The blocking worker running the transform did not complete
    TaskFailed { message: String },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::UnsupportedFormat { format } => {
                write!(f, "Unsupported image format: {}", format)
            }
            ImageError::ResizeFailed { message } => {
                write!(f, "Resize failed: {}", message)
            }
            ImageError::InvalidDimensions {
                width,
                height,
                reason,
            } => {
                write!(f, "Invalid dimensions {}x{}: {}", width, height, reason)
            }
            ImageError::WatermarkFailed { message } => {
                write!(f, "Watermark failed: {}", message)
            }
            ImageError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
            ImageError::TaskFailed { message } => {
                write!(f, "Image task failed: {}", message)
            }
        }
    }
}

impl std::error::Error for ImageError {}

impl ImageError {
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        ImageError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        ImageError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn watermark_failed(message: impl Into<String>) -> Self {
        ImageError::WatermarkFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn task_failed(message: impl Into<String>) -> Self {
        ImageError::TaskFailed {
            message: message.into(),
        }
    }
}
