//! Image processing and encoding
//!
//! - `processor`: crop, resize (fill or aspect), flip, filters, watermark
//! - `encoder`: JPEG, PNG and lossy WebP behind one trait
//! - `format`: mapping from the requested container name to an encoder
//!
//! Supported filters:
//!
//! | Filter          | Effect                              |
//! |-----------------|-------------------------------------|
//! | `blur(sigma)`   | gaussian blur                       |
//! | `sharpen(sigma)`| unsharp mask                        |
//! | `brightness(n)` | add `n` to every channel            |
//! | `contrast(c)`   | contrast adjustment in percent      |
//! | `grayscale`     | desaturate                          |
//! | `invert`        | negate colors                       |
//! | `rotate(deg)`   | 90, 180 or 270 degrees clockwise    |

pub mod config;
pub mod encoder;
pub mod error;
pub mod format;
pub mod processor;

pub use config::TransformConfig;
pub use encoder::{encode_image, EncodedImage, EncoderFactory, EncoderQuality, ImageEncoder};
pub use error::ImageError;
pub use format::OutputFormat;
pub use processor::{smart_offset, transform_image, Processor};
