//! Output encoders
//!
//! One encoder per output container behind the `ImageEncoder` trait.
//! JPEG and WebP honor the requested quality; PNG is lossless and ignores it.

use image::codecs::jpeg::JpegEncoder as JpegWriter;
use image::codecs::png::PngEncoder as PngWriter;
use image::{DynamicImage, ImageEncoder as _};
use std::io::Cursor;

use super::error::ImageError;
use super::format::OutputFormat;
use crate::constants::DEFAULT_QUALITY;

/// Encode quality, always within 1-100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderQuality {
    pub quality: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self::with_quality(DEFAULT_QUALITY)
    }
}

impl EncoderQuality {
    /// Clamp a parsed quality into the 1-100 range
    pub fn with_quality(quality: u32) -> Self {
        Self {
            quality: quality.clamp(1, 100) as u8,
        }
    }
}

/// Encoded bytes plus the matching `Content-Type`
#[derive(Debug)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: OutputFormat,
    pub content_type: &'static str,
}

impl EncodedImage {
    pub fn new(data: Vec<u8>, format: OutputFormat) -> Self {
        Self {
            data,
            format,
            content_type: format.content_type(),
        }
    }
}

/// Writes a processed image into one output container.
pub trait ImageEncoder: Send + Sync {
    fn format(&self) -> OutputFormat;

    fn encode(
        &self,
        image: &DynamicImage,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError>;
}

pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(
        &self,
        image: &DynamicImage,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        // Alpha is dropped, JPEG cannot carry it
        let rgb = image.to_rgb8();

        let mut output = Cursor::new(Vec::new());
        JpegWriter::new_with_quality(&mut output, quality.quality)
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)
            .map_err(|e| ImageError::encode_failed("jpeg", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::Jpeg))
    }
}

pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(
        &self,
        image: &DynamicImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        let rgba = image.to_rgba8();

        let mut output = Cursor::new(Vec::new());
        PngWriter::new(&mut output)
            .write_image(rgba.as_raw(), rgba.width(), rgba.height(), image::ColorType::Rgba8)
            .map_err(|e| ImageError::encode_failed("png", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::Png))
    }
}

/// Lossy WebP through libwebp; the `image` crate only writes lossless WebP.
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(
        &self,
        image: &DynamicImage,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        let rgba = image.to_rgba8();
        if rgba.width() == 0 || rgba.height() == 0 {
            return Err(ImageError::encode_failed("webp", "image has no pixels"));
        }

        let encoded = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
            .encode_simple(false, quality.quality as f32)
            .map_err(|e| ImageError::encode_failed("webp", format!("{:?}", e)))?;

        Ok(EncodedImage::new(encoded.to_vec(), OutputFormat::WebP))
    }
}

pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Jpeg => Box::new(JpegEncoder),
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder),
        }
    }
}

/// Encode with the encoder registered for `format`.
pub fn encode_image(
    image: &DynamicImage,
    format: OutputFormat,
    quality: EncoderQuality,
) -> Result<EncodedImage, ImageError> {
    EncoderFactory::create(format).encode(image, quality)
}
