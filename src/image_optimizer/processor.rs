//! Image processing implementation
//!
//! Applies a `TransformRequest` to a decoded image:
//! crop region → resize (fill or aspect-preserving) → flip → filters → watermark
//!
//! Pixel work is synchronous and runs on the blocking pool; only the overlay
//! fetch is async.

use async_trait::async_trait;
use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::{DynamicImage, GenericImageView, GrayImage};
use std::num::NonZeroU32;
use std::sync::Arc;

use super::config::TransformConfig;
use super::error::ImageError;
use crate::constants::{MAX_BLUR_SIGMA, MAX_SHARPEN_SIGMA, SHARPEN_THRESHOLD, SMART_CROP_SAMPLE_SIZE};
use crate::dispatch::ImageProcessor;
use crate::fetcher::CachingFetcher;
use crate::options::{normalize_source_url, CropRegion, TransformRequest};
use crate::watermark::{apply_watermark, WatermarkStyle};

/// Default `ImageProcessor`: pixel transforms plus watermark overlays
/// fetched through a cache.
#[derive(Clone)]
pub struct Processor {
    limits: TransformConfig,
    overlays: CachingFetcher,
    style: WatermarkStyle,
}

impl Processor {
    pub fn new(limits: TransformConfig, overlays: CachingFetcher, style: WatermarkStyle) -> Self {
        Self {
            limits,
            overlays,
            style,
        }
    }

    async fn fetch_overlay(&self, url: &str) -> Result<Arc<DynamicImage>, ImageError> {
        let url = normalize_source_url(url);
        self.overlays
            .fetch(&url)
            .await
            .map(|cached| cached.image)
            .map_err(|e| ImageError::watermark_failed(e.to_string()))
    }
}

#[async_trait]
impl ImageProcessor for Processor {
    async fn process(
        &self,
        image: DynamicImage,
        request: &TransformRequest,
    ) -> Result<DynamicImage, ImageError> {
        let overlay = match request.watermark.as_deref() {
            Some(url) => Some(self.fetch_overlay(url).await?),
            None => None,
        };

        let request = request.clone();
        let limits = self.limits.clone();
        let style = self.style;

        tokio::task::spawn_blocking(move || {
            transform_image(image, &request, &limits, overlay.as_deref(), &style)
        })
        .await
        .map_err(|e| ImageError::task_failed(e.to_string()))?
    }
}

/// Run every transform of `request` on `image`.
pub fn transform_image(
    image: DynamicImage,
    request: &TransformRequest,
    limits: &TransformConfig,
    overlay: Option<&DynamicImage>,
    style: &WatermarkStyle,
) -> Result<DynamicImage, ImageError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidDimensions {
            width,
            height,
            reason: "source image is empty".to_string(),
        });
    }

    let mut img = image;

    if let Some((x, y, w, h)) = clamp_region(request.crop_region, width, height) {
        img = img.crop_imm(x, y, w, h);
    }

    img = resize_for_request(img, request, limits)?;

    if request.flip {
        img = img.fliph();
    }

    img = apply_filters(img, request);

    if let Some(overlay) = overlay {
        img = apply_watermark(img, overlay, style);
    }

    Ok(img)
}

/// Clip the crop rectangle to the image, returning `(x, y, width, height)`.
fn clamp_region(region: CropRegion, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    region.extent()?;

    let x0 = region.x0.min(width);
    let y0 = region.y0.min(height);
    let x1 = region.x1.min(width);
    let y1 = region.y1.min(height);

    if x1 > x0 && y1 > y0 {
        Some((x0, y0, x1 - x0, y1 - y0))
    } else {
        None
    }
}

fn resize_for_request(
    img: DynamicImage,
    request: &TransformRequest,
    limits: &TransformConfig,
) -> Result<DynamicImage, ImageError> {
    let (src_w, src_h) = img.dimensions();
    let target_w = request.width.min(limits.max_width);
    let target_h = request.height.min(limits.max_height);

    match (target_w, target_h) {
        (0, 0) => Ok(img),
        (w, 0) => {
            let h = scale_axis(src_h, w, src_w).min(limits.max_height);
            resize_image(&img, w, h)
        }
        (0, h) => {
            let w = scale_axis(src_w, h, src_h).min(limits.max_width);
            resize_image(&img, w, h)
        }
        (w, h) => {
            let (crop_w, crop_h) = fill_window(src_w, src_h, w, h);
            let (x, y) = if request.smart_crop {
                smart_offset(&img, crop_w, crop_h)
            } else {
                ((src_w - crop_w) / 2, (src_h - crop_h) / 2)
            };
            let window = img.crop_imm(x, y, crop_w, crop_h);
            resize_image(&window, w, h)
        }
    }
}

/// `len * target / reference`, rounded, at least 1.
fn scale_axis(len: u32, target: u32, reference: u32) -> u32 {
    let scaled = (len as u64 * target as u64 + reference as u64 / 2) / reference as u64;
    scaled.clamp(1, u32::MAX as u64) as u32
}

/// Largest source window with the aspect ratio of `target_w x target_h`.
fn fill_window(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> (u32, u32) {
    if src_w as u64 * target_h as u64 > src_h as u64 * target_w as u64 {
        (scale_axis(src_h, target_w, target_h).min(src_w), src_h)
    } else {
        (src_w, scale_axis(src_w, target_h, target_w).min(src_h))
    }
}

/// Top-left corner of the `crop_w x crop_h` window with the most edge
/// energy. Only the axis that has slack is searched.
pub fn smart_offset(img: &DynamicImage, crop_w: u32, crop_h: u32) -> (u32, u32) {
    let (src_w, src_h) = img.dimensions();
    let center = (
        src_w.saturating_sub(crop_w) / 2,
        src_h.saturating_sub(crop_h) / 2,
    );

    let sample = if src_w > SMART_CROP_SAMPLE_SIZE || src_h > SMART_CROP_SAMPLE_SIZE {
        img.thumbnail(SMART_CROP_SAMPLE_SIZE, SMART_CROP_SAMPLE_SIZE)
            .to_luma8()
    } else {
        img.to_luma8()
    };
    let (sample_w, sample_h) = sample.dimensions();
    if sample_w == 0 || sample_h == 0 {
        return center;
    }

    let (columns, rows) = energy_profiles(&sample);

    if crop_w < src_w {
        let window = scale_axis(crop_w, sample_w, src_w) as usize;
        let start = best_window(&columns, window) as u64;
        let x = (start * src_w as u64 / sample_w as u64) as u32;
        (x.min(src_w - crop_w), 0)
    } else if crop_h < src_h {
        let window = scale_axis(crop_h, sample_h, src_h) as usize;
        let start = best_window(&rows, window) as u64;
        let y = (start * src_h as u64 / sample_h as u64) as u32;
        (0, y.min(src_h - crop_h))
    } else {
        center
    }
}

/// Per-column and per-row sums of absolute luma gradients.
fn energy_profiles(luma: &GrayImage) -> (Vec<u64>, Vec<u64>) {
    let (w, h) = luma.dimensions();
    let mut columns = vec![0u64; w as usize];
    let mut rows = vec![0u64; h as usize];

    for y in 0..h {
        for x in 0..w {
            let p = luma.get_pixel(x, y)[0] as i32;
            let mut g = 0u64;
            if x + 1 < w {
                g += (luma.get_pixel(x + 1, y)[0] as i32 - p).unsigned_abs() as u64;
            }
            if y + 1 < h {
                g += (luma.get_pixel(x, y + 1)[0] as i32 - p).unsigned_abs() as u64;
            }
            columns[x as usize] += g;
            rows[y as usize] += g;
        }
    }

    (columns, rows)
}

/// Start of the `window`-long run with the highest sum; ties go to the run
/// closest to the middle.
fn best_window(profile: &[u64], window: usize) -> usize {
    let len = profile.len();
    let window = window.clamp(1, len.max(1));
    if len <= window {
        return 0;
    }

    let middle = (len - window) / 2;
    let mut sum: u64 = profile[..window].iter().sum();
    let mut best = (sum, 0usize);

    for start in 1..=(len - window) {
        sum = sum + profile[start + window - 1] - profile[start - 1];
        let closer = start.abs_diff(middle) < best.1.abs_diff(middle);
        if sum > best.0 || (sum == best.0 && closer) {
            best = (sum, start);
        }
    }

    best.1
}

/// Resize image using fast-image-resize with Lanczos3 filter
fn resize_image(img: &DynamicImage, target_w: u32, target_h: u32) -> Result<DynamicImage, ImageError> {
    let (src_w, src_h) = img.dimensions();
    if (src_w, src_h) == (target_w, target_h) {
        return Ok(img.clone());
    }

    let src_width =
        NonZeroU32::new(src_w).ok_or_else(|| ImageError::resize_failed("Source width is 0"))?;
    let src_height =
        NonZeroU32::new(src_h).ok_or_else(|| ImageError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImageError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ImageError::resize_failed("Target height is 0"))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| ImageError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));

    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ImageError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    let rgba_image = image::RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ImageError::resize_failed("Failed to create output image buffer"))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}

/// Filters with pixel meaning; anything else in the list is ignored here.
fn apply_filters(mut img: DynamicImage, request: &TransformRequest) -> DynamicImage {
    if let Some(sigma) = request.filter("blur").filter(|v| *v > 0.0) {
        img = img.blur(sigma.min(MAX_BLUR_SIGMA) as f32);
    }

    if let Some(sigma) = request.filter("sharpen").filter(|v| *v > 0.0) {
        img = img.unsharpen(sigma.min(MAX_SHARPEN_SIGMA) as f32, SHARPEN_THRESHOLD);
    }

    if let Some(amount) = request.filter("brightness") {
        img = img.brighten(amount.clamp(-255.0, 255.0) as i32);
    }

    if let Some(contrast) = request.filter("contrast") {
        img = img.adjust_contrast(contrast.clamp(-100.0, 100.0) as f32);
    }

    if is_enabled(request, "grayscale") {
        img = img.grayscale();
    }

    if is_enabled(request, "invert") {
        img.invert();
    }

    if let Some(degrees) = request.filter("rotate") {
        img = match degrees as i64 {
            90 | -270 => img.rotate90(),
            180 | -180 => img.rotate180(),
            270 | -90 => img.rotate270(),
            _ => img,
        };
    }

    img
}

fn is_enabled(request: &TransformRequest, name: &str) -> bool {
    request.filter(name).map_or(false, |v| v > 0.0)
}
