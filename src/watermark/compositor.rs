//! Watermark compositor for blending overlays onto images.
//!
//! The overlay is anchored at the bottom-right corner, inset by the
//! configured margin, and blended with the Porter-Duff "over" operator.
//! Overlays larger than the free area are scaled down to fit.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

use super::WatermarkStyle;

/// Top-left placement of an overlay on the target, may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

/// Composite `overlay` onto `target` at the bottom-right corner.
pub fn apply_watermark(
    target: DynamicImage,
    overlay: &DynamicImage,
    style: &WatermarkStyle,
) -> DynamicImage {
    let mut canvas = target.to_rgba8();
    let mark = fit_overlay(overlay, canvas.width(), canvas.height(), style.margin);

    let position = bottom_right(
        canvas.width(),
        canvas.height(),
        mark.width(),
        mark.height(),
        style.margin,
    );
    blend_layer(&mut canvas, &mark, position, style.opacity);

    DynamicImage::ImageRgba8(canvas)
}

/// Shrink the overlay so it fits inside the target minus margins.
fn fit_overlay(overlay: &DynamicImage, target_w: u32, target_h: u32, margin: u32) -> RgbaImage {
    let max_w = target_w.saturating_sub(margin.saturating_mul(2)).max(1);
    let max_h = target_h.saturating_sub(margin.saturating_mul(2)).max(1);
    let (w, h) = overlay.dimensions();

    if w <= max_w && h <= max_h {
        overlay.to_rgba8()
    } else {
        overlay.resize(max_w, max_h, FilterType::Triangle).to_rgba8()
    }
}

fn bottom_right(img_w: u32, img_h: u32, wm_w: u32, wm_h: u32, margin: u32) -> PlacementPosition {
    PlacementPosition {
        x: img_w as i32 - wm_w as i32 - margin as i32,
        y: img_h as i32 - wm_h as i32 - margin as i32,
    }
}

/// Blend the overlay onto the target, clipping to target bounds.
fn blend_layer(target: &mut RgbaImage, overlay: &RgbaImage, position: PlacementPosition, opacity: f32) {
    let target_width = target.width() as i32;
    let target_height = target.height() as i32;

    let x_start = position.x.max(0);
    let y_start = position.y.max(0);
    let x_end = (position.x + overlay.width() as i32).min(target_width);
    let y_end = (position.y + overlay.height() as i32).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let wx = (tx - position.x) as u32;
            let wy = (ty - position.y) as u32;

            let fg = *overlay.get_pixel(wx, wy);
            let bg = *target.get_pixel(tx as u32, ty as u32);
            target.put_pixel(tx as u32, ty as u32, blend_pixels(bg, fg, opacity));
        }
    }
}

/// Blend two pixels using alpha compositing with additional opacity.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let fg_alpha = (foreground[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
