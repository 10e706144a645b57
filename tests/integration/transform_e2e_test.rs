// Full dispatch path: parse, fetch over HTTP, process, encode

use super::test_server::{solid, Route, TestOrigin};
use image::{GenericImageView, Rgba, RgbaImage};
use kagami::dispatch::Dispatcher;
use kagami::fetcher::{CachingFetcher, FetchConfig, ImageFetcher};
use kagami::image_optimizer::{Processor, TransformConfig};
use kagami::watermark::WatermarkStyle;
use std::sync::Arc;
use std::time::Duration;

fn dispatcher() -> Dispatcher {
    let fetcher = ImageFetcher::new(&FetchConfig::default()).expect("Failed to build fetcher");
    let overlays = CachingFetcher::new(fetcher.clone(), 10, Duration::from_secs(60));
    let processor = Processor::new(
        TransformConfig::default(),
        overlays,
        WatermarkStyle {
            opacity: 1.0,
            margin: 0,
        },
    );
    Dispatcher::new(Arc::new(fetcher), Arc::new(processor))
}

/// Left half red, right half blue
fn two_tone() -> RgbaImage {
    RgbaImage::from_fn(200, 100, |x, _| {
        if x < 100 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    })
}

fn encoded(url: &str) -> String {
    urlencoding::encode(url).into_owned()
}

#[tokio::test]
async fn test_resize_and_default_jpeg() {
    let origin = TestOrigin::start(vec![("/cat.png", Route::png(&two_tone()))]).await;

    let path = format!("/100x50/{}", encoded(&origin.url("/cat.png")));
    let response = dispatcher().dispatch(&path).await.unwrap();

    assert_eq!(response.content_type, "image/jpeg");
    let decoded = image::load_from_memory(&response.body).unwrap();
    assert_eq!(decoded.dimensions(), (100, 50));
}

#[tokio::test]
async fn test_flip_and_png_output() {
    let origin = TestOrigin::start(vec![("/cat.png", Route::png(&two_tone()))]).await;

    let path = format!(
        "/-200x0/filters:format(png)/{}",
        encoded(&origin.url("/cat.png"))
    );
    let response = dispatcher().dispatch(&path).await.unwrap();

    assert_eq!(response.content_type, "image/png");
    let decoded = image::load_from_memory(&response.body).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (200, 100));
    // Mirrored: blue now on the left
    assert_eq!(decoded.get_pixel(10, 50), &Rgba([0, 0, 255, 255]));
    assert_eq!(decoded.get_pixel(190, 50), &Rgba([255, 0, 0, 255]));
}

#[tokio::test]
async fn test_crop_filter_selects_region() {
    let origin = TestOrigin::start(vec![("/cat.png", Route::png(&two_tone()))]).await;

    let path = format!(
        "/filters:crop(120,0,180,40):format(png)/{}",
        encoded(&origin.url("/cat.png"))
    );
    let response = dispatcher().dispatch(&path).await.unwrap();

    let decoded = image::load_from_memory(&response.body).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (60, 40));
    assert!(decoded.pixels().all(|p| *p == Rgba([0, 0, 255, 255])));
}

#[tokio::test]
async fn test_watermark_overlay_is_composited() {
    let origin = TestOrigin::start(vec![
        ("/cat.png", Route::png(&solid(50, 50, [0, 0, 0, 255]))),
        ("/logo.png", Route::png(&solid(10, 10, [255, 255, 255, 255]))),
    ])
    .await;

    let path = format!(
        "/0x0:watermark(\"{}\"):filters:format(png)/{}",
        origin.url("/logo.png"),
        encoded(&origin.url("/cat.png"))
    );
    let response = dispatcher().dispatch(&path).await.unwrap();

    let decoded = image::load_from_memory(&response.body).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(45, 45), &Rgba([255, 255, 255, 255]));
    assert_eq!(decoded.get_pixel(5, 5), &Rgba([0, 0, 0, 255]));
}

#[tokio::test]
async fn test_missing_source_is_bad_gateway() {
    let origin = TestOrigin::start(vec![]).await;

    let path = format!("/100x100/{}", encoded(&origin.url("/gone.png")));
    let err = dispatcher().dispatch(&path).await.unwrap_err();

    assert_eq!(err.status(), 502);
    assert!(err.message.contains("404"));
}

#[tokio::test]
async fn test_missing_watermark_is_server_error() {
    let origin = TestOrigin::start(vec![("/cat.png", Route::png(&two_tone()))]).await;

    let path = format!(
        "/0x0:watermark(\"{}\")/{}",
        origin.url("/nologo.png"),
        encoded(&origin.url("/cat.png"))
    );
    let err = dispatcher().dispatch(&path).await.unwrap_err();

    assert_eq!(err.status(), 500);
    assert!(err.message.starts_with("failed to process image"));
}

#[tokio::test]
async fn test_oversized_source_is_bad_gateway() {
    let origin = TestOrigin::start(vec![("/big.png", Route::png(&solid(120, 120, [1, 1, 1, 255])))]).await;
    let fetcher = ImageFetcher::new(&FetchConfig::default())
        .expect("Failed to build fetcher")
        .with_max_pixels(10_000);
    let overlays = CachingFetcher::new(fetcher.clone(), 10, Duration::from_secs(60));
    let processor = Processor::new(TransformConfig::default(), overlays, WatermarkStyle::default());
    let dispatcher = Dispatcher::new(Arc::new(fetcher), Arc::new(processor));

    let path = format!("/50x50/{}", encoded(&origin.url("/big.png")));
    let err = dispatcher.dispatch(&path).await.unwrap_err();

    assert_eq!(err.status(), 502);
    assert_eq!(
        err.message,
        "failed to fetch image: image is 120x120, more than 10000 pixels"
    );
}
