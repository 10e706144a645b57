// Dispatcher tests with in-memory collaborators

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use kagami::dispatch::{Dispatcher, ImageProcessor, SourceFetcher};
use kagami::error::Stage;
use kagami::fetcher::FetchError;
use kagami::image_optimizer::{ImageError, OutputFormat};
use kagami::options::TransformRequest;
use std::sync::{Arc, Mutex};

/// Serves a solid image, or fails with the configured status.
struct FakeFetcher {
    fail_with: Option<u16>,
    requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail_with: None,
            requested: Mutex::new(Vec::new()),
        })
    }

    fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(status),
            requested: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.fail_with {
            Some(status) => Err(FetchError::Status(status)),
            None => Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                16,
                16,
                Rgba([10, 120, 200, 255]),
            ))),
        }
    }
}

/// Records the request it was handed and resizes to exactly `width x height`.
#[derive(Default)]
struct RecordingProcessor {
    seen: Mutex<Option<TransformRequest>>,
    fail: bool,
}

#[async_trait]
impl ImageProcessor for RecordingProcessor {
    async fn process(
        &self,
        image: DynamicImage,
        request: &TransformRequest,
    ) -> Result<DynamicImage, ImageError> {
        *self.seen.lock().unwrap() = Some(request.clone());
        if self.fail {
            return Err(ImageError::watermark_failed("HTTP 404"));
        }
        if request.width > 0 && request.height > 0 {
            Ok(image.resize_exact(
                request.width,
                request.height,
                image::imageops::FilterType::Nearest,
            ))
        } else {
            Ok(image)
        }
    }
}

/// Hands back an image with no pixels, which no lossy encoder accepts.
struct EmptyProcessor;

#[async_trait]
impl ImageProcessor for EmptyProcessor {
    async fn process(
        &self,
        _image: DynamicImage,
        _request: &TransformRequest,
    ) -> Result<DynamicImage, ImageError> {
        Ok(DynamicImage::new_rgba8(0, 0))
    }
}

fn dispatcher_with(
    fetcher: Arc<FakeFetcher>,
    processor: Arc<RecordingProcessor>,
) -> Dispatcher {
    Dispatcher::new(fetcher, processor)
}

#[tokio::test]
async fn test_quality_and_format_example_returns_webp() {
    let processor = Arc::new(RecordingProcessor::default());
    let dispatcher = dispatcher_with(FakeFetcher::ok(), processor.clone());

    let response = dispatcher
        .dispatch("/300x200/filters:quality(90):format(webp)/example.com/cat.jpg")
        .await
        .unwrap();

    assert_eq!(response.content_type, "image/webp");
    assert_eq!(response.format, OutputFormat::WebP);
    assert_eq!(&response.body[0..4], b"RIFF");
    assert_eq!(response.source_url, "https://example.com/cat.jpg");

    let seen = processor.seen.lock().unwrap().clone().unwrap();
    assert_eq!((seen.width, seen.height, seen.quality), (300, 200, 90));
}

#[tokio::test]
async fn test_png_output_keeps_processed_dimensions() {
    let dispatcher = dispatcher_with(FakeFetcher::ok(), Arc::new(RecordingProcessor::default()));

    let response = dispatcher
        .dispatch("/40x30/filters:format(png)/example.com/a.jpg")
        .await
        .unwrap();

    assert_eq!(response.content_type, "image/png");
    let decoded = image::load_from_memory(&response.body).unwrap();
    assert_eq!(decoded.dimensions(), (40, 30));
}

#[tokio::test]
async fn test_negative_width_reaches_processor_as_flip() {
    let processor = Arc::new(RecordingProcessor::default());
    let dispatcher = dispatcher_with(FakeFetcher::ok(), processor.clone());

    let response = dispatcher.dispatch("/-100x0/example.com/a.png").await.unwrap();
    assert_eq!(response.content_type, "image/jpeg");

    let seen = processor.seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.width, 100);
    assert_eq!(seen.height, 0);
    assert!(seen.flip);
}

#[tokio::test]
async fn test_missing_source_segment_is_client_error() {
    let fetcher = FakeFetcher::ok();
    let dispatcher = dispatcher_with(fetcher.clone(), Arc::new(RecordingProcessor::default()));

    let err = dispatcher.dispatch("/300x200").await.unwrap_err();
    assert_eq!(err.status(), 400);
    assert_eq!(err.stage, Stage::Parse);
    assert_eq!(
        err.message,
        "failed to parse options: invalid URL format, must be /OPTIONS/ENCODED_URL"
    );
    assert!(fetcher.requested.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_path_is_missing_image() {
    let dispatcher = dispatcher_with(FakeFetcher::ok(), Arc::new(RecordingProcessor::default()));

    let err = dispatcher.dispatch("").await.unwrap_err();
    assert_eq!(err.status(), 400);
    assert_eq!(err.message, "missing image path");
}

#[tokio::test]
async fn test_fetch_failure_is_bad_gateway() {
    let processor = Arc::new(RecordingProcessor::default());
    let dispatcher = dispatcher_with(FakeFetcher::failing(404), processor.clone());

    let err = dispatcher
        .dispatch("/300x200/example.com/missing.jpg")
        .await
        .unwrap_err();

    assert_eq!(err.status(), 502);
    assert_eq!(err.stage, Stage::Fetch);
    assert!(err.message.starts_with("failed to fetch image"));
    assert!(processor.seen.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_process_failure_is_server_error() {
    let processor = Arc::new(RecordingProcessor {
        fail: true,
        ..Default::default()
    });
    let dispatcher = dispatcher_with(FakeFetcher::ok(), processor);

    let err = dispatcher
        .dispatch("/0x0:watermark(\"https://x/logo.png\")/example.com/a.jpg")
        .await
        .unwrap_err();

    assert_eq!(err.status(), 500);
    assert_eq!(err.stage, Stage::Process);
    assert_eq!(err.message, "failed to process image: Watermark failed: HTTP 404");
}

#[tokio::test]
async fn test_concurrent_dispatches_are_independent() {
    let dispatcher = dispatcher_with(FakeFetcher::ok(), Arc::new(RecordingProcessor::default()));

    let paths = ["/10x10/example.com/a.png", "/20x20/example.com/b.png", "/30x30/example.com/c.png"];
    let handles: Vec<_> = paths
        .iter()
        .map(|path| {
            let dispatcher = dispatcher.clone();
            let path = path.to_string();
            tokio::spawn(async move { dispatcher.dispatch(&path).await })
        })
        .collect();

    for (handle, expected) in handles.into_iter().zip([10u32, 20, 30]) {
        let response = handle.await.unwrap().unwrap();
        let decoded = image::load_from_memory(&response.body).unwrap();
        assert_eq!(decoded.dimensions(), (expected, expected));
    }
}

#[tokio::test]
async fn test_encode_failure_is_server_error() {
    let dispatcher = Dispatcher::new(FakeFetcher::ok(), Arc::new(EmptyProcessor));

    let err = dispatcher
        .dispatch("/0x0/filters:format(webp)/example.com/a.png")
        .await
        .unwrap_err();

    assert_eq!(err.status(), 500);
    assert_eq!(err.stage, Stage::Encode);
    assert!(err.message.starts_with("failed to encode webp:"));
}
