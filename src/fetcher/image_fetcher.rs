//! HTTP image fetcher with an optional overlay cache.
//!
//! Only `http://` and `https://` URLs are accepted. The body is streamed
//! chunk by chunk so an oversized source is rejected without buffering it
//! whole. The header's dimensions are checked against the pixel budget
//! before the image is decoded on the blocking pool.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use moka::future::Cache;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use super::{FetchConfig, FetchError};
use crate::constants::DEFAULT_MAX_SOURCE_PIXELS;
use crate::dispatch::SourceFetcher;

/// Fetches and decodes remote images
#[derive(Clone)]
pub struct ImageFetcher {
    http_client: reqwest::Client,
    timeout_secs: u64,
    max_bytes: usize,
    max_pixels: u64,
}

impl ImageFetcher {
    /// Create a fetcher from the `fetch` config section.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the HTTP client cannot be created
    /// (e.g., TLS backend initialization failure).
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            timeout_secs: config.timeout_secs,
            max_bytes: config.max_source_bytes,
            max_pixels: DEFAULT_MAX_SOURCE_PIXELS,
        })
    }

    /// Refuse sources declaring more than `max_pixels` pixels.
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Download `url` and decode it.
    pub async fn fetch_image(&self, url: &str) -> Result<DynamicImage, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let body = self.download(parsed).await?;
        let format = detect_image_format(&body, url)?;
        let max_pixels = self.max_pixels;

        tokio::task::spawn_blocking(move || decode_within_limit(&body, format, max_pixels))
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?
    }

    async fn download(&self, url: reqwest::Url) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes as u64 {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.request_error(e))? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    fn request_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl SourceFetcher for ImageFetcher {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, FetchError> {
        self.fetch_image(url).await
    }
}

/// Cached decoded image.
#[derive(Clone)]
pub struct CachedImage {
    pub image: Arc<DynamicImage>,
}

impl std::fmt::Debug for CachedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedImage")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .finish()
    }
}

impl CachedImage {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }
}

/// `ImageFetcher` with a bounded, TTL-limited cache keyed by URL.
#[derive(Clone)]
pub struct CachingFetcher {
    inner: ImageFetcher,
    cache: Cache<String, CachedImage>,
}

impl CachingFetcher {
    pub fn new(inner: ImageFetcher, max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }

    /// Fetch an image, serving repeats from the cache until the TTL expires.
    pub async fn fetch(&self, url: &str) -> Result<CachedImage, FetchError> {
        if let Some(cached) = self.cache.get(url).await {
            return Ok(cached);
        }

        let cached = CachedImage::new(self.inner.fetch_image(url).await?);
        self.cache.insert(url.to_string(), cached.clone()).await;

        Ok(cached)
    }

    /// Get the number of cached images.
    pub fn cache_size(&self) -> u64 {
        self.cache.entry_count()
    }

    pub async fn is_cached(&self, url: &str) -> bool {
        self.cache.get(url).await.is_some()
    }

    pub async fn clear_cache(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

/// Detect image format from magic bytes, falling back to the URL extension.
pub fn detect_image_format(data: &[u8], url: &str) -> Result<ImageFormat, FetchError> {
    if let Ok(format) = image::guess_format(data) {
        return Ok(format);
    }

    let path = url.split(['?', '#']).next().unwrap_or_default();
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "gif" => Ok(ImageFormat::Gif),
        "webp" => Ok(ImageFormat::WebP),
        _ => Err(FetchError::UnsupportedFormat(if ext.is_empty() {
            "unknown".to_string()
        } else {
            ext
        })),
    }
}

/// Decode `data`, reading only the header first so an image bomb is
/// rejected before any pixel buffer is allocated.
pub fn decode_within_limit(
    data: &[u8],
    format: ImageFormat,
    max_pixels: u64,
) -> Result<DynamicImage, FetchError> {
    let (width, height) = image::io::Reader::with_format(Cursor::new(data), format)
        .into_dimensions()
        .map_err(|e| FetchError::Decode(e.to_string()))?;

    if width as u64 * height as u64 > max_pixels {
        return Err(FetchError::TooManyPixels {
            width,
            height,
            limit: max_pixels,
        });
    }

    image::load_from_memory_with_format(data, format).map_err(|e| FetchError::Decode(e.to_string()))
}
