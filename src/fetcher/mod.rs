//! Remote image retrieval
//!
//! `ImageFetcher` downloads and decodes source images. `CachingFetcher`
//! wraps it with an in-memory cache for watermark overlays, which tend to be
//! the same few URLs across many requests.

pub mod config;
pub mod error;
pub mod image_fetcher;

pub use config::FetchConfig;
pub use error::FetchError;
pub use image_fetcher::{
    decode_within_limit, detect_image_format, CachedImage, CachingFetcher, ImageFetcher,
};
