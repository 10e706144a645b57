//! Request dispatcher
//!
//! Runs one request through a linear state machine:
//!
//! ```text
//! Received → Parsed → Fetched → Processed → Encoded → Sent
//!     └──────────┴─────────┴──────────┴─────────┴──→ Errored(stage, cause)
//! ```
//!
//! Each stage's failure maps to exactly one HTTP status (see `Stage::status`).
//! Fetching and processing are collaborators behind traits so they can be
//! swapped in tests.

use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{DispatchError, Stage};
use crate::fetcher::FetchError;
use crate::image_optimizer::encoder::{encode_image, EncoderQuality};
use crate::image_optimizer::error::ImageError;
use crate::image_optimizer::format::OutputFormat;
use crate::metrics::TransformMetrics;
use crate::options::{self, TransformRequest};

/// Retrieves the source image named by the request.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, FetchError>;
}

/// Applies the pixel transforms of a request.
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    async fn process(
        &self,
        image: DynamicImage,
        request: &TransformRequest,
    ) -> Result<DynamicImage, ImageError>;
}

/// Encoded image ready to be written to the client
#[derive(Debug, Clone)]
pub struct TransformResponse {
    pub body: Bytes,
    pub format: OutputFormat,
    pub content_type: &'static str,
    pub source_url: String,
}

/// Position of a request in the dispatch state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Parsed,
    Fetched,
    Processed,
    Encoded,
    Sent,
    Errored(Stage, String),
}

#[derive(Clone)]
pub struct Dispatcher {
    fetcher: Arc<dyn SourceFetcher>,
    processor: Arc<dyn ImageProcessor>,
}

impl Dispatcher {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, processor: Arc<dyn ImageProcessor>) -> Self {
        Self { fetcher, processor }
    }

    /// Handle one request path (the leading `/` is optional).
    pub async fn dispatch(&self, raw_path: &str) -> Result<TransformResponse, DispatchError> {
        let metrics = TransformMetrics::global();
        let mut state = DispatchState::Received;

        let result = self.run(raw_path, &mut state, metrics).await;

        match &result {
            Ok(response) => {
                state = DispatchState::Sent;
                tracing::debug!(
                    state = ?state,
                    source = %response.source_url,
                    format = %response.format,
                    bytes = response.body.len(),
                    "Dispatch complete"
                );
            }
            Err(e) => {
                let reached = std::mem::replace(
                    &mut state,
                    DispatchState::Errored(e.stage, e.message.clone()),
                );
                tracing::debug!(
                    reached = ?reached,
                    state = ?state,
                    status = e.status(),
                    "Dispatch failed"
                );
            }
        }

        result
    }

    async fn run(
        &self,
        raw_path: &str,
        state: &mut DispatchState,
        metrics: &TransformMetrics,
    ) -> Result<TransformResponse, DispatchError> {
        let path = raw_path.strip_prefix('/').unwrap_or(raw_path);
        if path.is_empty() {
            return Err(DispatchError::missing_path());
        }

        let started = Instant::now();
        let parsed = options::parse(path).map_err(DispatchError::parse)?;
        metrics.record_stage(Stage::Parse, started.elapsed());
        metrics.record_defaulted(&parsed.defaulted);
        *state = DispatchState::Parsed;

        tracing::debug!(
            source = %parsed.source_url,
            width = parsed.request.width,
            height = parsed.request.height,
            defaulted = ?parsed.defaulted,
            "Parsed transform options"
        );

        let started = Instant::now();
        let image = self
            .fetcher
            .fetch(&parsed.source_url)
            .await
            .map_err(DispatchError::fetch)?;
        metrics.record_stage(Stage::Fetch, started.elapsed());
        *state = DispatchState::Fetched;

        let started = Instant::now();
        let processed = self
            .processor
            .process(image, &parsed.request)
            .await
            .map_err(DispatchError::process)?;
        metrics.record_stage(Stage::Process, started.elapsed());
        *state = DispatchState::Processed;

        let started = Instant::now();
        let format = parsed.request.output_format();
        let quality = EncoderQuality::with_quality(parsed.request.quality);
        let encoded = tokio::task::spawn_blocking(move || encode_image(&processed, format, quality))
            .await
            .map_err(|e| DispatchError::encode(format, e))?
            .map_err(|e| DispatchError::encode(format, e))?;
        metrics.record_stage(Stage::Encode, started.elapsed());
        *state = DispatchState::Encoded;

        Ok(TransformResponse {
            body: Bytes::from(encoded.data),
            format: encoded.format,
            content_type: encoded.content_type,
            source_url: parsed.source_url,
        })
    }
}
