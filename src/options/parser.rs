//! Option grammar parser
//!
//! `parse` is a pure function: no I/O, no logging, no shared state. It is
//! safe to call concurrently from any number of request tasks.
//!
//! Extraction order:
//! 1. `watermark("URL")` is removed from the whole path
//! 2. the path is split on the first `/` into options and source; while the
//!    source still starts with `filters:`, that segment is folded back into
//!    the options
//! 3. the source is percent-decoded and given a scheme
//! 4. the option segment is tokenized and reduced into a `TransformRequest`

use thiserror::Error;

use super::params::{CropRegion, DefaultedField, ParsedRequest, TransformRequest};
use super::token::{extract_watermark, tokenize, FilterToken, Token, FILTERS_MARKER};
use crate::constants::DEFAULT_QUALITY;
use crate::image_optimizer::format::OutputFormat;

/// The only hard failures of the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty path")]
    EmptyPath,
    #[error("invalid URL format, must be /OPTIONS/ENCODED_URL")]
    InvalidPathFormat,
}

/// Parse a raw request path (without the leading `/`).
///
/// # Errors
///
/// `EmptyPath` for an empty input, `InvalidPathFormat` when the path has no
/// `/` separating the option segment from the source segment. Malformed
/// individual tokens are never errors.
pub fn parse(raw_path: &str) -> Result<ParsedRequest, ParseError> {
    if raw_path.is_empty() {
        return Err(ParseError::EmptyPath);
    }

    let (watermark, path) = extract_watermark(raw_path);

    let (option_segment, source_segment) = split_segments(&path)?;

    let source_url = normalize_source_url(source_segment);

    let mut builder = RequestBuilder::new();
    for token in tokenize(&option_segment) {
        builder.apply(token);
    }
    if let Some(url) = watermark {
        builder.watermark(url);
    }

    let (request, defaulted) = builder.finish();

    Ok(ParsedRequest {
        request,
        source_url,
        defaulted,
    })
}

/// Split off the option text, absorbing any leading `filters:` segments of
/// the remainder so `300x200/filters:quality(90)/host/a.jpg` keeps its
/// filters out of the source URL.
fn split_segments(path: &str) -> Result<(String, &str), ParseError> {
    let (first, mut source) = path
        .split_once('/')
        .ok_or(ParseError::InvalidPathFormat)?;
    let mut options = first.to_string();

    while source.starts_with(FILTERS_MARKER) {
        let (segment, rest) = source
            .split_once('/')
            .ok_or(ParseError::InvalidPathFormat)?;

        // A second marker would show up as a filter named "filters"
        let extra = if options.contains(FILTERS_MARKER) {
            &segment[FILTERS_MARKER.len()..]
        } else {
            segment
        };
        if !options.is_empty() {
            options.push(':');
        }
        options.push_str(extra);
        source = rest;
    }

    Ok((options, source))
}

/// Percent-decode (keeping the raw text on failure), trim, and make sure the
/// URL carries a scheme.
pub fn normalize_source_url(segment: &str) -> String {
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());

    let trimmed = decoded.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Single-pass reducer from tokens to a `TransformRequest`.
///
/// Tokens are applied in order and a later token overwrites what an earlier
/// one set. Because the tokenizer emits the top-level crop region before the
/// filter list, `filters:crop(...)` takes precedence over `x0:y0:x1:y1`.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    request: TransformRequest,
    // Raw quality before defaulting; the filter may carry any float
    quality: Option<i64>,
    size_set: bool,
    crop_set: bool,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, token: Token) {
        match token {
            Token::Size {
                width,
                height,
                flip,
            } => {
                self.request.width = width;
                self.request.height = height;
                self.request.flip = flip;
                self.size_set = true;
            }
            Token::SmartCrop => self.request.smart_crop = true,
            Token::CropRegion(region) => {
                self.request.crop_region = region;
                self.crop_set = true;
            }
            Token::Filter(filter) => self.apply_filter(filter),
        }
    }

    pub fn watermark(&mut self, url: String) {
        self.request.watermark = Some(url);
    }

    fn apply_filter(&mut self, filter: FilterToken) {
        if filter.name.is_empty() {
            return;
        }

        let value = filter.value();

        if filter.name == "crop" {
            self.apply_crop_filter(filter.param.as_deref().unwrap_or_default());
            return;
        }

        match filter.name.as_str() {
            "format" => {
                if let Some(param) = filter.param.as_deref().filter(|p| !p.is_empty()) {
                    self.request.format = param.to_lowercase();
                }
            }
            // `as` saturates, so huge or non-finite values cannot wrap around
            "quality" => self.quality = Some(value as i64),
            _ => {}
        }

        self.request.filters.insert(filter.name, value);
    }

    /// `crop(x0,y0,x1,y1)`: needs exactly four parts; each part that parses
    /// replaces the matching coordinate.
    fn apply_crop_filter(&mut self, param: &str) {
        let parts: Vec<&str> = param.split(',').collect();
        if parts.len() != 4 {
            return;
        }

        let mut coords = self.request.crop_region.as_array();
        for (coord, part) in coords.iter_mut().zip(parts) {
            if let Ok(v) = part.trim().parse::<u32>() {
                *coord = v;
                self.crop_set = true;
            }
        }
        self.request.crop_region = CropRegion::from_array(coords);
    }

    /// Apply defaults and report which fields kept them.
    pub fn finish(mut self) -> (TransformRequest, Vec<DefaultedField>) {
        let mut defaulted = Vec::new();

        if !self.size_set {
            defaulted.push(DefaultedField::Size);
        }
        if !self.crop_set {
            defaulted.push(DefaultedField::CropRegion);
        }
        if OutputFormat::from_name(&self.request.format).is_none() {
            defaulted.push(DefaultedField::Format);
        }

        self.request.quality = match self.quality {
            Some(q) if q > 0 => u32::try_from(q).unwrap_or(u32::MAX),
            _ => {
                defaulted.push(DefaultedField::Quality);
                DEFAULT_QUALITY
            }
        };

        if self.request.watermark.is_none() {
            defaulted.push(DefaultedField::Watermark);
        }

        (self.request, defaulted)
    }
}
