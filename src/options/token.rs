//! Option segment tokenizer
//!
//! Turns the loosely structured option segment into a sequence of typed
//! tokens. The tokenizer only recognizes shapes; it never decides which
//! token wins. That is the reducer's job (see `parser::RequestBuilder`).
//!
//! Token order in the output is fixed: size, smart crop, crop region, then
//! the filter list in the order written.

use regex::Regex;
use std::sync::OnceLock;

use super::params::CropRegion;

/// Marker introducing the `:`-separated filter list.
pub const FILTERS_MARKER: &str = "filters:";

/// Literal that enables smart cropping wherever it appears.
pub const SMART_MARKER: &str = "smart";

/// A typed fragment of the option segment.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `WxH`, sign of the width moved into `flip`
    Size { width: u32, height: u32, flip: bool },
    /// `smart` substring
    SmartCrop,
    /// `x0:y0:x1:y1`
    CropRegion(CropRegion),
    /// One entry of the filter list
    Filter(FilterToken),
}

/// `name` or `name(param)` from the filter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterToken {
    pub name: String,
    /// Trimmed text inside the first parenthesized group
    pub param: Option<String>,
}

impl FilterToken {
    /// Numeric value of the parameter, 1.0 when absent or not a number.
    pub fn value(&self) -> f64 {
        self.param
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .unwrap_or(1.0)
    }
}

fn watermark_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"watermark\("([^"]+)"\)"#).expect("watermark pattern is valid")
    })
}

fn size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(-?[0-9]+)x(-?[0-9]+)").expect("size pattern is valid"))
}

fn crop_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([0-9]+):([0-9]+):([0-9]+):([0-9]+)").expect("crop pattern is valid")
    })
}

fn param_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\((.*?)\)").expect("param pattern is valid"))
}

/// Remove the first `watermark("URL")` from `path`.
///
/// Returns the captured URL and the path without the matched text.
pub fn extract_watermark(path: &str) -> (Option<String>, String) {
    let Some(caps) = watermark_pattern().captures(path) else {
        return (None, path.to_string());
    };

    // Both groups exist whenever the pattern matched
    let (Some(whole), Some(url)) = (caps.get(0), caps.get(1)) else {
        return (None, path.to_string());
    };

    let mut stripped = String::with_capacity(path.len() - whole.len());
    stripped.push_str(&path[..whole.start()]);
    stripped.push_str(&path[whole.end()..]);

    (Some(url.as_str().to_string()), stripped)
}

/// Tokenize an option segment.
pub fn tokenize(segment: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    if let Some(size) = scan_size(segment) {
        tokens.push(size);
    }

    if segment.contains(SMART_MARKER) {
        tokens.push(Token::SmartCrop);
    }

    if let Some(region) = scan_crop_region(segment) {
        tokens.push(Token::CropRegion(region));
    }

    if let Some((_, list)) = segment.split_once(FILTERS_MARKER) {
        tokens.extend(
            list.split(':')
                .filter(|raw| !raw.is_empty())
                .map(|raw| Token::Filter(scan_filter(raw))),
        );
    }

    tokens
}

/// Only the first `WxH` occurrence is considered; if its numbers do not fit
/// the token is dropped rather than retried further along the segment.
fn scan_size(segment: &str) -> Option<Token> {
    let caps = size_pattern().captures(segment)?;
    let width: i64 = caps.get(1)?.as_str().parse().ok()?;
    let height: i64 = caps.get(2)?.as_str().parse().ok()?;

    Some(Token::Size {
        width: u32::try_from(width.unsigned_abs()).ok()?,
        height: u32::try_from(height.unsigned_abs()).ok()?,
        flip: width < 0,
    })
}

fn scan_crop_region(segment: &str) -> Option<CropRegion> {
    let caps = crop_pattern().captures(segment)?;
    let mut coords = [0u32; 4];
    for (i, coord) in coords.iter_mut().enumerate() {
        *coord = caps.get(i + 1)?.as_str().parse().ok()?;
    }
    Some(CropRegion::from_array(coords))
}

fn scan_filter(raw: &str) -> FilterToken {
    let name = raw.split('(').next().unwrap_or_default().to_string();

    // The watermark parameter is a URL; it is never read as a value
    let param = if name == "watermark" {
        None
    } else {
        param_pattern()
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    };

    FilterToken { name, param }
}
