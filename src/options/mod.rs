//! Option grammar for transform requests
//!
//! Request paths look like:
//!
//! ```text
//! /{OPTIONS}/{ENCODED_SOURCE_URL}
//! /300x200/example.com/cat.jpg
//! /-100x0:smart/filters:blur(2):quality(90):format(webp)/https%3A%2F%2Fexample.com%2Fa.png
//! /10:10:200:200/filters:crop(0,0,50,50)/example.com/a.png
//! /300x0:watermark("https://cdn.example.com/logo.png")/example.com/a.png
//! ```
//!
//! # Tokens
//!
//! | Token        | Shape                      | Effect                          |
//! |--------------|----------------------------|---------------------------------|
//! | size         | `-?\d+x-?\d+`              | width/height, negative width flips |
//! | smart crop   | substring `smart`          | content-aware crop              |
//! | crop region  | `\d+:\d+:\d+:\d+`          | explicit rectangle              |
//! | filter list  | `filters:` + `:`-joined    | `name` or `name(param)`         |
//! | watermark    | `watermark("URL")`         | overlay, removed before split   |
//!
//! A `filters:` list may also sit in its own segment after the first `/`;
//! such segments belong to the options, not to the source URL.
//!
//! Unknown or malformed fragments are ignored and the affected field keeps
//! its default.

pub mod params;
pub mod parser;
pub mod token;

pub use params::{CropRegion, DefaultedField, ParsedRequest, TransformRequest};
pub use parser::{normalize_source_url, parse, ParseError, RequestBuilder};
pub use token::{extract_watermark, tokenize, FilterToken, Token};
