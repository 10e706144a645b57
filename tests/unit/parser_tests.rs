// Option grammar tests against the public parser API

use kagami::image_optimizer::OutputFormat;
use kagami::options::{parse, CropRegion, DefaultedField, ParseError};
use rstest::rstest;

#[test]
fn test_parsing_is_deterministic() {
    let path = "-300x200:smart:1:2:3:4/filters:blur(2):quality(90):format(webp)/example.com/cat.jpg";
    assert_eq!(parse(path), parse(path));
}

#[rstest]
#[case("300x200/example.com/a.png", 300, 200, false)]
#[case("-300x200/example.com/a.png", 300, 200, true)]
#[case("-100x0/example.com/a.png", 100, 0, true)]
#[case("0x0/example.com/a.png", 0, 0, false)]
#[case("100x-50/example.com/a.png", 100, 50, false)]
fn test_size_token(
    #[case] path: &str,
    #[case] width: u32,
    #[case] height: u32,
    #[case] flip: bool,
) {
    let parsed = parse(path).unwrap();
    assert_eq!(parsed.request.width, width);
    assert_eq!(parsed.request.height, height);
    assert_eq!(parsed.request.flip, flip);
}

#[test]
fn test_no_filters_gives_defaults() {
    let parsed = parse("300x200/example.com/cat.jpg").unwrap();
    assert!(parsed.request.filters.is_empty());
    assert_eq!(parsed.request.format, "");
    assert_eq!(parsed.request.output_format(), OutputFormat::Jpeg);
    assert_eq!(parsed.request.quality, 75);
    assert!(parsed.was_defaulted(DefaultedField::Quality));
    assert!(parsed.was_defaulted(DefaultedField::Format));
    assert!(!parsed.was_defaulted(DefaultedField::Size));
}

#[test]
fn test_filter_list_example() {
    let parsed = parse("300x200/filters:quality(90):format(webp)/example.com/cat.jpg").unwrap();
    let request = &parsed.request;

    assert_eq!((request.width, request.height), (300, 200));
    assert_eq!(request.quality, 90);
    assert_eq!(request.format, "webp");
    assert_eq!(request.output_format(), OutputFormat::WebP);
    assert_eq!(parsed.source_url, "https://example.com/cat.jpg");
}

#[test]
fn test_filter_crop_overrides_top_level_crop() {
    let parsed = parse("10:10:20:20/filters:crop(0,0,50,50)/example.com/a.png").unwrap();
    assert_eq!(parsed.request.crop_region, CropRegion::new(0, 0, 50, 50));
    assert!(!parsed.request.filters.contains_key("crop"));
}

#[test]
fn test_watermark_hidden_from_later_scans() {
    let parsed =
        parse("watermark(\"https://cdn.example.com/10x20:1:2:3:4.png\")/example.com/a.png")
            .unwrap();
    let request = &parsed.request;

    assert_eq!(
        request.watermark.as_deref(),
        Some("https://cdn.example.com/10x20:1:2:3:4.png")
    );
    assert_eq!((request.width, request.height), (0, 0));
    assert!(request.crop_region.is_empty());
    assert_eq!(parsed.source_url, "https://example.com/a.png");
}

#[test]
fn test_size_without_source_is_error() {
    assert_eq!(parse("300x200"), Err(ParseError::InvalidPathFormat));
}

#[test]
fn test_empty_path_is_error() {
    assert_eq!(parse(""), Err(ParseError::EmptyPath));
}

#[rstest]
#[case("0x0/example.com/a.png", "https://example.com/a.png")]
#[case("0x0/http://example.com/a.png", "http://example.com/a.png")]
#[case("0x0/https%3A%2F%2Fexample.com%2Fa.png", "https://example.com/a.png")]
#[case("0x0/ example.com/a.png ", "https://example.com/a.png")]
fn test_source_normalization(#[case] path: &str, #[case] expected: &str) {
    assert_eq!(parse(path).unwrap().source_url, expected);
}

#[test]
fn test_filter_without_param_is_one() {
    let parsed = parse("filters:grayscale:blur(x)/example.com/a.png").unwrap();
    assert_eq!(parsed.request.filter("grayscale"), Some(1.0));
    assert_eq!(parsed.request.filter("blur"), Some(1.0));
}

#[test]
fn test_empty_filter_tokens_skipped() {
    let parsed = parse("filters::invert::/example.com/a.png").unwrap();
    assert_eq!(parsed.request.filters.len(), 1);
    assert_eq!(parsed.request.filter("invert"), Some(1.0));
}

#[test]
fn test_format_is_lowercased_and_empty_param_ignored() {
    let parsed = parse("filters:format(PNG)/example.com/a.png").unwrap();
    assert_eq!(parsed.request.format, "png");

    let parsed = parse("filters:format()/example.com/a.png").unwrap();
    assert_eq!(parsed.request.format, "");
}

#[test]
fn test_smart_is_a_substring_match() {
    assert!(parse("300x300:smart/example.com/a.png").unwrap().request.smart_crop);
    assert!(!parse("300x300/example.com/a.png").unwrap().request.smart_crop);
}

#[test]
fn test_malformed_tokens_never_error() {
    let parsed = parse("axb:1:2:x:4:filters:(/example.com/a.png").unwrap();
    assert_eq!(parsed.request.width, 0);
    assert!(parsed.was_defaulted(DefaultedField::Size));
    assert!(parsed.was_defaulted(DefaultedField::CropRegion));
}
