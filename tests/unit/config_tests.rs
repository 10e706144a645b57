// Configuration loading tests

use kagami::config::Config;
use kagami::logging::LogFormat;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(yaml.as_bytes()).expect("Failed to write config");
    file
}

#[test]
fn test_load_full_config_from_file() {
    let file = write_config(
        r#"
server:
  address: "127.0.0.1"
  port: 9090
  threads: 2
  max_concurrent_requests: 64
fetch:
  timeout_secs: 5
  max_source_bytes: 1048576
  user_agent: "kagami-test"
transform:
  max_width: 1024
  max_height: 768
watermark:
  opacity: 0.8
  margin: 4
  cache_entries: 10
  cache_ttl_secs: 60
logging:
  format: pretty
  level: debug
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.server.listen_addr(), "127.0.0.1:9090");
    assert_eq!(config.server.max_concurrent_requests, 64);
    assert_eq!(config.fetch.timeout_secs, 5);
    assert_eq!(config.fetch.user_agent, "kagami-test");
    assert_eq!(config.transform.max_width, 1024);
    assert_eq!(config.watermark.style().margin, 4);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_load_missing_file_fails() {
    let err = Config::load("/nonexistent/kagami/config.yaml").unwrap_err();
    assert!(err.contains("Failed to read config file"));
}

#[test]
fn test_load_rejects_invalid_values() {
    let file = write_config("watermark:\n  opacity: 2.0\n");
    let err = Config::load(file.path()).unwrap_err();
    assert!(err.contains("opacity"));

    let file = write_config("fetch:\n  timeout_secs: 0\n");
    let err = Config::load(file.path()).unwrap_err();
    assert!(err.contains("timeout_secs"));
}

#[test]
fn test_load_rejects_malformed_yaml() {
    let file = write_config("server: [not, a, map]\n");
    assert!(Config::load(file.path()).is_err());
}

#[test]
fn test_env_substitution_from_file() {
    std::env::set_var("KAGAMI_UNIT_TEST_PORT", "7070");
    let file = write_config("server:\n  port: ${KAGAMI_UNIT_TEST_PORT}\n");
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.server.port, 7070);
}
