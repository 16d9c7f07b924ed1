// tests/unit_config_test.rs

//! Unit tests for configuration loading, defaults, and validation.

use framelink::config::Config;
use std::fs;
use std::time::Duration;

#[test]
fn defaults_match_the_documented_values() {
    let config = Config::default();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.listen_port, 42042);
    assert_eq!(config.backlog, 250);
    assert_eq!(config.node_id, 0);
    assert!(!config.should_connect);
    assert!(config.anonymous);
    assert_eq!(config.log_level, "info");
    assert_eq!(config.max_frame_len, None);
    assert_eq!(config.idle_timeout, Duration::from_secs(15));
    assert_eq!(config.sweep_interval, Duration::from_secs(1));
    config.validate().unwrap();
}

#[test]
fn from_file_parses_a_full_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
host = "127.0.0.1"
listen_port = 9000
backlog = 64
node_id = 7
should_connect = true
anonymous = false
log_level = "debug"
max_frame_len = 1048576
idle_timeout = "30s"
sweep_interval = "500ms"
"#,
    )
    .unwrap();

    let config = Config::from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.listen_port, 9000);
    assert_eq!(config.backlog, 64);
    assert_eq!(config.node_id, 7);
    assert!(config.should_connect);
    assert!(!config.anonymous);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.max_frame_len, Some(1_048_576));
    assert_eq!(config.idle_timeout, Duration::from_secs(30));
    assert_eq!(config.sweep_interval, Duration::from_millis(500));
}

#[test]
fn from_file_fills_omitted_fields_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "listen_port = 5555\n").unwrap();

    let config = Config::from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(config.listen_port, 5555);
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.backlog, 250);
    assert_eq!(config.idle_timeout, Duration::from_secs(15));
}

#[test]
fn from_file_rejects_malformed_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "listen_port = \"not a number\"\n").unwrap();

    assert!(Config::from_file(path.to_str().unwrap()).is_err());
}

#[test]
fn load_or_default_tolerates_a_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does_not_exist.toml");

    let config = Config::load_or_default(path.to_str().unwrap()).unwrap();
    assert_eq!(config.listen_port, 42042);
}

#[test]
fn validate_rejects_inconsistent_values() {
    let mut config = Config {
        host: "   ".to_string(),
        ..Config::default()
    };
    assert!(config.validate().is_err());

    config = Config {
        backlog: 0,
        ..Config::default()
    };
    assert!(config.validate().is_err());

    config = Config {
        sweep_interval: Duration::ZERO,
        ..Config::default()
    };
    assert!(config.validate().is_err());

    config = Config {
        idle_timeout: Duration::ZERO,
        ..Config::default()
    };
    assert!(config.validate().is_err());

    config = Config {
        max_frame_len: Some(0),
        ..Config::default()
    };
    assert!(config.validate().is_err());

    config = Config {
        max_frame_len: Some(u32::MAX as usize + 1),
        ..Config::default()
    };
    assert!(config.validate().is_err());
}
