//! Unit tests for configuration resolution and graceful degradation
//!
//! Tests cover:
//! - Missing TOML files SHALL NOT cause termination (defaults are used)
//! - Priority order: CLI/ENV overrides → TOML → compiled defaults
//! - Unparsable TOML is reported as a configuration error
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate RCP_CONFIG are marked with #[serial].

use rcp_common::config::{
    config_file_path, load_toml_config, parse_toml_config, ConfigOverrides, TomlConfig,
    CONFIG_ENV_VAR,
};
use rcp_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_compiled_defaults() {
    let config = TomlConfig::default();

    assert_eq!(config.bind_address, "127.0.0.1");
    assert_eq!(config.port, 5000);
    assert_eq!(config.results_dir, PathBuf::from("results"));
    assert_eq!(config.max_upload_bytes, 64 * 1024 * 1024);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_full_toml_parses() {
    let config = parse_toml_config(
        r#"
        bind_address = "0.0.0.0"
        port = 8080
        results_dir = "/var/lib/recipe-audit/results"
        max_upload_bytes = 1048576

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.bind_address, "0.0.0.0");
    assert_eq!(config.port, 8080);
    assert_eq!(
        config.results_dir,
        PathBuf::from("/var/lib/recipe-audit/results")
    );
    assert_eq!(config.max_upload_bytes, 1_048_576);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_partial_toml_keeps_defaults_for_missing_keys() {
    let config = parse_toml_config("port = 9000\n").unwrap();

    assert_eq!(config.port, 9000);
    assert_eq!(config.bind_address, "127.0.0.1");
    assert_eq!(config.results_dir, PathBuf::from("results"));
}

#[test]
fn test_overrides_beat_toml_values() {
    let config = parse_toml_config("port = 9000\nresults_dir = \"from-toml\"\n").unwrap();

    let resolved = config.with_overrides(ConfigOverrides {
        port: Some(7000),
        log_level: Some("warn".to_string()),
        ..ConfigOverrides::default()
    });

    assert_eq!(resolved.port, 7000, "CLI/ENV port should win over TOML");
    assert_eq!(resolved.results_dir, PathBuf::from("from-toml"));
    assert_eq!(resolved.logging.level, "warn");
}

#[test]
fn test_socket_addr() {
    let config = TomlConfig::default();
    let addr = config.socket_addr().unwrap();
    assert_eq!(addr.to_string(), "127.0.0.1:5000");
}

#[test]
fn test_invalid_toml_is_config_error() {
    let result = parse_toml_config("port = \"not a number\"");
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_missing_explicit_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let config = load_toml_config(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_env_var_selects_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = 6123\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, &path);
    let located = config_file_path(None);
    let config = load_toml_config(None);
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(located, Some(path));
    assert_eq!(config.unwrap().port, 6123);
}

#[test]
#[serial]
fn test_explicit_path_beats_env_var() {
    let dir = TempDir::new().unwrap();
    let explicit = dir.path().join("explicit.toml");
    let from_env = dir.path().join("env.toml");

    env::set_var(CONFIG_ENV_VAR, &from_env);
    let located = config_file_path(Some(&explicit));
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(located, Some(explicit));
}

#[test]
#[serial]
fn test_unparsable_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();

    match load_toml_config(Some(&path)) {
        Err(Error::Config(msg)) => assert!(msg.contains("broken.toml"), "got: {}", msg),
        other => panic!("expected config error, got {:?}", other),
    }
}
