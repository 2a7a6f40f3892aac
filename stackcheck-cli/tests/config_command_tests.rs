//! Integration tests for `stackcheck config` and the directory inputs `run` reads.
//!
//! Exercises configuration loading and catalog discovery with real files.

use std::fs;
use tempfile::TempDir;

use stackcheck_core::config::StackcheckConfig;
use stackcheck_harness::{HarnessError, ScenarioCatalog, load_variants};

#[tokio::test]
async fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("stackcheck.toml");

    let valid_config = r#"
[general]
log_level = "debug"

[harness]
commands_dir = "commands"
tests_dir = "tests"
ready_timeout_secs = 10

[target]
host = "127.0.0.1"
http_port = 8080
udp_port = 10001
"#;
    fs::write(&config_path, valid_config).expect("should write config");

    // When: Loading the config
    let config = StackcheckConfig::load(&config_path)
        .await
        .expect("valid config should load successfully");

    // Then: File values win over defaults, omitted values keep defaults
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.harness.ready_timeout_secs, 10);
    assert_eq!(config.harness.poll_interval_ms, 100);
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    // Given: A malformed TOML file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[harness\ncommands_dir = \"x\"\n").expect("should write bad config");

    // When: Loading the config
    let result = StackcheckConfig::load(&config_path).await;

    // Then: Should fail
    assert!(result.is_err(), "malformed TOML should fail to load");
}

#[tokio::test]
async fn test_config_validate_missing_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("absent.toml");

    assert!(StackcheckConfig::load(&config_path).await.is_err());
}

#[tokio::test]
async fn test_config_show_missing_file_uses_defaults() {
    // Given: No config file at all
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("absent.toml");

    // When: Loading the way `config show` and `run` do
    let config = StackcheckConfig::load_or_default(&config_path)
        .await
        .expect("defaults should be used");

    // Then: The stock layout is used
    assert_eq!(config.harness.commands_dir, "commands");
    assert_eq!(config.harness.tests_dir, "tests");
}

#[tokio::test]
async fn test_config_out_of_range_timeout_is_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("stackcheck.toml");
    fs::write(&config_path, "[harness]\nready_timeout_secs = 0\n").expect("write");

    let err = StackcheckConfig::load(&config_path)
        .await
        .expect_err("zero timeout is invalid");
    assert!(err.to_string().contains("ready_timeout_secs"));
}

#[tokio::test]
async fn test_config_show_round_trips_through_toml() {
    // Given: The effective default configuration rendered as TOML
    let rendered = toml::to_string_pretty(&StackcheckConfig::default()).expect("serialize");

    // When: Parsing it back
    let parsed = StackcheckConfig::parse(&rendered).expect("parse rendered config");

    // Then: It is still valid
    assert!(parsed.validate().is_ok());
}

#[tokio::test]
async fn test_commands_dir_loads_yaml_descriptors_only() {
    // Given: A commands directory with two descriptors and a stray file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let descriptor = |name: &str| {
        format!(
            "name: {name}\ncommand: {name}\nlist_command: docker ps -a\nup:\n  name: up\n  opts:\n    - name: -d\ndown:\n  name: down\n"
        )
    };
    fs::write(temp_dir.path().join("b-compose.yml"), descriptor("b-compose")).expect("write");
    fs::write(temp_dir.path().join("a-compose.yaml"), descriptor("a-compose")).expect("write");
    fs::write(temp_dir.path().join("README.md"), "not a descriptor").expect("write");

    // When: Loading variants
    let variants = load_variants(temp_dir.path()).await.expect("load");

    // Then: Only YAML files are read, in file name order
    let names: Vec<&str> = variants.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["a-compose", "b-compose"]);
}

#[tokio::test]
async fn test_commands_dir_with_broken_descriptor_fails_whole_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(temp_dir.path().join("broken.yml"), "name: [unterminated").expect("write");

    let result = load_variants(temp_dir.path()).await;
    assert!(matches!(result, Err(HarnessError::Descriptor { .. })));
}

#[tokio::test]
async fn test_tests_dir_catalog_ignores_hidden_and_files() {
    // Given: Scenario directories, a hidden directory and a plain file
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::create_dir(temp_dir.path().join("udp_port")).expect("mkdir");
    fs::create_dir(temp_dir.path().join("scaling")).expect("mkdir");
    fs::create_dir(temp_dir.path().join(".git")).expect("mkdir");
    fs::write(temp_dir.path().join("notes.txt"), "x").expect("write");

    // When: Loading the catalog
    let catalog = ScenarioCatalog::load(temp_dir.path()).await.expect("catalog");

    // Then: Only visible directories are scenarios
    let names: Vec<&str> = catalog.names().collect();
    assert_eq!(names, vec!["scaling", "udp_port"]);
}

#[tokio::test]
async fn test_missing_tests_dir_is_catalog_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let result = ScenarioCatalog::load(temp_dir.path().join("nope")).await;
    assert!(matches!(result, Err(HarnessError::Catalog { .. })));
}
