//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Configuration loading and saving
//! - Defaults for missing files and missing keys
//! - Conversion of loaded settings into retrieval options

use basepeak::ConfigManager;
use basepeak::models::{RetrievalOptions, UserConfig};
use camino::Utf8PathBuf;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

fn no_env() -> config::Environment {
    ConfigManager::environment().source(Some(config::Map::new()))
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), config_path.as_path());
}

#[test]
fn test_save_writes_yaml_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    manager.save_user_config(&UserConfig::default()).unwrap();

    let contents = fs::read_to_string(manager.user_config_path()).unwrap();
    assert!(contents.contains("redraw_interval_ms: 100"));
    assert!(contents.contains("log_prefix: basepeak"));
}

#[test]
fn test_hand_written_partial_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(
        manager.user_config_path(),
        "retrieval:\n  retention_time_scale: 60\nlogging:\n  console_output: false\n",
    )
    .unwrap();

    let config = manager.load_user_config_with(no_env()).unwrap();

    assert_eq!(config.retrieval.retention_time_scale, 60.0);
    assert_eq!(config.retrieval.redraw_interval_ms, 100);
    assert!(!config.logging.console_output);
    assert_eq!(config.logging.log_dir, "logs");
}

#[test]
fn test_malformed_file_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(manager.user_config_path(), "retrieval: [unclosed").unwrap();

    assert!(manager.load_user_config_with(no_env()).is_err());
}

#[test]
fn test_loaded_settings_to_options() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = UserConfig::default();
    config.retrieval.redraw_interval_ms = 500;
    manager.save_user_config(&config).unwrap();

    let loaded = manager.load_user_config_with(no_env()).unwrap();
    let options = RetrievalOptions::from(&loaded.retrieval);

    assert_eq!(options.redraw_interval, Duration::from_millis(500));
    assert_eq!(options.retention_time_scale, 1000.0);
}
