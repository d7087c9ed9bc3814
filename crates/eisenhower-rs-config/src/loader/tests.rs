//! Tests for layered configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options that never touch the real system or user layers.
fn isolated_options(cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = None;
    options.user_config_path = None;
    options
}

/// Verify that a minimal config parses with defaults.
#[test]
fn parse_minimal_config() {
    let config = EisenhowerConfig::load_from_str("{}").expect("config");
    assert_eq!(config.storage.max_age_days, 30);
    assert_eq!(config.timing.debounce_ms, 500);
    assert_eq!(config.timing.retry_attempts, 2);
    assert_eq!(config.timing.retry_backoff_ms, 300);
    assert_eq!(config.hosts.builtin.len(), 4);
    assert_eq!(config.locale.subject_prefixes.len(), 12);
}

#[test]
fn storage_durations_follow_the_configured_counts() {
    let config = EisenhowerConfig::load_from_str("{ storage: { max_age_days: 7, sweep_interval_hours: 2 } }")
        .expect("config");
    assert_eq!(config.storage.max_age(), chrono::Duration::days(7));
    assert_eq!(config.storage.sweep_interval(), std::time::Duration::from_secs(7200));
}

/// Reject unexpected top-level config keys.
#[test]
fn rejects_unknown_top_level_key() {
    let err = EisenhowerConfig::load_from_str(r#"{ unexpected: true }"#).unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

/// Reject wrongly typed timing values with a qualified path.
#[test]
fn rejects_negative_timing() {
    let err = EisenhowerConfig::load_from_str(r#"{ timing: { debounce_ms: -5 } }"#).unwrap_err();
    assert!(format!("{err}").contains("timing.debounce_ms"));
}

#[test]
fn rejects_uncompilable_ticket_pattern() {
    let err =
        EisenhowerConfig::load_from_str(r#"{ locale: { ticket_pattern: "([" } }"#).unwrap_err();
    assert!(format!("{err}").contains("locale.ticket_pattern"));
}

#[test]
fn rejects_zero_retention() {
    let err = EisenhowerConfig::load_from_str(r#"{ storage: { max_age_days: 0 } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

/// Ensure later layers override earlier ones key by key.
#[test]
fn layered_config_prefers_runtime_over_cwd_over_user() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("work");
    fs::create_dir_all(&cwd).expect("cwd");

    let user_config = root.join("user.json5");
    write_json5(
        &user_config,
        "{ timing: { debounce_ms: 700, badge_cooldown_ms: 1500 }, storage: { max_age_days: 10 } }",
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        "{ timing: { debounce_ms: 800 } }",
    );
    let runtime = root.join("runtime.json5");
    write_json5(&runtime, "{ storage: { max_age_days: 5 } }");

    let mut options = isolated_options(&cwd).with_runtime_path(&runtime);
    options.user_config_path = Some(user_config);

    let layered = EisenhowerConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.timing.debounce_ms, 800);
    assert_eq!(layered.config.timing.badge_cooldown_ms, 1500);
    assert_eq!(layered.config.storage.max_age_days, 5);
    assert_eq!(
        layered
            .layers
            .iter()
            .map(|layer| layer.source)
            .collect::<Vec<_>>(),
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Runtime
        ]
    );
}

/// Arrays are replaced by later layers, not appended.
#[test]
fn arrays_replace_rather_than_merge() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path();
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ hosts: { builtin: ["mail.example.com"] } }"#,
    );
    let layered =
        EisenhowerConfig::load_layered_with_options(isolated_options(cwd)).expect("layered");
    assert_eq!(
        layered.config.hosts.builtin,
        vec!["mail.example.com".to_string()]
    );
}

/// Missing optional layers are skipped, missing runtime layers fail.
#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path();
    let layered =
        EisenhowerConfig::load_layered_with_options(isolated_options(cwd)).expect("layered");
    assert!(layered.layers.is_empty());

    let options = isolated_options(cwd).with_runtime_path(cwd.join("missing.json5"));
    let err = EisenhowerConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}

/// A layer pointing at the cwd file is not loaded twice.
#[test]
fn duplicate_layers_are_loaded_once() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path();
    let cwd_file = cwd.join(DEFAULT_CONFIG_FILE);
    write_json5(&cwd_file, "{ timing: { debounce_ms: 900 } }");
    let mut options = isolated_options(cwd);
    options.user_config_path = Some(cwd_file);
    let layered = EisenhowerConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::User);
}
