//! Layered configuration loader.
//!
//! Discovers configuration layers (system/user/cwd/runtime), validates schema,
//! merges them, and produces a final `EisenhowerConfig`.

mod schema;
mod stack;

#[cfg(test)]
mod tests;

use crate::{ConfigError, EisenhowerConfig};
use directories::UserDirs;
use log::{debug, info};
use regex::RegexBuilder;
use serde_json::Value;
use stack::LayerStack;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "eisenhower.json5";
/// Default config directory under the user home.
const DEFAULT_CONFIG_DIR: &str = ".eisenhower";

#[cfg(unix)]
/// Default system config path on Unix.
const SYSTEM_CONFIG_PATH: &str = "/etc/eisenhower/eisenhower.json5";
#[cfg(windows)]
/// Default system config path on Windows.
const SYSTEM_CONFIG_PATH: &str = "C:\\ProgramData\\eisenhower\\eisenhower.json5";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: EisenhowerConfig,
    /// Metadata for each layer considered during load.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// System-wide configuration.
    System,
    /// User-specific configuration.
    User,
    /// Current working directory configuration.
    Cwd,
    /// Runtime overrides (highest precedence).
    Runtime,
}

impl ConfigLayerSource {
    /// Name used in logs and validation messages.
    pub fn name(self) -> &'static str {
        match self {
            ConfigLayerSource::System => "system",
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Runtime => "runtime",
        }
    }
}

/// Metadata about a config layer.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    /// Layer origin (system, user, runtime, etc).
    pub source: ConfigLayerSource,
    /// Location on disk if present.
    pub path: Option<PathBuf>,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to resolve the cwd layer.
    pub cwd: PathBuf,
    /// Optional system config path (defaults to `/etc/eisenhower/eisenhower.json5` on Unix).
    pub system_config_path: Option<PathBuf>,
    /// Optional user config path (defaults to `~/.eisenhower/eisenhower.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last.
    pub runtime_paths: Vec<PathBuf>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: Some(PathBuf::from(SYSTEM_CONFIG_PATH)),
            user_config_path: UserDirs::new().map(|dirs| {
                dirs.home_dir()
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILE)
            }),
            runtime_paths: Vec::new(),
        }
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl EisenhowerConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value: Value = json5::from_str(&contents)?;
        config_from_value(value, "config")
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): system, user, cwd, runtime overrides.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = match options.cwd.canonicalize() {
            Ok(cwd) => cwd,
            Err(err) if err.kind() == ErrorKind::NotFound => options.cwd.clone(),
            Err(err) => return Err(err.into()),
        };
        debug!("normalized cwd for config load: {}", cwd.display());

        let mut stack = LayerStack::default();
        if let Some(path) = options.system_config_path.as_deref() {
            stack.push_optional(ConfigLayerSource::System, path)?;
        }
        if let Some(path) = options.user_config_path.as_deref() {
            stack.push_optional(ConfigLayerSource::User, path)?;
        }
        stack.push_optional(ConfigLayerSource::Cwd, &cwd.join(DEFAULT_CONFIG_FILE))?;
        for path in &options.runtime_paths {
            stack.push(ConfigLayerSource::Runtime, path)?;
        }

        let (merged, layers) = stack.finish();
        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.builtin.iter().any(|host| host.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "hosts.builtin entries must not be empty".to_string(),
            ));
        }
        if self.storage.max_age_days == 0 {
            return Err(ConfigError::Invalid(
                "storage.max_age_days must be positive".to_string(),
            ));
        }
        if self.storage.sweep_interval_hours == 0 {
            return Err(ConfigError::Invalid(
                "storage.sweep_interval_hours must be positive".to_string(),
            ));
        }
        if self.locale.fallback_label.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "locale.fallback_label must not be empty".to_string(),
            ));
        }
        check_pattern("locale.ticket_pattern", &self.locale.ticket_pattern)?;
        for (idx, prefix) in self.locale.subject_prefixes.iter().enumerate() {
            check_pattern(&format!("locale.subject_prefixes[{idx}]"), prefix)?;
        }
        Ok(())
    }
}

fn config_from_value(value: Value, label: &str) -> Result<EisenhowerConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: EisenhowerConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

fn check_pattern(path: &str, pattern: &str) -> Result<(), ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(|_| ())
        .map_err(|err| ConfigError::InvalidField {
            path: path.to_string(),
            message: err.to_string(),
        })
}
