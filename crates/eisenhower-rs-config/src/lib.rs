//! Configuration models and layered config loading.
//!
//! This crate owns the Eisenhower config schema, validation, layer merging,
//! and the host allow-list shared by the page agent and the CLI.

mod error;
mod hosts;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Host allow-list and custom URL validation.
pub use hosts::{HostAllowList, add_custom_url, normalize_custom_url, remove_custom_url};
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
