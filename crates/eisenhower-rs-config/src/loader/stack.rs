//! Config layers read from disk, merged in the order they are pushed.

use super::{ConfigLayer, ConfigLayerSource, schema};
use crate::ConfigError;
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub(super) struct LayerStack {
    layers: Vec<ConfigLayer>,
    merged: Map<String, Value>,
    seen: HashSet<PathBuf>,
}

impl LayerStack {
    /// Push the layer at `path` when the file exists.
    pub(super) fn push_optional(
        &mut self,
        source: ConfigLayerSource,
        path: &Path,
    ) -> Result<(), ConfigError> {
        if !path.exists() {
            debug!(
                "config layer absent (source={}, path={})",
                source.name(),
                path.display()
            );
            return Ok(());
        }
        self.push(source, path)
    }

    /// Push a layer that must be readable. A file already pushed under
    /// another source is skipped.
    pub(super) fn push(&mut self, source: ConfigLayerSource, path: &Path) -> Result<(), ConfigError> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !self.seen.insert(key) {
            debug!(
                "config layer already loaded (source={}, path={})",
                source.name(),
                path.display()
            );
            return Ok(());
        }
        let label = format!("{}({})", source.name(), path.display());
        let value: Value = json5::from_str(&fs::read_to_string(path)?)?;
        schema::validate_layer_schema(&value, &label)?;
        let Value::Object(overlay) = value else {
            return Err(ConfigError::InvalidField {
                path: label,
                message: "expected an object".to_string(),
            });
        };
        overlay_into(&mut self.merged, overlay);
        self.layers.push(ConfigLayer {
            source,
            path: Some(path.to_path_buf()),
        });
        debug!("config layer loaded (source={}, path={})", source.name(), path.display());
        Ok(())
    }

    /// The merged value and the layers that contributed to it.
    pub(super) fn finish(self) -> (Value, Vec<ConfigLayer>) {
        (Value::Object(self.merged), self.layers)
    }
}

/// Objects merge key by key; arrays and scalars replace what was there.
fn overlay_into(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                overlay_into(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
