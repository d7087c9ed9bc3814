//! Structural checks on a raw config layer, run before deserializing so that
//! errors name the offending key.

use crate::ConfigError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
enum Kind {
    Text,
    Count,
    TextList,
}

type Section = (&'static str, &'static [(&'static str, Kind)]);

const SECTIONS: &[Section] = &[
    ("hosts", &[("builtin", Kind::TextList)]),
    (
        "storage",
        &[
            ("path", Kind::Text),
            ("max_age_days", Kind::Count),
            ("sweep_interval_hours", Kind::Count),
        ],
    ),
    (
        "timing",
        &[
            ("initial_scan_delay_ms", Kind::Count),
            ("observer_start_delay_ms", Kind::Count),
            ("debounce_ms", Kind::Count),
            ("badge_cooldown_ms", Kind::Count),
            ("retry_attempts", Kind::Count),
            ("retry_backoff_ms", Kind::Count),
            ("selection_settle_ms", Kind::Count),
            ("open_highlight_ms", Kind::Count),
        ],
    ),
    (
        "locale",
        &[
            ("subject_prefixes", Kind::TextList),
            ("status_words", Kind::TextList),
            ("noise_words", Kind::TextList),
            ("ticket_pattern", Kind::Text),
            ("fallback_label", Kind::Text),
            ("empty_subject_label", Kind::Text),
            ("web_title_noise", Kind::Text),
            ("untitled_page_label", Kind::Text),
        ],
    ),
];

/// Validate a single config layer; `layer` prefixes every error path.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let root = as_object(value, layer, "root")?;
    for (key, value) in root {
        if key == "$schema" {
            check(value, Kind::Text, layer, key)?;
            continue;
        }
        let Some((section, fields)) = SECTIONS.iter().find(|(name, _)| *name == key.as_str()) else {
            return Err(invalid(layer, key, "unknown key"));
        };
        for (field, value) in as_object(value, layer, section)? {
            let path = format!("{section}.{field}");
            let Some((_, kind)) = fields.iter().find(|(name, _)| *name == field.as_str()) else {
                return Err(invalid(layer, &path, "unknown key"));
            };
            check(value, *kind, layer, &path)?;
        }
    }
    Ok(())
}

fn as_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| invalid(layer, path, "expected object"))
}

fn check(value: &Value, kind: Kind, layer: &str, path: &str) -> Result<(), ConfigError> {
    match kind {
        Kind::Text if value.is_string() => Ok(()),
        Kind::Text => Err(invalid(layer, path, "expected string")),
        Kind::Count if value.is_u64() => Ok(()),
        Kind::Count => Err(invalid(layer, path, "expected non-negative integer")),
        Kind::TextList => {
            let items = value
                .as_array()
                .ok_or_else(|| invalid(layer, path, "expected array"))?;
            match items.iter().position(|item| !item.is_string()) {
                Some(idx) => Err(invalid(layer, &format!("{path}[{idx}]"), "expected string")),
                None => Ok(()),
            }
        }
    }
}

fn invalid(layer: &str, path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}
