//! User settings namespace.

use serde::{Deserialize, Serialize};

/// Settings persisted next to the priority namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub auto_categorize: bool,
    #[serde(default)]
    pub exchange_url: String,
    /// Extra mail hosts, stored as `scheme://host`.
    #[serde(default)]
    pub custom_exchange_urls: Vec<String>,
}
