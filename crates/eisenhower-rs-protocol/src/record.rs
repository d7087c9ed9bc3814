//! Persisted priority records.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Snapshot of one store namespace keyed by item id (or URL).
pub type PriorityMap = BTreeMap<String, PriorityRecord>;

/// Which independent namespace a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Mail items keyed by conversation id.
    Email,
    /// Web pages keyed by URL.
    WebPage,
}

impl ItemKind {
    pub const ALL: [ItemKind; 2] = [ItemKind::Email, ItemKind::WebPage];

    /// Storage namespace name.
    pub fn namespace(self) -> &'static str {
        match self {
            ItemKind::Email => "emailPriorities",
            ItemKind::WebPage => "webLinkPriorities",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Email => f.write_str("email"),
            ItemKind::WebPage => f.write_str("web"),
        }
    }
}

/// Priority assigned to one tagged item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityRecord {
    /// Stable identifier (conversation id, URL or derived hash).
    pub id: String,
    /// Cleaned subject or page title.
    #[serde(alias = "title")]
    pub subject: String,
    /// User supplied display override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_label: Option<String>,
    pub importance: i32,
    pub urgency: i32,
    /// Creation or last update time.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Origin host of a tagged web page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl PriorityRecord {
    /// Build a record for a freshly categorized item.
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        importance: i32,
        urgency: i32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            custom_label: None,
            importance,
            urgency,
            timestamp,
            hostname: None,
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Label to show: the custom label when set, otherwise the subject.
    pub fn display_label(&self) -> &str {
        match self.custom_label.as_deref() {
            Some(label) if !label.trim().is_empty() => label,
            _ => &self.subject,
        }
    }
}

/// Accept both RFC3339 strings and epoch milliseconds.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Millis(i64),
        Text(DateTime<Utc>),
    }

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(value) => Ok(value),
        RawTimestamp::Millis(millis) => Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {millis}"))),
    }
}
