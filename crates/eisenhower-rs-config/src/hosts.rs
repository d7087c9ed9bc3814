//! Host allow-list for the mail page agent.

use crate::ConfigError;
use log::{debug, warn};
use std::collections::BTreeSet;
use url::Url;

/// Validate a user supplied host URL and reduce it to `scheme://host`.
pub fn normalize_custom_url(input: &str) -> Result<String, ConfigError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ConfigError::InvalidUrl("url is empty".to_string()));
    }
    let parsed = Url::parse(input).map_err(|err| {
        ConfigError::InvalidUrl(format!(
            "{input}: {err} (use an http:// or https:// prefix)"
        ))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "{input}: unsupported scheme {}",
            parsed.scheme()
        )));
    }
    let Some(host) = parsed.host_str().filter(|host| !host.is_empty()) else {
        return Err(ConfigError::InvalidUrl(format!("{input}: missing host")));
    };
    Ok(format!("{}://{}", parsed.scheme(), host))
}

/// Append a validated URL to the custom list, rejecting duplicates.
///
/// Returns the normalized entry that was added.
pub fn add_custom_url(urls: &mut Vec<String>, input: &str) -> Result<String, ConfigError> {
    let normalized = normalize_custom_url(input)?;
    if urls.contains(&normalized) {
        return Err(ConfigError::DuplicateUrl(normalized));
    }
    urls.push(normalized.clone());
    debug!("custom host added (url={normalized}, total={})", urls.len());
    Ok(normalized)
}

/// Remove the entry at `index`; out of range indexes are ignored.
pub fn remove_custom_url(urls: &mut Vec<String>, index: usize) -> Option<String> {
    if index < urls.len() {
        Some(urls.remove(index))
    } else {
        None
    }
}

/// Exact-hostname allow-list built from builtin and custom hosts.
#[derive(Debug, Clone, Default)]
pub struct HostAllowList {
    hosts: BTreeSet<String>,
}

impl HostAllowList {
    /// Builtin entries are bare hostnames; custom entries are URLs.
    pub fn new(builtin: &[String], custom_urls: &[String]) -> Self {
        let mut hosts: BTreeSet<String> = builtin.iter().cloned().collect();
        for url in custom_urls {
            match Url::parse(url)
                .ok()
                .and_then(|parsed| parsed.host_str().map(str::to_string))
            {
                Some(host) => {
                    hosts.insert(host);
                }
                None => warn!("ignoring invalid custom host url: {url}"),
            }
        }
        Self { hosts }
    }

    /// Simple equality test, no pattern matching.
    pub fn is_allowed(&self, hostname: &str) -> bool {
        self.hosts.contains(hostname)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }
}
