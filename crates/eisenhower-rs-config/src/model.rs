//! Configuration schema for Eisenhower.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root config for the Eisenhower tools.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EisenhowerConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub hosts: HostsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub locale: LocaleConfig,
}

impl EisenhowerConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> EisenhowerConfigBuilder {
        EisenhowerConfigBuilder::new()
    }
}

/// Builder for assembling an `EisenhowerConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct EisenhowerConfigBuilder {
    config: EisenhowerConfig,
}

impl EisenhowerConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: EisenhowerConfig::default(),
        }
    }

    pub fn hosts(mut self, hosts: HostsConfig) -> Self {
        self.config.hosts = hosts;
        self
    }

    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.config.timing = timing;
        self
    }

    pub fn locale(mut self, locale: LocaleConfig) -> Self {
        self.config.locale = locale;
        self
    }

    /// Finalize and return the built `EisenhowerConfig`.
    pub fn build(self) -> EisenhowerConfig {
        self.config
    }
}

/// Mail hosts the page agent activates on without user configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostsConfig {
    #[serde(default = "default_builtin_hosts")]
    pub builtin: Vec<String>,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            builtin: default_builtin_hosts(),
        }
    }
}

fn default_builtin_hosts() -> Vec<String> {
    [
        "xch.ulyssys.hu",
        "outlook.office365.com",
        "outlook.office.com",
        "outlook.live.com",
    ]
    .iter()
    .map(|host| host.to_string())
    .collect()
}

/// Persistence location and retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store root; defaults to `~/.eisenhower/store`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    #[serde(default = "default_sweep_interval_hours")]
    pub sweep_interval_hours: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_age_days: default_max_age_days(),
            sweep_interval_hours: default_sweep_interval_hours(),
        }
    }
}

impl StorageConfig {
    /// Records older than this are removed by the sweep.
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.max_age_days))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.sweep_interval_hours) * 60 * 60)
    }
}

fn default_max_age_days() -> u32 {
    30
}

fn default_sweep_interval_hours() -> u32 {
    24
}

/// Delays and windows used by the coordination layer, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Wait after page load before the first scan.
    #[serde(default = "default_initial_scan_delay_ms")]
    pub initial_scan_delay_ms: u64,
    /// Wait after page load before watching mutations.
    #[serde(default = "default_observer_start_delay_ms")]
    pub observer_start_delay_ms: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_badge_cooldown_ms")]
    pub badge_cooldown_ms: u64,
    /// Extra attempts after the first dispatch fails.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Wait after a selection click for the reading pane to follow.
    #[serde(default = "default_selection_settle_ms")]
    pub selection_settle_ms: u64,
    /// How long an opened item stays flashed.
    #[serde(default = "default_open_highlight_ms")]
    pub open_highlight_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            initial_scan_delay_ms: default_initial_scan_delay_ms(),
            observer_start_delay_ms: default_observer_start_delay_ms(),
            debounce_ms: default_debounce_ms(),
            badge_cooldown_ms: default_badge_cooldown_ms(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            selection_settle_ms: default_selection_settle_ms(),
            open_highlight_ms: default_open_highlight_ms(),
        }
    }
}

impl TimingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn badge_cooldown(&self) -> Duration {
        Duration::from_millis(self.badge_cooldown_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn initial_scan_delay(&self) -> Duration {
        Duration::from_millis(self.initial_scan_delay_ms)
    }

    pub fn observer_start_delay(&self) -> Duration {
        Duration::from_millis(self.observer_start_delay_ms)
    }

    pub fn selection_settle(&self) -> Duration {
        Duration::from_millis(self.selection_settle_ms)
    }

    pub fn open_highlight(&self) -> Duration {
        Duration::from_millis(self.open_highlight_ms)
    }
}

fn default_initial_scan_delay_ms() -> u64 {
    1000
}

fn default_observer_start_delay_ms() -> u64 {
    2000
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_badge_cooldown_ms() -> u64 {
    1000
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    300
}

fn default_selection_settle_ms() -> u64 {
    300
}

fn default_open_highlight_ms() -> u64 {
    500
}

/// Locale specific literals used by subject extraction and cleaning.
///
/// `subject_prefixes` and `ticket_pattern` are regular expressions matched
/// case-insensitively; prefixes are anchored at the start of the subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    #[serde(default = "default_subject_prefixes")]
    pub subject_prefixes: Vec<String>,
    /// Words marking an aria-label field as a status, not a subject.
    #[serde(default = "default_status_words")]
    pub status_words: Vec<String>,
    /// Exact texts never taken as a subject.
    #[serde(default = "default_noise_words")]
    pub noise_words: Vec<String>,
    #[serde(default = "default_ticket_pattern")]
    pub ticket_pattern: String,
    /// Prefix of the generated label when no subject is found.
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,
    #[serde(default = "default_empty_subject_label")]
    pub empty_subject_label: String,
    /// Editor affordance text stripped from web page titles.
    #[serde(default = "default_web_title_noise")]
    pub web_title_noise: String,
    #[serde(default = "default_untitled_page_label")]
    pub untitled_page_label: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            subject_prefixes: default_subject_prefixes(),
            status_words: default_status_words(),
            noise_words: default_noise_words(),
            ticket_pattern: default_ticket_pattern(),
            fallback_label: default_fallback_label(),
            empty_subject_label: default_empty_subject_label(),
            web_title_noise: default_web_title_noise(),
            untitled_page_label: default_untitled_page_label(),
        }
    }
}

fn default_subject_prefixes() -> Vec<String> {
    [
        r"\[Piszkozat\]\s*",
        r"Draft:\s*",
        r"\[Draft\]\s*",
        r"RE:\s*",
        r"FW:\s*",
        r"FWD:\s*",
        r"VÁL:\s*",
        r"TOV:\s*",
        r"\[EXTERNAL\]\s*",
        r"\[KÜLSŐ\]\s*",
        r"Unread,?\s*",
        r"Olvasatlan,?\s*",
    ]
    .iter()
    .map(|prefix| prefix.to_string())
    .collect()
}

fn default_status_words() -> Vec<String> {
    ["olvasatlan", "unread", "draft", "piszkozat"]
        .iter()
        .map(|word| word.to_string())
        .collect()
}

fn default_noise_words() -> Vec<String> {
    ["piszkozat", "draft"]
        .iter()
        .map(|word| word.to_string())
        .collect()
}

fn default_ticket_pattern() -> String {
    r"\[JIRA\]|\(.*-\d+\)|#\d+|Assigned:|Updated:".to_string()
}

fn default_fallback_label() -> String {
    "Item".to_string()
}

fn default_empty_subject_label() -> String {
    "No subject".to_string()
}

fn default_web_title_noise() -> String {
    "Click to edit".to_string()
}

fn default_untitled_page_label() -> String {
    "Untitled Page".to_string()
}
