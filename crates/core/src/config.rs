//! Behavior tracking configuration. Loaded from environment variables with
//! the prefix `FREEMIUM_ANALYTICS__`, with serde defaults matching the
//! shipped site configuration.

use serde::Deserialize;

use crate::error::TelemetryResult;

/// Default storage namespace applied when the configured prefix is blank.
pub const DEFAULT_STORAGE_PREFIX: &str = "freemium_analytics_";

/// Configuration surface consumed by the behavior telemetry core.
#[derive(Debug, Clone, Deserialize)]
pub struct BehaviorConfig {
    /// Master on/off switch for the whole tracking core.
    #[serde(default = "default_enable_tracking")]
    pub enable_tracking: bool,
    /// If true and the visitor's browser reports Do-Not-Track, the core is inert.
    #[serde(default = "default_respect_dnt")]
    pub respect_dnt: bool,
    /// Idle threshold in milliseconds.
    #[serde(default = "default_inactivity_timeout_ms")]
    pub inactivity_timeout_ms: u64,
    /// Scroll depth milestones, as a list or a comma-separated string.
    #[serde(default = "default_scroll_milestones")]
    pub scroll_milestones: MilestonesSetting,
    /// Click tracking selector allowlist, as a list or a comma-separated string.
    #[serde(default = "default_click_selectors")]
    pub click_selectors: SelectorsSetting,
    /// Namespace prefix for every storage key.
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,
    /// Session retention window in days; `<= 0` disables pruning.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

/// Milestone setting as configured: either a list of numbers or a
/// comma-separated string such as `"25, 50, 75, 100"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MilestonesSetting {
    List(Vec<f64>),
    Csv(String),
}

impl MilestonesSetting {
    /// Normalize to sorted, de-duplicated, non-negative whole percentages.
    /// Entries that fail to parse are dropped.
    pub fn normalize(&self) -> Vec<u32> {
        let raw: Vec<f64> = match self {
            MilestonesSetting::List(values) => values.clone(),
            MilestonesSetting::Csv(text) => text
                .split(',')
                .filter_map(|item| item.trim().parse::<f64>().ok())
                .collect(),
        };

        let mut milestones: Vec<u32> = raw
            .into_iter()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u32)
            .collect();
        milestones.sort_unstable();
        milestones.dedup();
        milestones
    }
}

/// Selector allowlist as configured: list or comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SelectorsSetting {
    List(Vec<String>),
    Csv(String),
}

impl SelectorsSetting {
    /// Normalize to trimmed, non-empty selector strings.
    pub fn normalize(&self) -> Vec<String> {
        let items: Vec<&str> = match self {
            SelectorsSetting::List(values) => values.iter().map(String::as_str).collect(),
            SelectorsSetting::Csv(text) => text.split(',').collect(),
        };
        items
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn default_enable_tracking() -> bool {
    true
}
fn default_respect_dnt() -> bool {
    true
}
fn default_inactivity_timeout_ms() -> u64 {
    60_000
}
fn default_scroll_milestones() -> MilestonesSetting {
    MilestonesSetting::List(vec![25.0, 50.0, 75.0, 100.0])
}
fn default_click_selectors() -> SelectorsSetting {
    SelectorsSetting::List(vec![
        "a".to_string(),
        "button".to_string(),
        "input[type=\"submit\"]".to_string(),
        ".trackable".to_string(),
    ])
}
fn default_storage_prefix() -> String {
    DEFAULT_STORAGE_PREFIX.to_string()
}
fn default_retention_days() -> i64 {
    30
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            enable_tracking: default_enable_tracking(),
            respect_dnt: default_respect_dnt(),
            inactivity_timeout_ms: default_inactivity_timeout_ms(),
            scroll_milestones: default_scroll_milestones(),
            click_selectors: default_click_selectors(),
            storage_prefix: default_storage_prefix(),
            retention_days: default_retention_days(),
        }
    }
}

impl BehaviorConfig {
    /// Effective storage prefix; a blank configured value falls back to the
    /// shipped default.
    pub fn effective_prefix(&self) -> &str {
        let trimmed = self.storage_prefix.trim();
        if trimmed.is_empty() {
            DEFAULT_STORAGE_PREFIX
        } else {
            trimmed
        }
    }

    /// Key under which the whole behavior store blob is persisted.
    pub fn storage_key(&self) -> String {
        format!("{}userBehavior", self.effective_prefix())
    }

    /// Load configuration from environment variables.
    pub fn load() -> TelemetryResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("FREEMIUM_ANALYTICS")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
