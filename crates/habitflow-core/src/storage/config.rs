//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Breathing exercise defaults and haptic feedback
//! - Reward presentation and the developer bypass
//! - Trial length for subscription gating
//! - The AI insight endpoint and its fallback text
//!
//! Configuration is stored at `~/.config/habitflow/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// Breathing exercise configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathingConfig {
    /// Pulse the haptic sink when an exhale phase ends. Off on platforms
    /// without a vibration motor.
    #[serde(default = "default_true")]
    pub haptics: bool,
    #[serde(default = "default_technique")]
    pub default_technique: String,
}

/// Reward presentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Qualify every reward and skip the full-day precondition.
    #[serde(default)]
    pub developer_mode: bool,
    /// Delay between closing one reward modal and showing the next.
    #[serde(default = "default_modal_delay_ms")]
    pub modal_delay_ms: u64,
    /// Only scan for rewards once every task tracked for today is done.
    #[serde(default = "default_true")]
    pub require_full_day: bool,
}

/// Subscription gating configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    #[serde(default = "default_trial_days")]
    pub trial_days: u32,
}

/// AI insight service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/habitflow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub breathing: BreathingConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub subscription: SubscriptionConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
}

fn default_true() -> bool {
    true
}
fn default_technique() -> String {
    "box".into()
}
fn default_modal_delay_ms() -> u64 {
    500
}
fn default_trial_days() -> u32 {
    7
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_fallback_message() -> String {
    "Thanks for writing today. Take a moment to notice what went well.".into()
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            haptics: true,
            default_technique: default_technique(),
        }
    }
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            developer_mode: false,
            modal_delay_ms: default_modal_delay_ms(),
            require_full_day: true,
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            trial_days: default_trial_days(),
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
            fallback_message: default_fallback_message(),
        }
    }
}

impl InsightsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl RewardsConfig {
    pub fn modal_delay(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.modal_delay_ms).unwrap_or(i64::MAX))
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot set a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.insights.endpoint.is_empty() {
            url::Url::parse(&self.insights.endpoint).map_err(|e| ConfigError::InvalidValue {
                key: "insights.endpoint".into(),
                message: e.to_string(),
            })?;
        }
        if self.insights.enabled && self.insights.endpoint.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "insights.enabled".into(),
                message: "an endpoint is required when insights are enabled".into(),
            });
        }
        if crate::breathing::technique_by_id(&self.breathing.default_technique).is_none() {
            return Err(ConfigError::InvalidValue {
                key: "breathing.default_technique".into(),
                message: format!("unknown technique '{}'", self.breathing.default_technique),
            });
        }
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(parsed.breathing.haptics);
        assert_eq!(parsed.rewards.modal_delay_ms, 500);
        assert_eq!(parsed.subscription.trial_days, 7);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[rewards]\ndeveloper_mode = true\n").unwrap();
        assert!(parsed.rewards.developer_mode);
        assert_eq!(parsed.rewards.modal_delay_ms, 500);
        assert_eq!(parsed.breathing.default_technique, "box");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("breathing.haptics").as_deref(), Some("true"));
        assert_eq!(cfg.get("subscription.trial_days").as_deref(), Some("7"));
        assert!(cfg.get("breathing.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("breathing.haptics", "false").unwrap();
        cfg.set("rewards.modal_delay_ms", "750").unwrap();
        cfg.set("breathing.default_technique", "calm").unwrap();
        assert!(!cfg.breathing.haptics);
        assert_eq!(cfg.rewards.modal_delay_ms, 750);
        assert_eq!(cfg.breathing.default_technique, "calm");
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("ui.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("breathing.haptics", "not_a_bool").is_err());
        assert!(cfg.set("breathing", "{}").is_err());
    }

    #[test]
    fn set_validates_endpoint_and_technique() {
        let mut cfg = Config::default();
        assert!(cfg.set("insights.endpoint", "not a url").is_err());
        assert!(cfg.insights.endpoint.is_empty());
        assert!(cfg.set("insights.enabled", "true").is_err());
        cfg.set("insights.endpoint", "https://example.com/insight").unwrap();
        cfg.set("insights.enabled", "true").unwrap();
        assert!(cfg.set("breathing.default_technique", "holotropic").is_err());
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.rewards.modal_delay_ms, 500);

        let mut changed = cfg.clone();
        changed.set("subscription.trial_days", "14").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().subscription.trial_days, 14);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[breathing\nhaptics = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
