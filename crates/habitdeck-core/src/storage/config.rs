//! TOML-based application configuration.
//!
//! Stores tunables for:
//! - Reminder polling (source URL, interval)
//! - Unlock gate (window length, simulated ad, overlay fade)
//! - Completion feedback (label text and duration, viewport)
//! - Genie sequence (destination, stage delays)
//! - Notification permission answer for non-browser hosts
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Reminder poller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

/// Unlock gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockConfig {
    #[serde(default = "default_duration_hours")]
    pub duration_hours: u64,
    #[serde(default = "default_ad_duration_ms")]
    pub ad_duration_ms: u64,
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,
}

/// Completion feedback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_label_text")]
    pub label_text: String,
    #[serde(default = "default_label_duration_ms")]
    pub label_duration_ms: u64,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
}

/// Genie sequence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenieConfig {
    #[serde(default = "default_destination")]
    pub destination: String,
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
    #[serde(default = "default_navigate_delay_ms")]
    pub navigate_delay_ms: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Answer given when a host without a permission prompt is asked.
    #[serde(default = "default_true")]
    pub auto_grant: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub unlock: UnlockConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub genie: GenieConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_true() -> bool {
    true
}
fn default_base_url() -> String {
    "http://127.0.0.1:5000".into()
}
fn default_interval_secs() -> u64 {
    60
}
fn default_duration_hours() -> u64 {
    18
}
fn default_ad_duration_ms() -> u64 {
    5_000
}
fn default_fade_ms() -> u64 {
    500
}
fn default_label_text() -> String {
    "PROTOCOL EXECUTED".into()
}
fn default_label_duration_ms() -> u64 {
    800
}
fn default_viewport_width() -> f64 {
    1920.0
}
fn default_viewport_height() -> f64 {
    1080.0
}
fn default_destination() -> String {
    "/genie".into()
}
fn default_reveal_delay_ms() -> u64 {
    1_000
}
fn default_navigate_delay_ms() -> u64 {
    3_200
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            duration_hours: default_duration_hours(),
            ad_duration_ms: default_ad_duration_ms(),
            fade_ms: default_fade_ms(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            label_text: default_label_text(),
            label_duration_ms: default_label_duration_ms(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

impl Default for GenieConfig {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            reveal_delay_ms: default_reveal_delay_ms(),
            navigate_delay_ms: default_navigate_delay_ms(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { auto_grant: true }
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
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            let n = value
                                .parse::<f64>()
                                .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("'{value}' is not finite")))?
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
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
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the default when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
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

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// as the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Unlock window in milliseconds. Saturates for absurd hour counts.
    pub fn unlock_duration_ms(&self) -> u64 {
        self.unlock.duration_hours.saturating_mul(60 * 60 * 1000)
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
        assert_eq!(parsed.reminders.interval_secs, 60);
        assert_eq!(parsed.unlock.duration_hours, 18);
        assert_eq!(parsed.genie.destination, "/genie");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[reminders]\ninterval_secs = 5\n").unwrap();
        assert_eq!(parsed.reminders.interval_secs, 5);
        assert!(parsed.reminders.enabled);
        assert_eq!(parsed.feedback.label_text, "PROTOCOL EXECUTED");
        assert_eq!(parsed.unlock_duration_ms(), 18 * 60 * 60 * 1000);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("unlock.duration_hours").as_deref(), Some("18"));
        assert_eq!(cfg.get("genie.destination").as_deref(), Some("/genie"));
        assert!(cfg.get("genie.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("reminders.enabled", "false").unwrap();
        cfg.set("reminders.interval_secs", "15").unwrap();
        cfg.set("feedback.viewport_width", "1280.5").unwrap();
        cfg.set("feedback.label_text", "DONE").unwrap();
        assert!(!cfg.reminders.enabled);
        assert_eq!(cfg.reminders.interval_secs, 15);
        assert_eq!(cfg.feedback.viewport_width, 1280.5);
        assert_eq!(cfg.feedback.label_text, "DONE");
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("reminders.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("reminders", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("reminders.enabled", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.reminders.enabled);
    }

    #[test]
    fn huge_unlock_duration_saturates() {
        let mut cfg = Config::default();
        cfg.set("unlock.duration_hours", &u64::MAX.to_string()).unwrap();
        assert_eq!(cfg.unlock_duration_ms(), u64::MAX);

        cfg.set("unlock.duration_hours", "5124095576031").unwrap();
        assert_eq!(cfg.unlock_duration_ms(), u64::MAX);
        cfg.set("unlock.duration_hours", "5124095576030").unwrap();
        assert_eq!(cfg.unlock_duration_ms(), 5_124_095_576_030 * 3_600_000);
    }

    #[test]
    fn load_from_missing_file_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.reminders.interval_secs, 60);
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("genie.navigate_delay_ms", "4000").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().genie.navigate_delay_ms, 4000);
    }

    #[test]
    fn load_from_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "reminders = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
