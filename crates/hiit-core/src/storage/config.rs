//! TOML-based application configuration.
//!
//! Stores the default workout (phase durations and cycles) and cue
//! preferences. Configuration lives at `~/.config/hiit/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::timer::Settings;

/// Default workout used when no preset or overrides are given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_secs")]
    pub work_secs: u64,
    #[serde(default = "default_rest_secs")]
    pub rest_secs: u64,
    #[serde(default = "default_prepare_secs")]
    pub prepare_secs: u64,
    #[serde(default = "default_cycles")]
    pub cycles: u32,
}

/// How cues are rendered by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuesConfig {
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_true")]
    pub vibration: bool,
    /// 0..=100
    #[serde(default = "default_volume")]
    pub volume: u32,
    /// Emit the 3-2-1 countdown before each phase ends.
    #[serde(default = "default_true")]
    pub countdown: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/hiit/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub cues: CuesConfig,
}

fn default_work_secs() -> u64 {
    Settings::default().work_secs
}
fn default_rest_secs() -> u64 {
    Settings::default().rest_secs
}
fn default_prepare_secs() -> u64 {
    Settings::default().prepare_secs
}
fn default_cycles() -> u32 {
    Settings::default().cycles
}
fn default_true() -> bool {
    true
}
fn default_volume() -> u32 {
    80
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_secs: default_work_secs(),
            rest_secs: default_rest_secs(),
            prepare_secs: default_prepare_secs(),
            cycles: default_cycles(),
        }
    }
}

impl Default for CuesConfig {
    fn default() -> Self {
        Self {
            sound: true,
            vibration: true,
            volume: default_volume(),
            countdown: true,
        }
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
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|e| invalid(e.to_string()))?,
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                serde_json::Value::Object(_) => return Err(unknown()),
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        toml::from_str(&content).map_err(|e| load_failed(e.to_string()))
    }

    /// Persist to the data directory.
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

    /// Set a value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value does not parse as
    /// the key's type, or the result would be an invalid configuration.
    /// On error `self` is left untouched.
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
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cues.volume > 100 {
            return Err(ValidationError::InvalidValue {
                field: "cues.volume".into(),
                message: "must be between 0 and 100".into(),
            });
        }
        self.settings().map(|_| ())
    }

    /// The configured default workout.
    pub fn settings(&self) -> Result<Settings, ValidationError> {
        Settings::new(
            self.timer.work_secs,
            self.timer.rest_secs,
            self.timer.prepare_secs,
            self.timer.cycles,
        )
    }

    /// Load from disk, returning default on error.
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
        assert_eq!(parsed.timer.work_secs, 30);
        assert_eq!(parsed.cues.volume, 80);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[timer]\nwork_secs = 40\n").unwrap();
        assert_eq!(parsed.timer.work_secs, 40);
        assert_eq!(parsed.timer.rest_secs, 15);
        assert!(parsed.cues.countdown);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("cues.sound").as_deref(), Some("true"));
        assert_eq!(cfg.get("timer.cycles").as_deref(), Some("8"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("cues.countdown", "false").unwrap();
        cfg.set("timer.work_secs", "45").unwrap();
        assert!(!cfg.cues.countdown);
        assert_eq!(cfg.timer.work_secs, 45);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("timer", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_wrong_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("cues.sound", "loud").is_err());
        assert!(cfg.set("timer.cycles", "-3").is_err());
    }

    #[test]
    fn set_rejects_invalid_workout_and_keeps_old_value() {
        let mut cfg = Config::default();
        let err = cfg.set("timer.work_secs", "0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(cfg.timer.work_secs, 30);
        assert!(cfg.set("cues.volume", "101").is_err());
    }

    #[test]
    fn settings_reflect_timer_section() {
        let mut cfg = Config::default();
        cfg.set("timer.prepare_secs", "0").unwrap();
        let settings = cfg.settings().unwrap();
        assert_eq!(settings.prepare_secs, 0);
        assert_eq!(settings.cycles, 8);
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("cues.volume", "35").unwrap();
        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.cues.volume, 35);
    }

    #[test]
    fn load_from_reports_parse_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
