use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};

use crate::core::{
    errors::{Result, TrackerError},
    utils::{ensure_dir, write_atomic, PathResolver},
};

pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";
pub const DEFAULT_RECENT_LIMIT: usize = 4;
pub const DEFAULT_WARNING_THRESHOLD: f64 = 0.8;
pub const DEFAULT_BACKUP_RETENTION: usize = 5;

/// User preferences that shape presentation and tracker thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub currency_symbol: String,
    pub recent_limit: usize,
    pub warning_threshold: f64,
    /// Fixed UTC offset used for month grouping and period boundaries.
    /// Falls back to the system's current offset when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
    pub ui_color_enabled: bool,
    pub backup_retention: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.into(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            utc_offset_minutes: None,
            ui_color_enabled: true,
            backup_retention: DEFAULT_BACKUP_RETENTION,
        }
    }
}

impl Config {
    pub const KEYS: [&'static str; 6] = [
        "currency_symbol",
        "recent_limit",
        "warning_threshold",
        "utc_offset_minutes",
        "ui_color_enabled",
        "backup_retention",
    ];

    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes.checked_mul(60)?))
            .unwrap_or_else(|| Local::now().offset().fix())
    }

    /// Updates one field from its textual form, validating ranges.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key.to_ascii_lowercase().as_str() {
            "currency_symbol" => self.currency_symbol = value.to_string(),
            "recent_limit" => {
                self.recent_limit = check_at_least_one("recent_limit", parse_field(key, value)?)?;
            }
            "warning_threshold" => {
                self.warning_threshold = check_threshold(parse_field(key, value)?)?;
            }
            "utc_offset_minutes" => {
                if value.is_empty() || value.eq_ignore_ascii_case("auto") {
                    self.utc_offset_minutes = None;
                } else {
                    self.utc_offset_minutes = Some(check_offset(parse_field(key, value)?)?);
                }
            }
            "ui_color_enabled" => {
                self.ui_color_enabled = match value.to_ascii_lowercase().as_str() {
                    "on" | "true" | "yes" | "1" => true,
                    "off" | "false" | "no" | "0" => false,
                    _ => return Err(invalid(key, "expects on/off")),
                }
            }
            "backup_retention" => {
                self.backup_retention =
                    check_at_least_one("backup_retention", parse_field(key, value)?)?;
            }
            other => {
                return Err(TrackerError::ConfigError(format!(
                    "unknown config key `{}`",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Applies the same ranges as [`Config::set_value`] to a whole config,
    /// e.g. one read from a hand-edited file.
    pub fn validate(&self) -> Result<()> {
        check_at_least_one("recent_limit", self.recent_limit)?;
        check_threshold(self.warning_threshold)?;
        if let Some(minutes) = self.utc_offset_minutes {
            check_offset(minutes)?;
        }
        check_at_least_one("backup_retention", self.backup_retention)?;
        Ok(())
    }
}

fn check_at_least_one(key: &str, value: usize) -> Result<usize> {
    if value == 0 {
        return Err(invalid(key, "must be at least 1"));
    }
    Ok(value)
}

fn check_threshold(value: f64) -> Result<f64> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid("warning_threshold", "must be in (0, 1]"));
    }
    Ok(value)
}

fn check_offset(minutes: i32) -> Result<i32> {
    if minutes.abs() >= 24 * 60 {
        return Err(invalid("utc_offset_minutes", "must be within ±1439 minutes"));
    }
    Ok(minutes)
}

fn parse_field<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| invalid(key, &format!("cannot parse `{}`", value)))
}

fn invalid(key: &str, reason: &str) -> TrackerError {
    TrackerError::ConfigError(format!("{} {}", key, reason))
}

/// Handles persistence of [`Config`] under `<home>/config/config.json`.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        let config_root = PathResolver::config_dir_in(&base);
        ensure_dir(&config_root)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
        })
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data).map_err(|err| {
            TrackerError::ConfigError(format!("{}: {}", self.path.display(), err))
        })?;
        config.validate().map_err(|err| match err {
            TrackerError::ConfigError(reason) => {
                TrackerError::ConfigError(format!("{}: {}", self.path.display(), reason))
            }
            other => other,
        })?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
