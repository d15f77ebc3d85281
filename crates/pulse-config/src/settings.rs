use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use pulse_core::config::{
    Config, ConnectionParams, DisplayOptions, DEFAULT_REFRESH_INTERVAL, DEFAULT_TIME_ZONE,
    DEFAULT_TITLE_WIDTH,
};
use pulse_core::error::ConfigError;
use pulse_core::metric::metric_key;
use serde::Deserialize;

/// Prefix of per-metric environment flags (`METRIC_DAU=true`).
pub const METRIC_FLAG_PREFIX: &str = "METRIC_";

/// Raw dashboard settings before validation.
///
/// Every field is optional so layers can be merged: file first, then
/// environment on top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Seconds between refreshes.
    #[serde(default)]
    pub refresh_interval: Option<u64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub metrics: BTreeMap<String, bool>,
    #[serde(default)]
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplaySettings {
    #[serde(default)]
    pub title_width: Option<usize>,
}

impl Settings {
    /// Parse settings TOML.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let mut settings: Self =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.metrics = settings
            .metrics
            .into_iter()
            .map(|(name, on)| (metric_key(&name), on))
            .collect();
        Ok(settings)
    }

    /// Load settings from a TOML file on disk.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            ConfigError::Parse(msg) => ConfigError::Parse(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Overlay environment variables on top of these settings.
    ///
    /// Variables that are set but empty count as unset. Unrelated variables
    /// are ignored. Metric flags replace any file value for the same metric.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            if value.is_empty() {
                continue;
            }
            match key {
                "DB_HOST" => self.database.host = Some(value.to_string()),
                "DB_PORT" => self.database.port = Some(parse_env("DB_PORT", value)?),
                "DB_NAME" => self.database.name = Some(value.to_string()),
                "DB_USER" => self.database.user = Some(value.to_string()),
                "DB_PASSWORD" => self.database.password = Some(value.to_string()),
                "REFRESH_INTERVAL" => {
                    self.refresh_interval = Some(parse_env("REFRESH_INTERVAL", value)?)
                }
                "TIMEZONE" => self.timezone = Some(value.to_string()),
                "TITLE_WIDTH" => self.display.title_width = Some(parse_env("TITLE_WIDTH", value)?),
                _ if key.starts_with(METRIC_FLAG_PREFIX) && key.len() > METRIC_FLAG_PREFIX.len() => {
                    self.metrics
                        .insert(metric_key(key), value.eq_ignore_ascii_case("true"));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate into an immutable [`Config`], filling in defaults.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let db = self.database;
        let connection = ConnectionParams {
            host: require("DB_HOST", db.host)?,
            port: db.port.ok_or(ConfigError::Missing("DB_PORT"))?,
            database: require("DB_NAME", db.name)?,
            user: require("DB_USER", db.user)?,
            password: db.password.ok_or(ConfigError::Missing("DB_PASSWORD"))?,
        };

        let refresh_interval = self
            .refresh_interval
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL);
        let time_zone = self
            .timezone
            .unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string());
        let display = DisplayOptions {
            title_width: self.display.title_width.unwrap_or(DEFAULT_TITLE_WIDTH),
        };

        Config::new(connection, refresh_interval, time_zone, display, self.metrics)
    }
}

fn require(key: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parse_env<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
