//! Configuration loading for the pulse dashboard.
//!
//! Settings are layered: an optional TOML file, then an optional dotenv file,
//! then the process environment. The result is validated once into a
//! [`pulse_core::Config`].

pub mod settings;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pulse_core::error::ConfigError;
use pulse_core::Config;

pub use settings::{DatabaseSettings, DisplaySettings, Settings};

/// Env var naming the TOML settings file.
pub const CONFIG_PATH_VAR: &str = "PULSE_CONFIG";
/// Env var naming the dotenv file.
pub const ENV_FILE_VAR: &str = "PULSE_ENV_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "pulse.toml";
pub const DEFAULT_ENV_FILE: &str = ".env.analytics";

/// Where settings come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sources {
    pub config_file: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

impl Sources {
    /// Resolve file locations from the given environment.
    ///
    /// An explicitly named file must exist; the defaults are used only when
    /// present in the working directory.
    pub fn discover(env: &BTreeMap<String, String>) -> Self {
        Self {
            config_file: pick(env.get(CONFIG_PATH_VAR), DEFAULT_CONFIG_FILE),
            env_file: pick(env.get(ENV_FILE_VAR), DEFAULT_ENV_FILE),
        }
    }
}

fn pick(explicit: Option<&String>, default: &str) -> Option<PathBuf> {
    match explicit {
        Some(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
        _ => Some(PathBuf::from(default)).filter(|p| p.is_file()),
    }
}

/// Read `KEY=value` pairs from a dotenv file without touching the process
/// environment.
// `from_path` would export the entries; the iterator only reads them.
#[allow(deprecated)]
pub fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let iter = dotenv::from_path_iter(path)
        .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
    iter.map(|item| item.map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display()))))
        .collect()
}

/// Build a [`Config`] from explicit sources and environment.
///
/// Process variables win over dotenv entries with the same name.
pub fn load_from(
    sources: &Sources,
    process_env: &BTreeMap<String, String>,
) -> Result<Config, ConfigError> {
    let mut settings = match &sources.config_file {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading settings file");
            Settings::from_path(path)?
        }
        None => Settings::default(),
    };

    if let Some(path) = &sources.env_file {
        tracing::debug!(path = %path.display(), "loading env file");
        settings.apply_env(read_env_file(path)?)?;
    }
    settings.apply_env(process_env)?;

    settings.into_config()
}

/// Build a [`Config`] from the process environment and the files it names.
pub fn load() -> Result<Config, ConfigError> {
    let env: BTreeMap<String, String> = std::env::vars().collect();
    let sources = Sources::discover(&env);
    let config = load_from(&sources, &env)?;
    tracing::info!(
        db = %config.connection().target(),
        interval_secs = config.refresh_interval().as_secs(),
        time_zone = config.time_zone(),
        enabled = ?config.enabled(),
        "configuration loaded"
    );
    Ok(config)
}
