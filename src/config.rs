//! Configuration loading.
//!
//! The configuration directory holds `projects.json` and `sources.json`,
//! plus an optional `config.toml` with sync and logging settings. Nothing
//! here ever writes to that directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{Project, Source};
use crate::sync::{ApplyPolicy, RetryConfig};

/// File holding the project list.
pub const PROJECTS_FILE: &str = "projects.json";

/// File holding the source list.
pub const SOURCES_FILE: &str = "sources.json";

/// File holding optional settings.
pub const SETTINGS_FILE: &str = "config.toml";

/// Error types for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings read from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sync pass settings
    pub sync: SyncSettings,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// How a sync pass applies its changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Stop at the first failed change, or skip it and carry on
    pub policy: ApplyPolicy,

    /// Extra attempts for each failed change (0 = no retries)
    pub retry_attempts: u32,

    /// Delay before the first retry, doubled on each further attempt
    pub retry_delay_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { policy: ApplyPolicy::FailFast, retry_attempts: 0, retry_delay_ms: 250 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string() }
    }
}

impl SyncSettings {
    /// Retry behaviour for applying changes.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_attempts,
            initial_delay: Duration::from_millis(self.retry_delay_ms),
            ..RetryConfig::default()
        }
    }
}

impl Config {
    /// The default configuration directory, `~/.config/omnisync`.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("omnisync"))
    }

    /// Load settings from `config.toml` in `dir`, falling back to defaults
    /// when the file does not exist.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(SETTINGS_FILE);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_file(&path)
    }

    /// Load settings from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&content)
            .map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })
    }
}

/// Load `projects.json` from the configuration directory.
pub fn load_projects(dir: &Path) -> Result<Vec<Project>, ConfigError> {
    tracing::debug!(dir = %dir.display(), "Loading projects");
    load_json(&dir.join(PROJECTS_FILE))
}

/// Load `sources.json` from the configuration directory.
pub fn load_sources(dir: &Path) -> Result<Vec<Source>, ConfigError> {
    tracing::debug!(dir = %dir.display(), "Loading sources");
    load_json(&dir.join(SOURCES_FILE))
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let bytes = std::fs::read(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&bytes)
        .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })
}
