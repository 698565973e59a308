//! Controller configuration, stored as JSON

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::discovery::RetryPolicy;

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "LIONCHIEF_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Pause between scan samples that found nothing
    pub sample_interval_secs: u64,
    /// Number of samples before a bounded scan gives up
    pub max_passes: u32,
    /// Keep scanning until a train shows up
    pub retry: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 5,
            max_passes: 6,
            retry: false,
        }
    }
}

impl DiscoveryConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        if self.retry {
            RetryPolicy::Unbounded
        } else {
            RetryPolicy::Bounded { max_passes: self.max_passes }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub discovery: DiscoveryConfig,
    /// Pause between consecutive commands sent by the CLI
    pub command_delay_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            command_delay_ms: 250,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ControllerConfig {
    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }

    /// `<config dir>/lionchief/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lionchief").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Explicit path, then `LIONCHIEF_CONFIG`, then the default location.
    ///
    /// Only a missing file at the default location falls back to defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::resolve_with(explicit, from_env.as_deref())
    }

    fn resolve_with(explicit: Option<&Path>, from_env: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit.or(from_env) {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}
