//! Configuration loading for the client store
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--api-root, --storage)
//! 2. Environment variables (MLIB_API_ROOT, MLIB_STORAGE_PATH)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing TOML file never stops startup: a warning is logged and the
//! defaults are used. A TOML file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding the API root URL
pub const ENV_API_ROOT: &str = "MLIB_API_ROOT";

/// Environment variable overriding the durable storage file
pub const ENV_STORAGE_PATH: &str = "MLIB_STORAGE_PATH";

/// Default REST API root
pub const DEFAULT_API_ROOT: &str = "http://127.0.0.1:8081/api/v2/";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of entries kept in the recently viewed series list
pub const DEFAULT_RECENT_CAPACITY: usize = 5;

/// Configuration file as written on disk
///
/// Every field is optional; anything left out falls through to the
/// built-in defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// REST API root, e.g. `https://media.example.org/api/v2/`
    #[serde(default)]
    pub api_root: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Capacity of the recently viewed series list
    #[serde(default)]
    pub recent_capacity: Option<usize>,

    /// Durable storage file
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Fully resolved store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// REST API root, always ending in `/`
    pub api_root: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Capacity of the recently viewed series list
    pub recent_capacity: usize,
    /// Durable storage file
    pub storage_path: PathBuf,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            storage_path: default_storage_path(),
            logging: LoggingConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject settings the client cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.api_root.starts_with("http://") || self.api_root.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api_root must be an http(s) URL, got '{}'",
                self.api_root
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than 0".to_string()));
        }
        if self.recent_capacity == 0 {
            return Err(Error::Config("recent_capacity must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_root: Option<String>,
    pub storage_path: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

/// Resolves a `StoreConfig` from the four configuration tiers
pub struct ConfigResolver {
    overrides: CliOverrides,
}

impl ConfigResolver {
    pub fn new(overrides: CliOverrides) -> Self {
        Self { overrides }
    }

    /// Resolve configuration following the documented priority order
    pub fn resolve(&self) -> Result<StoreConfig> {
        let file = self.load_toml()?;
        let defaults = StoreConfig::default();

        // Priority 1 → 2 → 3 → 4
        let api_root = self
            .overrides
            .api_root
            .clone()
            .or_else(|| env_value(ENV_API_ROOT))
            .or(file.api_root)
            .unwrap_or(defaults.api_root);

        let storage_path = self
            .overrides
            .storage_path
            .clone()
            .or_else(|| env_value(ENV_STORAGE_PATH).map(PathBuf::from))
            .or(file.storage_path)
            .unwrap_or(defaults.storage_path);

        let config = StoreConfig {
            api_root: normalize_api_root(&api_root),
            timeout_secs: file.timeout_secs.unwrap_or(defaults.timeout_secs),
            recent_capacity: file.recent_capacity.unwrap_or(defaults.recent_capacity),
            storage_path,
            logging: file.logging,
        };

        config.validate()?;
        Ok(config)
    }

    fn load_toml(&self) -> Result<TomlConfig> {
        let path = match self.overrides.config_file.clone().or_else(default_config_path) {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using defaults");
                return Ok(TomlConfig::default());
            }
        };

        if !path.exists() {
            warn!("Config file not found: {}, using defaults", path.display());
            return Ok(TomlConfig::default());
        }

        let config = load_toml_config(&path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Ensure the API root ends in exactly one `/` so relative paths join cleanly
pub fn normalize_api_root(root: &str) -> String {
    format!("{}/", root.trim().trim_end_matches('/'))
}

/// Platform configuration file location (`<config_dir>/mlib/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mlib").join("config.toml"))
}

/// Platform storage file location (`<data_local_dir>/mlib/storage.json`)
pub fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mlib"))
        .unwrap_or_else(|| PathBuf::from("./mlib_data"))
        .join("storage.json")
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
