//! Config file resolution and loading.
//!
//! Resolution order:
//! 1. `--config PATH` given on the command line
//! 2. `VMSINK_CONFIG` environment variable
//! 3. `<config_dir>/vmsink/config.toml`, if it exists
//! 4. Built-in defaults
//!
//! A path named explicitly (1 or 2) must exist; the platform default is
//! optional.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;
use crate::sink::SinkConfig;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "VMSINK_CONFIG";

const DIR_NAME: &str = "vmsink";
const FILE_NAME: &str = "config.toml";

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Environment(PathBuf),
    Platform(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Environment(p) | Self::Platform(p) => Some(p),
            Self::Defaults => None,
        }
    }
}

/// Resolve which config file to read, if any.
pub fn resolve_config_path(explicit: Option<&Path>) -> ConfigSource {
    // 1) Explicit override
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    // 2) Environment
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return ConfigSource::Environment(PathBuf::from(path));
        }
    }

    // 3) Platform default
    if let Some(base) = dirs::config_dir() {
        let path = base.join(DIR_NAME).join(FILE_NAME);
        if path.is_file() {
            return ConfigSource::Platform(path);
        }
    }

    ConfigSource::Defaults
}

/// Load the effective configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<(SinkConfig, ConfigSource), ConfigError> {
    let source = resolve_config_path(explicit);
    let config = match source.path() {
        Some(path) => load_config_from_path(path)?,
        None => SinkConfig::default(),
    };
    debug!(source = ?source, "configuration loaded");
    Ok((config, source))
}

/// Read and parse one config file.
pub fn load_config_from_path(path: &Path) -> Result<SinkConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
