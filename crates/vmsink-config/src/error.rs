//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid label assignment {0:?}: expected key=value")]
    InvalidLabel(String),

    #[error("scrape interval must be a positive number of seconds")]
    ZeroInterval,

    #[error("{name} granularity must be a positive number of blocks")]
    ZeroGranularity { name: &'static str },

    #[error("endpoint address must not be empty")]
    EmptyAddress,
}

impl From<ConfigError> for vmsink_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidLabel(label) => vmsink_common::Error::InvalidLabel(label),
            ConfigError::ZeroInterval => vmsink_common::Error::ZeroInterval,
            ConfigError::ZeroGranularity { name } => vmsink_common::Error::ZeroGranularity { name },
            other => vmsink_common::Error::Config(other.to_string()),
        }
    }
}
