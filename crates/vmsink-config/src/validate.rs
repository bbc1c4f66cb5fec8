//! Validation of a raw [`SinkConfig`] into values the pipelines can use
//! without further checks.

use std::num::NonZeroU64;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::labels::Labels;
use crate::sink::SinkConfig;

/// Configuration with every invariant checked.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub address: String,
    pub port: u16,
    pub scrape_interval: NonZeroU64,
    pub csv_root: PathBuf,
    pub folder_granular: NonZeroU64,
    pub file_granular: NonZeroU64,
    pub labels: Labels,
}

impl ValidatedConfig {
    /// Base URL of the metrics database, e.g. `http://localhost:8428`.
    pub fn host(&self) -> String {
        let address = self.address.trim_end_matches('/');
        if address.contains("://") {
            format!("{}:{}", address, self.port)
        } else {
            format!("http://{}:{}", address, self.port)
        }
    }
}

impl SinkConfig {
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let scrape_interval = positive(self.scrape_interval).ok_or(ConfigError::ZeroInterval)?;
        let folder_granular = positive(self.csv.folder_granular)
            .ok_or(ConfigError::ZeroGranularity { name: "folder" })?;
        let file_granular = positive(self.csv.file_granular)
            .ok_or(ConfigError::ZeroGranularity { name: "file" })?;
        if self.endpoint.address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        let labels = Labels::parse(&self.labels)?;

        Ok(ValidatedConfig {
            address: self.endpoint.address.trim().to_string(),
            port: self.endpoint.port,
            scrape_interval,
            csv_root: normalize_csv_root(&self.csv.root),
            folder_granular,
            file_granular,
            labels,
        })
    }
}

/// Zero and negative values are both rejected.
fn positive(value: i64) -> Option<NonZeroU64> {
    u64::try_from(value).ok().and_then(NonZeroU64::new)
}

/// Empty roots mean the working directory; one trailing `/` is dropped.
pub fn normalize_csv_root(root: &str) -> PathBuf {
    if root.is_empty() {
        return PathBuf::from(".");
    }
    let trimmed = root.strip_suffix('/').unwrap_or(root);
    if trimmed.is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(trimmed)
    }
}
