//! Sink configuration types.
//!
//! These types match the `config.toml` layout:
//!
//! ```toml
//! scrape_interval = 30
//! labels = ["env=prod"]
//!
//! [endpoint]
//! address = "localhost"
//! port = 8428
//!
//! [csv]
//! root = "./csv"
//! folder_granular = 1000
//! file_granular = 100
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_ADDRESS: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8428;
pub const DEFAULT_SCRAPE_INTERVAL: i64 = 30;
pub const DEFAULT_CSV_ROOT: &str = "./csv";
pub const DEFAULT_FOLDER_GRANULAR: i64 = 1000;
pub const DEFAULT_FILE_GRANULAR: i64 = 100;

/// Complete sink configuration, as read from disk and overridden by flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Seconds between samples.
    #[serde(default = "default_scrape_interval")]
    pub scrape_interval: i64,

    #[serde(default)]
    pub csv: CsvConfig,

    /// `key=value` label assignments.
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Metrics database endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// CSV export/import layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvConfig {
    #[serde(default = "default_csv_root")]
    pub root: String,

    /// Blocks per folder partition.
    #[serde(default = "default_folder_granular")]
    pub folder_granular: i64,

    /// Blocks per file partition.
    #[serde(default = "default_file_granular")]
    pub file_granular: i64,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.into()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_scrape_interval() -> i64 {
    DEFAULT_SCRAPE_INTERVAL
}

fn default_csv_root() -> String {
    DEFAULT_CSV_ROOT.into()
}

fn default_folder_granular() -> i64 {
    DEFAULT_FOLDER_GRANULAR
}

fn default_file_granular() -> i64 {
    DEFAULT_FILE_GRANULAR
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            scrape_interval: default_scrape_interval(),
            csv: CsvConfig::default(),
            labels: Vec::new(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            root: default_csv_root(),
            folder_granular: default_folder_granular(),
            file_granular: default_file_granular(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: SinkConfig = toml::from_str("").unwrap();
        assert_eq!(config, SinkConfig::default());
        assert_eq!(config.endpoint.port, 8428);
        assert_eq!(config.csv.folder_granular, 1000);
    }

    #[test]
    fn test_partial_tables() {
        let input = r#"
scrape_interval = 10
labels = ["env=prod"]

[csv]
file_granular = 50
"#;
        let config: SinkConfig = toml::from_str(input).unwrap();
        assert_eq!(config.scrape_interval, 10);
        assert_eq!(config.csv.file_granular, 50);
        assert_eq!(config.csv.folder_granular, DEFAULT_FOLDER_GRANULAR);
        assert_eq!(config.endpoint.address, DEFAULT_ADDRESS);
        assert_eq!(config.labels, vec!["env=prod".to_string()]);
    }
}
