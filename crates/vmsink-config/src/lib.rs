//! vmsink configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for `config.toml`
//! - Config resolution (CLI → env → XDG → defaults)
//! - Label assignment parsing (`key=value`)
//! - Validation into positive intervals and granularities

pub mod error;
pub mod labels;
pub mod resolve;
pub mod sink;
pub mod validate;

pub use error::ConfigError;
pub use labels::Labels;
pub use resolve::{load_config, load_config_from_path, resolve_config_path, ConfigSource, CONFIG_ENV};
pub use sink::{CsvConfig, EndpointConfig, SinkConfig};
pub use validate::ValidatedConfig;
