//! Error types for vmsink.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vmsink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for vmsink.
///
/// Crate-local error enums convert into this type at the binary boundary so
/// that every failure maps onto a stable code and exit status.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid label assignment: {0}")]
    InvalidLabel(String),

    #[error("scrape interval must be a positive number of seconds")]
    ZeroInterval,

    #[error("{name} granularity must be a positive number of blocks")]
    ZeroGranularity { name: &'static str },

    // Filesystem errors (20-29)
    #[error("{} is not a folder", path.display())]
    NotADirectory { path: PathBuf },

    // Upstream errors (30-39)
    #[error("tick source failed: {0}")]
    TickSource(String),

    #[error("metrics source failed: {0}")]
    MetricsSource(String),

    // Sink errors (40-49)
    #[error("ingestion request failed: {0}")]
    Sink(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors (90-99)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in logs.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidLabel(_) => 11,
            Error::ZeroInterval => 12,
            Error::ZeroGranularity { .. } => 13,
            Error::NotADirectory { .. } => 20,
            Error::TickSource(_) => 30,
            Error::MetricsSource(_) => 31,
            Error::Sink(_) => 40,
            Error::Io(_) => 60,
            Error::Internal(_) => 90,
        }
    }

    /// Whether this error was raised while validating configuration,
    /// before any work was performed.
    pub fn is_config(&self) -> bool {
        (10..20).contains(&self.code())
    }
}
