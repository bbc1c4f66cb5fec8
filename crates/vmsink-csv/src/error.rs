//! Error types for the CSV engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or driving the CSV engine.
#[derive(Error, Debug)]
pub enum CsvError {
    /// Sampling every `0` seconds is a division by zero, not "every tick".
    #[error("scrape interval must be a positive number of seconds")]
    ZeroInterval,

    /// A zero partition granularity would divide by zero.
    #[error("{name} granularity must be a positive number of blocks")]
    ZeroGranularity { name: &'static str },

    /// The partition directory path is occupied by something else.
    #[error("{} is not a folder", path.display())]
    NotADirectory { path: PathBuf },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<CsvError> for vmsink_common::Error {
    fn from(err: CsvError) -> Self {
        match err {
            CsvError::ZeroInterval => vmsink_common::Error::ZeroInterval,
            CsvError::ZeroGranularity { name } => vmsink_common::Error::ZeroGranularity { name },
            CsvError::NotADirectory { path } => vmsink_common::Error::NotADirectory { path },
            CsvError::Io { source, .. } => vmsink_common::Error::Io(source),
        }
    }
}
