//! Block and epoch identity types.
//!
//! A sample is identified by the block that delivered it (which selects the
//! output partition) and by its epoch (which selects whether it is sampled
//! at all, and becomes the `#epoch` column).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block number wrapper with display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockNum(pub u64);

impl fmt::Display for BlockNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BlockNum {
    fn from(num: u64) -> Self {
        BlockNum(num)
    }
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(pub i64);

impl Epoch {
    /// Epoch of a clock timestamp, truncated to whole milliseconds.
    pub fn from_datetime(ts: &DateTime<Utc>) -> Self {
        Epoch(ts.timestamp_millis())
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DateTime<Utc>> for Epoch {
    fn from(ts: DateTime<Utc>) -> Self {
        Epoch::from_datetime(&ts)
    }
}
