//! Sampling boundary detection.
//!
//! A tick is sampled when its timestamp falls exactly on a multiple of the
//! scrape interval. Ticks without a timestamp are never sampled.

use chrono::{DateTime, Utc};
use std::num::NonZeroU64;
use vmsink_common::Epoch;

use crate::error::CsvError;

/// Scrape interval in whole seconds, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleInterval(NonZeroU64);

impl SampleInterval {
    pub fn from_secs(secs: u64) -> Result<Self, CsvError> {
        NonZeroU64::new(secs)
            .map(SampleInterval)
            .ok_or(CsvError::ZeroInterval)
    }

    pub fn as_secs(self) -> u64 {
        self.0.get()
    }

    /// Whether `epoch` is on a boundary: `(epoch / 1000) mod secs == 0`
    /// with exact division, so fractional seconds never match.
    pub fn is_boundary(self, epoch: Epoch) -> bool {
        let period_ms = i128::from(self.as_secs()) * 1000;
        i128::from(epoch.as_millis()).rem_euclid(period_ms) == 0
    }
}

impl From<NonZeroU64> for SampleInterval {
    fn from(secs: NonZeroU64) -> Self {
        SampleInterval(secs)
    }
}

/// Decide whether a tick with the given timestamp is due for sampling.
///
/// Fails with [`CsvError::ZeroInterval`] when `interval_secs` is zero.
pub fn is_sample_due(
    timestamp: Option<&DateTime<Utc>>,
    interval_secs: u64,
) -> Result<bool, CsvError> {
    let interval = SampleInterval::from_secs(interval_secs)?;
    Ok(Sampler::new(interval).sample(timestamp).is_some())
}

/// Stateless sampler bound to one interval.
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    interval: SampleInterval,
}

impl Sampler {
    pub fn new(interval: SampleInterval) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> SampleInterval {
        self.interval
    }

    /// Epoch of the tick if it is due, `None` otherwise.
    pub fn sample(&self, timestamp: Option<&DateTime<Utc>>) -> Option<Epoch> {
        let epoch = Epoch::from_datetime(timestamp?);
        self.interval.is_boundary(epoch).then_some(epoch)
    }
}
