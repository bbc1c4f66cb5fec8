//! Forward pipeline: push each sample straight to the Prometheus import
//! endpoint instead of writing CSV.

use tracing::{debug, error, info, warn};
use vmsink_common::format::{COMMENT_PREFIX, ROW_DELIMITER};
use vmsink_common::Epoch;
use vmsink_csv::Sampler;

use crate::metrics::MetricsSource;
use crate::sink::{IngestRequest, IngestSink};
use crate::source::{SourceError, Tick, TickSource};

/// Prometheus text import endpoint path.
pub const PROMETHEUS_IMPORT_PATH: &str = "/api/v1/import/prometheus";

/// Append ` <epoch>` to every sample line of an exposition.
///
/// Comment and blank lines pass through unchanged.
pub fn stamp_exposition(exposition: &str, epoch: Epoch) -> String {
    exposition
        .split(ROW_DELIMITER)
        .map(|line| {
            if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
                line.to_string()
            } else {
                format!("{line} {epoch}")
            }
        })
        .collect::<Vec<_>>()
        .join(ROW_DELIMITER)
}

/// Counters for one forward run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardSummary {
    pub ticks: u64,
    pub samples: u64,
    pub submitted: u64,
    pub failed: u64,
}

pub struct ForwardPipeline<M, S> {
    sampler: Sampler,
    metrics: M,
    sink: S,
    summary: ForwardSummary,
}

impl<M: MetricsSource, S: IngestSink> ForwardPipeline<M, S> {
    pub fn new(sampler: Sampler, metrics: M, sink: S) -> Self {
        Self {
            sampler,
            metrics,
            sink,
            summary: ForwardSummary::default(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn summary(&self) -> &ForwardSummary {
        &self.summary
    }

    pub fn run<T: TickSource + ?Sized>(
        &mut self,
        source: &mut T,
    ) -> Result<ForwardSummary, SourceError> {
        info!(
            interval_secs = self.sampler.interval().as_secs(),
            "forwarding started"
        );
        while let Some(tick) = source.next_tick()? {
            self.handle_tick(&tick);
        }
        info!(
            ticks = self.summary.ticks,
            submitted = self.summary.submitted,
            failed = self.summary.failed,
            "forwarding finished"
        );
        Ok(self.summary.clone())
    }

    pub fn handle_tick(&mut self, tick: &Tick) {
        self.summary.ticks += 1;
        for operation in &tick.operations {
            if let Err(e) = self.metrics.apply(operation) {
                warn!(block = %tick.block_num, metric = %operation.name, error = %e, "skipping metric operation");
            }
        }

        let Some(epoch) = self.sampler.sample(tick.timestamp.as_ref()) else {
            return;
        };
        self.summary.samples += 1;

        let exposition = match self.metrics.metrics() {
            Ok(text) => text,
            Err(e) => {
                error!(block = %tick.block_num, error = %e, "failed to read metrics, sample skipped");
                self.summary.failed += 1;
                return;
            }
        };

        if exposition.trim().is_empty() {
            debug!(block = %tick.block_num, "empty exposition, nothing to forward");
            return;
        }

        let request =
            IngestRequest::new(PROMETHEUS_IMPORT_PATH, stamp_exposition(&exposition, epoch));
        debug!(block = %tick.block_num, %epoch, body = %request.body, "forwarding sample");
        match self.sink.submit(&request) {
            Ok(()) => self.summary.submitted += 1,
            Err(e) => {
                error!(block = %tick.block_num, error = %e, "forward request failed");
                self.summary.failed += 1;
            }
        }
    }
}
