//! CSV export pipeline.
//!
//! Samples the metrics source on every due tick and writes one CSV file per
//! file partition.
//!
//! # State Machine
//!
//! ```text
//! Idle ──start──▶ Streaming ──end of stream──▶ Draining ──final flush──▶ Done
//!                    │
//!                    └── directory conflict ──▶ (run aborts with an error)
//! ```
//!
//! All mutable export state (the row buffer and the last directory/file
//! seen) lives in [`ExportPipeline`], so independent pipelines never share
//! anything. A partition's rows are only written when a later sample routes
//! to a different file, or when the stream ends.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use vmsink_csv::{ensure_dir, extract_row, reconcile, CsvError, PartitionRouter, Row, Sampler};

use crate::metrics::MetricsSource;
use crate::source::{SourceError, Tick, TickSource};

/// Fatal export errors. Recoverable failures are logged and counted in
/// [`ExportSummary`] instead.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("export pipeline is {0}, expected streaming")]
    NotStreaming(ExportPhase),
}

impl From<ExportError> for vmsink_common::Error {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Csv(e) => e.into(),
            ExportError::Source(e) => e.into(),
            other @ ExportError::NotStreaming(_) => vmsink_common::Error::Internal(other.to_string()),
        }
    }
}

/// Lifecycle phase of an export pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Streaming,
    Draining,
    Done,
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Streaming => write!(f, "streaming"),
            Self::Draining => write!(f, "draining"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Counters for one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Ticks received, sampled or not.
    pub ticks: u64,
    /// Rows appended to a buffer.
    pub samples: u64,
    pub files_written: u64,
    /// Flushes whose write failed; their rows are lost.
    pub failed_flushes: u64,
    /// Malformed exposition lines skipped.
    pub rejected_lines: u64,
    /// Failed registry updates or reads.
    pub metrics_errors: u64,
}

pub struct ExportPipeline<M> {
    sampler: Sampler,
    router: PartitionRouter,
    metrics: M,
    phase: ExportPhase,
    buffer: Vec<Row>,
    last_dir: Option<PathBuf>,
    last_file: Option<PathBuf>,
    summary: ExportSummary,
}

impl<M: MetricsSource> ExportPipeline<M> {
    pub fn new(sampler: Sampler, router: PartitionRouter, metrics: M) -> Self {
        Self {
            sampler,
            router,
            metrics,
            phase: ExportPhase::Idle,
            buffer: Vec::new(),
            last_dir: None,
            last_file: None,
            summary: ExportSummary::default(),
        }
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    pub fn buffered_rows(&self) -> usize {
        self.buffer.len()
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.last_file.as_deref()
    }

    pub fn summary(&self) -> &ExportSummary {
        &self.summary
    }

    /// Drive the pipeline over `source` until the stream ends.
    ///
    /// A stream error still drains the buffered rows to their file before
    /// the error is returned.
    pub fn run<S: TickSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<ExportSummary, ExportError> {
        self.start();
        loop {
            match source.next_tick() {
                Ok(Some(tick)) => self.handle_tick(&tick)?,
                Ok(None) => return Ok(self.finish()),
                Err(e) => {
                    error!(rows = self.buffer.len(), error = %e, "tick stream failed, flushing buffered rows");
                    self.finish();
                    return Err(e.into());
                }
            }
        }
    }

    pub fn start(&mut self) {
        if self.phase == ExportPhase::Idle {
            info!(
                root = %self.router.root().display(),
                interval_secs = self.sampler.interval().as_secs(),
                "export started"
            );
            self.phase = ExportPhase::Streaming;
        }
    }

    /// Process one tick completely, including any flush it triggers.
    pub fn handle_tick(&mut self, tick: &Tick) -> Result<(), ExportError> {
        if self.phase != ExportPhase::Streaming {
            return Err(ExportError::NotStreaming(self.phase));
        }
        self.summary.ticks += 1;

        for operation in &tick.operations {
            if let Err(e) = self.metrics.apply(operation) {
                warn!(block = %tick.block_num, metric = %operation.name, error = %e, "skipping metric operation");
                self.summary.metrics_errors += 1;
            }
        }

        let Some(epoch) = self.sampler.sample(tick.timestamp.as_ref()) else {
            return Ok(());
        };

        let exposition = match self.metrics.metrics() {
            Ok(text) => text,
            Err(e) => {
                error!(block = %tick.block_num, error = %e, "failed to read metrics, sample skipped");
                self.summary.metrics_errors += 1;
                return Ok(());
            }
        };

        let extraction = extract_row(&exposition, epoch);
        for rejected in &extraction.rejected {
            warn!(block = %tick.block_num, error = %rejected, "skipping exposition line");
        }
        self.summary.rejected_lines += extraction.rejected.len() as u64;

        let partition = self.router.route(tick.block_num);

        if self.last_dir.as_deref() != Some(partition.dir.as_path()) {
            ensure_dir(&partition.dir)?;
            self.last_dir = Some(partition.dir);
        }

        if self.last_file.as_deref() != Some(partition.file.as_path()) {
            self.flush();
            debug!(file = %partition.file.display(), block = %tick.block_num, "new file partition");
            self.last_file = Some(partition.file);
        }

        self.buffer.push(extraction.row);
        self.summary.samples += 1;
        Ok(())
    }

    /// End of stream: write the last partition and stop.
    pub fn finish(&mut self) -> ExportSummary {
        if self.phase == ExportPhase::Streaming {
            self.phase = ExportPhase::Draining;
            self.flush();
            self.phase = ExportPhase::Done;
            info!(
                ticks = self.summary.ticks,
                samples = self.summary.samples,
                files = self.summary.files_written,
                failed = self.summary.failed_flushes,
                "export finished"
            );
        }
        self.summary.clone()
    }

    /// Write the buffer to the current file, then discard it.
    fn flush(&mut self) {
        let rows = std::mem::take(&mut self.buffer);
        let Some(path) = self.last_file.as_deref() else {
            return;
        };
        let Some(document) = reconcile(&rows) else {
            return;
        };
        match fs::write(path, document) {
            Ok(()) => {
                info!(file = %path.display(), rows = rows.len(), "wrote partition");
                self.summary.files_written += 1;
            }
            Err(e) => {
                error!(file = %path.display(), rows = rows.len(), error = %e, "failed to write partition, rows dropped");
                self.summary.failed_flushes += 1;
            }
        }
    }
}
