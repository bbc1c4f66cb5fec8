//! vmsink core library.
//!
//! Pipelines that turn a block-driven tick stream into VictoriaMetrics data:
//! - [`export`]: sample a metrics registry into block-partitioned CSV files
//! - [`import`]: upload those CSV files through the CSV import endpoint
//! - [`forward`]: push each sample straight to the Prometheus import endpoint

pub mod cli;
pub mod exit_codes;
pub mod export;
pub mod forward;
pub mod import;
pub mod logging;
pub mod manifest;
pub mod metrics;
pub mod sink;
pub mod source;

pub use export::{ExportError, ExportPhase, ExportPipeline, ExportSummary};
pub use forward::{ForwardPipeline, ForwardSummary};
pub use import::{ImportPipeline, ImportSummary};
pub use metrics::{MetricsSource, PromRegistry, StaticMetrics};
pub use sink::{HttpSink, IngestRequest, IngestSink, RecordingSink};
pub use source::{open_tick_source, JsonLinesTickSource, Tick, TickSource, VecTickSource};
