//! vmsink CSV engine.
//!
//! This crate provides:
//! - The sampler deciding which clock ticks produce a sample
//! - Row extraction from a text exposition
//! - Column reconciliation of rows with growing key sets into one document
//! - Block-number partitioning into folder/file paths

pub mod error;
pub mod extract;
pub mod partition;
pub mod reconcile;
pub mod row;
pub mod sampler;

pub use error::CsvError;
pub use extract::{extract_row, Extraction, LineError};
pub use partition::{ensure_dir, route, Partition, PartitionRouter};
pub use reconcile::{reconcile, HeaderSet};
pub use row::Row;
pub use sampler::{is_sample_due, SampleInterval, Sampler};
