//! Clock sources: the ordered stream of ticks driving every pipeline.
//!
//! A tick carries the block number, the block timestamp (absent until the
//! stream has a clock) and the registry operations produced by that block.
//! Pipelines pull ticks one at a time and finish all work for a tick before
//! asking for the next one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use vmsink_common::BlockNum;

/// Errors from tick sources.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read tick stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed tick on line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl From<SourceError> for vmsink_common::Error {
    fn from(err: SourceError) -> Self {
        vmsink_common::Error::TickSource(err.to_string())
    }
}

/// Kind of registry metric an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// Operation applied to a registry metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Set,
    Inc,
    Dec,
    Add,
}

/// A registry update carried by a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricOperation {
    pub name: String,
    pub kind: MetricKind,
    pub op: OpKind,
    #[serde(default)]
    pub value: f64,
    /// Label name → value, in the order the metric was first declared.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<(String, String)>,
}

/// One clock event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    #[serde(rename = "number", alias = "block_num")]
    pub block_num: BlockNum,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<MetricOperation>,
}

impl Tick {
    pub fn new(block_num: u64, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            block_num: BlockNum(block_num),
            timestamp,
            operations: Vec::new(),
        }
    }

    pub fn with_operations(mut self, operations: Vec<MetricOperation>) -> Self {
        self.operations = operations;
        self
    }
}

/// Ordered, pull-based stream of ticks.
pub trait TickSource {
    /// Next tick, or `None` once the stream is complete.
    fn next_tick(&mut self) -> Result<Option<Tick>, SourceError>;
}

/// In-memory tick source.
#[derive(Debug, Clone, Default)]
pub struct VecTickSource {
    ticks: VecDeque<Tick>,
}

impl VecTickSource {
    pub fn new(ticks: Vec<Tick>) -> Self {
        Self {
            ticks: ticks.into(),
        }
    }
}

impl TickSource for VecTickSource {
    fn next_tick(&mut self) -> Result<Option<Tick>, SourceError> {
        Ok(self.ticks.pop_front())
    }
}

/// Reads one JSON-encoded tick per line.
///
/// ```json
/// {"number": 2500, "timestamp": "2024-01-01T00:00:30Z", "operations": []}
/// ```
pub struct JsonLinesTickSource<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> JsonLinesTickSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> TickSource for JsonLinesTickSource<R> {
    fn next_tick(&mut self) -> Result<Option<Tick>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            return serde_json::from_str(line)
                .map(Some)
                .map_err(|e| SourceError::Parse {
                    line: self.line_no,
                    message: e.to_string(),
                });
        }
    }
}

/// Open the tick stream at `path`; `None` or `-` reads stdin.
pub fn open_tick_source(path: Option<&Path>) -> Result<Box<dyn TickSource>, SourceError> {
    match path {
        None => Ok(Box::new(JsonLinesTickSource::new(std::io::stdin().lock()))),
        Some(p) if p.as_os_str() == "-" => {
            Ok(Box::new(JsonLinesTickSource::new(std::io::stdin().lock())))
        }
        Some(p) => {
            let file = File::open(p)?;
            Ok(Box::new(JsonLinesTickSource::new(BufReader::new(file))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_json_lines_source() {
        let input = r#"{"number": 1, "timestamp": null}

{"number": 2, "timestamp": "2024-01-01T00:00:30Z", "operations": [
  {"name": "head", "kind": "gauge", "op": "set", "value": 2}]}
"#;
        // Operations must fit on one line; the second tick above does not.
        let mut source = JsonLinesTickSource::new(Cursor::new(input));
        let first = source.next_tick().unwrap().unwrap();
        assert_eq!(first.block_num, BlockNum(1));
        assert!(first.timestamp.is_none());
        assert!(matches!(
            source.next_tick(),
            Err(SourceError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_json_lines_operations() {
        let input = concat!(
            r#"{"number": 7, "timestamp": "2024-01-01T00:00:30Z", "#,
            r#""operations": [{"name": "transfers", "kind": "counter", "op": "inc", "labels": [["token", "eos"]]}]}"#,
            "\n"
        );
        let mut source = JsonLinesTickSource::new(Cursor::new(input));
        let tick = source.next_tick().unwrap().unwrap();
        assert_eq!(tick.block_num, BlockNum(7));
        assert_eq!(tick.operations.len(), 1);
        let op = &tick.operations[0];
        assert_eq!(op.kind, MetricKind::Counter);
        assert_eq!(op.op, OpKind::Inc);
        assert_eq!(op.value, 0.0);
        assert_eq!(op.labels, vec![("token".to_string(), "eos".to_string())]);
        assert!(source.next_tick().unwrap().is_none());
    }

    #[test]
    fn test_vec_source_in_order() {
        let mut source = VecTickSource::new(vec![Tick::new(1, None), Tick::new(2, None)]);
        assert_eq!(source.next_tick().unwrap().unwrap().block_num, BlockNum(1));
        assert_eq!(source.next_tick().unwrap().unwrap().block_num, BlockNum(2));
        assert!(source.next_tick().unwrap().is_none());
    }
}
