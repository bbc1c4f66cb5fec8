//! CSV import pipeline.
//!
//! Re-uploads exported CSV files through the database's CSV import
//! endpoint. Every file carries its own header, so the field mapping
//! (`<position>:<kind>:<name>` per column) is rebuilt per file; configured
//! labels are appended to every row as extra columns.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use vmsink_common::format::{COL_DELIMITER, CSV_EXTENSION, ROW_DELIMITER};
use vmsink_common::EPOCH_HEADER;
use vmsink_config::Labels;
use walkdir::WalkDir;

use crate::sink::{IngestRequest, IngestSink};

/// CSV import endpoint path.
pub const CSV_IMPORT_PATH: &str = "/api/v1/import/csv";

/// Name of the time field format for millisecond epochs.
pub const TIME_FORMAT_UNIX_MS: &str = "unix_ms";

/// Kind of an import field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Time,
    Metric,
    Label,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time => write!(f, "time"),
            Self::Metric => write!(f, "metric"),
            Self::Label => write!(f, "label"),
        }
    }
}

/// One column of the import format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// 1-based column position.
    pub position: usize,
    pub kind: FieldKind,
    pub name: String,
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.position, self.kind, self.name)
    }
}

/// Field mapping of one file: its header columns followed by the
/// configured labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    fields: Vec<FieldDescriptor>,
    label_values: Vec<String>,
}

impl FieldMapping {
    pub fn build<'a>(headers: impl IntoIterator<Item = &'a str>, labels: &Labels) -> Self {
        let mut mapping = FieldMapping::default();
        for header in headers {
            let (kind, name) = if header == EPOCH_HEADER {
                (FieldKind::Time, TIME_FORMAT_UNIX_MS)
            } else {
                (FieldKind::Metric, header)
            };
            mapping.push(kind, name);
        }
        for (key, value) in labels.iter() {
            mapping.push(FieldKind::Label, key);
            mapping.label_values.push(value.to_string());
        }
        mapping
    }

    fn push(&mut self, kind: FieldKind, name: &str) {
        self.fields.push(FieldDescriptor {
            position: self.fields.len() + 1,
            kind,
            name: name.to_string(),
        });
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Values appended to every data row, in label order.
    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// The `format` query parameter.
    pub fn format(&self) -> String {
        self.fields
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(COL_DELIMITER)
    }
}

/// Build the import request for one file's content, or `None` when the
/// file holds no data rows.
pub fn build_request(content: &str, labels: &Labels) -> Option<IngestRequest> {
    let mut lines = content
        .trim()
        .split(ROW_DELIMITER)
        .map(|line| line.strip_suffix('\r').unwrap_or(line));
    let header = lines.next()?;
    let data: Vec<&str> = lines.collect();
    if data.is_empty() {
        return None;
    }

    let mapping = FieldMapping::build(header.split(COL_DELIMITER), labels);
    let injected = mapping.label_values().join(COL_DELIMITER);
    let body = if mapping.label_values().is_empty() {
        data.join(ROW_DELIMITER)
    } else {
        data.iter()
            .map(|line| format!("{line}{COL_DELIMITER}{injected}"))
            .collect::<Vec<_>>()
            .join(ROW_DELIMITER)
    };

    Some(IngestRequest::new(CSV_IMPORT_PATH, body).with_query("format", mapping.format()))
}

/// All `.csv` files below `root`, in lexical order per directory.
///
/// Unreadable entries are logged and skipped.
pub fn scan_csv_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(CSV_EXTENSION))
        .collect()
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Header only, or empty.
    Skipped,
    Submitted,
    Failed,
}

/// Counters for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: u64,
    pub skipped: u64,
    pub submitted: u64,
    pub failed: u64,
}

impl ImportSummary {
    fn record(&mut self, outcome: FileOutcome) {
        self.files += 1;
        match outcome {
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Submitted => self.submitted += 1,
            FileOutcome::Failed => self.failed += 1,
        }
    }
}

pub struct ImportPipeline<S> {
    sink: S,
    labels: Labels,
}

impl<S: IngestSink> ImportPipeline<S> {
    pub fn new(sink: S, labels: Labels) -> Self {
        Self { sink, labels }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Import every CSV file below `root`, one at a time.
    pub fn run(&self, root: &Path) -> ImportSummary {
        info!(root = %root.display(), labels = self.labels.len(), "import started");
        let mut summary = ImportSummary::default();
        for path in scan_csv_files(root) {
            summary.record(self.import_file(&path));
        }
        info!(
            files = summary.files,
            submitted = summary.submitted,
            skipped = summary.skipped,
            failed = summary.failed,
            "import finished"
        );
        summary
    }

    pub fn import_file(&self, path: &Path) -> FileOutcome {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!(file = %path.display(), error = %e, "failed to read CSV file");
                return FileOutcome::Failed;
            }
        };

        let Some(request) = build_request(&content, &self.labels) else {
            debug!(file = %path.display(), "no data rows, skipping");
            return FileOutcome::Skipped;
        };

        debug!(
            file = %path.display(),
            format = request.query_value("format").unwrap_or_default(),
            body = %request.body,
            "submitting CSV import"
        );
        match self.sink.submit(&request) {
            Ok(()) => FileOutcome::Submitted,
            Err(e) => {
                error!(file = %path.display(), error = %e, "CSV import request failed");
                FileOutcome::Failed
            }
        }
    }
}
