//! Row extraction from a text exposition.
//!
//! The exposition is a plain listing of `name value` lines, with `#`
//! comment lines, blank lines and a `manifest` line that carries no sample.

use thiserror::Error;
use vmsink_common::format::{COMMENT_PREFIX, MANIFEST_PREFIX};
use vmsink_common::Epoch;

use crate::row::Row;

/// An exposition line that could not be split into a name and a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("exposition line {line_no} has no name/value separator: {line:?}")]
pub struct LineError {
    /// 1-based line number within the trimmed exposition.
    pub line_no: usize,
    pub line: String,
}

/// Result of extracting one row.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub row: Row,
    /// Lines that were skipped because they were malformed.
    pub rejected: Vec<LineError>,
}

/// Build a row from `exposition`, tagged with `epoch`.
///
/// Columns follow line order, after the epoch column. Malformed lines are
/// reported in [`Extraction::rejected`] and contribute nothing to the row.
pub fn extract_row(exposition: &str, epoch: Epoch) -> Extraction {
    let mut row = Row::with_epoch(epoch);
    let mut rejected = Vec::new();

    for (idx, raw) in exposition.trim().lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) || line.starts_with(MANIFEST_PREFIX)
        {
            continue;
        }
        match split_sample(line) {
            Some((name, value)) => row.insert(name, value),
            None => rejected.push(LineError {
                line_no: idx + 1,
                line: line.to_string(),
            }),
        }
    }

    Extraction { row, rejected }
}

/// Split on the first whitespace run. Trailing fields (such as an explicit
/// sample timestamp) are ignored.
fn split_sample(line: &str) -> Option<(&str, &str)> {
    let (name, rest) = line.split_once(char::is_whitespace)?;
    let value = rest.split_whitespace().next().unwrap_or("");
    Some((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmsink_common::EPOCH_HEADER;

    const EXPOSITION: &str = "\
# HELP head_block_number Last processed block
# TYPE head_block_number gauge
head_block_number 2500
manifest{module_hash=\"abc\"} 1

transfers_total{token=\"eos\"} 17 1704067230000
";

    #[test]
    fn test_only_comments_yields_epoch_only() {
        let out = extract_row("# HELP x\n# TYPE x gauge\n\nmanifest 1\n", Epoch(5_000));
        assert_eq!(out.row.len(), 1);
        assert_eq!(out.row.get(EPOCH_HEADER), Some("5000"));
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn test_empty_exposition() {
        let out = extract_row("", Epoch(0));
        let names: Vec<_> = out.row.names().collect();
        assert_eq!(names, vec![EPOCH_HEADER]);
    }

    #[test]
    fn test_line_order_preserved() {
        let out = extract_row(EXPOSITION, Epoch(1_704_067_230_000));
        let pairs: Vec<_> = out.row.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (EPOCH_HEADER, "1704067230000"),
                ("head_block_number", "2500"),
                ("transfers_total{token=\"eos\"}", "17"),
            ]
        );
    }

    #[test]
    fn test_malformed_line_reported_not_inserted() {
        let out = extract_row("good 1\nbroken\nalso_good 2", Epoch(0));
        assert_eq!(out.row.len(), 3);
        assert!(!out.row.contains("broken"));
        assert_eq!(
            out.rejected,
            vec![LineError {
                line_no: 2,
                line: "broken".to_string()
            }]
        );
    }

    #[test]
    fn test_tabs_and_runs_of_spaces() {
        let out = extract_row("a\t\t1\nb    2", Epoch(0));
        assert_eq!(out.row.get("a"), Some("1"));
        assert_eq!(out.row.get("b"), Some("2"));
    }
}
