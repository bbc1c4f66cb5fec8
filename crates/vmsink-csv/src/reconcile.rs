//! Column reconciliation.
//!
//! A buffer holds rows whose key sets can grow as new metrics appear during
//! a partition. Flushing turns the buffer into one CSV document with a
//! single header: the insertion-ordered union of every key seen.
//!
//! Rows are scanned once. Each row is rendered against the header as it
//! stood right after that row was scanned, with empty placeholders for keys
//! the row lacks. The last row that grew the header is the *reference
//! row*; every row before it is right-padded with `"0"` up to the final
//! header width. When the first row is the reference row nothing is padded.
//! The padding value is applied to every missing trailing column regardless
//! of its meaning, and existing files depend on it.

use std::collections::HashMap;
use vmsink_common::format::{COL_DELIMITER, PAD_VALUE, ROW_DELIMITER};

use crate::row::Row;

/// Insertion-ordered set of column names.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the names of `row` not seen yet. Returns true if the set grew.
    pub fn extend_from(&mut self, row: &Row) -> bool {
        let before = self.names.len();
        for name in row.names() {
            if !self.index.contains_key(name) {
                self.index.insert(name.to_string(), self.names.len());
                self.names.push(name.to_string());
            }
        }
        self.names.len() > before
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Render `rows` as a CSV document, or `None` when there is nothing to
/// write.
///
/// Column names are written unquoted. A series with two or more labels,
/// such as `name{a="x",b="y"}`, carries a comma in its key, so a CSV reader
/// sees that header (but not the row values) split into extra columns.
pub fn reconcile(rows: &[Row]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let mut header = HeaderSet::new();
    let mut reference_index = 0;
    let mut rendered: Vec<Vec<&str>> = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        if header.extend_from(row) {
            reference_index = idx;
        }
        let values = header
            .names()
            .iter()
            .map(|name| row.get(name).unwrap_or(""))
            .collect();
        rendered.push(values);
    }

    let width = header.len();
    for values in rendered.iter_mut().take(reference_index) {
        values.resize(width, PAD_VALUE);
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header.names().join(COL_DELIMITER));
    lines.extend(rendered.iter().map(|values| values.join(COL_DELIMITER)));

    Some(lines.join(ROW_DELIMITER))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_empty_buffer_is_noop() {
        assert_eq!(reconcile(&[]), None);
    }

    #[test]
    fn test_growing_key_sets_pad_with_zero() {
        let rows = vec![
            row(&[("a", "1")]),
            row(&[("a", "2"), ("b", "3")]),
            row(&[("a", "4"), ("b", "5"), ("c", "6")]),
        ];
        let csv = reconcile(&rows).unwrap();
        assert_eq!(csv, "a,b,c\n1,0,0\n2,3,0\n4,5,6");
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_first_row_widest_is_unaltered() {
        let rows = vec![
            row(&[("a", "1"), ("b", "2"), ("c", "3")]),
            row(&[("a", "4"), ("c", "6")]),
            row(&[("a", "7"), ("b", "8"), ("c", "9")]),
        ];
        let csv = reconcile(&rows).unwrap();
        assert_eq!(csv, "a,b,c\n1,2,3\n4,,6\n7,8,9");
    }

    #[test]
    fn test_gap_before_reference_keeps_empty_placeholder() {
        // Row 1 lacks `b` inside its own header prefix: empty placeholder,
        // then zero padding for the columns discovered later.
        let rows = vec![
            row(&[("a", "1"), ("b", "2")]),
            row(&[("a", "3")]),
            row(&[("a", "4"), ("b", "5"), ("c", "6")]),
        ];
        let csv = reconcile(&rows).unwrap();
        assert_eq!(csv, "a,b,c\n1,2,0\n3,,0\n4,5,6");
    }

    #[test]
    fn test_rows_after_reference_use_empty_placeholder() {
        let rows = vec![
            row(&[("a", "1")]),
            row(&[("a", "2"), ("b", "3")]),
            row(&[("b", "4")]),
        ];
        let csv = reconcile(&rows).unwrap();
        assert_eq!(csv, "a,b\n1,0\n2,3\n,4");
    }

    #[test]
    fn test_same_width_new_key_grows_header() {
        let rows = vec![row(&[("a", "1")]), row(&[("b", "2")])];
        let csv = reconcile(&rows).unwrap();
        assert_eq!(csv, "a,b\n1,0\n,2");
    }

    #[test]
    fn test_every_row_has_header_width() {
        let rows = vec![
            row(&[("x", "1")]),
            row(&[("x", "1"), ("y", "2"), ("z", "3")]),
            row(&[("w", "0")]),
            row(&[("x", "1")]),
        ];
        let csv = reconcile(&rows).unwrap();
        let width = csv.lines().next().unwrap().split(',').count();
        for line in csv.lines() {
            assert_eq!(line.split(',').count(), width, "line {line:?}");
        }
    }

    #[test]
    fn test_multi_label_key_is_written_unquoted() {
        let rows = vec![row(&[("epoch", "1"), ("req{a=\"x\",b=\"y\"}", "2")])];
        let csv = reconcile(&rows).unwrap();
        assert_eq!(csv, "epoch,req{a=\"x\",b=\"y\"}\n1,2");
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap().split(',').count(), 3);
        assert_eq!(lines.next().unwrap().split(',').count(), 2);
    }
}
