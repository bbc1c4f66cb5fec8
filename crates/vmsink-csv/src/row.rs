//! A single sample: ordered column name → value pairs.

use std::collections::HashMap;
use vmsink_common::{Epoch, EPOCH_HEADER};

/// One sampled row.
///
/// Columns keep their insertion order. Inserting a name that is already
/// present replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Row {
    /// Create a row holding only the epoch column.
    pub fn with_epoch(epoch: Epoch) -> Self {
        let mut row = Row::default();
        row.insert(EPOCH_HEADER, epoch.to_string());
        row
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.index.get(&name) {
            Some(&pos) => self.columns[pos].1 = value,
            None => {
                self.index.insert(name.clone(), self.columns.len());
                self.columns.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .map(|&pos| self.columns[pos].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Column names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::default();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}
