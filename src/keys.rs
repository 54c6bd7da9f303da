//! Key extraction: maps each row of a table to the value of its key column.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    fmt,
    hash::{Hash, Hasher},
};

use log::warn;
use regex::Regex;

use crate::{
    config::DuplicateKeyPolicy,
    error::{DiffError, DiffResult, Side},
    sheet::Table,
};

/// Row identity within a sheet.
///
/// Keys that parse as finite numbers order numerically ahead of all other
/// keys; the rest order lexicographically.
#[derive(Debug, Clone)]
pub struct Key {
    text: String,
    numeric: Option<f64>,
}

impl Key {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let numeric = text.parse::<f64>().ok().filter(|n| n.is_finite());
        Self { text, numeric }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric, other.numeric) {
            (Some(a), Some(b)) => a.total_cmp(&b).then_with(|| self.text.cmp(&other.text)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.text.cmp(&other.text),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::new(value)
    }
}

#[derive(Debug, Clone)]
pub struct KeyOptions {
    pub column: String,
    pub pattern: Option<Regex>,
    pub duplicates: DuplicateKeyPolicy,
}

impl KeyOptions {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            pattern: None,
            duplicates: DuplicateKeyPolicy::default(),
        }
    }
}

/// Ordered key → row index mapping for one table.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    entries: BTreeMap<Key, usize>,
    duplicates: BTreeSet<Key>,
    skipped_rows: usize,
}

impl KeyIndex {
    /// Indexes rows by their 1-based position, for sheets without a key column.
    pub fn positional(table: &Table) -> Self {
        let entries = (0..table.row_count())
            .map(|idx| (Key::new((idx + 1).to_string()), idx))
            .collect();
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn get(&self, key: &Key) -> Option<usize> {
        self.entries.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn duplicates(&self) -> &BTreeSet<Key> {
        &self.duplicates
    }

    /// Rows left out because their key was empty or rejected by the pattern.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

pub fn extract_keys(table: &Table, side: Side, options: &KeyOptions) -> DiffResult<KeyIndex> {
    let column = table
        .column_index(&options.column)
        .ok_or_else(|| DiffError::MissingKeyColumn {
            sheet: table.name().to_string(),
            column: options.column.trim().to_string(),
            side,
        })?;

    let mut index = KeyIndex::default();
    for (row_idx, row) in table.rows().iter().enumerate() {
        let canonical = row[column].canonical();
        let text = canonical.trim();
        if text.is_empty() {
            index.skipped_rows += 1;
            continue;
        }
        if let Some(pattern) = &options.pattern {
            if !pattern.is_match(text) {
                index.skipped_rows += 1;
                continue;
            }
        }
        let key = Key::new(text);
        if index.entries.insert(key.clone(), row_idx).is_some() {
            index.duplicates.insert(key);
        }
    }

    if !index.duplicates.is_empty() {
        let keys = index
            .duplicates
            .iter()
            .map(|key| key.to_string())
            .collect::<Vec<_>>();
        match options.duplicates {
            DuplicateKeyPolicy::Fail => {
                return Err(DiffError::DuplicateKey {
                    sheet: table.name().to_string(),
                    side,
                    keys,
                });
            }
            DuplicateKeyPolicy::KeepLast => warn!(
                "Sheet '{}' ({side}): duplicate key(s) {}; keeping the last row for each",
                table.name(),
                keys.join(", ")
            ),
        }
    }
    Ok(index)
}
