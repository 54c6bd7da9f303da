//! Comparison settings: an optional YAML profile merged with command-line
//! overrides.
//!
//! A profile mirrors the command-line options:
//!
//! ```yaml
//! key_column: Test ID
//! excluded_sheets: [Cover, Results]
//! column_diff_sheet: History
//! default_header_row: 0
//! header_rows:
//!   History: 1
//! duplicate_keys: keep-last
//! missing_key: placeholder
//! key_pattern: "^IO"
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    classify::CompareOptions,
    error::{DiffError, DiffResult},
    keys::KeyOptions,
};

pub const DEFAULT_KEY_COLUMN: &str = "Test ID";

/// What to do when a key occurs on more than one row of the same table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateKeyPolicy {
    /// Keep the last row seen for each key and record the duplicate
    #[default]
    KeepLast,
    /// Refuse to compare the sheet and emit a placeholder report
    Fail,
}

/// What to do when a sheet lacks the key column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingKeyPolicy {
    /// Emit a placeholder report naming the missing column
    #[default]
    Placeholder,
    /// Compare rows by position instead
    Positional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareConfig {
    pub key_column: String,
    pub excluded_sheets: BTreeSet<String>,
    pub column_diff_sheet: Option<String>,
    /// Rows above the header on sheets without an explicit entry.
    pub default_header_row: usize,
    pub header_rows: BTreeMap<String, usize>,
    pub duplicate_keys: DuplicateKeyPolicy,
    pub missing_key: MissingKeyPolicy,
    pub key_pattern: Option<String>,
    pub suppress_unchanged: bool,
    pub blank_equals_zero: bool,
    pub show_old_values: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            excluded_sheets: BTreeSet::new(),
            column_diff_sheet: None,
            default_header_row: 0,
            header_rows: BTreeMap::new(),
            duplicate_keys: DuplicateKeyPolicy::default(),
            missing_key: MissingKeyPolicy::default(),
            key_pattern: None,
            suppress_unchanged: false,
            blank_equals_zero: false,
            show_old_values: false,
        }
    }
}

impl CompareConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening profile {path:?}"))?;
        let config: CompareConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing profile {path:?}"))?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Parsing profile YAML")
    }

    pub fn header_row_for(&self, sheet: &str) -> usize {
        self.header_rows
            .get(sheet)
            .copied()
            .unwrap_or(self.default_header_row)
    }

    pub fn is_excluded(&self, sheet: &str) -> bool {
        self.excluded_sheets.contains(sheet)
    }

    pub fn is_column_diff_sheet(&self, sheet: &str) -> bool {
        self.column_diff_sheet.as_deref() == Some(sheet)
    }

    pub fn key_options(&self) -> DiffResult<KeyOptions> {
        let column = self.key_column.trim();
        if column.is_empty() {
            return Err(DiffError::Config("key column name cannot be empty".into()));
        }
        let pattern = self
            .key_pattern
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(Regex::new)
            .transpose()
            .map_err(|err| DiffError::Config(format!("invalid key pattern: {err}")))?;
        Ok(KeyOptions {
            column: column.to_string(),
            pattern,
            duplicates: self.duplicate_keys,
        })
    }

    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            blank_equals_zero: self.blank_equals_zero,
            show_old_values: self.show_old_values,
            suppress_unchanged: self.suppress_unchanged,
        }
    }
}
