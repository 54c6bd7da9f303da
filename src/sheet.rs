//! In-memory tables and the tagged output tables produced from them.
//!
//! A [`Table`] is what the loader hands to the engine: unique column names and
//! rows padded to the header width. An [`OutputTable`] is what the reporter
//! hands to the writer: the same shape, with every cell carrying a [`CellTag`].

use serde::Serialize;

use crate::{columns::dedupe_headers, data::CellValue};

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Builds a table from raw header cells and rows.
    ///
    /// Headers are trimmed and made unique; every row is padded with empty
    /// cells (or truncated) to the header width, and entirely empty rows are
    /// dropped.
    pub fn new(name: impl Into<String>, headers: &[String], rows: Vec<Vec<CellValue>>) -> Self {
        let columns = dedupe_headers(headers);
        let width = columns.len();
        let rows = rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Convenience constructor for textual data, mostly used by tests.
    pub fn from_text(name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        let headers = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| CellValue::from_text(cell)).collect())
            .collect();
        Self::new(name, &headers, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[CellValue] {
        &self.rows[index]
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.columns.iter().position(|c| c == wanted)
    }
}

/// Classification attached to a rendered output cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellTag {
    Unchanged,
    Added,
    Removed,
    Changed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputCell {
    pub value: CellValue,
    pub tag: CellTag,
}

impl OutputCell {
    pub fn new(value: CellValue, tag: CellTag) -> Self {
        Self { value, tag }
    }
}

/// How an output table came to be; drives the summary and sheet naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Keyed,
    Positional,
    ColumnsAdded,
    SheetAdded,
    SheetRemoved,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    kind: ReportKind,
    columns: Vec<String>,
    rows: Vec<Vec<OutputCell>>,
}

impl OutputTable {
    pub fn new(kind: ReportKind, columns: Vec<String>) -> Self {
        Self {
            kind,
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row; it must match the header width.
    pub fn push_row(&mut self, row: Vec<OutputCell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Appends a row whose cells all share one tag.
    pub fn push_tagged(&mut self, values: impl IntoIterator<Item = CellValue>, tag: CellTag) {
        let row = values
            .into_iter()
            .map(|value| OutputCell::new(value, tag))
            .collect();
        self.push_row(row);
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<OutputCell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn count_tag(&self, tag: CellTag) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|cell| cell.tag == tag)
            .count()
    }

    /// Row-major textual rendering, handy for previews and assertions.
    pub fn to_text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.value.to_string()).collect())
            .collect()
    }
}
