//! Sheet reporter: turns alignment and classification results into tagged
//! output tables.
//!
//! Keyed reports list added rows, then removed rows, then common rows, each
//! section in key order.

use log::warn;
use serde::Serialize;

use crate::{
    align::align,
    classify::{CompareOptions, classify_row, project_row},
    columns::plan_columns,
    data::CellValue,
    error::Side,
    keys::KeyIndex,
    sheet::{CellTag, OutputCell, OutputTable, ReportKind, Table},
};

pub const PLACEHOLDER_COLUMN: &str = "Status";

/// Per-sheet counts reported in the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetStats {
    pub added_rows: usize,
    pub removed_rows: usize,
    pub changed_rows: usize,
    pub unchanged_rows: usize,
    pub suppressed_rows: usize,
    pub changed_cells: usize,
    pub skipped_rows: usize,
    pub comparable_columns: usize,
    pub added_columns: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicate_keys: Vec<String>,
}

impl SheetStats {
    pub fn has_differences(&self) -> bool {
        self.added_rows + self.removed_rows + self.changed_rows + self.added_columns > 0
    }
}

pub fn keyed_report(
    old: &Table,
    new: &Table,
    old_index: &KeyIndex,
    new_index: &KeyIndex,
    kind: ReportKind,
    options: &CompareOptions,
) -> (OutputTable, SheetStats) {
    let plan = plan_columns(old.columns(), new.columns());
    if plan.comparable_count() == 0 {
        warn!(
            "Sheet '{}': old and new versions share no columns; common rows compare as unchanged",
            new.name()
        );
    }
    let alignment = align(old_index, new_index);
    let mut output = OutputTable::new(kind, plan.headers().to_vec());
    let mut stats = SheetStats {
        skipped_rows: old_index.skipped_rows() + new_index.skipped_rows(),
        comparable_columns: plan.comparable_count(),
        duplicate_keys: old_index
            .duplicates()
            .iter()
            .chain(new_index.duplicates())
            .map(|key| key.to_string())
            .collect(),
        ..SheetStats::default()
    };
    stats.duplicate_keys.sort();
    stats.duplicate_keys.dedup();

    for key in &alignment.added {
        if let Some(idx) = new_index.get(key) {
            output.push_tagged(project_row(&plan, new.row(idx), Side::New), CellTag::Added);
            stats.added_rows += 1;
        }
    }
    for key in &alignment.removed {
        if let Some(idx) = old_index.get(key) {
            output.push_tagged(project_row(&plan, old.row(idx), Side::Old), CellTag::Removed);
            stats.removed_rows += 1;
        }
    }
    for key in &alignment.common {
        let (Some(old_idx), Some(new_idx)) = (old_index.get(key), new_index.get(key)) else {
            continue;
        };
        let row = classify_row(&plan, old.row(old_idx), new.row(new_idx), options);
        if row.has_changes() {
            stats.changed_rows += 1;
            stats.changed_cells += row.changed;
        } else if options.suppress_unchanged {
            stats.suppressed_rows += 1;
            continue;
        } else {
            stats.unchanged_rows += 1;
        }
        output.push_row(row.cells);
    }
    (output, stats)
}

/// Reports a sheet that exists in only one workbook, every cell carrying `tag`.
pub fn whole_sheet_report(table: &Table, tag: CellTag) -> (OutputTable, SheetStats) {
    let kind = if tag == CellTag::Removed {
        ReportKind::SheetRemoved
    } else {
        ReportKind::SheetAdded
    };
    let mut output = OutputTable::new(kind, table.columns().to_vec());
    for row in table.rows() {
        output.push_tagged(row.iter().cloned(), tag);
    }
    let mut stats = SheetStats::default();
    if tag == CellTag::Removed {
        stats.removed_rows = table.row_count();
    } else {
        stats.added_rows = table.row_count();
    }
    (output, stats)
}

/// Single-cell report explaining why a sheet could not be compared.
pub fn placeholder_report(message: impl Into<String>) -> OutputTable {
    let mut output = OutputTable::new(ReportKind::Placeholder, vec![PLACEHOLDER_COLUMN.to_string()]);
    output.push_row(vec![OutputCell::new(
        CellValue::Text(message.into()),
        CellTag::Unchanged,
    )]);
    output
}
