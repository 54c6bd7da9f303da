//! Column-diff mode for append-only sheets: reports only the columns the new
//! version introduced, with every value the new table holds for them.
//!
//! Removed columns and value changes inside shared columns are out of scope
//! for this mode.

use std::collections::HashSet;

use crate::{
    columns::base_name,
    sheet::{CellTag, OutputTable, ReportKind, Table},
};

/// Names of columns present in `new` but not in `old`, in `new` order.
pub fn added_columns(old: &Table, new: &Table) -> Vec<String> {
    let existing: HashSet<&str> = old.columns().iter().map(|c| base_name(c)).collect();
    new.columns()
        .iter()
        .filter(|c| !existing.contains(base_name(c)))
        .cloned()
        .collect()
}

/// Returns `None` when the new version adds no columns.
pub fn column_diff(old: &Table, new: &Table) -> Option<OutputTable> {
    let added = added_columns(old, new);
    if added.is_empty() {
        return None;
    }
    let indices = added
        .iter()
        .filter_map(|name| new.column_index(name))
        .collect::<Vec<_>>();
    let mut output = OutputTable::new(ReportKind::ColumnsAdded, added);
    for row in new.rows() {
        output.push_tagged(indices.iter().map(|&idx| row[idx].clone()), CellTag::Added);
    }
    Some(output)
}
