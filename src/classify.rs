//! Cell classification for rows that exist in both versions of a sheet.

use crate::{
    columns::{ColumnPlan, ColumnSlot},
    data::CellValue,
    error::Side,
    sheet::{CellTag, OutputCell},
};

/// Knobs that change how common rows are compared and rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Treat an empty cell and a zero as the same value.
    pub blank_equals_zero: bool,
    /// Render changed cells as `old ==> new` instead of the new value alone.
    pub show_old_values: bool,
    /// Leave common rows without any changed cell out of the report.
    pub suppress_unchanged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub cells: Vec<OutputCell>,
    pub changed: usize,
}

impl ClassifiedRow {
    pub fn has_changes(&self) -> bool {
        self.changed > 0
    }
}

pub fn classify_row(
    plan: &ColumnPlan,
    old_row: &[CellValue],
    new_row: &[CellValue],
    options: &CompareOptions,
) -> ClassifiedRow {
    let mut changed = 0usize;
    let cells = plan
        .slots()
        .iter()
        .map(|slot| match *slot {
            ColumnSlot::Both { old, new } => {
                let before = &old_row[old];
                let after = &new_row[new];
                if before.equivalent(after, options.blank_equals_zero) {
                    OutputCell::new(after.clone(), CellTag::Unchanged)
                } else {
                    changed += 1;
                    OutputCell::new(render_change(before, after, options), CellTag::Changed)
                }
            }
            ColumnSlot::NewOnly(new) => OutputCell::new(new_row[new].clone(), CellTag::Unchanged),
            ColumnSlot::OldOnly(old) => OutputCell::new(old_row[old].clone(), CellTag::Unchanged),
        })
        .collect();
    ClassifiedRow { cells, changed }
}

fn render_change(before: &CellValue, after: &CellValue, options: &CompareOptions) -> CellValue {
    if options.show_old_values {
        CellValue::Text(format!("{before} ==> {after}"))
    } else {
        after.clone()
    }
}

/// Lays a single-side row out on the plan; columns the side lacks stay empty.
pub fn project_row(plan: &ColumnPlan, row: &[CellValue], side: Side) -> Vec<CellValue> {
    plan.slots()
        .iter()
        .map(|slot| match (*slot, side) {
            (ColumnSlot::Both { new, .. }, Side::New) | (ColumnSlot::NewOnly(new), Side::New) => {
                row[new].clone()
            }
            (ColumnSlot::Both { old, .. }, Side::Old) | (ColumnSlot::OldOnly(old), Side::Old) => {
                row[old].clone()
            }
            _ => CellValue::Empty,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::plan_columns;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn text(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from_text(v)).collect()
    }

    #[test]
    fn changed_cells_take_new_value() {
        let plan = plan_columns(&names(&["ID", "Name"]), &names(&["ID", "Name"]));
        let row = classify_row(&plan, &text(&["2", "B"]), &text(&["2", "B2"]), &CompareOptions::default());
        assert_eq!(row.changed, 1);
        assert_eq!(row.cells[0].tag, CellTag::Unchanged);
        assert_eq!(row.cells[1], OutputCell::new(CellValue::Text("B2".into()), CellTag::Changed));
    }

    #[test]
    fn numeric_drift_is_not_a_change() {
        let plan = plan_columns(&names(&["ID", "Qty"]), &names(&["ID", "Qty"]));
        let old = vec![CellValue::Text("1".into()), CellValue::Number(5.0)];
        let new = vec![CellValue::Text("1".into()), CellValue::Text("5".into())];
        let row = classify_row(&plan, &old, &new, &CompareOptions::default());
        assert!(!row.has_changes());
    }

    #[test]
    fn one_sided_columns_are_carried_unchanged() {
        let plan = plan_columns(&names(&["ID", "Legacy"]), &names(&["ID", "Notes"]));
        let row = classify_row(&plan, &text(&["1", "old"]), &text(&["1", "new"]), &CompareOptions::default());
        assert_eq!(row.changed, 0);
        let values = row.cells.iter().map(|c| c.value.to_string()).collect::<Vec<_>>();
        assert_eq!(values, vec!["1", "new", "old"]);
        assert!(row.cells.iter().all(|c| c.tag == CellTag::Unchanged));
    }

    #[test]
    fn show_old_values_renders_transition() {
        let plan = plan_columns(&names(&["ID", "Name"]), &names(&["ID", "Name"]));
        let options = CompareOptions {
            show_old_values: true,
            ..CompareOptions::default()
        };
        let row = classify_row(&plan, &text(&["2", "B"]), &text(&["2", "B2"]), &options);
        assert_eq!(row.cells[1].value, CellValue::Text("B ==> B2".into()));
    }

    #[test]
    fn blank_against_zero_respects_policy() {
        let plan = plan_columns(&names(&["ID", "Qty"]), &names(&["ID", "Qty"]));
        let old = vec![CellValue::Text("1".into()), CellValue::Empty];
        let new = vec![CellValue::Text("1".into()), CellValue::Number(0.0)];
        assert!(classify_row(&plan, &old, &new, &CompareOptions::default()).has_changes());
        let lenient = CompareOptions {
            blank_equals_zero: true,
            ..CompareOptions::default()
        };
        assert!(!classify_row(&plan, &old, &new, &lenient).has_changes());
    }

    #[test]
    fn projection_blanks_missing_columns() {
        let plan = plan_columns(&names(&["ID", "Legacy"]), &names(&["ID", "Notes"]));
        let added = project_row(&plan, &text(&["3", "n"]), Side::New);
        assert_eq!(added, text(&["3", "n", ""]));
        let removed = project_row(&plan, &text(&["1", "l"]), Side::Old);
        assert_eq!(removed, text(&["1", "", "l"]));
    }
}
