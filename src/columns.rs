//! Header normalisation and old/new column correspondence.

use std::collections::{HashMap, HashSet};

use log::debug;

/// Makes header names unique: repeated names get `.1`, `.2`, ... suffixes and
/// blank headers become `Column{n}` (1-based position).
pub fn dedupe_headers(headers: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut output = Vec::with_capacity(headers.len());
    for (idx, raw) in headers.iter().enumerate() {
        let base = match raw.trim() {
            "" => format!("Column{}", idx + 1),
            trimmed => trimmed.to_string(),
        };
        let mut candidate = base.clone();
        let mut counter = 1usize;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{counter}");
            counter += 1;
        }
        seen.insert(candidate.clone());
        output.push(candidate);
    }
    output
}

/// Name used to pair an old column with a new one.
pub fn base_name(name: &str) -> &str {
    name.trim()
}

/// Where an output column takes its values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSlot {
    Both { old: usize, new: usize },
    NewOnly(usize),
    OldOnly(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan {
    headers: Vec<String>,
    slots: Vec<ColumnSlot>,
}

impl ColumnPlan {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn slots(&self) -> &[ColumnSlot] {
        &self.slots
    }

    pub fn comparable_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, ColumnSlot::Both { .. }))
            .count()
    }
}

/// Lays out output columns: the new table's columns in order, then columns
/// only the old table has.
pub fn plan_columns(old_columns: &[String], new_columns: &[String]) -> ColumnPlan {
    let old_lookup: HashMap<&str, usize> = old_columns
        .iter()
        .enumerate()
        .map(|(idx, name)| (base_name(name), idx))
        .collect();

    let mut headers = Vec::with_capacity(old_columns.len().max(new_columns.len()));
    let mut slots = Vec::with_capacity(headers.capacity());
    let mut matched_old = vec![false; old_columns.len()];

    for (new_idx, name) in new_columns.iter().enumerate() {
        headers.push(name.clone());
        match old_lookup.get(base_name(name)) {
            Some(&old_idx) if !matched_old[old_idx] => {
                matched_old[old_idx] = true;
                slots.push(ColumnSlot::Both {
                    old: old_idx,
                    new: new_idx,
                });
            }
            _ => slots.push(ColumnSlot::NewOnly(new_idx)),
        }
    }
    for (old_idx, name) in old_columns.iter().enumerate() {
        if !matched_old[old_idx] {
            headers.push(name.clone());
            slots.push(ColumnSlot::OldOnly(old_idx));
        }
    }

    let plan = ColumnPlan { headers, slots };
    debug!(
        "Column plan: {} comparable of {} output column(s)",
        plan.comparable_count(),
        plan.slots.len()
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn dedupe_suffixes_repeats_and_names_blanks() {
        let deduped = dedupe_headers(&names(&["ID", " Name ", "Name", "", "Name"]));
        assert_eq!(deduped, names(&["ID", "Name", "Name.1", "Column4", "Name.2"]));
    }

    #[test]
    fn plan_keeps_new_order_and_appends_old_only_columns() {
        let plan = plan_columns(&names(&["ID", "Legacy", "Name"]), &names(&["Name", "ID", "Notes"]));
        assert_eq!(plan.headers(), names(&["Name", "ID", "Notes", "Legacy"]).as_slice());
        assert_eq!(
            plan.slots(),
            &[
                ColumnSlot::Both { old: 2, new: 0 },
                ColumnSlot::Both { old: 0, new: 1 },
                ColumnSlot::NewOnly(2),
                ColumnSlot::OldOnly(1),
            ]
        );
        assert_eq!(plan.comparable_count(), 2);
    }

    #[test]
    fn disjoint_schemas_have_no_comparable_columns() {
        let plan = plan_columns(&names(&["A"]), &names(&["B"]));
        assert_eq!(plan.comparable_count(), 0);
        assert_eq!(plan.headers(), names(&["B", "A"]).as_slice());
    }
}
