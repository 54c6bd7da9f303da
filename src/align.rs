//! Row alignment: splits the union of two key sets into added, removed and
//! common keys.

use itertools::{EitherOrBoth, Itertools};

use crate::keys::{Key, KeyIndex};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentResult {
    pub added: Vec<Key>,
    pub removed: Vec<Key>,
    pub common: Vec<Key>,
}

impl AlignmentResult {
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.common.len()
    }
}

/// Merge-walks both ordered indexes once; each output set stays in key order.
pub fn align(old: &KeyIndex, new: &KeyIndex) -> AlignmentResult {
    let mut result = AlignmentResult::default();
    for pair in old.keys().merge_join_by(new.keys(), |a, b| a.cmp(b)) {
        match pair {
            EitherOrBoth::Both(key, _) => result.common.push(key.clone()),
            EitherOrBoth::Left(key) => result.removed.push(key.clone()),
            EitherOrBoth::Right(key) => result.added.push(key.clone()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Side, keys::{KeyOptions, extract_keys}, sheet::Table};

    fn index(keys: &[&str]) -> KeyIndex {
        let rows = keys.iter().map(|k| vec![*k]).collect::<Vec<_>>();
        let rows = rows.iter().map(|r| r.as_slice()).collect::<Vec<_>>();
        let table = Table::from_text("S", &["ID"], &rows);
        extract_keys(&table, Side::Old, &KeyOptions::new("ID")).unwrap()
    }

    fn strings(keys: &[Key]) -> Vec<&str> {
        keys.iter().map(Key::as_str).collect()
    }

    #[test]
    fn splits_keys_into_three_sets() {
        let result = align(&index(&["1", "2"]), &index(&["2", "3"]));
        assert_eq!(strings(&result.removed), vec!["1"]);
        assert_eq!(strings(&result.added), vec!["3"]);
        assert_eq!(strings(&result.common), vec!["2"]);
        assert_eq!(result.total(), 3);
    }

    #[test]
    fn output_is_sorted_regardless_of_row_order() {
        let result = align(&index(&["IO9", "10", "IO1"]), &index(&["IO3", "2", "IO9"]));
        assert_eq!(strings(&result.added), vec!["2", "IO3"]);
        assert_eq!(strings(&result.removed), vec!["10", "IO1"]);
        assert_eq!(strings(&result.common), vec!["IO9"]);
    }

    #[test]
    fn empty_sides_align_cleanly() {
        let result = align(&KeyIndex::default(), &index(&["A"]));
        assert_eq!(strings(&result.added), vec!["A"]);
        assert!(result.removed.is_empty() && result.common.is_empty());
    }
}
