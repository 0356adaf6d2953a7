//! Column sorting as a pure three-state reducer.
//!
//! Toggling a column cycles unsorted → ascending → descending → unsorted.
//! Toggling a different column starts again at ascending on that column.

use std::borrow::Borrow;
use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::normalize::fold_str;
use crate::record::{Record, RecordField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Current sort of the result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum SortState {
    /// Records keep the filter output order.
    #[default]
    Unsorted,

    /// Records ordered by one column.
    By {
        key: RecordField,
        direction: SortDirection,
    },
}

impl SortState {
    pub fn ascending(key: RecordField) -> Self {
        Self::By {
            key,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(key: RecordField) -> Self {
        Self::By {
            key,
            direction: SortDirection::Descending,
        }
    }

    /// Returns the next state after the user toggles `key`.
    #[must_use]
    pub fn toggle(self, key: RecordField) -> Self {
        match self {
            Self::By {
                key: current,
                direction: SortDirection::Ascending,
            } if current == key => Self::descending(key),
            Self::By {
                key: current,
                direction: SortDirection::Descending,
            } if current == key => Self::Unsorted,
            _ => Self::ascending(key),
        }
    }

    /// Sorts `records` in place.
    ///
    /// Comparison is case-insensitive on the chosen field. The sort is
    /// stable in both directions: records with equal keys keep their
    /// relative order.
    pub fn apply<R: Borrow<Record>>(&self, records: &mut [R]) {
        let Self::By { key, direction } = *self else {
            return;
        };

        match direction {
            SortDirection::Ascending => {
                records.sort_by_cached_key(|r| fold_str(r.borrow().field(key)));
            }
            SortDirection::Descending => {
                records.sort_by_cached_key(|r| Reverse(fold_str(r.borrow().field(key))));
            }
        }
    }

    /// Returns a sorted copy of `records`.
    pub fn sorted<R: Borrow<Record> + Clone>(&self, records: &[R]) -> Vec<R> {
        let mut out = records.to_vec();
        self.apply(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, specialty: &str) -> Record {
        Record {
            id: id.to_string(),
            standard_category: String::new(),
            issuing_decision_ref: String::new(),
            specialty: specialty.to_string(),
            procedure_name: name.to_string(),
            created_at: None,
        }
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_toggle_cycle() {
        let name = RecordField::ProcedureName;
        let state = SortState::default();
        let state = state.toggle(name);
        assert_eq!(state, SortState::ascending(name));
        let state = state.toggle(name);
        assert_eq!(state, SortState::descending(name));
        let state = state.toggle(name);
        assert_eq!(state, SortState::Unsorted);
    }

    #[test]
    fn test_toggle_other_column_restarts_ascending() {
        let state = SortState::descending(RecordField::ProcedureName).toggle(RecordField::Specialty);
        assert_eq!(state, SortState::ascending(RecordField::Specialty));
    }

    #[test]
    fn test_apply_case_insensitive() {
        let records = vec![
            record("1", "banana", ""),
            record("2", "Apple", ""),
            record("3", "cherry", ""),
        ];
        let sorted = SortState::ascending(RecordField::ProcedureName).sorted(&records);
        assert_eq!(ids(&sorted), vec!["2", "1", "3"]);

        let sorted = SortState::descending(RecordField::ProcedureName).sorted(&records);
        assert_eq!(ids(&sorted), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_ties_keep_input_order_in_both_directions() {
        let records = vec![
            record("a", "x", "Tim"),
            record("b", "x", "tieu"),
            record("c", "x", "TIM"),
            record("d", "x", "tim"),
        ];
        let asc = SortState::ascending(RecordField::Specialty).sorted(&records);
        assert_eq!(ids(&asc), vec!["b", "a", "c", "d"]);

        let desc = SortState::descending(RecordField::Specialty).sorted(&records);
        assert_eq!(ids(&desc), vec!["a", "c", "d", "b"]);
    }

    #[test]
    fn test_unsorted_keeps_order() {
        let records = vec![record("2", "b", ""), record("1", "a", "")];
        let sorted = SortState::Unsorted.sorted(&records);
        assert_eq!(ids(&sorted), vec!["2", "1"]);
    }

    #[test]
    fn test_apply_on_references() {
        let records = vec![record("1", "b", ""), record("2", "a", "")];
        let mut refs: Vec<&Record> = records.iter().collect();
        SortState::ascending(RecordField::ProcedureName).apply(&mut refs);
        assert_eq!(refs[0].id, "2");
    }
}
