//! Cohort Matrix Normalization
//!
//! Turns a sparse [`CohortTable`] into a dense, display-ready matrix:
//!
//! 1. The column list is the sorted, deduplicated union of every period key
//!    found in any cohort, capped at `max_periods`.
//! 2. Rows are cohorts ordered by the date their key represents (non-date
//!    keys last), capped at `max_cohorts`.
//! 3. Every retained `(cohort, period)` pair gets an explicit cell: the raw
//!    value, or `None` when the backend had no data for it.
//!
//! Caps hide data rather than drop it from the computation; the untruncated
//! counts travel with the matrix so callers can say "showing first N".
//!
//! Period keys that are not non-negative integers are dropped with a warning.

use crate::cohort_key::CohortKeyParser;
use crate::models::{CohortSizes, CohortTable};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

pub const DEFAULT_MAX_COHORTS: usize = 20;
pub const DEFAULT_MAX_PERIODS: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRow {
    pub cohort_key: String,
    pub size: u64,
    /// One entry per retained period; `None` means no data.
    pub cells: BTreeMap<u32, Option<f64>>,
}

impl CohortRow {
    pub fn cell(&self, period: u32) -> Option<f64> {
        self.cells.get(&period).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortMatrix {
    pub periods: Vec<u32>,
    pub rows: Vec<CohortRow>,
    /// Distinct valid periods before the cap was applied.
    pub total_periods: usize,
    /// Cohorts before the cap was applied.
    pub total_cohorts: usize,
    pub truncated: bool,
}

impl CohortMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.periods.is_empty()
    }
}

/// Build the dense view of `table`. Pure: identical inputs give identical output.
pub fn normalize(
    table: &CohortTable,
    sizes: &CohortSizes,
    max_cohorts: usize,
    max_periods: usize,
) -> CohortMatrix {
    let all_periods = collect_periods(table);
    let total_periods = all_periods.len();
    let total_cohorts = table.len();

    let periods: Vec<u32> = all_periods.into_iter().take(max_periods).collect();

    let rows: Vec<CohortRow> = ordered_cohorts(table)
        .into_iter()
        .take(max_cohorts)
        .map(|cohort_key| {
            let values = &table[cohort_key];
            let cells = periods
                .iter()
                .map(|&period| (period, lookup(values, period)))
                .collect();

            CohortRow {
                cohort_key: cohort_key.to_string(),
                size: sizes.get(cohort_key).copied().unwrap_or(0),
                cells,
            }
        })
        .collect();

    let truncated = total_periods > max_periods || total_cohorts > max_cohorts;

    debug!(
        total_periods,
        total_cohorts,
        shown_periods = periods.len(),
        shown_cohorts = rows.len(),
        truncated,
        "Normalized cohort table"
    );

    CohortMatrix {
        periods,
        rows,
        total_periods,
        total_cohorts,
        truncated,
    }
}

/// Sorted, deduplicated union of every valid period key in `table`.
pub fn collect_periods(table: &CohortTable) -> Vec<u32> {
    let mut periods = BTreeSet::new();
    let mut rejected = BTreeSet::new();

    for key in table.values().flat_map(|cells| cells.keys()) {
        match CohortKeyParser::parse_period(key) {
            Some(period) => {
                periods.insert(period);
            }
            None => {
                rejected.insert(key.as_str());
            }
        }
    }

    for key in rejected {
        warn!(period_key = %key, "Dropping period key that is not a non-negative integer");
    }

    periods.into_iter().collect()
}

/// Cohort keys in display order: by date, then non-date keys lexicographically.
pub fn ordered_cohorts(table: &CohortTable) -> Vec<&str> {
    CohortKeyParser::sort(table.keys().map(String::as_str))
}

/// Value stored for `period`, matching keys such as "01" or " 1" by number.
pub(crate) fn lookup(values: &BTreeMap<String, f64>, period: u32) -> Option<f64> {
    if let Some(value) = values.get(&period.to_string()) {
        return Some(*value);
    }
    values
        .iter()
        .find(|(key, _)| CohortKeyParser::parse_period(key) == Some(period))
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &[(&str, f64)])]) -> CohortTable {
        entries
            .iter()
            .map(|(cohort, cells)| {
                (
                    cohort.to_string(),
                    cells.iter().map(|(p, v)| (p.to_string(), *v)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_periods_are_sorted_union() {
        let t = table(&[
            ("2024-01-01", &[("0", 1.0), ("2", 0.4), ("10", 0.1)]),
            ("2024-02-01", &[("0", 1.0), ("1", 0.5)]),
        ]);
        let m = normalize(&t, &CohortSizes::new(), 20, 12);
        assert_eq!(m.periods, vec![0, 1, 2, 10]);
        assert!(!m.truncated);
    }

    #[test]
    fn test_absent_cells_are_none_not_zero() {
        let t = table(&[
            ("2024-01-01", &[("0", 1.0), ("1", 0.0)]),
            ("2024-02-01", &[("0", 1.0)]),
        ]);
        let m = normalize(&t, &CohortSizes::new(), 20, 12);
        assert_eq!(m.rows[0].cell(1), Some(0.0));
        assert_eq!(m.rows[1].cell(1), None);
        assert!(m.rows[1].cells.contains_key(&1));
    }

    #[test]
    fn test_invalid_period_keys_dropped() {
        let t = table(&[("2024-01-01", &[("0", 1.0), ("NaN", 0.3), ("-1", 0.2)])]);
        let m = normalize(&t, &CohortSizes::new(), 20, 12);
        assert_eq!(m.periods, vec![0]);
        assert_eq!(m.total_periods, 1);
    }

    #[test]
    fn test_padded_period_key_matches() {
        let t = table(&[("2024-01-01", &[("01", 0.5)])]);
        let m = normalize(&t, &CohortSizes::new(), 20, 12);
        assert_eq!(m.periods, vec![1]);
        assert_eq!(m.rows[0].cell(1), Some(0.5));
    }

    #[test]
    fn test_cohorts_sorted_by_date() {
        let t = table(&[
            ("2024-03-01", &[("0", 1.0)]),
            ("direct", &[("0", 1.0)]),
            ("2023-12-01", &[("0", 1.0)]),
        ]);
        let m = normalize(&t, &CohortSizes::new(), 20, 12);
        let keys: Vec<_> = m.rows.iter().map(|r| r.cohort_key.as_str()).collect();
        assert_eq!(keys, vec!["2023-12-01", "2024-03-01", "direct"]);
    }
}
