//! Row-key x month matrices with month-over-month deltas.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Label of the appended totals row.
pub const GRAND_TOTAL: &str = "Grand Total";

/// A zero-filled `row_key x month` matrix of summed sales.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPivot {
    /// Name of the row dimension (e.g. `Group`, `Store`)
    pub index_name: String,
    /// Row keys, lexicographic, optionally followed by [`GRAND_TOTAL`]
    pub row_keys: Vec<String>,
    /// Month columns in the order given at construction
    pub months: Vec<String>,
    /// `values[row][month]`
    pub values: Vec<Vec<f64>>,
}

impl MonthPivot {
    /// Build a pivot from `(row_key, month, sales)` triples.
    ///
    /// Triples whose month is not in `months` are ignored; row/month
    /// combinations without triples are zero.
    pub fn from_triples<'a, I>(index_name: &str, triples: I, months: Vec<String>) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, f64)>,
    {
        let month_index: HashMap<&str, usize> = months
            .iter()
            .enumerate()
            .map(|(i, m)| (m.as_str(), i))
            .collect();

        let mut sums: HashMap<(String, usize), f64> = HashMap::new();
        let mut keys = BTreeSet::new();
        for (row_key, month, sales) in triples {
            let Some(&col) = month_index.get(month) else {
                continue;
            };
            keys.insert(row_key.to_string());
            *sums.entry((row_key.to_string(), col)).or_insert(0.0) += sales;
        }

        let row_keys: Vec<String> = keys.into_iter().collect();
        let values = row_keys
            .iter()
            .map(|key| {
                (0..months.len())
                    .map(|col| sums.get(&(key.clone(), col)).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();

        MonthPivot {
            index_name: index_name.to_string(),
            row_keys,
            months,
            values,
        }
    }

    /// Check if the pivot has no rows
    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty()
    }

    /// Append a [`GRAND_TOTAL`] row holding each month's column sum.
    #[must_use]
    pub fn with_grand_total(mut self) -> Self {
        let totals: Vec<f64> = (0..self.months.len())
            .map(|col| self.values.iter().map(|row| row[col]).sum())
            .collect();
        self.row_keys.push(GRAND_TOTAL.to_string());
        self.values.push(totals);
        self
    }

    /// Row values by key
    pub fn row(&self, key: &str) -> Option<&[f64]> {
        self.row_keys
            .iter()
            .position(|k| k == key)
            .map(|i| self.values[i].as_slice())
    }

    /// `value[m] - value[m-1]` per cell; `None` for the first month.
    pub fn differences(&self) -> Vec<Vec<Option<f64>>> {
        self.values
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, curr)| i.checked_sub(1).map(|prev| curr - row[prev]))
                    .collect()
            })
            .collect()
    }

    /// `(value[m] - value[m-1]) / value[m-1] * 100` per cell.
    ///
    /// `None` for the first month and wherever the ratio is undefined or
    /// infinite (previous value 0).
    pub fn percent_changes(&self) -> Vec<Vec<Option<f64>>> {
        self.values
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, curr)| {
                        let prev = row[i.checked_sub(1)?];
                        percent_change(prev, *curr)
                    })
                    .collect()
            })
            .collect()
    }
}

/// Percent change from `prev` to `curr`, `None` when not finite.
pub fn percent_change(prev: f64, curr: f64) -> Option<f64> {
    let pct = (curr - prev) / prev * 100.0;
    pct.is_finite().then_some(pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn months(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|m| (*m).to_string()).collect()
    }

    #[test]
    fn test_from_triples_zero_fills_and_sorts_keys() {
        let pivot = MonthPivot::from_triples(
            "Group",
            vec![
                ("GRC", "01_Feb", 5.0),
                ("BZR", "01_Jan", 100.0),
                ("BZR", "01_Jan", 50.0),
                ("BZR", "01_Mar", 1.0),
            ],
            months(&["01_Jan", "01_Feb"]),
        );

        assert_eq!(pivot.row_keys, vec!["BZR", "GRC"]);
        assert_eq!(pivot.row("BZR").unwrap(), &[150.0, 0.0]);
        assert_eq!(pivot.row("GRC").unwrap(), &[0.0, 5.0]);
    }

    #[test]
    fn test_grand_total_is_column_sum() {
        let pivot = MonthPivot::from_triples(
            "Group",
            vec![("A", "m1", 1.0), ("B", "m1", 2.0), ("B", "m2", 4.0)],
            months(&["m1", "m2"]),
        )
        .with_grand_total();

        assert_eq!(pivot.row(GRAND_TOTAL).unwrap(), &[3.0, 4.0]);
        assert_eq!(pivot.row_keys.last().unwrap(), GRAND_TOTAL);
    }

    #[test]
    fn test_differences_and_percent_changes() {
        let pivot = MonthPivot::from_triples(
            "Group",
            vec![("BZR", "01_Jan", 100.0), ("BZR", "01_Feb", 150.0)],
            months(&["01_Jan", "01_Feb"]),
        );

        assert_eq!(pivot.differences(), vec![vec![None, Some(50.0)]]);
        assert_eq!(pivot.percent_changes(), vec![vec![None, Some(50.0)]]);
    }

    #[test]
    fn test_percent_change_from_zero_is_undefined() {
        assert_eq!(percent_change(0.0, 20.0), None);
        assert_eq!(percent_change(0.0, 0.0), None);
        assert_eq!(percent_change(200.0, 100.0), Some(-50.0));
    }

    #[test]
    fn test_empty_pivot() {
        let pivot = MonthPivot::from_triples("Store", Vec::<(&str, &str, f64)>::new(), Vec::new()).with_grand_total();
        assert_eq!(pivot.row_keys, vec![GRAND_TOTAL]);
        assert!(pivot.values[0].is_empty());
        assert!(pivot.differences()[0].is_empty());
    }
}
