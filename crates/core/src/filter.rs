//! Set-membership filters chosen by the calling shell.

use crate::reshape::{
    distinct_categories, distinct_groups, distinct_months, distinct_stores, ParsedRow,
};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Allowed values per dimension. An empty set admits nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub groups: IndexSet<String>,
    pub months: IndexSet<String>,
    pub stores: IndexSet<String>,
    /// Only used by the selected-category views
    pub categories: IndexSet<String>,
}

impl FilterSelection {
    /// Create an empty selection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every group, month and store present in `rows`; categories start with
    /// the first encountered category only.
    #[must_use]
    pub fn select_all(rows: &[ParsedRow]) -> Self {
        FilterSelection {
            groups: distinct_groups(rows).into_iter().collect(),
            months: distinct_months(rows).into_iter().collect(),
            stores: distinct_stores(rows).into_iter().collect(),
            categories: distinct_categories(rows).into_iter().take(1).collect(),
        }
    }

    /// Replace the allowed groups
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the allowed months
    #[must_use]
    pub fn with_months<I, S>(mut self, months: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.months = months.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the allowed stores
    #[must_use]
    pub fn with_stores<I, S>(mut self, stores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stores = stores.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the compared categories
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    fn admits_period(&self, row: &ParsedRow) -> bool {
        self.months.contains(&row.month) && self.stores.contains(&row.store)
    }

    /// Whether a row passes the group, month and store tests
    pub fn admits(&self, row: &ParsedRow) -> bool {
        self.groups.contains(&row.group) && self.admits_period(row)
    }

    /// Whether a row passes the category, month and store tests
    pub fn admits_category(&self, row: &ParsedRow) -> bool {
        self.categories.contains(&row.category) && self.admits_period(row)
    }

    /// Rows passing [`admits`](Self::admits), in input order
    pub fn apply<'a>(&self, rows: &'a [ParsedRow]) -> Vec<&'a ParsedRow> {
        rows.iter().filter(|row| self.admits(row)).collect()
    }

    /// Rows passing [`admits_category`](Self::admits_category), in input order
    pub fn apply_categories<'a>(&self, rows: &'a [ParsedRow]) -> Vec<&'a ParsedRow> {
        rows.iter().filter(|row| self.admits_category(row)).collect()
    }
}
