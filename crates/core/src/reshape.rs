//! Wide-to-long reshaping.
//!
//! Every non-category cell of a wide sheet is melted into a [`LongRow`], then
//! parsed into a [`ParsedRow`] or rejected with a [`DropReason`]. Rejected
//! rows never stop the pass; they are tallied in the [`ReshapeReport`].

use crate::error::{PipelineError, PipelineResult};
use crate::header::{find_category_column, flatten_headers};
use crate::options::{ReshapeOptions, ShortCategoryPolicy};
use indexmap::IndexSet;
use regex::Regex;
use salespivot_sheet::{CellValue, Sheet, HEADER_ROWS};
use serde::Serialize;
use std::fmt;

/// Characters of the category that form the group code.
pub const GROUP_CODE_LEN: usize = 3;

/// One melted cell: category label, source column key, raw cell value.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRow {
    pub category: String,
    pub month_store: String,
    pub sales: CellValue,
}

/// A melted cell with Month, Store, numeric Sales and Group resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedRow {
    pub category: String,
    pub month_store: String,
    pub month: String,
    pub store: String,
    pub sales: f64,
    pub group: String,
}

/// Why a melted cell did not become a [`ParsedRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Column key does not match `<digits>_<word>_<letters>`
    UnmatchedMonthStore,
    /// Blank category, or too short under [`ShortCategoryPolicy::Drop`]
    MissingCategory,
    /// Cell is not a finite number under the configured number format
    NonNumericSales,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::UnmatchedMonthStore => write!(f, "unmatched month/store column"),
            DropReason::MissingCategory => write!(f, "missing category"),
            DropReason::NonNumericSales => write!(f, "non-numeric sales"),
        }
    }
}

/// Per-reason drop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    pub unmatched_month_store: usize,
    pub missing_category: usize,
    pub non_numeric_sales: usize,
}

impl DropCounts {
    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::UnmatchedMonthStore => self.unmatched_month_store += 1,
            DropReason::MissingCategory => self.missing_category += 1,
            DropReason::NonNumericSales => self.non_numeric_sales += 1,
        }
    }

    /// Total dropped rows
    pub fn total(&self) -> usize {
        self.unmatched_month_store + self.missing_category + self.non_numeric_sales
    }
}

/// Summary of one reshape pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReshapeReport {
    /// Body rows read below the header
    pub source_rows: usize,
    /// Cells emitted by the melt
    pub melted: usize,
    /// Cells that became parsed rows
    pub kept: usize,
    pub dropped: DropCounts,
}

/// Output of [`reshape`].
#[derive(Debug, Clone, Serialize)]
pub struct Reshaped {
    /// Flattened key of the category column
    pub category_column: String,
    /// All flattened column keys in sheet order
    pub columns: Vec<String>,
    pub rows: Vec<ParsedRow>,
    pub report: ReshapeReport,
}

fn month_store_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+_\w+)_([a-zA-Z]+)").expect("valid regex"))
}

/// Extract `(month, store)` from a flattened column key.
///
/// The pattern is searched, not anchored: the leftmost match wins and text
/// around it is ignored.
pub fn split_month_store(key: &str) -> Option<(String, String)> {
    let caps = month_store_regex().captures(key)?;
    let month = caps.get(1)?.as_str().to_string();
    let store = caps.get(2)?.as_str().to_string();
    Some((month, store))
}

/// Derive the group code: the first three characters, upper-cased.
///
/// Returns `None` for blank categories, and for short ones under
/// [`ShortCategoryPolicy::Drop`].
pub fn derive_group(category: &str, policy: ShortCategoryPolicy) -> Option<String> {
    if category.trim().is_empty() {
        return None;
    }

    let prefix: String = category.chars().take(GROUP_CODE_LEN).collect();
    let is_short = prefix.chars().count() < GROUP_CODE_LEN;
    match (is_short, policy) {
        (true, ShortCategoryPolicy::Drop) => None,
        _ => Some(prefix.to_uppercase()),
    }
}

/// Melt every non-category column into long rows, row by row.
pub fn melt(sheet: &Sheet, columns: &[String], category_index: usize) -> Vec<LongRow> {
    let mut long = Vec::new();

    for (row_idx, row) in sheet.data_rows(HEADER_ROWS).enumerate() {
        let row_idx = row_idx + HEADER_ROWS;
        let category = row.get(category_index).map(CellValue::as_str).unwrap_or_default();

        for (col_idx, key) in columns.iter().enumerate() {
            if col_idx == category_index {
                continue;
            }
            long.push(LongRow {
                category: category.clone(),
                month_store: key.clone(),
                sales: sheet.cell_or_null(row_idx, col_idx).clone(),
            });
        }
    }

    long
}

/// Resolve one melted cell.
pub fn parse_long_row(row: LongRow, options: &ReshapeOptions) -> Result<ParsedRow, DropReason> {
    let (month, store) =
        split_month_store(&row.month_store).ok_or(DropReason::UnmatchedMonthStore)?;
    let group =
        derive_group(&row.category, options.short_category).ok_or(DropReason::MissingCategory)?;
    let sales = options
        .number_format
        .coerce(&row.sales)
        .ok_or(DropReason::NonNumericSales)?;

    Ok(ParsedRow {
        category: row.category,
        month_store: row.month_store,
        month,
        store,
        sales,
        group,
    })
}

/// Reshape a wide sales sheet into tidy rows.
///
/// # Errors
///
/// Fails when the sheet has no two-row header, when header keys collide, or
/// when no column carries every category marker. Nothing is reshaped in
/// those cases.
pub fn reshape(sheet: &Sheet, options: &ReshapeOptions) -> PipelineResult<Reshaped> {
    let pairs = sheet.header_pairs(&options.header)?;
    let columns = flatten_headers(&pairs)?;

    let Some(category_index) = find_category_column(&columns, &options.category_markers) else {
        tracing::warn!(sheet = sheet.name(), "category column not found");
        return Err(PipelineError::category_not_found(
            sheet.name(),
            &options.category_markers,
        ));
    };
    let category_column = columns[category_index].clone();
    tracing::debug!(
        sheet = sheet.name(),
        column = %category_column,
        index = category_index,
        "detected category column"
    );

    let long = melt(sheet, &columns, category_index);
    let mut report = ReshapeReport {
        source_rows: sheet.row_count().saturating_sub(HEADER_ROWS),
        melted: long.len(),
        ..ReshapeReport::default()
    };

    let mut rows = Vec::with_capacity(long.len());
    for outcome in long.into_iter().map(|row| parse_long_row(row, options)) {
        match outcome {
            Ok(parsed) => rows.push(parsed),
            Err(reason) => report.dropped.record(reason),
        }
    }
    report.kept = rows.len();

    if report.dropped.total() > 0 {
        tracing::warn!(
            unmatched_month_store = report.dropped.unmatched_month_store,
            missing_category = report.dropped.missing_category,
            non_numeric_sales = report.dropped.non_numeric_sales,
            "dropped melted cells"
        );
    }
    tracing::info!(
        sheet = sheet.name(),
        melted = report.melted,
        kept = report.kept,
        dropped = report.dropped.total(),
        "reshaped sheet"
    );

    Ok(Reshaped {
        category_column,
        columns,
        rows,
        report,
    })
}

fn distinct<'a, F>(rows: &'a [ParsedRow], field: F) -> Vec<String>
where
    F: Fn(&'a ParsedRow) -> &'a str,
{
    let set: IndexSet<&str> = rows.iter().map(field).collect();
    set.into_iter().map(str::to_string).collect()
}

/// Distinct groups in first-encountered order
pub fn distinct_groups(rows: &[ParsedRow]) -> Vec<String> {
    distinct(rows, |r| r.group.as_str())
}

/// Distinct months in first-encountered order
pub fn distinct_months(rows: &[ParsedRow]) -> Vec<String> {
    distinct(rows, |r| r.month.as_str())
}

/// Distinct stores in first-encountered order
pub fn distinct_stores(rows: &[ParsedRow]) -> Vec<String> {
    distinct(rows, |r| r.store.as_str())
}

/// Distinct categories in first-encountered order
pub fn distinct_categories(rows: &[ParsedRow]) -> Vec<String> {
    distinct(rows, |r| r.category.as_str())
}
