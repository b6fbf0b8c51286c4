//! Chronological ordering of `day_month` labels.

use chrono::NaiveDate;

/// Labels carry no year; they are anchored to 1900 for comparison.
const ANCHOR_YEAR: &str = "1900";

/// Parse a month label such as `01_Jan` with a chrono format such as `%d_%b`.
pub fn parse_month(label: &str, format: &str) -> Option<NaiveDate> {
    let anchored = format!("{label}|{ANCHOR_YEAR}");
    let anchored_format = format!("{format}|%Y");
    NaiveDate::parse_from_str(&anchored, &anchored_format).ok()
}

/// Parseable labels in date order; labels sharing a date keep their input order.
/// Unparseable labels are left out.
pub fn chronological<S: AsRef<str>>(labels: &[S], format: &str) -> Vec<String> {
    let mut dated: Vec<(NaiveDate, &str)> = labels
        .iter()
        .filter_map(|label| {
            let label = label.as_ref();
            parse_month(label, format).map(|date| (date, label))
        })
        .collect();
    dated.sort_by_key(|(date, _)| *date);
    dated.into_iter().map(|(_, label)| label.to_string()).collect()
}

/// Column order for month pivots that must not lose data: chronological
/// labels first, then unparseable labels in lexicographic order.
pub fn month_columns<S: AsRef<str>>(labels: &[S], format: &str) -> Vec<String> {
    let mut columns = chronological(labels, format);
    let mut rest: Vec<String> = labels
        .iter()
        .map(|label| label.as_ref())
        .filter(|label| parse_month(label, format).is_none())
        .map(str::to_string)
        .collect();
    rest.sort();
    rest.dedup();
    columns.extend(rest);
    columns
}
