//! Sum-reductions over filtered tidy rows.
//!
//! Every view is rebuilt from scratch from the parsed rows and a selection;
//! nothing is cached between calls.

use crate::filter::FilterSelection;
use crate::month::{chronological, month_columns, parse_month};
use crate::options::AggregateOptions;
use crate::pivot::MonthPivot;
use crate::reshape::ParsedRow;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Sales summed by (Group, Month).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMonthSales {
    pub group: String,
    pub month: String,
    pub sales: f64,
}

/// Sales summed by (Month, Store).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreMonthSales {
    pub month: String,
    pub store: String,
    pub sales: f64,
}

/// One (Category, Store, Group) line of the detail pivot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDetailRow {
    pub category: String,
    pub store: String,
    pub group: String,
    /// Sales per month, aligned with [`CategoryDetail::months`]
    pub sales: Vec<f64>,
    /// Change from the previous month column; `None` for the first
    pub changes: Vec<Option<f64>>,
    pub total_sales: f64,
    /// Competition rank of `total_sales` within the group
    pub rank: usize,
}

/// Month-by-month sales for every (Category, Store, Group).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryDetail {
    pub months: Vec<String>,
    /// Ordered by group, then rank
    pub rows: Vec<CategoryDetailRow>,
}

/// A category's total in scope and its rank within its group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCategory {
    pub category: String,
    pub group: String,
    pub total_sales: f64,
    pub rank: usize,
}

/// A category's total in scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub sales: f64,
}

/// A store's portion of the selected categories' sales.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreShare {
    pub store: String,
    pub sales: f64,
    /// Percent of the selection total, 0 when the total is 0
    pub share: f64,
}

/// Sales summed by (Month, Store, Category).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub month: String,
    pub store: String,
    pub category: String,
    pub sales: f64,
}

/// Views over the category-filtered rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectedCategoryViews {
    pub comparison: Vec<StoreMonthSales>,
    pub store_share: Vec<StoreShare>,
    pub trend: Vec<TrendPoint>,
}

impl SelectedCategoryViews {
    /// True when the selected categories have no rows in scope
    pub fn is_empty(&self) -> bool {
        self.comparison.is_empty() && self.store_share.is_empty() && self.trend.is_empty()
    }
}

/// Everything the dashboard shows for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardViews {
    pub group_sales: Vec<GroupMonthSales>,
    pub group_pivot: MonthPivot,
    pub store_comparison: Vec<StoreMonthSales>,
    pub store_pivot: MonthPivot,
    pub category_detail: CategoryDetail,
    pub ranked_categories: Vec<RankedCategory>,
    pub top: Vec<CategoryTotal>,
    pub bottom: Vec<CategoryTotal>,
    pub selected: SelectedCategoryViews,
}

impl DashboardViews {
    /// True when the selection admits no rows at all
    pub fn is_empty(&self) -> bool {
        self.group_sales.is_empty() && self.category_detail.rows.is_empty()
    }
}

/// Sort items by month date, keeping input order for equal dates; unparseable months are dropped.
fn sort_by_month<T>(items: Vec<T>, month_of: impl Fn(&T) -> &str, format: &str) -> Vec<T> {
    let mut dated: Vec<(NaiveDate, T)> = items
        .into_iter()
        .filter_map(|item| parse_month(month_of(&item), format).map(|date| (date, item)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);
    dated.into_iter().map(|(_, item)| item).collect()
}

fn sum_by<K, F>(rows: &[&ParsedRow], key: F) -> BTreeMap<K, f64>
where
    K: Ord,
    F: Fn(&ParsedRow) -> K,
{
    let mut sums = BTreeMap::new();
    for row in rows {
        *sums.entry(key(row)).or_insert(0.0) += row.sales;
    }
    sums
}

/// Standard competition ranks ("min" method): `1 + count of strictly greater values`.
pub fn competition_ranks(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0; values.len()];
    let mut prev: Option<(f64, usize)> = None;
    for (pos, &idx) in order.iter().enumerate() {
        let rank = match prev {
            Some((value, rank)) if value == values[idx] => rank,
            _ => pos + 1,
        };
        ranks[idx] = rank;
        prev = Some((values[idx], rank));
    }
    ranks
}

/// Competition ranks computed separately for each group.
fn ranks_within_groups(groups: &[&str], totals: &[f64]) -> Vec<usize> {
    let mut members: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (idx, &group) in groups.iter().enumerate() {
        members.entry(group).or_default().push(idx);
    }

    let mut ranks = vec![0; totals.len()];
    for indices in members.values() {
        let group_totals: Vec<f64> = indices.iter().map(|&i| totals[i]).collect();
        for (&idx, rank) in indices.iter().zip(competition_ranks(&group_totals)) {
            ranks[idx] = rank;
        }
    }
    ranks
}

/// Sales by (Group, Month) in chronological order; unparseable months are dropped.
pub fn group_sales(rows: &[&ParsedRow], month_format: &str) -> Vec<GroupMonthSales> {
    let sums = sum_by(rows, |r| (r.group.clone(), r.month.clone()));
    let items = sums
        .into_iter()
        .map(|((group, month), sales)| GroupMonthSales {
            group,
            month,
            sales,
        })
        .collect();
    sort_by_month(items, |s: &GroupMonthSales| s.month.as_str(), month_format)
}

/// Sales by (Month, Store) in chronological order; unparseable months are dropped.
pub fn store_comparison(rows: &[&ParsedRow], month_format: &str) -> Vec<StoreMonthSales> {
    let sums = sum_by(rows, |r| (r.month.clone(), r.store.clone()));
    let items = sums
        .into_iter()
        .map(|((month, store), sales)| StoreMonthSales {
            month,
            store,
            sales,
        })
        .collect();
    sort_by_month(items, |s: &StoreMonthSales| s.month.as_str(), month_format)
}

fn distinct_months_of<'a, I>(months: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let set: indexmap::IndexSet<&str> = months.into_iter().collect();
    set.into_iter().collect()
}

/// Group x month pivot with a Grand Total row, months in chronological order.
pub fn group_pivot(sales: &[GroupMonthSales], month_format: &str) -> MonthPivot {
    let months = chronological(
        &distinct_months_of(sales.iter().map(|s| s.month.as_str())),
        month_format,
    );
    MonthPivot::from_triples(
        "Group",
        sales
            .iter()
            .map(|s| (s.group.as_str(), s.month.as_str(), s.sales)),
        months,
    )
    .with_grand_total()
}

/// Store x month pivot with a Grand Total row, months in chronological order.
pub fn store_pivot(sales: &[StoreMonthSales], month_format: &str) -> MonthPivot {
    let months = chronological(
        &distinct_months_of(sales.iter().map(|s| s.month.as_str())),
        month_format,
    );
    MonthPivot::from_triples(
        "Store",
        sales
            .iter()
            .map(|s| (s.store.as_str(), s.month.as_str(), s.sales)),
        months,
    )
    .with_grand_total()
}

/// Detail pivot keyed by (Category, Store, Group).
///
/// Month columns are chronological, with unparseable months kept at the end.
pub fn category_detail(rows: &[&ParsedRow], month_format: &str) -> CategoryDetail {
    let months = month_columns(
        &distinct_months_of(rows.iter().map(|r| r.month.as_str())),
        month_format,
    );
    let month_index: HashMap<&str, usize> = months
        .iter()
        .enumerate()
        .map(|(i, m)| (m.as_str(), i))
        .collect();

    let mut cells: BTreeMap<(&str, &str, &str), Vec<f64>> = BTreeMap::new();
    for row in rows {
        let line = cells
            .entry((row.category.as_str(), row.store.as_str(), row.group.as_str()))
            .or_insert_with(|| vec![0.0; months.len()]);
        line[month_index[row.month.as_str()]] += row.sales;
    }

    let mut detail: Vec<CategoryDetailRow> = cells
        .into_iter()
        .map(|((category, store, group), sales)| {
            let changes = sales
                .iter()
                .enumerate()
                .map(|(i, curr)| i.checked_sub(1).map(|prev| curr - sales[prev]))
                .collect();
            CategoryDetailRow {
                category: category.to_string(),
                store: store.to_string(),
                group: group.to_string(),
                total_sales: sales.iter().sum(),
                sales,
                changes,
                rank: 0,
            }
        })
        .collect();

    let groups: Vec<&str> = detail.iter().map(|r| r.group.as_str()).collect();
    let totals: Vec<f64> = detail.iter().map(|r| r.total_sales).collect();
    let ranks = ranks_within_groups(&groups, &totals);
    for (row, rank) in detail.iter_mut().zip(ranks) {
        row.rank = rank;
    }
    detail.sort_by(|a, b| a.group.cmp(&b.group).then(a.rank.cmp(&b.rank)));

    CategoryDetail {
        months,
        rows: detail,
    }
}

/// Per-category totals in first-encountered order.
fn category_totals<'a>(rows: &[&'a ParsedRow]) -> IndexMap<&'a str, (f64, &'a str)> {
    let mut totals: IndexMap<&'a str, (f64, &'a str)> = IndexMap::new();
    for row in rows {
        let entry = totals
            .entry(row.category.as_str())
            .or_insert((0.0, row.group.as_str()));
        entry.0 += row.sales;
    }
    totals
}

/// Categories ranked by total sales within their group.
pub fn rank_categories(rows: &[&ParsedRow]) -> Vec<RankedCategory> {
    let totals = category_totals(rows);
    let groups: Vec<&str> = totals.values().map(|(_, group)| *group).collect();
    let sums: Vec<f64> = totals.values().map(|(sum, _)| *sum).collect();
    let ranks = ranks_within_groups(&groups, &sums);

    let mut ranked: Vec<RankedCategory> = totals
        .into_iter()
        .zip(ranks)
        .map(|((category, (total_sales, group)), rank)| RankedCategory {
            category: category.to_string(),
            group: group.to_string(),
            total_sales,
            rank,
        })
        .collect();
    ranked.sort_by(|a, b| a.group.cmp(&b.group).then(a.rank.cmp(&b.rank)));
    ranked
}

/// The `n` best-selling categories; ties keep first-encountered order.
pub fn top_categories(rows: &[&ParsedRow], n: usize) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = category_totals(rows)
        .into_iter()
        .map(|(category, (sales, _))| CategoryTotal {
            category: category.to_string(),
            sales,
        })
        .collect();
    totals.sort_by(|a, b| b.sales.partial_cmp(&a.sales).unwrap_or(Ordering::Equal));
    totals.truncate(n);
    totals
}

/// The `n` worst-selling categories with strictly positive totals, ascending.
pub fn bottom_categories(rows: &[&ParsedRow], n: usize) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = category_totals(rows)
        .into_iter()
        .filter(|(_, (sales, _))| *sales > 0.0)
        .map(|(category, (sales, _))| CategoryTotal {
            category: category.to_string(),
            sales,
        })
        .collect();
    totals.sort_by(|a, b| a.sales.partial_cmp(&b.sales).unwrap_or(Ordering::Equal));
    totals.truncate(n);
    totals
}

/// Each store's sales and percentage share, stores in first-encountered order.
pub fn store_share(rows: &[&ParsedRow]) -> Vec<StoreShare> {
    let mut sums: IndexMap<&str, f64> = IndexMap::new();
    for row in rows {
        *sums.entry(row.store.as_str()).or_insert(0.0) += row.sales;
    }
    let total: f64 = sums.values().sum();

    sums.into_iter()
        .map(|(store, sales)| StoreShare {
            store: store.to_string(),
            sales,
            share: if total == 0.0 {
                0.0
            } else {
                sales / total * 100.0
            },
        })
        .collect()
}

/// Sales by (Month, Store, Category) in chronological order.
pub fn sales_trend(rows: &[&ParsedRow], month_format: &str) -> Vec<TrendPoint> {
    let sums = sum_by(rows, |r| (r.month.clone(), r.store.clone(), r.category.clone()));
    let items = sums
        .into_iter()
        .map(|((month, store, category), sales)| TrendPoint {
            month,
            store,
            category,
            sales,
        })
        .collect();
    sort_by_month(items, |p: &TrendPoint| p.month.as_str(), month_format)
}

/// Build every view for one selection.
pub fn aggregate(
    rows: &[ParsedRow],
    selection: &FilterSelection,
    options: &AggregateOptions,
) -> DashboardViews {
    let format = options.month_format.as_str();
    let filtered = selection.apply(rows);
    let compared = selection.apply_categories(rows);
    tracing::debug!(
        rows = rows.len(),
        filtered = filtered.len(),
        compared = compared.len(),
        "applied selection"
    );

    let selected = SelectedCategoryViews {
        comparison: store_comparison(&compared, format),
        store_share: store_share(&compared),
        trend: sales_trend(&compared, format),
    };
    let group_rows = group_sales(&filtered, format);
    let store_rows = store_comparison(&filtered, format);

    let views = DashboardViews {
        group_pivot: group_pivot(&group_rows, format),
        store_pivot: store_pivot(&store_rows, format),
        group_sales: group_rows,
        store_comparison: store_rows,
        category_detail: category_detail(&filtered, format),
        ranked_categories: rank_categories(&filtered),
        top: top_categories(&filtered, options.top_n),
        bottom: bottom_categories(&filtered, options.top_n),
        selected,
    };

    if views.is_empty() {
        tracing::info!("selection admits no rows");
    }
    views
}
