//! Presentation tables handed to renderers.
//!
//! Values leave this module final: absent cells are zero-filled, undefined
//! percentages are sanitized to 0, and everything is rounded. Renderers only
//! add separators and glyphs.

use crate::aggregate::{
    CategoryDetail, CategoryTotal, DashboardViews, GroupMonthSales, RankedCategory,
    StoreMonthSales, StoreShare, TrendPoint,
};
use crate::options::{ComposeOptions, MAX_DECIMALS};
use crate::pivot::{MonthPivot, GRAND_TOTAL};
use serde::Serialize;
use std::fmt;

/// What a value column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Sales,
    Difference,
    PercentChange,
    Change,
    Total,
    Rank,
    Share,
}

impl ColumnKind {
    /// Prefix used in qualified month column names
    pub fn prefix(self) -> &'static str {
        match self {
            ColumnKind::Sales => "Sales",
            ColumnKind::Difference => "Difference",
            ColumnKind::PercentChange => "Percent Change",
            ColumnKind::Change => "Change",
            ColumnKind::Total => "Total Sales",
            ColumnKind::Rank => "Rank",
            ColumnKind::Share => "Share",
        }
    }

    /// Whether the column holds a percentage
    pub fn is_percent(self) -> bool {
        matches!(self, ColumnKind::PercentChange | ColumnKind::Share)
    }
}

/// A value column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }

    fn for_month(kind: ColumnKind, month: &str) -> Self {
        Column::new(format!("{}_{month}", kind.prefix()), kind)
    }
}

/// Direction of a change, shown as an arrow by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Trend from the sign of a value
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Trend::Up
        } else if value < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    /// Arrow glyph, empty when flat
    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat => "",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.arrow())
    }
}

/// One table row: key cells then value cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub keys: Vec<String>,
    pub values: Vec<f64>,
}

/// A flat table with string key columns and numeric value columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationTable {
    pub title: String,
    pub key_names: Vec<String>,
    pub columns: Vec<Column>,
    pub rows: Vec<TableRow>,
}

impl PresentationTable {
    fn new(title: &str, key_names: &[&str], columns: Vec<Column>) -> Self {
        PresentationTable {
            title: title.to_string(),
            key_names: key_names.iter().map(|k| (*k).to_string()).collect(),
            columns,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, keys: Vec<String>, values: Vec<f64>) {
        self.rows.push(TableRow { keys, values });
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether any row besides the Grand Total is present
    pub fn has_data(&self) -> bool {
        self.rows
            .iter()
            .any(|row| row.keys.iter().all(|key| key != GRAND_TOTAL))
    }

    /// Value by row index and column name
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c.name == column)?;
        self.rows.get(row)?.values.get(col).copied()
    }

    /// Row index by its first key
    pub fn row_index(&self, key: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.keys.first().is_some_and(|k| k == key))
    }

    /// Up/down annotation for percent-change cells; `None` for other columns
    pub fn trend(&self, row: usize, col: usize) -> Option<Trend> {
        let column = self.columns.get(col)?;
        if column.kind != ColumnKind::PercentChange {
            return None;
        }
        self.rows.get(row)?.values.get(col).copied().map(Trend::of)
    }
}

/// Round to `decimals` places (capped at [`MAX_DECIMALS`]); NaN and
/// infinities become 0.
pub fn finalize(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10f64.powi(decimals.min(MAX_DECIMALS) as i32);
    let rounded = (value * scale).round() / scale;
    if !rounded.is_finite() {
        return value;
    }
    // avoid rendering "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn finalize_optional(value: Option<f64>, decimals: u32) -> f64 {
    value.map_or(0.0, |v| finalize(v, decimals))
}

/// Merge a month pivot's sales, differences and (optionally) percent changes
/// into one table: `Sales_<m>`..., `Difference_<m>`..., `Percent Change_<m>`...
pub fn compose_month_pivot(
    title: &str,
    pivot: &MonthPivot,
    options: &ComposeOptions,
) -> PresentationTable {
    let mut kinds = vec![ColumnKind::Sales, ColumnKind::Difference];
    if options.percent_change {
        kinds.push(ColumnKind::PercentChange);
    }

    let columns = kinds
        .iter()
        .flat_map(|&kind| pivot.months.iter().map(move |m| Column::for_month(kind, m)))
        .collect();
    let mut table = PresentationTable::new(title, &[pivot.index_name.as_str()], columns);

    let differences = pivot.differences();
    let percents = options.percent_change.then(|| pivot.percent_changes());

    for (idx, key) in pivot.row_keys.iter().enumerate() {
        let amount = options.amount_decimals;
        let mut values: Vec<f64> = pivot.values[idx]
            .iter()
            .map(|v| finalize(*v, amount))
            .collect();
        values.extend(differences[idx].iter().map(|d| finalize_optional(*d, amount)));
        if let Some(percents) = &percents {
            values.extend(
                percents[idx]
                    .iter()
                    .map(|p| finalize_optional(*p, options.percent_decimals)),
            );
        }
        table.push(vec![key.clone()], values);
    }

    table
}

/// Detail table: `Sales_<m>`..., `Change_<m>`..., `Total Sales`, `Rank`.
pub fn compose_category_detail(
    detail: &CategoryDetail,
    options: &ComposeOptions,
) -> PresentationTable {
    let mut columns: Vec<Column> = [ColumnKind::Sales, ColumnKind::Change]
        .iter()
        .flat_map(|&kind| detail.months.iter().map(move |m| Column::for_month(kind, m)))
        .collect();
    columns.push(Column::new(ColumnKind::Total.prefix(), ColumnKind::Total));
    columns.push(Column::new(ColumnKind::Rank.prefix(), ColumnKind::Rank));

    let mut table = PresentationTable::new(
        "Detailed Sales and Month-to-Month Changes by Kelompok Barang and Store",
        &["Kelompok Barang", "Store", "Group"],
        columns,
    );

    let amount = options.amount_decimals;
    for row in &detail.rows {
        let mut values: Vec<f64> = row.sales.iter().map(|v| finalize(*v, amount)).collect();
        values.extend(row.changes.iter().map(|c| finalize_optional(*c, amount)));
        values.push(finalize(row.total_sales, amount));
        values.push(row.rank as f64);
        table.push(
            vec![row.category.clone(), row.store.clone(), row.group.clone()],
            values,
        );
    }

    table
}

/// Per-group category ranking.
pub fn compose_ranked(ranked: &[RankedCategory], options: &ComposeOptions) -> PresentationTable {
    let mut table = PresentationTable::new(
        "Kelompok Barang Ranking by Group",
        &["Group", "Kelompok Barang"],
        vec![
            Column::new(ColumnKind::Total.prefix(), ColumnKind::Total),
            Column::new(ColumnKind::Rank.prefix(), ColumnKind::Rank),
        ],
    );
    for r in ranked {
        table.push(
            vec![r.group.clone(), r.category.clone()],
            vec![finalize(r.total_sales, options.amount_decimals), r.rank as f64],
        );
    }
    table
}

/// Top or bottom performer list.
pub fn compose_performers(
    title: &str,
    totals: &[CategoryTotal],
    options: &ComposeOptions,
) -> PresentationTable {
    let mut table = PresentationTable::new(
        title,
        &["Kelompok Barang"],
        vec![Column::new("Sales", ColumnKind::Sales)],
    );
    for t in totals {
        table.push(
            vec![t.category.clone()],
            vec![finalize(t.sales, options.amount_decimals)],
        );
    }
    table
}

/// Tidy (Group, Month, Sales) table.
pub fn compose_group_sales(sales: &[GroupMonthSales], options: &ComposeOptions) -> PresentationTable {
    let mut table = PresentationTable::new(
        "Total Sales by Group Over Months",
        &["Group", "Month"],
        vec![Column::new("Sales", ColumnKind::Sales)],
    );
    for s in sales {
        table.push(
            vec![s.group.clone(), s.month.clone()],
            vec![finalize(s.sales, options.amount_decimals)],
        );
    }
    table
}

/// Tidy (Month, Store, Sales) table.
pub fn compose_store_sales(
    title: &str,
    sales: &[StoreMonthSales],
    options: &ComposeOptions,
) -> PresentationTable {
    let mut table = PresentationTable::new(
        title,
        &["Month", "Store"],
        vec![Column::new("Sales", ColumnKind::Sales)],
    );
    for s in sales {
        table.push(
            vec![s.month.clone(), s.store.clone()],
            vec![finalize(s.sales, options.amount_decimals)],
        );
    }
    table
}

/// Store distribution of the selected categories.
pub fn compose_store_share(shares: &[StoreShare], options: &ComposeOptions) -> PresentationTable {
    let mut table = PresentationTable::new(
        "Sales Distribution for Selected Kelompok Barang",
        &["Store"],
        vec![
            Column::new("Sales", ColumnKind::Sales),
            Column::new("Share", ColumnKind::Share),
        ],
    );
    for s in shares {
        table.push(
            vec![s.store.clone()],
            vec![
                finalize(s.sales, options.amount_decimals),
                finalize(s.share, options.percent_decimals),
            ],
        );
    }
    table
}

/// Tidy (Month, Store, Category, Sales) trend table.
pub fn compose_trend(points: &[TrendPoint], options: &ComposeOptions) -> PresentationTable {
    let mut table = PresentationTable::new(
        "Sales Trend for Selected Kelompok Barang by Store",
        &["Month", "Store", "Kelompok Barang"],
        vec![Column::new("Sales", ColumnKind::Sales)],
    );
    for p in points {
        table.push(
            vec![p.month.clone(), p.store.clone(), p.category.clone()],
            vec![finalize(p.sales, options.amount_decimals)],
        );
    }
    table
}

/// The dashboard's views, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    GroupSales,
    GroupTable,
    StoreComparison,
    StoreTable,
    CategoryDetail,
    Ranking,
    CategoryComparison,
    StoreShare,
    Trend,
    Top,
    Bottom,
}

impl ViewKind {
    /// Every view in display order
    pub const ALL: [ViewKind; 11] = [
        ViewKind::GroupSales,
        ViewKind::GroupTable,
        ViewKind::StoreComparison,
        ViewKind::StoreTable,
        ViewKind::CategoryDetail,
        ViewKind::Ranking,
        ViewKind::CategoryComparison,
        ViewKind::StoreShare,
        ViewKind::Trend,
        ViewKind::Top,
        ViewKind::Bottom,
    ];
}

/// Compose one view.
pub fn compose_view(
    views: &DashboardViews,
    kind: ViewKind,
    options: &ComposeOptions,
) -> PresentationTable {
    match kind {
        ViewKind::GroupSales => compose_group_sales(&views.group_sales, options),
        ViewKind::GroupTable => {
            compose_month_pivot("Detailed Group Sales by Month", &views.group_pivot, options)
        }
        ViewKind::StoreComparison => {
            compose_store_sales("Store Sales Comparison", &views.store_comparison, options)
        }
        ViewKind::StoreTable => compose_month_pivot(
            "Detailed Data with Month-to-Month Changes",
            &views.store_pivot,
            options,
        ),
        ViewKind::CategoryDetail => compose_category_detail(&views.category_detail, options),
        ViewKind::Ranking => compose_ranked(&views.ranked_categories, options),
        ViewKind::CategoryComparison => compose_store_sales(
            "Sales Comparison for Selected Kelompok Barang",
            &views.selected.comparison,
            options,
        ),
        ViewKind::StoreShare => compose_store_share(&views.selected.store_share, options),
        ViewKind::Trend => compose_trend(&views.selected.trend, options),
        ViewKind::Top => compose_performers("Top Performing Kelompok Barang", &views.top, options),
        ViewKind::Bottom => compose_performers(
            "Bottom Performing Kelompok Barang",
            &views.bottom,
            options,
        ),
    }
}
