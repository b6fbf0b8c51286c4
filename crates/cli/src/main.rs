//! # salespivot-cli
//!
//! Command-line sales dashboard: loads a wide monthly sales workbook, applies
//! the chosen filters and prints the dashboard views.

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use colored::Colorize;
use salespivot_core::{
    compute, ColumnKind, ComposeOptions, Dashboard, FilterSelection, ParsedRow, PipelineOptions,
    PresentationTable, Trend, ViewKind,
};
use salespivot_sheet::{Book, Sheet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// salespivot - monthly sales dashboard for wide store sheets
#[derive(Parser)]
#[command(name = "salespivot")]
#[command(author, version, about = "Monthly sales dashboard for wide store sheets", long_about = None)]
struct Cli {
    /// Workbook (.xlsx) to load
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Sheet to analyse (defaults to the first sheet)
    #[arg(short = 's', long = "sheet")]
    sheet: Option<String>,

    /// List the workbook's sheets and exit
    #[arg(long = "list-sheets")]
    list_sheets: bool,

    /// Groups to include (default: all)
    #[arg(short = 'g', long = "group", value_name = "GROUP")]
    groups: Vec<String>,

    /// Months to include (default: all)
    #[arg(short = 'm', long = "month", value_name = "MONTH")]
    months: Vec<String>,

    /// Stores to include (default: all)
    #[arg(long = "store", value_name = "STORE")]
    stores: Vec<String>,

    /// Categories for the comparison, share and trend views (default: the first one)
    #[arg(short = 'c', long = "category", value_name = "CATEGORY")]
    categories: Vec<String>,

    /// Add percent-change columns to the month tables
    #[arg(short = 'p', long = "percent")]
    percent: bool,

    /// Views to print (default: all)
    #[arg(long = "view", value_enum)]
    views: Vec<View>,

    /// Output format (json, csv, table)
    #[arg(short = 'f', long = "format", default_value = "table")]
    format: OutputFormat,

    /// JSON options file
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Length of the top/bottom performer lists
    #[arg(long = "top", value_name = "N")]
    top: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output format for results.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Pretty table output (default)
    #[default]
    Table,
}

/// Dashboard view selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum View {
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

impl From<View> for ViewKind {
    fn from(view: View) -> Self {
        match view {
            View::GroupSales => ViewKind::GroupSales,
            View::GroupTable => ViewKind::GroupTable,
            View::StoreComparison => ViewKind::StoreComparison,
            View::StoreTable => ViewKind::StoreTable,
            View::CategoryDetail => ViewKind::CategoryDetail,
            View::Ranking => ViewKind::Ranking,
            View::CategoryComparison => ViewKind::CategoryComparison,
            View::StoreShare => ViewKind::StoreShare,
            View::Trend => ViewKind::Trend,
            View::Top => ViewKind::Top,
            View::Bottom => ViewKind::Bottom,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let stdout = std::io::stdout();
    run(&cli, &mut stdout.lock())
}

/// Load the workbook, build the dashboard and write the requested views.
fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    // The upload is parsed fresh on every run
    let bytes = std::fs::read(&cli.file)
        .with_context(|| format!("Failed to read file: {}", cli.file.display()))?;
    let book = Book::from_xlsx_bytes(&bytes)
        .with_context(|| format!("Failed to open workbook: {}", cli.file.display()))?;

    if cli.list_sheets {
        for name in book.sheet_names() {
            writeln!(out, "{name}")?;
        }
        return Ok(());
    }

    let options = load_options(cli)?;
    let sheet = select_sheet(&book, cli.sheet.as_deref())?;

    let mut dashboard = compute(sheet, &FilterSelection::new(), &options)?;
    let selection = build_selection(cli, &dashboard.reshaped.rows);
    dashboard.reselect(selection, &options.aggregate);

    let kinds: Vec<ViewKind> = if cli.views.is_empty() {
        ViewKind::ALL.to_vec()
    } else {
        cli.views.iter().map(|view| ViewKind::from(*view)).collect()
    };
    let tables: Vec<PresentationTable> = kinds
        .iter()
        .map(|kind| dashboard.table(*kind, &options.compose))
        .collect();
    tracing::debug!(views = tables.len(), "composed views");

    match cli.format {
        OutputFormat::Table => print_tables(out, sheet, &dashboard, &tables, &options.compose),
        OutputFormat::Json => {
            let json = dashboard_json(sheet, &dashboard, &tables);
            writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
            Ok(())
        }
        OutputFormat::Csv => {
            out.write_all(tables_to_csv(&tables)?.as_bytes())?;
            Ok(())
        }
    }
}

/// Options from `--config`, then flag overrides.
fn load_options(cli: &Cli) -> Result<PipelineOptions> {
    let mut options = match &cli.config {
        Some(path) => read_options(path)?,
        None => PipelineOptions::default(),
    };
    if cli.percent {
        options.compose.percent_change = true;
    }
    if let Some(top) = cli.top {
        options.aggregate.top_n = top;
    }
    Ok(options)
}

fn read_options(path: &Path) -> Result<PipelineOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    PipelineOptions::from_json_str(&text)
        .with_context(|| format!("Invalid config: {}", path.display()))
}

fn select_sheet<'a>(book: &'a Book, name: Option<&str>) -> Result<&'a Sheet> {
    let sheet = match name {
        Some(name) => book.get_sheet(name)?,
        None => book.first_sheet()?,
    };
    Ok(sheet)
}

/// Start from everything present in the data; each non-empty flag list
/// replaces its dimension.
fn build_selection(cli: &Cli, rows: &[ParsedRow]) -> FilterSelection {
    let mut selection = FilterSelection::select_all(rows);
    if !cli.groups.is_empty() {
        selection = selection.with_groups(cli.groups.iter().cloned());
    }
    if !cli.months.is_empty() {
        selection = selection.with_months(cli.months.iter().cloned());
    }
    if !cli.stores.is_empty() {
        selection = selection.with_stores(cli.stores.iter().cloned());
    }
    if !cli.categories.is_empty() {
        selection = selection.with_categories(cli.categories.iter().cloned());
    }
    selection
}

/// Print every table with a heading, or a notice when only a Grand Total remains.
fn print_tables(
    out: &mut impl Write,
    sheet: &Sheet,
    dashboard: &Dashboard,
    tables: &[PresentationTable],
    options: &ComposeOptions,
) -> Result<()> {
    let report = &dashboard.reshaped.report;
    writeln!(
        out,
        "{} {} ({} rows, {} cells dropped)",
        "Sheet".dimmed(),
        sheet.name().bold(),
        report.kept,
        report.dropped.total()
    )?;

    for table in tables {
        writeln!(out)?;
        writeln!(out, "{}", table.title.cyan().bold())?;
        if !table.has_data() {
            writeln!(
                out,
                "{}",
                "No data available for the current selection.".yellow()
            )?;
            continue;
        }
        let batch = display_batch(table, options)?;
        writeln!(out, "{}", pretty_format_batches(&[batch])?)?;
    }

    Ok(())
}

/// Render a table as an all-`Utf8` batch of display strings.
fn display_batch(table: &PresentationTable, options: &ComposeOptions) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.key_names.len() + table.columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());

    for (k, name) in table.key_names.iter().enumerate() {
        fields.push(Field::new(name, DataType::Utf8, false));
        let cells: Vec<&str> = table
            .rows
            .iter()
            .map(|row| row.keys.get(k).map_or("", String::as_str))
            .collect();
        arrays.push(Arc::new(StringArray::from(cells)));
    }

    for (c, column) in table.columns.iter().enumerate() {
        fields.push(Field::new(&column.name, DataType::Utf8, false));
        let cells: Vec<String> = table
            .rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                let value = row.values.get(c).copied().unwrap_or(0.0);
                format_cell(value, column.kind, table.trend(r, c), options)
            })
            .collect();
        arrays.push(Arc::new(StringArray::from(cells)));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Format one value for display.
fn format_cell(
    value: f64,
    kind: ColumnKind,
    trend: Option<Trend>,
    options: &ComposeOptions,
) -> String {
    let percent_decimals = options.percent_decimals as usize;
    match kind {
        ColumnKind::Rank => format!("{value:.0}"),
        ColumnKind::Share => format!("{:.*}%", percent_decimals, value),
        ColumnKind::PercentChange => {
            let text = format!("{:.*}%", percent_decimals, value);
            match trend {
                Some(trend @ (Trend::Up | Trend::Down)) => format!("{text} {trend}"),
                _ => text,
            }
        }
        ColumnKind::Sales
        | ColumnKind::Difference
        | ColumnKind::Change
        | ColumnKind::Total => format_amount(value, options.amount_decimals as usize),
    }
}

/// Format an amount with `,` thousands separators.
fn format_amount(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + whole.len() / 3 + 1);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

/// Convert a table to a JSON object of its title and row objects.
fn table_json(table: &PresentationTable) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = table
        .rows
        .iter()
        .map(|row| {
            let mut object = serde_json::Map::new();
            for (name, key) in table.key_names.iter().zip(&row.keys) {
                object.insert(name.clone(), serde_json::Value::String(key.clone()));
            }
            for (column, value) in table.columns.iter().zip(&row.values) {
                let number = serde_json::Number::from_f64(*value)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null);
                object.insert(column.name.clone(), number);
            }
            serde_json::Value::Object(object)
        })
        .collect();

    serde_json::json!({ "title": table.title, "rows": rows })
}

fn dashboard_json(
    sheet: &Sheet,
    dashboard: &Dashboard,
    tables: &[PresentationTable],
) -> serde_json::Value {
    let views: Vec<serde_json::Value> = tables.iter().map(table_json).collect();
    serde_json::json!({
        "sheet": sheet.name(),
        "report": dashboard.reshaped.report,
        "selection": dashboard.selection,
        "views": views,
    })
}

/// Write the tables one after another: a title record, a header record, then rows.
fn tables_to_csv(tables: &[PresentationTable]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    for table in tables {
        let batch = table.to_record_batch()?;
        writer.write_record([table.title.as_str()])?;
        writer.write_record(batch.schema().fields().iter().map(|field| field.name().as_str()))?;
        for row in 0..batch.num_rows() {
            writer.write_record(batch.columns().iter().map(|column| csv_cell(column, row)))?;
        }
    }

    writer.flush()?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("{}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn csv_cell(column: &ArrayRef, row: usize) -> String {
    let column = column.as_any();
    if let Some(keys) = column.downcast_ref::<StringArray>() {
        keys.value(row).to_string()
    } else if let Some(values) = column.downcast_ref::<Float64Array>() {
        values.value(row).to_string()
    } else {
        String::new()
    }
}
