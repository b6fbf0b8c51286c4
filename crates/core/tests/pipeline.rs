use rust_xlsxwriter::{Format, Workbook, XlsxError};
use salespivot_core::compose::compose_month_pivot;
use salespivot_core::pivot::GRAND_TOTAL;
use salespivot_core::reshape::{distinct_months, split_month_store};
use salespivot_core::{
    compute, reshape, ComposeOptions, FilterSelection, NumberFormat, PipelineError,
    PipelineOptions, ReshapeOptions, ViewKind,
};
use salespivot_sheet::{Book, CellValue, Sheet};
use std::io;
use std::sync::{Arc, Mutex};

fn c(value: &str) -> CellValue {
    CellValue::from(value)
}

/// One month, two stores, a positive and an all-zero category.
fn single_month_sheet() -> Sheet {
    Sheet::from_data(vec![
        vec![c("Kelompok Barang"), c("01_Jan"), c("01_Jan")],
        vec![c(""), c("StoreA"), c("StoreB")],
        vec![c("BZR Widget"), CellValue::Int(100), CellValue::Int(50)],
        vec![c("GRC Gadget"), CellValue::Int(0), CellValue::Int(0)],
    ])
}

fn two_month_sheet() -> Sheet {
    Sheet::from_data(vec![
        vec![c("Kelompok Barang"), c("01_Jan"), c("01_Feb")],
        vec![c(""), c("StoreA"), c("StoreA")],
        vec![c("BZR Widget"), CellValue::Float(100.0), CellValue::Float(150.0)],
    ])
}

// ===== End-to-end scenarios =====

#[test]
fn test_single_month_dashboard() {
    let sheet = single_month_sheet();
    let reshaped = reshape(&sheet, &ReshapeOptions::default()).unwrap();
    assert_eq!(reshaped.rows.len(), 4);
    assert_eq!(reshaped.category_column, "Kelompok Barang");

    let selection = FilterSelection::select_all(&reshaped.rows);
    let dashboard = compute(&sheet, &selection, &PipelineOptions::default()).unwrap();
    let views = &dashboard.views;

    let bzr = views
        .group_sales
        .iter()
        .find(|s| s.group == "BZR" && s.month == "01_Jan")
        .unwrap();
    assert_eq!(bzr.sales, 150.0);
    let grc = views.group_sales.iter().find(|s| s.group == "GRC").unwrap();
    assert_eq!(grc.sales, 0.0);

    let bottom: Vec<&str> = views.bottom.iter().map(|t| t.category.as_str()).collect();
    assert_eq!(bottom, vec!["BZR Widget"]);
    let top: Vec<&str> = views.top.iter().map(|t| t.category.as_str()).collect();
    assert_eq!(top, vec!["BZR Widget", "GRC Gadget"]);
}

#[test]
fn test_month_to_month_changes() {
    let sheet = two_month_sheet();
    let reshaped = reshape(&sheet, &ReshapeOptions::default()).unwrap();
    let selection = FilterSelection::select_all(&reshaped.rows);

    let options = PipelineOptions::default();
    let dashboard = compute(&sheet, &selection, &options).unwrap();
    let compose = ComposeOptions::default().with_percent_change(true);
    let table = compose_month_pivot("Groups", &dashboard.views.group_pivot, &compose);

    let bzr = table.row_index("BZR").unwrap();
    assert_eq!(table.value(bzr, "Sales_01_Jan"), Some(100.0));
    assert_eq!(table.value(bzr, "Sales_01_Feb"), Some(150.0));
    assert_eq!(table.value(bzr, "Difference_01_Jan"), Some(0.0));
    assert_eq!(table.value(bzr, "Difference_01_Feb"), Some(50.0));
    assert_eq!(table.value(bzr, "Percent Change_01_Feb"), Some(50.0));

    let total = table.row_index(GRAND_TOTAL).unwrap();
    assert_eq!(table.rows[total].values, table.rows[bzr].values);
}

#[test]
fn test_grand_total_matches_filtered_sum() {
    let sheet = single_month_sheet();
    let reshaped = reshape(&sheet, &ReshapeOptions::default()).unwrap();
    let selection = FilterSelection::select_all(&reshaped.rows).with_stores(["StoreA"]);
    let dashboard = compute(&sheet, &selection, &PipelineOptions::default()).unwrap();

    let table = dashboard.table(ViewKind::StoreTable, &ComposeOptions::default());
    let total = table.row_index(GRAND_TOTAL).unwrap();
    let expected: f64 = selection.apply(&reshaped.rows).iter().map(|r| r.sales).sum();
    assert_eq!(table.value(total, "Sales_01_Jan"), Some(expected));
    assert_eq!(expected, 100.0);
}

#[test]
fn test_reselect_recomputes_views() {
    let sheet = single_month_sheet();
    let options = PipelineOptions::default();
    let mut dashboard = compute(&sheet, &FilterSelection::new(), &options).unwrap();
    assert!(dashboard.views.is_empty());

    let all = FilterSelection::select_all(&dashboard.reshaped.rows);
    dashboard.reselect(all, &options.aggregate);
    assert!(!dashboard.views.is_empty());
    assert_eq!(dashboard.views.top.len(), 2);
}

// ===== Failures and dropped cells =====

#[test]
fn test_missing_category_column_is_fatal() {
    let sheet = Sheet::from_data(vec![
        vec![c("Produk"), c("01_Jan")],
        vec![c(""), c("StoreA")],
        vec![c("BZR Widget"), c("10")],
    ]);

    let err = reshape(&sheet, &ReshapeOptions::default()).unwrap_err();
    assert!(matches!(err, PipelineError::CategoryColumnNotFound { .. }));
    assert!(err.to_string().contains("Kelompok Barang column not found"));
}

#[test]
fn test_drop_counts_per_reason() {
    let sheet = Sheet::from_data(vec![
        vec![c("Kelompok Barang"), c("01_Jan"), c("Notes")],
        vec![c(""), c("StoreA"), c("")],
        vec![c("BZR Widget"), c("n/a"), c("keep cold")],
        vec![c("  "), CellValue::Int(7), CellValue::Null],
        vec![c("GRC Gadget"), c("12.5"), CellValue::Null],
    ]);

    let reshaped = reshape(&sheet, &ReshapeOptions::default()).unwrap();
    let report = reshaped.report;
    assert_eq!(report.source_rows, 3);
    assert_eq!(report.melted, 6);
    assert_eq!(report.kept, 1);
    assert_eq!(report.dropped.unmatched_month_store, 3);
    assert_eq!(report.dropped.missing_category, 1);
    assert_eq!(report.dropped.non_numeric_sales, 1);
    assert_eq!(reshaped.rows[0].sales, 12.5);
}

#[test]
fn test_blank_spacer_columns_are_dropped_not_fatal() {
    let sheet = Sheet::from_data(vec![
        vec![c("Kelompok Barang"), c(""), c("01_Jan"), c(""), c(""), c("01_Feb")],
        vec![c(""), c(""), c("StoreA"), c(""), c(""), c("StoreA")],
        vec![
            c("BZR Widget"),
            c("memo"),
            CellValue::Int(100),
            CellValue::Null,
            CellValue::Null,
            CellValue::Int(150),
        ],
    ]);

    let reshaped = reshape(&sheet, &ReshapeOptions::default()).unwrap();
    assert_eq!(reshaped.category_column, "Kelompok Barang");
    assert_eq!(reshaped.report.kept, 2);
    assert_eq!(reshaped.report.dropped.unmatched_month_store, 3);
    assert_eq!(distinct_months(&reshaped.rows), vec!["01_Jan", "01_Feb"]);
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_dropped_cells_are_logged_as_warnings() {
    let sheet = Sheet::from_data(vec![
        vec![c("Kelompok Barang"), c("01_Jan")],
        vec![c(""), c("StoreA")],
        vec![c("BZR Widget"), c("n/a")],
        vec![c("GRC Gadget"), CellValue::Int(5)],
    ]);
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let reshaped = tracing::subscriber::with_default(subscriber, || {
        reshape(&sheet, &ReshapeOptions::default()).unwrap()
    });
    assert_eq!(reshaped.report.dropped.non_numeric_sales, 1);

    let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("WARN"));
    assert!(logs.contains("dropped melted cells"));
    assert!(logs.contains("non_numeric_sales=1"));
    assert!(!logs.contains("reshaped sheet"));
}

#[test]
fn test_comma_decimal_sales() {
    let sheet = Sheet::from_data(vec![
        vec![c("Kelompok Barang"), c("01_Jan")],
        vec![c(""), c("StoreA")],
        vec![c("BZR Widget"), c("1.234,5")],
    ]);
    let options = ReshapeOptions::default().with_number_format(NumberFormat::comma_decimal());

    let reshaped = reshape(&sheet, &options).unwrap();
    assert_eq!(reshaped.rows[0].sales, 1234.5);
}

#[test]
fn test_invalid_options_are_rejected_before_reshape() {
    let options = PipelineOptions::from_json_str(r#"{"reshape": {"category_markers": []}}"#);
    assert!(matches!(options, Err(PipelineError::InvalidOptions(_))));
}

#[test]
fn test_month_store_pattern_is_searched() {
    for (key, month, store) in [
        ("01_Jan_StoreA", "01_Jan", "StoreA"),
        ("Total 15_Feb_Main", "15_Feb", "Main"),
    ] {
        assert_eq!(
            split_month_store(key),
            Some((month.to_string(), store.to_string()))
        );
    }
    assert_eq!(split_month_store("Kelompok Barang"), None);
    assert_eq!(split_month_store("01_Jan"), None);
}

// ===== Workbook ingestion =====

fn workbook() -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let merged = Format::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Penjualan")?;
    sheet.write_string(0, 0, "Kelompok Barang")?;
    sheet.merge_range(0, 1, 0, 2, "01_Jan", &merged)?;
    sheet.merge_range(0, 3, 0, 4, "01_Feb", &merged)?;
    for (col, store) in [(1, "StoreA"), (2, "StoreB"), (3, "StoreA"), (4, "StoreB")] {
        sheet.write_string(1, col, store)?;
    }
    sheet.write_string(2, 0, "BZR Widget")?;
    sheet.write_string(3, 0, "GRC Gadget")?;
    for (col, value) in [(1, 100.0), (2, 50.0), (3, 120.0), (4, 40.0)] {
        sheet.write_number(2, col, value)?;
    }
    for (col, value) in [(1, 10.0), (2, 0.0), (3, 5.0), (4, 0.0)] {
        sheet.write_number(3, col, value)?;
    }
    Ok(workbook)
}

#[test]
fn test_uploaded_workbook_end_to_end() {
    let bytes = workbook().unwrap().save_to_buffer().unwrap();
    let book = Book::from_xlsx_bytes(&bytes).unwrap();
    let sheet = book.get_sheet("Penjualan").unwrap();

    let reshaped = reshape(sheet, &ReshapeOptions::default()).unwrap();
    assert_eq!(reshaped.rows.len(), 8);
    assert_eq!(distinct_months(&reshaped.rows), vec!["01_Jan", "01_Feb"]);

    let selection = FilterSelection::select_all(&reshaped.rows);
    let dashboard = compute(sheet, &selection, &PipelineOptions::default()).unwrap();
    let views = &dashboard.views;

    assert_eq!(views.store_pivot.row("StoreA").unwrap(), &[110.0, 125.0]);
    assert_eq!(views.store_pivot.row(GRAND_TOTAL).unwrap(), &[160.0, 165.0]);

    // the first category is compared by default
    let shares: Vec<(&str, f64)> = views
        .selected
        .store_share
        .iter()
        .map(|s| (s.store.as_str(), s.sales))
        .collect();
    assert_eq!(shares, vec![("StoreA", 220.0), ("StoreB", 90.0)]);

    let batch = dashboard
        .table(ViewKind::CategoryDetail, &ComposeOptions::default())
        .to_record_batch()
        .unwrap();
    assert_eq!(batch.num_rows(), 4);
    assert_eq!(batch.schema().field(0).name(), "Kelompok Barang");
}
