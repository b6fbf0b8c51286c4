use rust_xlsxwriter::{Format, Workbook, XlsxError};
use salespivot_sheet::{Book, CellValue, HeaderOptions, Sheet, SheetError, HEADER_ROWS};
use tempfile::tempdir;

/// Builds a wide sales workbook with a merged day_month header over two stores.
fn sales_workbook() -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let merged = Format::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Januari")?;
    sheet.write_string(0, 0, "Kelompok Barang")?;
    sheet.merge_range(0, 1, 0, 2, "01_Jan", &merged)?;
    sheet.write_string(1, 1, "StoreA")?;
    sheet.write_string(1, 2, "StoreB")?;
    sheet.write_string(2, 0, "BZR Widget")?;
    sheet.write_number(2, 1, 100.0)?;
    sheet.write_number(2, 2, 50.0)?;
    sheet.write_string(3, 0, "GRC Gadget")?;
    sheet.write_number(3, 1, 0.0)?;
    sheet.write_string(3, 2, "n/a")?;

    let other = workbook.add_worksheet();
    other.set_name("Catatan")?;
    other.write_string(0, 0, "notes only")?;

    Ok(workbook)
}

// ===== Loading Tests =====

#[test]
fn test_book_from_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sales.xlsx");
    sales_workbook().unwrap().save(&path).unwrap();

    let book = Book::from_xlsx(&path).unwrap();
    assert_eq!(book.sheet_names(), vec!["Januari", "Catatan"]);

    let names = Book::xlsx_sheet_names(&path).unwrap();
    assert_eq!(names, vec!["Januari".to_string(), "Catatan".to_string()]);
}

#[test]
fn test_book_from_uploaded_bytes() {
    let bytes = sales_workbook().unwrap().save_to_buffer().unwrap();

    let book = Book::from_xlsx_bytes(&bytes).unwrap();
    assert_eq!(book.sheet_count(), 2);

    let sheet = book.get_sheet("Januari").unwrap();
    assert_eq!(sheet.row_count(), 4);
    assert_eq!(
        sheet.get(2, 0).unwrap(),
        &CellValue::String("BZR Widget".to_string())
    );
    assert_eq!(sheet.get(2, 1).unwrap().as_float(), Some(100.0));
    assert_eq!(sheet.get(3, 2).unwrap(), &CellValue::String("n/a".to_string()));
}

#[test]
fn test_single_sheet_from_bytes_and_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sales.xlsx");
    sales_workbook().unwrap().save(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();

    let from_path = Sheet::from_xlsx_sheet(&path, "Januari").unwrap();
    let from_bytes = Sheet::from_xlsx_bytes_sheet(&bytes, "Januari").unwrap();

    assert_eq!(from_path.name(), "Januari");
    assert_eq!(from_path.data(), from_bytes.data());
}

#[test]
fn test_unknown_sheet_is_an_error() {
    let bytes = sales_workbook().unwrap().save_to_buffer().unwrap();
    let result = Sheet::from_xlsx_bytes_sheet(&bytes, "Desember");
    assert!(result.is_err());
}

// ===== Header Tests =====

#[test]
fn test_merged_header_is_forward_filled() {
    let bytes = sales_workbook().unwrap().save_to_buffer().unwrap();
    let book = Book::from_xlsx_bytes(&bytes).unwrap();
    let sheet = book.get_sheet("Januari").unwrap();

    let pairs = sheet.header_pairs(&HeaderOptions::default()).unwrap();
    assert_eq!(
        pairs,
        vec![
            ("Kelompok Barang".to_string(), String::new()),
            ("01_Jan".to_string(), "StoreA".to_string()),
            ("01_Jan".to_string(), "StoreB".to_string()),
        ]
    );
    assert_eq!(sheet.data_rows(HEADER_ROWS).count(), 2);
}

#[test]
fn test_notes_sheet_has_no_header() {
    let bytes = sales_workbook().unwrap().save_to_buffer().unwrap();
    let book = Book::from_xlsx_bytes(&bytes).unwrap();
    let notes = book.get_sheet("Catatan").unwrap();

    let result = notes.header_pairs(&HeaderOptions::default());
    assert!(matches!(
        result,
        Err(SheetError::MissingHeader { found: 1, .. })
    ));
}
