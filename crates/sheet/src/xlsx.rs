use crate::book::Book;
use crate::cell::CellValue;
use crate::error::Result;
use crate::sheet::Sheet;
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        // Excel stores dates as days since 1899-12-30
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        // #N/A, #DIV/0! and friends carry no sales figure
        Data::Error(_) => CellValue::Null,
    }
}

fn read_sheet<RS: Read + Seek>(workbook: &mut Xlsx<RS>, sheet_name: &str) -> Result<Sheet> {
    let range = workbook.worksheet_range(sheet_name)?;

    let data: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(data_to_cell_value).collect())
        .collect();

    let mut sheet = Sheet::with_name(sheet_name);
    *sheet.data_mut() = data;
    Ok(sheet)
}

fn read_book<RS: Read + Seek>(mut workbook: Xlsx<RS>) -> Result<Book> {
    let sheet_names = workbook.sheet_names();
    let mut book = Book::new();

    for sheet_name in sheet_names {
        let sheet = read_sheet(&mut workbook, &sheet_name)?;
        book.add_sheet(&sheet_name, sheet)?;
    }

    Ok(book)
}

fn open_path<P: AsRef<Path>>(path: P) -> Result<Xlsx<BufReader<File>>> {
    Ok(open_workbook(path.as_ref())?)
}

fn open_bytes(bytes: &[u8]) -> Result<Xlsx<Cursor<&[u8]>>> {
    Ok(Xlsx::new(Cursor::new(bytes))?)
}

impl Sheet {
    /// Load a specific sheet from an Excel file by name
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened, sheet not found, or read fails.
    pub fn from_xlsx_sheet<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<Self> {
        read_sheet(&mut open_path(path)?, sheet_name)
    }

    /// Load a specific sheet from an in-memory workbook buffer
    ///
    /// # Errors
    ///
    /// Returns error if the buffer is not a workbook or the sheet is missing.
    pub fn from_xlsx_bytes_sheet(bytes: &[u8], sheet_name: &str) -> Result<Self> {
        read_sheet(&mut open_bytes(bytes)?, sheet_name)
    }
}

impl Book {
    /// Load a book from an Excel file (all sheets)
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened or read.
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_book(open_path(path)?)
    }

    /// Load a book from an uploaded workbook buffer.
    ///
    /// The buffer is parsed from scratch on every call.
    ///
    /// # Errors
    ///
    /// Returns error if the buffer is not a readable workbook.
    pub fn from_xlsx_bytes(bytes: &[u8]) -> Result<Self> {
        read_book(open_bytes(bytes)?)
    }

    /// Get sheet names from an Excel file without loading data
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened.
    pub fn xlsx_sheet_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        Ok(open_path(path)?.sheet_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_to_cell_value() {
        assert_eq!(data_to_cell_value(&Data::Empty), CellValue::Null);
        assert_eq!(data_to_cell_value(&Data::Int(4)), CellValue::Int(4));
        assert_eq!(data_to_cell_value(&Data::Float(1.5)), CellValue::Float(1.5));
        assert_eq!(
            data_to_cell_value(&Data::String("StoreA".to_string())),
            CellValue::String("StoreA".to_string())
        );
        assert_eq!(
            data_to_cell_value(&Data::Error(calamine::CellErrorType::NA)),
            CellValue::Null
        );
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(Book::from_xlsx_bytes(b"definitely not a zip archive").is_err());
    }
}
