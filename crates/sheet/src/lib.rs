//! Sheet/Book module for salespivot
//!
//! Holds uploaded workbooks in memory: a [`Book`] of named [`Sheet`]s, each a
//! row-major grid of [`CellValue`]s. Wide sales sheets carry a two-row header
//! (day_month over store) that [`Sheet::header_pairs`] reads back as pairs.
//!
//! # Examples
//!
//! ```
//! use salespivot_sheet::{CellValue, HeaderOptions, Sheet};
//!
//! let sheet = Sheet::from_data(vec![
//!     vec![CellValue::from("Kelompok Barang"), CellValue::from("01_Jan")],
//!     vec![CellValue::Null, CellValue::from("StoreA")],
//!     vec![CellValue::from("BZR Widget"), CellValue::Int(100)],
//! ]);
//!
//! let pairs = sheet.header_pairs(&HeaderOptions::default()).unwrap();
//! assert_eq!(pairs[1], ("01_Jan".to_string(), "StoreA".to_string()));
//! ```
//!
//! ## Loading an uploaded workbook
//!
//! ```no_run
//! use salespivot_sheet::Book;
//!
//! let bytes = std::fs::read("sales.xlsx").unwrap();
//! let book = Book::from_xlsx_bytes(&bytes).unwrap();
//! let sheet = book.get_sheet("Januari").unwrap();
//! ```

mod book;
mod cell;
mod error;
mod sheet;
mod xlsx;

/// Re-export book type.
pub use book::Book;
/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export sheet type and header options.
pub use sheet::{HeaderOptions, Sheet, HEADER_ROWS};
