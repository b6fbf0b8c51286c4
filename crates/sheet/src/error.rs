use thiserror::Error;

/// Errors that can occur while loading or reading sheets
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Index out of bounds: row {row}, col {col} (sheet has {rows} rows, {cols} cols)")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Row index out of bounds: {index} (sheet has {count} rows)")]
    RowIndexOutOfBounds { index: usize, count: usize },

    #[error("Sheet '{sheet}' needs {expected} header rows, found {found}")]
    MissingHeader {
        sheet: String,
        expected: usize,
        found: usize,
    },

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("Sheet already exists: {name}")]
    SheetAlreadyExists { name: String },

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<calamine::XlsxError> for SheetError {
    fn from(err: calamine::XlsxError) -> Self {
        match err {
            calamine::XlsxError::Io(io) => SheetError::Io(io),
            other => SheetError::Workbook(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
