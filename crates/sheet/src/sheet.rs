use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};

/// Number of header rows in a wide sales sheet (day_month level, store level)
pub const HEADER_ROWS: usize = 2;

/// Options for reading the two-level column header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderOptions {
    /// Carry a blank top-level cell over from the nearest non-blank cell on its left.
    /// Exported workbooks merge the day_month cell across all of its store columns.
    pub fill_merged: bool,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        HeaderOptions { fill_merged: true }
    }
}

impl HeaderOptions {
    /// Set whether merged top-level header cells are forward-filled
    #[must_use]
    pub fn with_fill_merged(mut self, fill_merged: bool) -> Self {
        self.fill_merged = fill_merged;
        self
    }
}

/// A sheet representing a 2D grid of cells (row-major storage)
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    name: String,
    data: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Create a new empty sheet
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("Sheet1")
    }

    /// Create a new empty sheet with a name
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            data: Vec::new(),
        }
    }

    /// Create a sheet from a 2D vector of values
    #[must_use]
    pub fn from_data<T: Into<CellValue>>(data: Vec<Vec<T>>) -> Self {
        let converted: Vec<Vec<CellValue>> = data
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        Sheet {
            name: "Sheet1".to_string(),
            data: converted,
        }
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Get the number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Get the number of columns (rows read from workbooks can be ragged, so this is the widest row)
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.data.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check if the sheet is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a cell value by row and column index
    pub fn get(&self, row: usize, col: usize) -> Result<&CellValue> {
        self.data
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or(SheetError::IndexOutOfBounds {
                row,
                col,
                rows: self.row_count(),
                cols: self.col_count(),
            })
    }

    /// Get a cell, treating cells past the end of a ragged row as null
    #[must_use]
    pub fn cell_or_null(&self, row: usize, col: usize) -> &CellValue {
        static NULL: CellValue = CellValue::Null;
        self.data.get(row).and_then(|r| r.get(col)).unwrap_or(&NULL)
    }

    /// Get a row by index
    pub fn row(&self, index: usize) -> Result<&Vec<CellValue>> {
        self.data.get(index).ok_or(SheetError::RowIndexOutOfBounds {
            index,
            count: self.row_count(),
        })
    }

    /// Iterate over all rows
    pub fn rows(&self) -> impl Iterator<Item = &Vec<CellValue>> {
        self.data.iter()
    }

    /// Iterate over body rows, skipping `header_rows` leading header rows
    pub fn data_rows(&self, header_rows: usize) -> impl Iterator<Item = &Vec<CellValue>> {
        self.data.iter().skip(header_rows)
    }

    /// Get raw data reference
    #[must_use]
    pub fn data(&self) -> &Vec<Vec<CellValue>> {
        &self.data
    }

    /// Get mutable data reference
    pub fn data_mut(&mut self) -> &mut Vec<Vec<CellValue>> {
        &mut self.data
    }

    /// Read the first two rows as `(level_a, level_b)` header pairs, one per column.
    ///
    /// Missing cells in ragged rows count as blank. A blank top-level cell over a
    /// non-blank store cell inherits the nearest top-level label to its left. Any
    /// other blank top-level cell becomes `Unnamed: {col}` so columns stay distinct.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::MissingHeader` if the sheet has fewer than two rows.
    pub fn header_pairs(&self, options: &HeaderOptions) -> Result<Vec<(String, String)>> {
        if self.row_count() < HEADER_ROWS {
            return Err(SheetError::MissingHeader {
                sheet: self.name.clone(),
                expected: HEADER_ROWS,
                found: self.row_count(),
            });
        }

        let width = self.data[0].len().max(self.data[1].len());
        let mut pairs = Vec::with_capacity(width);
        let mut carried: Option<String> = None;

        for col in 0..width {
            let top = self.cell_or_null(0, col).as_str().trim().to_string();
            let bottom = self.cell_or_null(1, col).as_str().trim().to_string();

            let level_a = if !top.is_empty() {
                carried = Some(top.clone());
                top
            } else if let (true, false, Some(prev)) =
                (options.fill_merged, bottom.is_empty(), carried.as_ref())
            {
                // merged cells span store columns only
                prev.clone()
            } else {
                format!("Unnamed: {col}")
            };

            pairs.push((level_a, bottom));
        }

        Ok(pairs)
    }
}
