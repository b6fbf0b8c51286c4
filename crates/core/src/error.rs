//! Error types for salespivot.

use salespivot_sheet::SheetError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a pipeline pass.
///
/// Row-level problems (unmatched headers, non-numeric cells) never surface here;
/// they are counted in the reshape report instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No flattened column contains every category marker.
    #[error("{} column not found in sheet '{sheet}'", markers.join(" "))]
    CategoryColumnNotFound { sheet: String, markers: Vec<String> },

    /// Two header pairs flattened to the same key.
    #[error("Duplicate column key after flattening: {key}")]
    DuplicateColumnKey { key: String },

    /// Contradictory or empty options.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Sheet access or workbook error.
    #[error(transparent)]
    Sheet(#[from] SheetError),

    /// Options file could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arrow conversion failed.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl PipelineError {
    /// Create a category-column-not-found error.
    pub fn category_not_found(sheet: impl Into<String>, markers: &[String]) -> Self {
        Self::CategoryColumnNotFound {
            sheet: sheet.into(),
            markers: markers.to_vec(),
        }
    }

    /// Create an invalid-options error.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions(message.into())
    }
}
