//! # salespivot-core
//!
//! Turns a wide sales sheet (two-level header, one row per category, one
//! column per `<day>_<Mon>_<Store>`) into tidy rows and the aggregated views
//! of a sales dashboard.
//!
//! The pipeline is a pure function of the sheet, a [`FilterSelection`] and
//! [`PipelineOptions`]:
//!
//! ```text
//! Sheet -> header flatten -> category detect -> melt/parse -> filter -> aggregate -> compose
//! ```
//!
//! ```
//! use salespivot_core::{compute, FilterSelection, PipelineOptions};
//! use salespivot_sheet::Sheet;
//!
//! let sheet = Sheet::from_data(vec![
//!     vec!["Kelompok", "01_Jan"],
//!     vec!["Barang", "StoreA"],
//!     vec!["BZR Widget", "100"],
//! ]);
//! let selection = FilterSelection::new()
//!     .with_groups(["BZR"])
//!     .with_months(["01_Jan"])
//!     .with_stores(["StoreA"]);
//! let dashboard = compute(&sheet, &selection, &PipelineOptions::default()).unwrap();
//! assert_eq!(dashboard.views.group_sales[0].sales, 100.0);
//! ```

/// Sum-reductions and the dashboard view bundle.
pub mod aggregate;
/// Presentation tables.
pub mod compose;
/// Error types and result aliases.
pub mod error;
/// Arrow export of presentation tables.
pub mod export;
/// Set-membership filters.
pub mod filter;
/// Header flattening and category column detection.
pub mod header;
/// Month label parsing and ordering.
pub mod month;
/// Pipeline configuration.
pub mod options;
/// Month pivots.
pub mod pivot;
/// Wide-to-long reshaping.
pub mod reshape;

pub use aggregate::{aggregate, DashboardViews};
pub use compose::{compose_view, ColumnKind, PresentationTable, Trend, ViewKind};
pub use error::{PipelineError, PipelineResult};
pub use filter::FilterSelection;
pub use options::{
    AggregateOptions, ComposeOptions, NumberFormat, PipelineOptions, ReshapeOptions,
    ShortCategoryPolicy,
};
pub use reshape::{reshape, DropReason, ParsedRow, ReshapeReport, Reshaped};

use salespivot_sheet::Sheet;
use serde::Serialize;

/// Reshaped rows plus every view for one selection.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub reshaped: Reshaped,
    pub selection: FilterSelection,
    pub views: DashboardViews,
}

impl Dashboard {
    /// Rebuild the views for another selection without re-reading the sheet.
    pub fn reselect(&mut self, selection: FilterSelection, options: &AggregateOptions) {
        self.views = aggregate(&self.reshaped.rows, &selection, options);
        self.selection = selection;
    }

    /// Compose one view into a presentation table
    pub fn table(&self, kind: ViewKind, options: &ComposeOptions) -> PresentationTable {
        compose_view(&self.views, kind, options)
    }
}

/// Reshape `sheet` and aggregate it for `selection`.
pub fn compute(
    sheet: &Sheet,
    selection: &FilterSelection,
    options: &PipelineOptions,
) -> PipelineResult<Dashboard> {
    options.validate()?;
    let reshaped = reshape(sheet, &options.reshape)?;
    let views = aggregate(&reshaped.rows, selection, &options.aggregate);
    Ok(Dashboard {
        reshaped,
        selection: selection.clone(),
        views,
    })
}
