//! Pipeline configuration.
//!
//! Every option struct has a usable `Default`, `with_*` builders, and serde
//! support so a shell can load overrides from a JSON file.

use crate::error::{PipelineError, PipelineResult};
use salespivot_sheet::{CellValue, HeaderOptions};
use serde::{Deserialize, Serialize};

/// Default markers identifying the category ("Kelompok Barang") column.
pub const DEFAULT_CATEGORY_MARKERS: [&str; 2] = ["Kelompok", "Barang"];

/// Default chrono format for month labels such as `01_Jan`.
pub const DEFAULT_MONTH_FORMAT: &str = "%d_%b";

/// Most decimals an `f64` amount can carry meaningfully.
pub const MAX_DECIMALS: u32 = 15;

/// How sales text cells are coerced into numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormat {
    /// Decimal separator in text cells (default: '.')
    pub decimal_separator: char,
    /// Thousands separator stripped from text cells (default: none)
    pub thousands_separator: Option<char>,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            decimal_separator: '.',
            thousands_separator: None,
        }
    }
}

impl NumberFormat {
    /// Indonesian/European style: `1.234,5`
    #[must_use]
    pub fn comma_decimal() -> Self {
        NumberFormat {
            decimal_separator: ',',
            thousands_separator: Some('.'),
        }
    }

    /// Set the decimal separator
    #[must_use]
    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    /// Set the thousands separator
    #[must_use]
    pub fn with_thousands_separator(mut self, separator: Option<char>) -> Self {
        self.thousands_separator = separator;
        self
    }

    /// Parse a text cell. Empty and non-finite values are not numbers.
    pub fn parse(&self, text: &str) -> Option<f64> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut normalized = String::with_capacity(trimmed.len());
        for ch in trimmed.chars() {
            if Some(ch) == self.thousands_separator {
                continue;
            }
            if ch == self.decimal_separator {
                normalized.push('.');
            } else {
                normalized.push(ch);
            }
        }

        normalized.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Coerce a cell to a sales figure
    pub fn coerce(&self, cell: &CellValue) -> Option<f64> {
        match cell {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f).filter(|v| v.is_finite()),
            CellValue::String(s) => self.parse(s),
            CellValue::Bool(_) | CellValue::Null => None,
        }
    }
}

/// What to do with categories shorter than the three-character group code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortCategoryPolicy {
    /// Upper-case the whole category
    #[default]
    UseWhole,
    /// Drop the row
    Drop,
}

/// Options for turning a wide sheet into tidy rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReshapeOptions {
    /// Header reading options
    pub header: HeaderOptions,
    /// Substrings that must all occur in the category column key
    pub category_markers: Vec<String>,
    /// Sales text coercion
    pub number_format: NumberFormat,
    /// Group derivation for short categories
    pub short_category: ShortCategoryPolicy,
}

impl Default for ReshapeOptions {
    fn default() -> Self {
        ReshapeOptions {
            header: HeaderOptions::default(),
            category_markers: DEFAULT_CATEGORY_MARKERS
                .iter()
                .map(|m| (*m).to_string())
                .collect(),
            number_format: NumberFormat::default(),
            short_category: ShortCategoryPolicy::default(),
        }
    }
}

impl ReshapeOptions {
    /// Set the category markers
    #[must_use]
    pub fn with_category_markers<S: Into<String>>(mut self, markers: Vec<S>) -> Self {
        self.category_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number format
    #[must_use]
    pub fn with_number_format(mut self, number_format: NumberFormat) -> Self {
        self.number_format = number_format;
        self
    }

    /// Set the short category policy
    #[must_use]
    pub fn with_short_category(mut self, policy: ShortCategoryPolicy) -> Self {
        self.short_category = policy;
        self
    }

    /// Set the header options
    #[must_use]
    pub fn with_header(mut self, header: HeaderOptions) -> Self {
        self.header = header;
        self
    }
}

/// Options for the aggregate views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateOptions {
    /// chrono format used to order month labels
    pub month_format: String,
    /// Size of the top and bottom performer lists
    pub top_n: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions {
            month_format: DEFAULT_MONTH_FORMAT.to_string(),
            top_n: 10,
        }
    }
}

impl AggregateOptions {
    /// Set the month format
    #[must_use]
    pub fn with_month_format(mut self, format: &str) -> Self {
        self.month_format = format.to_string();
        self
    }

    /// Set the top/bottom list size
    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

/// Options for presentation tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Add `Percent Change_<month>` columns to month pivots
    pub percent_change: bool,
    /// Decimals kept for sales and differences
    pub amount_decimals: u32,
    /// Decimals kept for percentages
    pub percent_decimals: u32,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        ComposeOptions {
            percent_change: false,
            amount_decimals: 0,
            percent_decimals: 2,
        }
    }
}

impl ComposeOptions {
    /// Set whether percent change columns are included
    #[must_use]
    pub fn with_percent_change(mut self, percent_change: bool) -> Self {
        self.percent_change = percent_change;
        self
    }

    /// Set the decimals kept for amounts
    #[must_use]
    pub fn with_amount_decimals(mut self, decimals: u32) -> Self {
        self.amount_decimals = decimals;
        self
    }
}

/// All pipeline options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub reshape: ReshapeOptions,
    pub aggregate: AggregateOptions,
    pub compose: ComposeOptions,
}

impl PipelineOptions {
    /// Parse options from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> PipelineResult<Self> {
        let options: PipelineOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject contradictory settings.
    pub fn validate(&self) -> PipelineResult<()> {
        let markers = &self.reshape.category_markers;
        if markers.is_empty() || markers.iter().any(|m| m.is_empty()) {
            return Err(PipelineError::invalid_options(
                "category markers must be non-empty",
            ));
        }

        let number = &self.reshape.number_format;
        if Some(number.decimal_separator) == number.thousands_separator {
            return Err(PipelineError::invalid_options(format!(
                "decimal and thousands separator are both '{}'",
                number.decimal_separator
            )));
        }
        for sep in std::iter::once(number.decimal_separator).chain(number.thousands_separator) {
            if sep.is_ascii_digit() || sep == '-' || sep == '+' {
                return Err(PipelineError::invalid_options(format!(
                    "'{sep}' cannot be used as a number separator"
                )));
            }
        }

        if self.aggregate.month_format.trim().is_empty() {
            return Err(PipelineError::invalid_options("month format is empty"));
        }

        let compose = &self.compose;
        for (name, decimals) in [
            ("amount_decimals", compose.amount_decimals),
            ("percent_decimals", compose.percent_decimals),
        ] {
            if decimals > MAX_DECIMALS {
                return Err(PipelineError::invalid_options(format!(
                    "{name} is {decimals}, at most {MAX_DECIMALS} allowed"
                )));
            }
        }

        Ok(())
    }
}
