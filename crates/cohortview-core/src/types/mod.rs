//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the cohortview CORE:
//! - Table cells (`Cell`)
//! - Grouping dimension for box plots (`GroupingMode`)
//! - User-facing messages (`Notice`, `NoticeLevel`)
//! - Error types (`CohortError`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// CELL
// =============================================================================

/// A single field of an uploaded table.
///
/// Numbers are always finite. Empty fields and NA markers are `Missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    /// A finite numeric value.
    Number(f64),
    /// Free text.
    Text(String),
    /// No value.
    #[default]
    Missing,
}

impl Cell {
    /// Numeric value of the cell, if any.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Check whether the cell carries no value.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Text(s) => f.write_str(s),
            Self::Missing => Ok(()),
        }
    }
}

/// Render a number without a trailing `.0` when it is integral.
///
/// Used for category labels and table cells, so that an age of `3.0`
/// reads as `3`.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

// =============================================================================
// GROUPING MODE
// =============================================================================

/// The categorical dimension used to split a metric into box traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    /// One trace per sex value.
    #[default]
    Sex,
    /// One trace per normalized age.
    Age,
}

impl GroupingMode {
    /// Both modes, in the order they are offered to the user.
    pub const ALL: [GroupingMode; 2] = [GroupingMode::Sex, GroupingMode::Age];

    /// Wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sex => "sex",
            Self::Age => "age",
        }
    }

    /// Human label, e.g. "by sex".
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sex => "by sex",
            Self::Age => "by age",
        }
    }
}

impl fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingMode {
    type Err = CohortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sex" | "by-sex" | "by_sex" | "gender" => Ok(Self::Sex),
            "age" | "by-age" | "by_age" => Ok(Self::Age),
            other => Err(CohortError::UnknownGrouping(other.to_string())),
        }
    }
}

// =============================================================================
// NOTICES
// =============================================================================

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A message shown next to the view that produced it.
///
/// Notices are local to one render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl From<&CohortError> for Notice {
    fn from(err: &CohortError) -> Self {
        if err.is_warning() {
            Self::warning(err.to_string())
        } else {
            Self::error(err.to_string())
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while loading, cleaning or charting a cohort.
///
/// - No silent failures
/// - Use `Result<T, CohortError>` for fallible operations
/// - The CORE never panics; every error ends up as a visible message
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CohortError {
    /// One or more required columns are absent. Fatal for the render.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// No column can serve as a metric.
    #[error("No numeric columns available for charting")]
    NoNumericColumns,

    /// The age filter matched no rows.
    #[error("No rows match the current selection; adjust the filters")]
    EmptySelection,

    /// A column name that is not part of the table.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A column exists but is not a usable metric.
    #[error("Column is not a numeric metric: {0}")]
    NonNumericMetric(String),

    /// A page slug outside the fixed page set.
    #[error("Unknown page: {0}")]
    UnknownPage(String),

    /// A grouping mode other than sex or age.
    #[error("Unknown grouping mode: {0}")]
    UnknownGrouping(String),

    /// The uploaded file has no content.
    #[error("Uploaded file is empty")]
    EmptyUpload,

    /// The uploaded file exceeds the size limit.
    #[error("Uploaded file is {size} bytes; the limit is {max} bytes")]
    UploadTooLarge { size: usize, max: usize },

    /// The table shape is unusable (no header, too many columns, ...).
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// The CSV reader rejected the input.
    #[error("CSV error: {0}")]
    CsvError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl CohortError {
    /// Whether this error is a recoverable warning rather than a hard failure.
    ///
    /// Warnings halt chart rendering but leave the rest of the page intact.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::NoNumericColumns | Self::EmptySelection)
    }
}

impl From<csv::Error> for CohortError {
    fn from(err: csv::Error) -> Self {
        Self::CsvError(err.to_string())
    }
}

impl From<std::io::Error> for CohortError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_drops_integral_fraction() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-4.0), "-4");
    }

    #[test]
    fn cell_display() {
        assert_eq!(Cell::Number(6.0).to_string(), "6");
        assert_eq!(Cell::Text("M".into()).to_string(), "M");
        assert_eq!(Cell::Missing.to_string(), "");
    }

    #[test]
    fn grouping_mode_parses_aliases() {
        assert_eq!("sex".parse::<GroupingMode>(), Ok(GroupingMode::Sex));
        assert_eq!("By-Age".parse::<GroupingMode>(), Ok(GroupingMode::Age));
        assert!(matches!(
            "weight".parse::<GroupingMode>(),
            Err(CohortError::UnknownGrouping(_))
        ));
    }

    #[test]
    fn missing_columns_message_names_columns() {
        let err = CohortError::MissingColumns(vec!["Age".into(), "Gender".into()]);
        assert_eq!(err.to_string(), "Missing required columns: Age, Gender");
    }

    #[test]
    fn notice_level_follows_error_kind() {
        assert_eq!(
            Notice::from(&CohortError::EmptySelection).level,
            NoticeLevel::Warning
        );
        assert_eq!(
            Notice::from(&CohortError::NoNumericColumns).level,
            NoticeLevel::Warning
        );
        assert_eq!(
            Notice::from(&CohortError::MissingColumns(vec!["Gender".into()])).level,
            NoticeLevel::Error
        );
    }

    #[test]
    fn cell_serializes_untagged() {
        let cells = vec![Cell::Number(3.0), Cell::Text("M".into()), Cell::Missing];
        let json = serde_json::to_string(&cells).expect("serialize");
        assert_eq!(json, r#"[3.0,"M",null]"#);
    }
}
