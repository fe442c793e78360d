//! # Fixed Primitives
//!
//! Hardcoded runtime constants for the cohortview CORE.
//!
//! These values are compiled into the binary and are immutable at runtime.
//!
//! ## Primitives
//!
//! 1. **Schema Primitive**: the two columns every upload must carry.
//! 2. **Selection Primitive**: how many ages are pre-selected.
//! 3. **Boundary Primitive**: upload and table size limits.

/// Column holding the (possibly free-text) age of each subject.
pub const AGE_COLUMN: &str = "Age";

/// Column holding the sex of each subject.
pub const SEX_COLUMN: &str = "Gender";

/// Columns that must be present before any chart logic runs.
///
/// Order matters: missing-column errors list names in this order.
pub const REQUIRED_COLUMNS: [&str; 2] = [AGE_COLUMN, SEX_COLUMN];

/// Number of smallest distinct ages selected when the age selector is first shown.
pub const DEFAULT_AGE_SELECTION: usize = 3;

/// Field values read as "no value" when parsing a CSV.
pub const MISSING_MARKERS: [&str; 11] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Tukey fence multiplier used for box-plot whiskers.
pub const WHISKER_IQR_FACTOR: f64 = 1.5;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum size of an uploaded file (20 MB).
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Maximum number of columns accepted in an uploaded table.
pub const MAX_COLUMNS: usize = 512;

/// Maximum length of a single column name.
pub const MAX_COLUMN_NAME_LENGTH: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_columns_are_age_then_sex() {
        assert_eq!(REQUIRED_COLUMNS, ["Age", "Gender"]);
    }

    #[test]
    fn empty_field_is_missing() {
        assert!(MISSING_MARKERS.contains(&""));
    }
}
