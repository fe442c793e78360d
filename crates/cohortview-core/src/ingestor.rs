//! # Ingestor Module
//!
//! Upload validation and cleaning protocol for the cohortview CORE.
//!
//! - Reject empty or oversized uploads before parsing
//! - Reject tables missing a required column before any chart logic
//! - Normalize the age column in place
//! - Drop rows whose age cannot be read, and count them

use crate::age::normalize_age;
use crate::primitives::{AGE_COLUMN, MAX_UPLOAD_BYTES, REQUIRED_COLUMNS, SEX_COLUMN};
use crate::{Cell, Cohort, CohortError, Table};

/// The Ingestor turns uploaded bytes into a cleaned [`Cohort`].
pub struct Ingestor;

impl Ingestor {
    /// Validate raw upload bytes.
    ///
    /// Returns `CohortError::EmptyUpload` for zero bytes and
    /// `CohortError::UploadTooLarge` above `MAX_UPLOAD_BYTES`.
    pub fn validate_upload(bytes: &[u8]) -> Result<(), CohortError> {
        if bytes.is_empty() {
            return Err(CohortError::EmptyUpload);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(CohortError::UploadTooLarge {
                size: bytes.len(),
                max: MAX_UPLOAD_BYTES,
            });
        }
        Ok(())
    }

    /// Validate and parse uploaded bytes into a raw table.
    ///
    /// This is the memoized load step; see [`LoadCache`](crate::LoadCache).
    pub fn load(bytes: &[u8]) -> Result<Table, CohortError> {
        Self::validate_upload(bytes)?;
        Table::from_csv_bytes(bytes)
    }

    /// Check that every required column exists.
    ///
    /// The error lists all missing columns, not just the first.
    pub fn require_columns(table: &Table) -> Result<(), CohortError> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !table.has_column(col))
            .map(|col| (*col).to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CohortError::MissingColumns(missing))
        }
    }

    /// Clean a raw table into a cohort.
    ///
    /// Ages are replaced by their normalized value; rows with no value are
    /// removed and reported through [`Cohort::dropped_rows`].
    pub fn clean(table: &Table) -> Result<Cohort, CohortError> {
        Self::require_columns(table)?;

        let age_idx = table
            .column_index(AGE_COLUMN)
            .ok_or_else(|| CohortError::MissingColumns(vec![AGE_COLUMN.to_string()]))?;
        let sex_idx = table
            .column_index(SEX_COLUMN)
            .ok_or_else(|| CohortError::MissingColumns(vec![SEX_COLUMN.to_string()]))?;

        let mut table = table.clone();
        let before = table.row_count();

        for row in table.rows_mut() {
            if let Some(cell) = row.get_mut(age_idx) {
                *cell = normalize_age(cell).map_or(Cell::Missing, Cell::Number);
            }
        }
        table.retain_rows(|row| row.get(age_idx).is_some_and(|cell| !cell.is_missing()));

        Ok(Cohort {
            dropped_rows: before - table.row_count(),
            table,
            age_idx,
            sex_idx,
        })
    }

    /// Load and clean in one step.
    pub fn ingest(bytes: &[u8]) -> Result<Cohort, CohortError> {
        let table = Self::load(bytes)?;
        Self::clean(&table)
    }
}

// =============================================================================
// TESTS
// =============================================================================
