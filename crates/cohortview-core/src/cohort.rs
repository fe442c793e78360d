//! # Cohort Module
//!
//! A cleaned table: both required columns present, every age normalized to a
//! number, rows without a readable age removed. Built by
//! [`Ingestor::clean`](crate::Ingestor::clean).

use crate::primitives::REQUIRED_COLUMNS;
use crate::{Cell, Table};

/// The working dataset behind every chart and table view.
#[derive(Debug, Clone, PartialEq)]
pub struct Cohort {
    pub(crate) table: Table,
    pub(crate) age_idx: usize,
    pub(crate) sex_idx: usize,
    pub(crate) dropped_rows: usize,
}

impl Cohort {
    /// The cleaned table.
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Rows removed because their age could not be normalized.
    #[must_use]
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Number of rows kept.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// Index of the age column.
    #[must_use]
    pub fn age_index(&self) -> usize {
        self.age_idx
    }

    /// Index of the sex column.
    #[must_use]
    pub fn sex_index(&self) -> usize {
        self.sex_idx
    }

    /// Normalized age of a row.
    ///
    /// Always `Some` for rows of a cleaned cohort.
    #[must_use]
    pub fn age_of(&self, row: &[Cell]) -> Option<f64> {
        row.get(self.age_idx).and_then(Cell::as_number)
    }

    /// Sex label of a row, or `None` when missing.
    #[must_use]
    pub fn sex_of(&self, row: &[Cell]) -> Option<String> {
        row.get(self.sex_idx)
            .filter(|cell| !cell.is_missing())
            .map(ToString::to_string)
    }

    /// Distinct normalized ages, ascending.
    #[must_use]
    pub fn distinct_ages(&self) -> Vec<f64> {
        let mut ages: Vec<f64> = self
            .table
            .rows()
            .iter()
            .filter_map(|row| self.age_of(row))
            .collect();
        ages.sort_by(f64::total_cmp);
        ages.dedup();
        ages
    }

    /// Numeric columns that can be charted, in column order.
    ///
    /// The required columns are never metrics.
    #[must_use]
    pub fn metric_columns(&self) -> Vec<&str> {
        self.table
            .numeric_columns()
            .into_iter()
            .filter(|name| !REQUIRED_COLUMNS.contains(name))
            .collect()
    }
}
