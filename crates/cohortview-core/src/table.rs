//! # Table Module
//!
//! In-memory tabular data loaded wholesale from an uploaded CSV file.
//!
//! Column typing follows the usual data-frame convention: a column is numeric
//! when every non-missing field parses as a finite number, in which case its
//! cells are stored as `Cell::Number`. Any other column keeps its non-missing
//! fields as `Cell::Text`, including fields that happen to look numeric.

use crate::primitives::{MAX_COLUMN_NAME_LENGTH, MAX_COLUMNS, MISSING_MARKERS};
use crate::{Cell, CohortError};
use std::collections::BTreeSet;
use std::io::Read;

/// A rectangular table with named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table from column names and rows.
    ///
    /// Every row must have exactly one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, CohortError> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(CohortError::InvalidTable(format!(
                "row {} has {} cells but the table has {} columns",
                idx,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Parse CSV bytes (header row first) into a typed table.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, CohortError> {
        Self::from_csv_reader(bytes)
    }

    /// Parse CSV from any reader into a typed table.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CohortError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(CohortError::InvalidTable("missing header row".to_string()));
        }
        if headers.len() > MAX_COLUMNS {
            return Err(CohortError::InvalidTable(format!(
                "{} columns exceeds maximum {}",
                headers.len(),
                MAX_COLUMNS
            )));
        }
        if let Some(long) = headers.iter().find(|h| h.len() > MAX_COLUMN_NAME_LENGTH) {
            return Err(CohortError::InvalidTable(format!(
                "column name of {} bytes exceeds maximum {}",
                long.len(),
                MAX_COLUMN_NAME_LENGTH
            )));
        }
        let columns = unique_column_names(headers.iter());

        let mut raw: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            raw.push(record.iter().map(str::to_string).collect());
        }

        let numeric: Vec<bool> = (0..columns.len())
            .map(|col| {
                raw.iter()
                    .map(|row| row[col].as_str())
                    .filter(|field| !is_missing_marker(field))
                    .all(|field| parse_finite(field).is_some())
            })
            .collect();

        let rows = raw
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&numeric)
                    .map(|(field, &is_numeric)| typed_cell(field, is_numeric))
                    .collect()
            })
            .collect();

        Self::new(columns, rows)
    }

    /// Column names in file order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows in file order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Check whether a column exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate over one column's cells.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// A column is numeric when it holds at least one number and nothing but
    /// numbers or missing cells.
    #[must_use]
    pub fn is_numeric_column(&self, idx: usize) -> bool {
        let mut any_number = false;
        for cell in self.column(idx) {
            match cell {
                Cell::Number(_) => any_number = true,
                Cell::Missing => {}
                Cell::Text(_) => return false,
            }
        }
        any_number
    }

    /// Names of all numeric columns, in column order.
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<&str> {
        (0..self.columns.len())
            .filter(|&idx| self.is_numeric_column(idx))
            .map(|idx| self.columns[idx].as_str())
            .collect()
    }

    /// Keep only the rows for which `keep` returns true.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Cell]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Mutable access to the rows, for in-place cell normalization.
    pub fn rows_mut(&mut self) -> &mut [Vec<Cell>] {
        &mut self.rows
    }
}

/// Check if a raw field is one of the "no value" markers.
fn is_missing_marker(field: &str) -> bool {
    MISSING_MARKERS.contains(&field)
}

/// Parse a field as a finite number.
fn parse_finite(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn typed_cell(field: String, numeric_column: bool) -> Cell {
    if is_missing_marker(&field) {
        return Cell::Missing;
    }
    if numeric_column {
        if let Some(n) = parse_finite(&field) {
            return Cell::Number(n);
        }
    }
    Cell::Text(field)
}

/// Make header names unique: blank headers become `Unnamed: <idx>` and repeats
/// get a `.1`, `.2`, ... suffix.
fn unique_column_names<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    for (idx, header) in headers.enumerate() {
        let base = if header.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_text_columns_are_typed() {
        let csv = "Age,Gender,Weight\n3 months,M,10\n6,F,20.5\n";
        let table = Table::from_csv_bytes(csv.as_bytes()).expect("parse");

        assert_eq!(table.columns(), ["Age", "Gender", "Weight"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0][0], Cell::Text("3 months".into()));
        // Mixed column keeps numeric-looking fields as text.
        assert_eq!(table.rows()[1][0], Cell::Text("6".into()));
        assert_eq!(table.rows()[1][2], Cell::Number(20.5));
        assert_eq!(table.numeric_columns(), vec!["Weight"]);
    }

    #[test]
    fn missing_markers_become_missing() {
        let csv = "Age,Weight\n3,NA\n4,\n5,7\n";
        let table = Table::from_csv_bytes(csv.as_bytes()).expect("parse");

        assert!(table.rows()[0][1].is_missing());
        assert!(table.rows()[1][1].is_missing());
        assert_eq!(table.rows()[2][1], Cell::Number(7.0));
        assert!(table.is_numeric_column(1));
    }

    #[test]
    fn all_missing_column_is_not_numeric() {
        let csv = "Age,Note\n3,\n4,NA\n";
        let table = Table::from_csv_bytes(csv.as_bytes()).expect("parse");
        assert!(!table.is_numeric_column(1));
    }

    #[test]
    fn infinity_is_not_numeric() {
        let csv = "A\ninf\n1\n";
        let table = Table::from_csv_bytes(csv.as_bytes()).expect("parse");
        assert!(!table.is_numeric_column(0));
    }

    #[test]
    fn duplicate_and_blank_headers_are_renamed() {
        let csv = "X,X,,X\n1,2,3,4\n";
        let table = Table::from_csv_bytes(csv.as_bytes()).expect("parse");
        assert_eq!(table.columns(), ["X", "X.1", "Unnamed: 2", "X.2"]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let csv = "A,B\n1,2\n3\n";
        let result = Table::from_csv_bytes(csv.as_bytes());
        assert!(matches!(result, Err(CohortError::CsvError(_))));
    }

    #[test]
    fn new_rejects_mismatched_rows() {
        let result = Table::new(vec!["A".into()], vec![vec![Cell::Missing, Cell::Missing]]);
        assert!(matches!(result, Err(CohortError::InvalidTable(_))));
    }

    #[test]
    fn retain_rows_filters_in_place() {
        let mut table = Table::new(
            vec!["A".into()],
            vec![vec![Cell::Number(1.0)], vec![Cell::Number(2.0)]],
        )
        .expect("table");
        table.retain_rows(|row| row[0] == Cell::Number(2.0));
        assert_eq!(table.row_count(), 1);
    }
}
