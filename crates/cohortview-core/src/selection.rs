//! # Selection Module
//!
//! Metric, grouping and age selection over a cleaned cohort.
//!
//! Selection state is transient: a [`SelectionRequest`] arrives with every
//! interaction, possibly partial, and is resolved against the cohort's
//! [`SelectionOptions`] into a complete [`Selection`].

use crate::primitives::{AGE_COLUMN, DEFAULT_AGE_SELECTION, SEX_COLUMN};
use crate::{Cell, Cohort, CohortError, GroupingMode};
use serde::{Deserialize, Serialize};

// =============================================================================
// OPTIONS
// =============================================================================

/// What the user can choose from for a given cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOptions {
    /// Candidate metric columns, in column order.
    pub metrics: Vec<String>,
    /// Distinct normalized ages, ascending.
    pub ages: Vec<f64>,
    /// Ages pre-selected when the selector is first shown.
    pub default_ages: Vec<f64>,
}

impl SelectionOptions {
    /// Derive the options for a cohort.
    ///
    /// Returns `CohortError::NoNumericColumns` if nothing can be charted.
    pub fn from_cohort(cohort: &Cohort) -> Result<Self, CohortError> {
        let metrics: Vec<String> = cohort
            .metric_columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        if metrics.is_empty() {
            return Err(CohortError::NoNumericColumns);
        }

        let ages = cohort.distinct_ages();
        let default_ages = default_age_selection(&ages);
        Ok(Self {
            metrics,
            ages,
            default_ages,
        })
    }
}

/// The smallest `DEFAULT_AGE_SELECTION` distinct ages, ascending.
#[must_use]
pub fn default_age_selection(ages: &[f64]) -> Vec<f64> {
    let mut distinct = ages.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    distinct.truncate(DEFAULT_AGE_SELECTION);
    distinct
}

// =============================================================================
// REQUEST & RESOLVED SELECTION
// =============================================================================

/// A possibly partial selection, as received from the user.
///
/// `ages: None` means "not chosen yet" and resolves to the default ages;
/// `ages: Some(vec![])` is an explicit empty selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub group: Option<GroupingMode>,
    #[serde(default)]
    pub ages: Option<Vec<f64>>,
}

/// A complete selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub metric: String,
    pub grouping: GroupingMode,
    pub ages: Vec<f64>,
}

impl Selection {
    /// Fill the gaps of a request from the cohort's options.
    ///
    /// An explicit metric must be one of `options.metrics`.
    pub fn resolve(
        request: &SelectionRequest,
        options: &SelectionOptions,
        cohort: &Cohort,
    ) -> Result<Self, CohortError> {
        let metric = match &request.metric {
            Some(name) => {
                if !cohort.table().has_column(name) {
                    return Err(CohortError::UnknownColumn(name.clone()));
                }
                if !options.metrics.contains(name) {
                    return Err(CohortError::NonNumericMetric(name.clone()));
                }
                name.clone()
            }
            None => options
                .metrics
                .first()
                .cloned()
                .ok_or(CohortError::NoNumericColumns)?,
        };

        let ages = request
            .ages
            .clone()
            .unwrap_or_else(|| options.default_ages.clone());

        Ok(Self {
            metric,
            grouping: request.group.unwrap_or_default(),
            ages,
        })
    }

    /// Check whether an age is part of the selection.
    #[must_use]
    pub fn contains_age(&self, age: f64) -> bool {
        self.ages.contains(&age)
    }
}

// =============================================================================
// FILTERING
// =============================================================================

/// Rows whose normalized age is one of `ages`, in table order.
#[must_use]
pub fn filter_by_ages<'a>(cohort: &'a Cohort, ages: &[f64]) -> Vec<&'a [Cell]> {
    cohort
        .table()
        .rows()
        .iter()
        .filter(|row| cohort.age_of(row).is_some_and(|age| ages.contains(&age)))
        .map(Vec::as_slice)
        .collect()
}

/// The filtered rows restricted to (age, sex, metric) for direct inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl FilteredTable {
    /// Project filtered rows onto the age, sex and metric columns.
    pub fn project(
        cohort: &Cohort,
        rows: &[&[Cell]],
        metric: &str,
    ) -> Result<Self, CohortError> {
        let metric_idx = cohort
            .table()
            .column_index(metric)
            .ok_or_else(|| CohortError::UnknownColumn(metric.to_string()))?;
        let indices = [cohort.age_index(), cohort.sex_index(), metric_idx];

        let rows = rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&idx| row.get(idx).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self {
            columns: vec![
                AGE_COLUMN.to_string(),
                SEX_COLUMN.to_string(),
                metric.to_string(),
            ],
            rows,
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no row survived the filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Normalized ages of the rows, in order.
    #[must_use]
    pub fn ages(&self) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.first().and_then(Cell::as_number))
            .collect()
    }

    /// Serialize the rows as CSV with a header line.
    pub fn to_csv(&self) -> Result<Vec<u8>, CohortError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(ToString::to_string))?;
        }
        writer
            .into_inner()
            .map_err(|e| CohortError::IoError(format!("CSV flush failed: {}", e)))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ingestor;

    fn cohort(csv: &str) -> Cohort {
        Ingestor::ingest(csv.as_bytes()).expect("ingest")
    }

    const SAMPLE: &str = "Age,Gender,Weight,Note\n\
                          1,M,10,a\n2,F,11,b\n3,M,12,c\n4,F,13,d\n4,M,14,e\n";

    #[test]
    fn default_selection_takes_three_smallest() {
        assert_eq!(
            default_age_selection(&[4.0, 1.0, 3.0, 2.0]),
            vec![1.0, 2.0, 3.0]
        );
        assert_eq!(default_age_selection(&[2.0, 1.0]), vec![1.0, 2.0]);
        assert!(default_age_selection(&[]).is_empty());
    }

    #[test]
    fn default_selection_ignores_duplicates() {
        assert_eq!(
            default_age_selection(&[1.0, 1.0, 2.0, 2.0, 5.0, 9.0]),
            vec![1.0, 2.0, 5.0]
        );
    }

    #[test]
    fn options_from_cohort() {
        let cohort = cohort(SAMPLE);
        let options = SelectionOptions::from_cohort(&cohort).expect("options");
        assert_eq!(options.metrics, vec!["Weight"]);
        assert_eq!(options.ages, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(options.default_ages, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn options_without_metrics_is_warning() {
        let cohort = cohort("Age,Gender,Note\n1,M,x\n");
        assert_eq!(
            SelectionOptions::from_cohort(&cohort),
            Err(CohortError::NoNumericColumns)
        );
    }

    #[test]
    fn resolve_fills_defaults() {
        let cohort = cohort(SAMPLE);
        let options = SelectionOptions::from_cohort(&cohort).expect("options");
        let selection =
            Selection::resolve(&SelectionRequest::default(), &options, &cohort).expect("resolve");
        assert_eq!(selection.metric, "Weight");
        assert_eq!(selection.grouping, GroupingMode::Sex);
        assert_eq!(selection.ages, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn resolve_rejects_text_metric() {
        let cohort = cohort(SAMPLE);
        let options = SelectionOptions::from_cohort(&cohort).expect("options");
        let request = SelectionRequest {
            metric: Some("Note".into()),
            ..SelectionRequest::default()
        };
        assert_eq!(
            Selection::resolve(&request, &options, &cohort),
            Err(CohortError::NonNumericMetric("Note".into()))
        );
    }

    #[test]
    fn resolve_rejects_unknown_metric() {
        let cohort = cohort(SAMPLE);
        let options = SelectionOptions::from_cohort(&cohort).expect("options");
        let request = SelectionRequest {
            metric: Some("Glucose".into()),
            ..SelectionRequest::default()
        };
        assert_eq!(
            Selection::resolve(&request, &options, &cohort),
            Err(CohortError::UnknownColumn("Glucose".into()))
        );
    }

    #[test]
    fn resolve_keeps_explicit_empty_ages() {
        let cohort = cohort(SAMPLE);
        let options = SelectionOptions::from_cohort(&cohort).expect("options");
        let request = SelectionRequest {
            ages: Some(vec![]),
            ..SelectionRequest::default()
        };
        let selection = Selection::resolve(&request, &options, &cohort).expect("resolve");
        assert!(selection.ages.is_empty());
    }

    #[test]
    fn filter_keeps_exact_members() {
        let cohort = cohort(SAMPLE);
        let rows = filter_by_ages(&cohort, &[2.0, 4.0]);
        assert_eq!(rows.len(), 3);
        assert!(filter_by_ages(&cohort, &[7.0]).is_empty());
        assert!(filter_by_ages(&cohort, &[]).is_empty());
    }

    #[test]
    fn projected_table_to_csv() {
        let cohort = cohort(SAMPLE);
        let rows = filter_by_ages(&cohort, &[1.0]);
        let table = FilteredTable::project(&cohort, &rows, "Weight").expect("project");
        assert_eq!(table.columns, vec!["Age", "Gender", "Weight"]);

        let csv = String::from_utf8(table.to_csv().expect("csv")).expect("utf8");
        assert_eq!(csv, "Age,Gender,Weight\n1,M,10\n");
    }
}
