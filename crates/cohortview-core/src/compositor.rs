//! # Compositor Module
//!
//! Assembles the metrics view from a cohort and a selection request:
//!
//! 1. Candidate metrics must exist (`NoNumericColumns` otherwise).
//! 2. The request is resolved against the cohort's options.
//! 3. Rows are restricted to the selected ages (`EmptySelection` if none remain).
//! 4. The box chart and the (age, sex, metric) table are built.
//!
//! Required-column validation happens earlier, in [`Ingestor::clean`].

use crate::chart::BoxChart;
use crate::selection::{
    FilteredTable, Selection, SelectionOptions, SelectionRequest, filter_by_ages,
};
use crate::{Cohort, CohortError, Ingestor, Table};
use serde::{Deserialize, Serialize};

/// Everything the metrics page shows below its controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsView {
    pub heading: String,
    pub options: SelectionOptions,
    pub selection: Selection,
    pub chart: BoxChart,
    pub table: FilteredTable,
}

/// Builds metric views. Stateless.
pub struct Compositor;

impl Compositor {
    /// Compose the view for a raw table, validating and cleaning it first.
    pub fn compose_table(
        table: &Table,
        request: &SelectionRequest,
    ) -> Result<MetricsView, CohortError> {
        let cohort = Ingestor::clean(table)?;
        Self::compose(&cohort, request)
    }

    /// Compose the view for a cleaned cohort.
    pub fn compose(cohort: &Cohort, request: &SelectionRequest) -> Result<MetricsView, CohortError> {
        let options = SelectionOptions::from_cohort(cohort)?;
        let selection = Selection::resolve(request, &options, cohort)?;
        Self::compose_selection(cohort, options, selection)
    }

    /// Compose the view for an already resolved selection.
    pub fn compose_selection(
        cohort: &Cohort,
        options: SelectionOptions,
        selection: Selection,
    ) -> Result<MetricsView, CohortError> {
        let rows = filter_by_ages(cohort, &selection.ages);
        if rows.is_empty() {
            return Err(CohortError::EmptySelection);
        }

        let chart = BoxChart::build(cohort, &rows, &selection)?;
        let table = FilteredTable::project(cohort, &rows, &selection.metric)?;

        Ok(MetricsView {
            heading: heading(&selection),
            options,
            selection,
            chart,
            table,
        })
    }
}

/// Section heading above the chart, e.g. "Distribution of Weight (by sex)".
#[must_use]
pub fn heading(selection: &Selection) -> String {
    format!(
        "Distribution of {} ({})",
        selection.metric,
        selection.grouping.label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GroupingMode;

    const SAMPLE: &str = "Age,Gender,Weight\n1,M,10\n2,F,20\n3,M,30\n4,F,40\n";

    fn table(csv: &str) -> Table {
        Table::from_csv_bytes(csv.as_bytes()).expect("parse")
    }

    #[test]
    fn default_request_uses_first_three_ages() {
        let view = Compositor::compose_table(&table(SAMPLE), &SelectionRequest::default())
            .expect("compose");
        assert_eq!(view.table.len(), 3);
        assert_eq!(view.heading, "Distribution of Weight (by sex)");
    }

    #[test]
    fn empty_age_selection_short_circuits() {
        let request = SelectionRequest {
            ages: Some(vec![]),
            ..SelectionRequest::default()
        };
        assert_eq!(
            Compositor::compose_table(&table(SAMPLE), &request),
            Err(CohortError::EmptySelection)
        );
    }

    #[test]
    fn unmatched_ages_short_circuit() {
        let request = SelectionRequest {
            ages: Some(vec![99.0]),
            group: Some(GroupingMode::Age),
            ..SelectionRequest::default()
        };
        assert_eq!(
            Compositor::compose_table(&table(SAMPLE), &request),
            Err(CohortError::EmptySelection)
        );
    }

    #[test]
    fn missing_columns_stop_before_selection() {
        let result =
            Compositor::compose_table(&table("Age,Weight\n1,2\n"), &SelectionRequest::default());
        assert!(matches!(result, Err(CohortError::MissingColumns(_))));
    }
}
