//! # Chart Module
//!
//! Grouped box-plot construction.
//!
//! A [`BoxChart`] holds one [`BoxTrace`] per category with every individual
//! point and its five-number summary. [`BoxChart::to_figure`] turns it into a
//! Plotly figure description (`data` + `layout`) that any plotly.js page can
//! draw as-is.

use crate::primitives::{AGE_COLUMN, SEX_COLUMN, WHISKER_IQR_FACTOR};
use crate::selection::Selection;
use crate::types::format_number;
use crate::{Cell, Cohort, CohortError, GroupingMode};
use serde::{Deserialize, Serialize};

/// Plotly's default qualitative palette, cycled across traces.
pub const PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

// =============================================================================
// STATISTICS
// =============================================================================

/// Five-number summary plus mean and outliers of one box.
///
/// Quartiles use linear interpolation between closest ranks; whiskers reach
/// the most extreme points within 1.5 IQR of the quartiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub max: f64,
    pub mean: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// Summarize a set of values. Returns `None` for an empty set.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let (&min, &max) = (sorted.first()?, sorted.last()?);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR_FACTOR * iqr;
        let high_fence = q3 + WHISKER_IQR_FACTOR * iqr;

        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(min);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(max);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < lower_whisker || v > upper_whisker)
            .collect();

        Some(Self {
            count: sorted.len(),
            min,
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            max,
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            outliers,
        })
    }
}

/// Linear-interpolated quantile of a sorted, non-empty slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let last = sorted.len().saturating_sub(1);
    let pos = p * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    match (sorted.get(lo), sorted.get(hi)) {
        (Some(&a), Some(&b)) => a + (b - a) * (pos - lo as f64),
        (Some(&a), None) => a,
        _ => 0.0,
    }
}

// =============================================================================
// CHART
// =============================================================================

/// One box: a category and all of its points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxTrace {
    pub name: String,
    pub values: Vec<f64>,
    pub stats: BoxStats,
}

/// A grouped distribution chart for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxChart {
    pub metric: String,
    pub grouping: GroupingMode,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub traces: Vec<BoxTrace>,
}

impl BoxChart {
    /// Build the chart for already-filtered rows.
    ///
    /// Sex categories keep their order of first appearance; age categories
    /// are ascending. Rows with a missing metric value, or a missing sex when
    /// grouping by sex, contribute no point.
    pub fn build(
        cohort: &Cohort,
        rows: &[&[Cell]],
        selection: &Selection,
    ) -> Result<Self, CohortError> {
        let metric_idx = cohort
            .table()
            .column_index(&selection.metric)
            .ok_or_else(|| CohortError::UnknownColumn(selection.metric.clone()))?;

        let mut groups: Vec<(String, Option<f64>, Vec<f64>)> = Vec::new();
        for row in rows {
            let Some(value) = row.get(metric_idx).and_then(Cell::as_number) else {
                continue;
            };
            let (label, order_key) = match selection.grouping {
                GroupingMode::Sex => match cohort.sex_of(row) {
                    Some(sex) => (sex, None),
                    None => continue,
                },
                GroupingMode::Age => match cohort.age_of(row) {
                    Some(age) => (format_number(age), Some(age)),
                    None => continue,
                },
            };
            match groups.iter_mut().find(|(name, _, _)| *name == label) {
                Some((_, _, values)) => values.push(value),
                None => groups.push((label, order_key, vec![value])),
            }
        }

        if selection.grouping == GroupingMode::Age {
            groups.sort_by(|a, b| {
                a.1.unwrap_or_default()
                    .total_cmp(&b.1.unwrap_or_default())
            });
        }

        let traces = groups
            .into_iter()
            .filter_map(|(name, _, values)| {
                BoxStats::from_values(&values).map(|stats| BoxTrace {
                    name,
                    values,
                    stats,
                })
            })
            .collect();

        let x_label = match selection.grouping {
            GroupingMode::Sex => SEX_COLUMN,
            GroupingMode::Age => AGE_COLUMN,
        };

        Ok(Self {
            metric: selection.metric.clone(),
            grouping: selection.grouping,
            title: format!("{} box plot {}", selection.metric, selection.grouping.label()),
            x_label: x_label.to_string(),
            y_label: selection.metric.clone(),
            traces,
        })
    }

    /// Total number of plotted points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.traces.iter().map(|t| t.values.len()).sum()
    }

    /// Plotly figure description of this chart.
    #[must_use]
    pub fn to_figure(&self) -> Figure {
        let data = self
            .traces
            .iter()
            .enumerate()
            .map(|(idx, trace)| FigureTrace {
                kind: "box".to_string(),
                name: trace.name.clone(),
                x: vec![trace.name.clone(); trace.values.len()],
                y: trace.values.clone(),
                boxpoints: "all".to_string(),
                jitter: 0.3,
                pointpos: 0.0,
                marker: Marker {
                    color: PALETTE[idx % PALETTE.len()].to_string(),
                },
                offsetgroup: trace.name.clone(),
                legendgroup: trace.name.clone(),
            })
            .collect();

        Figure {
            data,
            layout: Layout {
                title: Title::new(&self.title),
                xaxis: Axis {
                    title: Title::new(&self.x_label),
                    kind: Some("category".to_string()),
                },
                yaxis: Axis {
                    title: Title::new(&self.y_label),
                    kind: None,
                },
                boxmode: "overlay".to_string(),
                legend: Legend {
                    title: Title::new(&self.x_label),
                },
            },
        }
    }
}

// =============================================================================
// PLOTLY FIGURE
// =============================================================================

/// A plotly.js figure: traces plus layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<FigureTrace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureTrace {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub boxpoints: String,
    pub jitter: f64,
    pub pointpos: f64,
    pub marker: Marker,
    pub offsetgroup: String,
    pub legendgroup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: Title,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub boxmode: String,
    pub legend: Legend,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ingestor;
    use crate::selection::filter_by_ages;

    fn selection(metric: &str, grouping: GroupingMode, ages: &[f64]) -> Selection {
        Selection {
            metric: metric.to_string(),
            grouping,
            ages: ages.to_vec(),
        }
    }

    #[test]
    fn stats_of_odd_sample() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).expect("stats");
        assert_eq!(stats.count, 5);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.lower_whisker, 1.0);
        assert_eq!(stats.upper_whisker, 5.0);
        assert!(stats.outliers.is_empty());
    }

    #[test]
    fn stats_interpolate_even_sample() {
        let stats = BoxStats::from_values(&[10.0, 20.0, 30.0, 40.0]).expect("stats");
        assert_eq!(stats.q1, 17.5);
        assert_eq!(stats.median, 25.0);
        assert_eq!(stats.q3, 32.5);
    }

    #[test]
    fn stats_flag_outliers() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0]).expect("stats");
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.upper_whisker, 4.0);
        assert_eq!(stats.max, 100.0);
    }

    #[test]
    fn stats_single_value() {
        let stats = BoxStats::from_values(&[7.0]).expect("stats");
        assert_eq!(stats.q1, 7.0);
        assert_eq!(stats.q3, 7.0);
        assert!(BoxStats::from_values(&[]).is_none());
    }

    #[test]
    fn groups_by_sex_in_first_appearance_order() {
        let csv = "Age,Gender,Weight\n3,M,10\n6,F,20\n12,M,30\n";
        let cohort = Ingestor::ingest(csv.as_bytes()).expect("ingest");
        let sel = selection("Weight", GroupingMode::Sex, &[3.0, 6.0, 12.0]);
        let rows = filter_by_ages(&cohort, &sel.ages);
        let chart = BoxChart::build(&cohort, &rows, &sel).expect("chart");

        let names: Vec<_> = chart.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["M", "F"]);
        assert_eq!(chart.traces[0].values, vec![10.0, 30.0]);
        assert_eq!(chart.x_label, "Gender");
        assert_eq!(chart.point_count(), 3);
    }

    #[test]
    fn groups_by_age_ascending() {
        let csv = "Age,Gender,Weight\n12m,M,30\n3m,F,10\n6m,M,20\n3m,M,11\n";
        let cohort = Ingestor::ingest(csv.as_bytes()).expect("ingest");
        let sel = selection("Weight", GroupingMode::Age, &[3.0, 6.0, 12.0]);
        let rows = filter_by_ages(&cohort, &sel.ages);
        let chart = BoxChart::build(&cohort, &rows, &sel).expect("chart");

        let names: Vec<_> = chart.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["3", "6", "12"]);
        assert_eq!(chart.traces[0].values, vec![10.0, 11.0]);
    }

    #[test]
    fn missing_metric_values_are_skipped() {
        let csv = "Age,Gender,Weight\n3,M,\n3,F,20\n";
        let cohort = Ingestor::ingest(csv.as_bytes()).expect("ingest");
        let sel = selection("Weight", GroupingMode::Sex, &[3.0]);
        let rows = filter_by_ages(&cohort, &sel.ages);
        let chart = BoxChart::build(&cohort, &rows, &sel).expect("chart");
        assert_eq!(chart.traces.len(), 1);
        assert_eq!(chart.traces[0].name, "F");
    }

    #[test]
    fn figure_draws_all_points() {
        let csv = "Age,Gender,Weight\n3,M,10\n6,F,20\n";
        let cohort = Ingestor::ingest(csv.as_bytes()).expect("ingest");
        let sel = selection("Weight", GroupingMode::Sex, &[3.0, 6.0]);
        let rows = filter_by_ages(&cohort, &sel.ages);
        let figure = BoxChart::build(&cohort, &rows, &sel)
            .expect("chart")
            .to_figure();

        assert_eq!(figure.data.len(), 2);
        assert!(figure.data.iter().all(|t| t.boxpoints == "all"));
        assert_eq!(figure.data[1].marker.color, PALETTE[1]);

        let json = serde_json::to_value(&figure).expect("json");
        assert_eq!(json["data"][0]["type"], "box");
        assert_eq!(json["layout"]["xaxis"]["type"], "category");
        assert!(json["layout"]["yaxis"].get("type").is_none());
    }
}
