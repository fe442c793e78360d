//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::AppConfig;
use cohortview_core::{
    CohortError, Compositor, GroupingMode, Ingestor, MetricsView, Page, SelectionOptions,
    SelectionRequest, Session, format_number, primitives::MAX_UPLOAD_BYTES,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading. Same limit as a dashboard upload.
fn validate_file_size(path: &Path) -> Result<(), CohortError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CohortError::IoError(format!("Cannot read file metadata: {}", e)))?;

    let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    if size > MAX_UPLOAD_BYTES {
        return Err(CohortError::UploadTooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Resolve an input path and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CohortError> {
    let canonical = path.canonicalize().map_err(|e| {
        CohortError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(CohortError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path through its (existing) parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, CohortError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        CohortError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(CohortError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| CohortError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read a CSV file after path and size checks.
fn read_csv(path: &Path) -> Result<Vec<u8>, CohortError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path)?;
    std::fs::read(&path)
        .map_err(|e| CohortError::IoError(format!("Cannot read '{}': {}", path.display(), e)))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<PathBuf, CohortError> {
    let path = validate_output_path(path)?;
    std::fs::write(&path, bytes)
        .map_err(|e| CohortError::IoError(format!("Cannot write '{}': {}", path.display(), e)))?;
    Ok(path)
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

fn join_ages(ages: &[f64]) -> String {
    ages.iter()
        .map(|age| format_number(*age))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the dashboard server.
pub async fn cmd_server(config: AppConfig) -> Result<(), CohortError> {
    println!("cohortview dashboard starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.server.host);
    println!("  Port:       {}", config.server.port);
    println!("  Rate limit: {} req/s", config.server.rate_limit);
    println!("  Title:      {}", config.dashboard.title);
    println!();
    println!("Open http://{}/ in a browser.", config.bind_addr());
    println!();
    println!("JSON API:");
    println!("  GET  /api/status  - Upload and page state");
    println!("  PUT  /api/dataset - Upload a CSV body");
    println!("  POST /api/chart   - Chart a selection");
    println!("  GET  /api/health  - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config, Session::new()).await
}

// =============================================================================
// INSPECT COMMAND
// =============================================================================

/// Validate a CSV and summarize what the metrics page would offer.
pub fn cmd_inspect(file: &Path, json_mode: bool, verbose: bool) -> Result<(), CohortError> {
    let bytes = read_csv(file)?;
    let table = Ingestor::load(&bytes)?;
    let cohort = Ingestor::clean(&table)?;
    let options = SelectionOptions::from_cohort(&cohort);

    if cohort.dropped_rows() > 0 {
        tracing::info!(
            dropped = cohort.dropped_rows(),
            "Dropped rows with unreadable age"
        );
    }

    if json_mode {
        let output = serde_json::json!({
            "file": file.to_string_lossy(),
            "columns": table.columns(),
            "rows": table.row_count(),
            "kept_rows": cohort.row_count(),
            "dropped_rows": cohort.dropped_rows(),
            "metrics": options.as_ref().map(|o| o.metrics.clone()).unwrap_or_default(),
            "ages": cohort.distinct_ages(),
            "default_ages": options.as_ref().map(|o| o.default_ages.clone()).unwrap_or_default(),
            "warning": options.as_ref().err().map(ToString::to_string),
        });
        print_json(&output);
        return Ok(());
    }

    println!("Cohort file: {}", file.display());
    println!("=============");
    println!("Rows:          {}", table.row_count());
    println!("Kept rows:     {}", cohort.row_count());
    println!("Dropped rows:  {}", cohort.dropped_rows());
    if verbose {
        println!("Columns:       {}", table.columns().join(", "));
    }
    println!("Ages:          {}", join_ages(&cohort.distinct_ages()));

    match &options {
        Ok(options) => {
            println!("Metrics:       {}", options.metrics.join(", "));
            println!("Default ages:  {}", join_ages(&options.default_ages));
        }
        Err(e) => println!("Warning:       {}", e),
    }

    Ok(())
}

// =============================================================================
// CHART COMMAND
// =============================================================================

/// Selection and output options of the `chart` command.
#[derive(Debug, Clone, Default)]
pub struct ChartOptions {
    pub metric: Option<String>,
    pub group: Option<GroupingMode>,
    pub ages: Option<Vec<f64>>,
    pub output: Option<PathBuf>,
    pub table_out: Option<PathBuf>,
}

/// Build the chart for one metric and print per-group statistics.
pub fn cmd_chart(file: &Path, options: ChartOptions, json_mode: bool) -> Result<(), CohortError> {
    let bytes = read_csv(file)?;
    let cohort = Ingestor::ingest(&bytes)?;
    let request = SelectionRequest {
        metric: options.metric,
        group: options.group,
        ages: options.ages,
    };
    let view = Compositor::compose(&cohort, &request)?;
    tracing::debug!(
        metric = %view.selection.metric,
        points = view.chart.point_count(),
        "Chart composed"
    );

    let figure_path = match &options.output {
        Some(path) => Some(write_figure(path, &view)?),
        None => None,
    };
    let table_path = match &options.table_out {
        Some(path) => Some(write_output(path, &view.table.to_csv()?)?),
        None => None,
    };

    if json_mode {
        let groups: Vec<serde_json::Value> = view
            .chart
            .traces
            .iter()
            .map(|trace| serde_json::json!({ "name": trace.name, "stats": trace.stats }))
            .collect();
        let output = serde_json::json!({
            "heading": view.heading,
            "selection": view.selection,
            "rows": view.table.len(),
            "groups": groups,
            "figure": figure_path.map(|p| p.to_string_lossy().into_owned()),
            "table": table_path.map(|p| p.to_string_lossy().into_owned()),
        });
        print_json(&output);
        return Ok(());
    }

    println!("{}", view.heading);
    println!("Ages: {}", join_ages(&view.selection.ages));
    println!("Rows: {}", view.table.len());
    println!();
    println!(
        "{:<16} {:>5} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "group", "n", "min", "q1", "median", "q3", "max", "mean"
    );
    for trace in &view.chart.traces {
        let s = &trace.stats;
        println!(
            "{:<16} {:>5} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            trace.name, s.count, s.min, s.q1, s.median, s.q3, s.max, s.mean
        );
    }
    if let Some(path) = figure_path {
        println!();
        println!("Figure written to {}", path.display());
    }
    if let Some(path) = table_path {
        println!("Rows written to {}", path.display());
    }

    Ok(())
}

/// Write the figure as plotly JSON (`.json`) or a standalone HTML page.
fn write_figure(path: &Path, view: &MetricsView) -> Result<PathBuf, CohortError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let bytes = if is_json {
        serde_json::to_vec_pretty(&view.chart.to_figure())
            .map_err(|e| CohortError::IoError(format!("Cannot serialize figure: {}", e)))?
    } else {
        api::standalone_chart_html(view).into_bytes()
    };
    write_output(path, &bytes)
}

// =============================================================================
// PAGES COMMAND
// =============================================================================

/// List the dashboard pages.
pub fn cmd_pages(json_mode: bool) -> Result<(), CohortError> {
    if json_mode {
        let pages: Vec<serde_json::Value> = Page::ALL
            .into_iter()
            .map(|page| {
                serde_json::json!({
                    "slug": page.slug(),
                    "title": page.title(),
                    "summary": page.summary(),
                    "placeholder": page.is_placeholder(),
                })
            })
            .collect();
        print_json(&serde_json::json!({ "pages": pages }));
        return Ok(());
    }

    println!("Dashboard pages");
    println!("===============");
    for page in Page::ALL {
        println!("  {:<26} {}", page.slug(), page.title());
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "Age,Gender,Weight\n3 months,M,10\n6 months,F,20\n12 months,M,30\n";

    fn sample_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(SAMPLE.as_bytes()).expect("write");
        file
    }

    #[test]
    fn directory_is_not_an_input_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            validate_file_path(dir.path()),
            Err(CohortError::IoError(_))
        ));
    }

    #[test]
    fn output_needs_existing_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope").join("out.html");
        assert!(validate_output_path(&missing).is_err());
        assert!(validate_output_path(&dir.path().join("out.html")).is_ok());
    }

    #[test]
    fn inspect_reports_missing_columns() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"Weight\n1\n").expect("write");
        let result = cmd_inspect(file.path(), true, false);
        assert_eq!(
            result,
            Err(CohortError::MissingColumns(vec![
                "Age".to_string(),
                "Gender".to_string()
            ]))
        );
    }

    #[test]
    fn chart_writes_figure_and_rows() {
        let file = sample_file();
        let dir = tempfile::tempdir().expect("tempdir");
        let figure = dir.path().join("weight.json");
        let rows = dir.path().join("rows.csv");

        cmd_chart(
            file.path(),
            ChartOptions {
                output: Some(figure.clone()),
                table_out: Some(rows.clone()),
                ..ChartOptions::default()
            },
            true,
        )
        .expect("chart");

        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&figure).expect("read figure"))
                .expect("figure json");
        assert_eq!(json["data"].as_array().map(Vec::len), Some(2));

        let csv = std::fs::read_to_string(&rows).expect("read rows");
        assert_eq!(csv.lines().next(), Some("Age,Gender,Weight"));
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn chart_html_output() {
        let file = sample_file();
        let dir = tempfile::tempdir().expect("tempdir");
        let figure = dir.path().join("weight.html");
        cmd_chart(
            file.path(),
            ChartOptions {
                group: Some(GroupingMode::Age),
                output: Some(figure.clone()),
                ..ChartOptions::default()
            },
            false,
        )
        .expect("chart");
        let html = std::fs::read_to_string(&figure).expect("read");
        assert!(html.contains("Weight box plot by age"));
    }

    #[test]
    fn chart_with_no_matching_ages_is_empty_selection() {
        let file = sample_file();
        let result = cmd_chart(
            file.path(),
            ChartOptions {
                ages: Some(vec![99.0]),
                ..ChartOptions::default()
            },
            true,
        );
        assert_eq!(result, Err(CohortError::EmptySelection));
    }
}
