//! # HTML Rendering
//!
//! Server-side markup for the dashboard pages. The box chart is drawn in
//! the browser by plotly.js from the figure JSON embedded in the page.

use super::model::MetricsModel;
use crate::config::DashboardConfig;
use cohortview_core::{
    Cell, Figure, FilteredTable, GroupingMode, MetricsView, Notice, NoticeLevel, Page, Selection,
    SelectionOptions, format_number,
};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; color: #1f2933; }
.app { display: flex; min-height: 100vh; }
.sidebar { width: 17rem; padding: 1.25rem; background-color: #61afdd; color: black; }
.sidebar h2 { font-size: 1rem; margin-top: 1.5rem; }
.sidebar label { display: block; margin: 0.3rem 0; }
.content { flex: 1; padding: 1.5rem 2.5rem; }
.notice { padding: 0.6rem 0.9rem; margin: 0.6rem 0; border-radius: 4px; }
.notice-success { background: #e3f9e5; }
.notice-info { background: #e6f0ff; }
.notice-warning { background: #fff6d5; }
.notice-error { background: #ffe3e3; }
.controls { display: flex; flex-wrap: wrap; gap: 1.5rem; align-items: flex-end; margin: 1rem 0; }
.controls fieldset { border: none; padding: 0; margin: 0; }
.chart { width: 100%; min-height: 480px; }
table.data { border-collapse: collapse; }
table.data th, table.data td { border: 1px solid #d9e2ec; padding: 0.25rem 0.6rem; text-align: right; }
.placeholder, .muted { color: #52606d; }
"#;

// =============================================================================
// HELPERS
// =============================================================================

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Figure JSON, safe to embed inside a `<script>` element.
fn figure_json(figure: &Figure) -> String {
    match serde_json::to_string(figure) {
        Ok(json) => json.replace("</", "<\\/"),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot serialize figure");
            "null".to_string()
        }
    }
}

/// Query string reproducing a selection, for the CSV export link.
pub(crate) fn selection_query(selection: &Selection) -> String {
    let mut pairs: Vec<(&str, String)> = vec![
        ("metric", selection.metric.clone()),
        ("group", selection.grouping.as_str().to_string()),
    ];
    pairs.extend(selection.ages.iter().map(|age| ("ages", format_number(*age))));
    pairs.push(("submitted", "1".to_string()));

    match serde_urlencoded::to_string(&pairs) {
        Ok(query) => query,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot encode selection query");
            String::new()
        }
    }
}

fn notice_html(notice: &Notice) -> String {
    let class = match notice.level {
        NoticeLevel::Success => "success",
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    format!(
        r#"<div class="notice notice-{}">{}</div>"#,
        class,
        escape_html(&notice.message)
    )
}

fn selected(flag: bool) -> &'static str {
    if flag { " selected" } else { "" }
}

fn checked(flag: bool) -> &'static str {
    if flag { " checked" } else { "" }
}

// =============================================================================
// LAYOUT
// =============================================================================

/// Full HTML document: sidebar with navigation and upload, then `main`.
pub(crate) fn document(
    config: &DashboardConfig,
    current: Page,
    upload: &Notice,
    main: &str,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{page} | {title}</title>
    <style>{STYLE}</style>
</head>
<body>
<div class="app">
{sidebar}
<main class="content">
    <h1>{title}</h1>
{main}
</main>
</div>
</body>
</html>"#,
        page = escape_html(current.title()),
        title = escape_html(&config.title),
        sidebar = sidebar(current, upload),
    )
}

fn sidebar(current: Page, upload: &Notice) -> String {
    let pages: String = Page::ALL
        .into_iter()
        .map(|page| {
            format!(
                r#"
        <label><input type="radio" name="page" value="{}" onchange="this.form.submit()"{}> {}</label>"#,
                page.slug(),
                checked(page == current),
                escape_html(page.title())
            )
        })
        .collect();

    format!(
        r#"<aside class="sidebar">
    <h2>Navigation</h2>
    <form method="post" action="/navigate">{pages}
        <noscript><button type="submit">Go</button></noscript>
    </form>
    <h2>Data</h2>
    <form method="post" action="/upload" enctype="multipart/form-data">
        <input type="file" name="file" accept=".csv,text/csv" required>
        <button type="submit">Upload CSV</button>
    </form>
    {notice}
</aside>"#,
        notice = notice_html(upload)
    )
}

// =============================================================================
// STATIC PAGES
// =============================================================================

pub(crate) fn home(config: &DashboardConfig) -> String {
    let pages: String = Page::ALL
        .into_iter()
        .filter(|page| *page != Page::Home)
        .map(|page| {
            format!(
                "\n        <li><strong>{}</strong>: {}</li>",
                escape_html(page.title()),
                escape_html(page.summary())
            )
        })
        .collect();

    format!(
        r#"    <h2>Welcome</h2>
    <p>{intro}</p>
    <p>Upload a CSV with one row per animal. It must contain an <code>Age</code> column
    and a <code>Gender</code> column; every other numeric column can be charted.
    Ages such as <code>3 months</code> or <code>3-6</code> are read as their first number.</p>
    <ul>{pages}
    </ul>"#,
        intro = escape_html(&format!(
            "{} compares biochemical measurements across sex and age groups.",
            config.title
        )),
    )
}

pub(crate) fn placeholder(page: Page) -> String {
    format!(
        r#"    <h2>{}</h2>
    <p class="placeholder">{}</p>"#,
        escape_html(page.title()),
        escape_html(page.summary())
    )
}

pub(crate) fn team(config: &DashboardConfig) -> String {
    let body = if config.team.is_empty() {
        r#"<p class="muted">Team details have not been configured.</p>"#.to_string()
    } else {
        let items: String = config
            .team
            .iter()
            .map(|line| format!("\n        <li>{}</li>", escape_html(line)))
            .collect();
        format!("<ul>{items}\n    </ul>")
    };
    format!(
        "    <h2>{}</h2>\n    <p>{}</p>\n    {body}",
        Page::Team.title(),
        Page::Team.summary()
    )
}

pub(crate) fn contact(config: &DashboardConfig) -> String {
    let body = match &config.contact_email {
        Some(email) => {
            let email = escape_html(email);
            format!(r#"<p>Write to <a href="mailto:{email}">{email}</a>.</p>"#)
        }
        None => r#"<p class="muted">No contact address has been configured.</p>"#.to_string(),
    };
    format!(
        "    <h2>{}</h2>\n    <p>{}</p>\n    {body}",
        Page::Contact.title(),
        Page::Contact.summary()
    )
}

// =============================================================================
// METRICS PAGE
// =============================================================================

/// Main area of the metrics page: notices, then controls, then chart and table.
pub(crate) fn metrics(model: &MetricsModel) -> String {
    let notices: String = model.notices.iter().map(notice_html).collect();
    let controls_html = model
        .options
        .as_ref()
        .map(|options| controls(options, model.selection.as_ref()))
        .unwrap_or_default();
    let view_html = model.view.as_ref().map(view).unwrap_or_default();

    format!(
        "    <h2>{}</h2>\n    {notices}\n    {controls_html}\n    {view_html}",
        Page::Metrics.title()
    )
}

fn controls(options: &SelectionOptions, selection: Option<&Selection>) -> String {
    let current_metric = selection.map(|s| s.metric.as_str());
    let metric_options: String = options
        .metrics
        .iter()
        .enumerate()
        .map(|(idx, metric)| {
            let is_selected = match current_metric {
                Some(current) => current == metric,
                None => idx == 0,
            };
            format!(
                r#"<option value="{name}"{sel}>{name}</option>"#,
                name = escape_html(metric),
                sel = selected(is_selected)
            )
        })
        .collect();

    let grouping = selection.map(|s| s.grouping).unwrap_or_default();
    let group_radios: String = GroupingMode::ALL
        .into_iter()
        .map(|mode| {
            format!(
                r#"<label><input type="radio" name="group" value="{}"{}> {}</label>"#,
                mode.as_str(),
                checked(mode == grouping),
                mode.label()
            )
        })
        .collect();

    let chosen_ages = selection.map_or(&options.default_ages, |s| &s.ages);
    let age_options: String = options
        .ages
        .iter()
        .map(|age| {
            let label = format_number(*age);
            format!(
                r#"<option value="{label}"{}>{label}</option>"#,
                selected(chosen_ages.contains(age))
            )
        })
        .collect();

    format!(
        r#"<form method="get" action="/" class="controls">
        <input type="hidden" name="submitted" value="1">
        <label>Metric<br><select name="metric">{metric_options}</select></label>
        <fieldset><legend>Group</legend>{group_radios}</fieldset>
        <label>Ages (months)<br><select name="ages" multiple size="{size}">{age_options}</select></label>
        <button type="submit">Apply</button>
    </form>"#,
        size = options.ages.len().clamp(1, 8)
    )
}

fn view(metrics_view: &MetricsView) -> String {
    format!(
        r#"<section>
        <h3>{heading}</h3>
        {chart}
        <h3>Data</h3>
        <p class="muted">{rows} row(s) | <a href="/export.csv?{export}">Download CSV</a></p>
        {table}
    </section>"#,
        heading = escape_html(&metrics_view.heading),
        chart = chart(&metrics_view.chart.to_figure()),
        rows = metrics_view.table.len(),
        export = escape_html(&selection_query(&metrics_view.selection)),
        table = table(&metrics_view.table),
    )
}

fn chart(figure: &Figure) -> String {
    format!(
        r#"<div id="chart" class="chart"></div>
        <script src="{PLOTLY_CDN}"></script>
        <script>
            const figure = {json};
            Plotly.newPlot("chart", figure.data, figure.layout, {{ responsive: true }});
        </script>"#,
        json = figure_json(figure)
    )
}

fn table(table: &FilteredTable) -> String {
    let header: String = table
        .columns
        .iter()
        .map(|c| format!("<th>{}</th>", escape_html(c)))
        .collect();
    let rows: String = table
        .rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| match cell {
                    Cell::Missing => r#"<td class="muted">NA</td>"#.to_string(),
                    other => format!("<td>{}</td>", escape_html(&other.to_string())),
                })
                .collect();
            format!("\n            <tr>{cells}</tr>")
        })
        .collect();

    format!(
        r#"<table class="data">
            <thead><tr>{header}</tr></thead>
            <tbody>{rows}
            </tbody>
        </table>"#
    )
}

/// Self-contained page with one chart and its table, written by `cohortview chart`.
pub fn standalone_chart_html(metrics_view: &MetricsView) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
<main class="content">
    {body}
</main>
</body>
</html>"#,
        title = escape_html(&metrics_view.chart.title),
        body = view(metrics_view),
    )
}
