//! # Page Handlers
//!
//! Browser-facing routes. Every interaction ends in a full re-render of the
//! current page from the session; forms redirect back to `/` (303).

use super::{AppState, model::MetricsModel, render};
use axum::{
    Form,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::Query;
use cohortview_core::{GroupingMode, Page, SelectionRequest};
use serde::Deserialize;

// =============================================================================
// QUERY & FORMS
// =============================================================================

/// Metrics selection as sent by the controls form.
///
/// `submitted` is set by the form itself, so that a submission with no
/// `ages` means an explicitly empty age selection rather than "use defaults".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsQuery {
    pub metric: Option<String>,
    pub group: Option<GroupingMode>,
    #[serde(default)]
    pub ages: Vec<f64>,
    pub submitted: Option<String>,
}

impl MetricsQuery {
    /// Convert to a selection request.
    #[must_use]
    pub fn to_request(&self) -> SelectionRequest {
        let ages = if self.submitted.is_some() || !self.ages.is_empty() {
            Some(self.ages.clone())
        } else {
            None
        };
        SelectionRequest {
            metric: self.metric.clone().filter(|m| !m.is_empty()),
            group: self.group,
            ages,
        }
    }
}

/// Navigation form body.
#[derive(Debug, Clone, Deserialize)]
pub struct NavigateForm {
    pub page: String,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Render the current page.
pub async fn index_handler(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Html<String> {
    let session = state.session.read().await;
    let dashboard = &state.config.dashboard;
    let page = session.current_page();

    let main = match page {
        Page::Home => render::home(dashboard),
        Page::Metrics => render::metrics(&MetricsModel::build(&session, &query.to_request())),
        Page::SingleCellAtlas | Page::SingleCellTrajectories => render::placeholder(page),
        Page::Team => render::team(dashboard),
        Page::Contact => render::contact(dashboard),
    };

    Html(render::document(
        dashboard,
        page,
        &session.upload_notice(),
        &main,
    ))
}

/// Switch pages from the sidebar.
pub async fn navigate_form_handler(
    State(state): State<AppState>,
    Form(form): Form<NavigateForm>,
) -> Response {
    let mut session = state.session.write().await;
    let previous = session.current_page();
    match session.select_page_slug(&form.page) {
        Ok(page) => {
            tracing::info!(from = previous.slug(), to = page.slug(), "Page switched");
            Redirect::to("/").into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// Accept the `file` field of a multipart form as the new dataset.
///
/// A file that fails to parse still redirects; the page shows the error.
pub async fn upload_form_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed upload");
                return (e.status(), e.body_text()).into_response();
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "Upload interrupted");
                return (e.status(), e.body_text()).into_response();
            }
        };

        let mut session = state.session.write().await;
        match session.upload(&name, &bytes) {
            Ok(receipt) => tracing::info!(
                name = %receipt.name,
                rows = receipt.rows,
                cache = ?receipt.cache,
                "Dataset uploaded"
            ),
            Err(e) => tracing::warn!(name = %name, error = %e, "Upload rejected"),
        }
        session.select_page(Page::Metrics);
        return Redirect::to("/").into_response();
    }

    (StatusCode::BAD_REQUEST, "Missing multipart field 'file'").into_response()
}

/// Download the filtered (Age, Gender, metric) rows for a selection.
pub async fn export_handler(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Response {
    let session = state.session.read().await;
    let model = MetricsModel::build(&session, &query.to_request());

    let Some(view) = model.view else {
        let status = if model.has_upload {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::CONFLICT
        };
        let message = model
            .notices
            .last()
            .map(|n| n.message.clone())
            .unwrap_or_default();
        return (status, message).into_response();
    };

    match view.table.to_csv() {
        Ok(bytes) => {
            tracing::debug!(rows = view.table.len(), metric = %view.selection.metric, "CSV export");
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!(
                            "attachment; filename=\"{}\"",
                            export_file_name(&view.selection.metric)
                        ),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// File name for an export, restricted to characters safe in a header.
fn export_file_name(metric: &str) -> String {
    let stem: String = metric
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("cohort_{}.csv", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_ages_use_defaults() {
        let request = MetricsQuery::default().to_request();
        assert_eq!(request.ages, None);
    }

    #[test]
    fn submitted_without_ages_is_empty_selection() {
        let query = MetricsQuery {
            submitted: Some("1".to_string()),
            ..MetricsQuery::default()
        };
        assert_eq!(query.to_request().ages, Some(vec![]));
    }

    #[test]
    fn blank_metric_is_ignored() {
        let query = MetricsQuery {
            metric: Some(String::new()),
            ..MetricsQuery::default()
        };
        assert_eq!(query.to_request().metric, None);
    }

    #[test]
    fn export_name_is_header_safe() {
        assert_eq!(export_file_name("ALT (U/L)"), "cohort_ALT__U_L_.csv");
    }
}
