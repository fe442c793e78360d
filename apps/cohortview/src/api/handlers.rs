//! # API Endpoint Handlers
//!
//! JSON endpoints under `/api`.

use super::{
    AppState,
    model::MetricsModel,
    types::{
        ChartResponse, GroupStatsJson, HealthResponse, NavigateRequest, NavigateResponse,
        PageJson, PagesResponse, StatusResponse, UploadQuery, UploadResponse, UploadSummary,
    },
};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use cohortview_core::{CohortError, Page, SelectionOptions, SelectionRequest, Session, UploadState};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Session status: current page, upload state, cache counters.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let response = StatusResponse {
        page: session.current_page().slug().to_string(),
        upload: upload_summary(&session),
        cache: session.cache_stats(),
    };
    (StatusCode::OK, Json(response))
}

fn upload_summary(session: &Session) -> Option<UploadSummary> {
    match session.upload_state()? {
        UploadState::Loaded(loaded) => {
            let mut summary = UploadSummary {
                name: loaded.name.clone(),
                state: "loaded".to_string(),
                digest: Some(loaded.digest.to_hex()),
                size: Some(loaded.size),
                rows: Some(loaded.table.row_count()),
                kept_rows: None,
                dropped_rows: None,
                metrics: Vec::new(),
                error: None,
            };
            match session.cohort() {
                Some(Ok(cohort)) => {
                    summary.kept_rows = Some(cohort.row_count());
                    summary.dropped_rows = Some(cohort.dropped_rows());
                    summary.metrics = SelectionOptions::from_cohort(&cohort)
                        .map(|o| o.metrics)
                        .unwrap_or_default();
                }
                Some(Err(e)) => summary.error = Some(e.to_string()),
                None => {}
            }
            Some(summary)
        }
        UploadState::Rejected { name, error } => Some(UploadSummary {
            name: name.clone(),
            state: "rejected".to_string(),
            digest: None,
            size: None,
            rows: None,
            kept_rows: None,
            dropped_rows: None,
            metrics: Vec::new(),
            error: Some(error.to_string()),
        }),
    }
}

// =============================================================================
// PAGES / NAVIGATION HANDLERS
// =============================================================================

/// List all pages, marking the current one.
pub async fn pages_handler(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.session.read().await.current_page();
    Json(PagesResponse {
        current: current.slug().to_string(),
        pages: Page::ALL
            .into_iter()
            .map(|page| PageJson::new(page, current))
            .collect(),
    })
}

/// Switch the current page.
pub async fn navigate_handler(
    State(state): State<AppState>,
    Json(request): Json<NavigateRequest>,
) -> impl IntoResponse {
    let page = match request.page.parse::<Page>() {
        Ok(page) => page,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(NavigateResponse::error(e.to_string())),
            );
        }
    };

    let previous = state.session.write().await.select_page(page);
    tracing::info!(from = previous.slug(), to = page.slug(), "Page switched");
    (StatusCode::OK, Json(NavigateResponse::success(page, previous)))
}

// =============================================================================
// UPLOAD HANDLERS
// =============================================================================

/// Replace the dataset with the raw CSV request body.
pub async fn upload_handler(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> impl IntoResponse {
    let name = query.name.unwrap_or_else(|| "upload.csv".to_string());
    let mut session = state.session.write().await;

    match session.upload(&name, &body) {
        Ok(receipt) => {
            tracing::info!(
                name = %receipt.name,
                rows = receipt.rows,
                cache = ?receipt.cache,
                "Dataset uploaded"
            );
            (StatusCode::OK, Json(UploadResponse::success(receipt)))
        }
        Err(e) => {
            tracing::warn!(name = %name, error = %e, "Upload rejected");
            let status = match e {
                CohortError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            (status, Json(UploadResponse::error(e.to_string())))
        }
    }
}

/// Discard the current dataset.
pub async fn clear_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.session.write().await.clear_upload();
    tracing::info!("Dataset cleared");
    StatusCode::NO_CONTENT
}

// =============================================================================
// CHART HANDLER
// =============================================================================

/// Build the metrics view for a selection.
pub async fn chart_handler(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> impl IntoResponse {
    let session = state.session.read().await;
    let model = MetricsModel::build(&session, &request);

    let status = match (&model.error, model.has_upload) {
        (_, false) => StatusCode::CONFLICT,
        (None, true) => StatusCode::OK,
        (Some(e), true) => chart_error_status(e),
    };

    let response = match model.view {
        Some(view) => ChartResponse {
            success: true,
            heading: Some(view.heading),
            figure: Some(view.chart.to_figure()),
            groups: view
                .chart
                .traces
                .into_iter()
                .map(|trace| GroupStatsJson {
                    name: trace.name,
                    stats: trace.stats,
                })
                .collect(),
            table: Some(view.table),
            selection: Some(view.selection),
            options: Some(view.options),
            notices: model.notices,
        },
        None => ChartResponse {
            success: false,
            heading: None,
            figure: None,
            groups: Vec::new(),
            table: None,
            selection: model.selection,
            options: model.options,
            notices: model.notices,
        },
    };

    (status, Json(response))
}

/// Status code for an error that stopped the metrics pass.
///
/// Warnings are a normal outcome of filtering and still return 200.
pub(crate) fn chart_error_status(error: &CohortError) -> StatusCode {
    match error {
        CohortError::NoNumericColumns | CohortError::EmptySelection => StatusCode::OK,
        CohortError::MissingColumns(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_REQUEST,
    }
}
