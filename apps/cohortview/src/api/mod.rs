//! # cohortview HTTP Module
//!
//! This module implements the dashboard server using axum.
//!
//! ## Pages (HTML)
//!
//! - `GET /` - Render the current page (metrics selection in the query string)
//! - `POST /navigate` - Switch page (form field `page`)
//! - `POST /upload` - Upload a CSV (multipart field `file`)
//! - `GET /export.csv` - Filtered rows of the metrics view as CSV
//!
//! ## JSON API
//!
//! - `GET /api/health` - Health check
//! - `GET /api/status` - Current page, upload state, cache counters
//! - `GET /api/pages` - Page list
//! - `POST /api/navigate` - Switch page
//! - `PUT /api/dataset?name=` - Upload a CSV as the raw request body
//! - `DELETE /api/dataset` - Discard the upload
//! - `POST /api/chart` - Chart, statistics and rows for a selection
//!
//! ## Security Configuration
//!
//! - `[server] cors_origins` / `COHORTVIEW_CORS_ORIGINS`: allowed origins, or "*" for all
//!   (default: localhost only)
//! - `[server] rate_limit` / `COHORTVIEW_RATE_LIMIT`: requests per second (0 disables)

mod handlers;
mod middleware;
mod model;
mod pages;
mod render;
mod types;

pub use middleware::create_rate_limiter;
pub use model::MetricsModel;
pub use render::standalone_chart_html;
// Re-export handlers and types for integration tests (via `cohortview::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    chart_handler, clear_handler, health_handler, navigate_handler, pages_handler,
    status_handler, upload_handler,
};
#[allow(unused_imports)]
pub use pages::{
    MetricsQuery, NavigateForm, export_handler, index_handler, navigate_form_handler,
    upload_form_handler,
};
#[allow(unused_imports)]
pub use types::{
    ChartResponse, ErrorResponse, GroupStatsJson, HealthResponse, NavigateRequest,
    NavigateResponse, PageJson, PagesResponse, StatusResponse, UploadQuery, UploadResponse,
    UploadSummary,
};

use crate::config::AppConfig;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use cohortview_core::{CohortError, Session};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the single dashboard session plus configuration.
#[derive(Clone)]
pub struct AppState {
    /// The session holding page, cache and upload.
    pub session: Arc<RwLock<Session>>,
    /// Resolved configuration.
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(session: Session, config: AppConfig) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `[server] cors_origins`.
///
/// - `["*"]`: allows all origins
/// - `None`: localhost only
/// - otherwise: the listed origins
fn build_cors_layer(origins: Option<&[String]>) -> CorsLayer {
    match origins {
        Some([only]) if only == "*" => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!(origin = %origin, "CORS: Allowing origin");
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!(origin = %origin, error = %e, "CORS: Invalid origin");
                        None
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restrictive_cors(allowed_origins)
            }
        }
        None => build_localhost_cors(),
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:8501",
        "http://localhost:8080",
        "http://127.0.0.1:8501",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    restrictive_cors(origins)
}

fn restrictive_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit - bounds uploads
/// 4. Rate Limiting - global request budget (if enabled)
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors = build_cors_layer(server.cors_origins.as_deref());

    let rate_limiter = if server.rate_limit > 0 {
        tracing::info!(rps = server.rate_limit, "Rate limiting enabled");
        Some(create_rate_limiter(server.rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };
    let body_limit = server.body_limit_bytes;

    let mut router = Router::new()
        .route("/", get(pages::index_handler))
        .route("/navigate", post(pages::navigate_form_handler))
        .route("/upload", post(pages::upload_form_handler))
        .route("/export.csv", get(pages::export_handler))
        .route("/api/health", get(handlers::health_handler))
        .route("/api/status", get(handlers::status_handler))
        .route("/api/pages", get(handlers::pages_handler))
        .route("/api/navigate", post(handlers::navigate_handler))
        .route(
            "/api/dataset",
            put(handlers::upload_handler).delete(handlers::clear_handler),
        )
        .route("/api/chart", post(handlers::chart_handler));

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until Ctrl+C.
pub async fn run_server(config: AppConfig, session: Session) -> Result<(), CohortError> {
    let addr = config.bind_addr();
    let state = AppState::new(session, config);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CohortError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!(addr = %addr, "cohortview dashboard listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CohortError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_layer_builds_for_every_origin_setting() {
        let _ = build_cors_layer(Some(&["*".to_string()]));
        let _ = build_cors_layer(Some(&["http://lab.example.org".to_string()]));
        let _ = build_cors_layer(Some(&["\n".to_string()]));
        let _ = build_cors_layer(None);
    }
}
