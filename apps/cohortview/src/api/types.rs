//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use cohortview_core::{
    BoxStats, CacheStats, Figure, FilteredTable, Notice, Page, Selection, SelectionOptions,
    UploadReceipt,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of requests rejected before reaching a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Session status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub page: String,
    pub upload: Option<UploadSummary>,
    pub cache: CacheStats,
}

/// State of the current upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    pub name: String,
    /// "loaded" or "rejected".
    pub state: String,
    pub digest: Option<String>,
    pub size: Option<usize>,
    /// Rows as parsed, before cleaning.
    pub rows: Option<usize>,
    /// Rows kept after age normalization.
    pub kept_rows: Option<usize>,
    pub dropped_rows: Option<usize>,
    pub metrics: Vec<String>,
    /// Parse or validation failure.
    pub error: Option<String>,
}

// =============================================================================
// PAGES / NAVIGATION
// =============================================================================

/// One entry of the page list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageJson {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub placeholder: bool,
    pub current: bool,
}

impl PageJson {
    pub fn new(page: Page, current: Page) -> Self {
        Self {
            slug: page.slug().to_string(),
            title: page.title().to_string(),
            summary: page.summary().to_string(),
            placeholder: page.is_placeholder(),
            current: page == current,
        }
    }
}

/// Page list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesResponse {
    pub current: String,
    pub pages: Vec<PageJson>,
}

/// Navigation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateRequest {
    pub page: String,
}

/// Navigation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateResponse {
    pub success: bool,
    pub page: Option<String>,
    pub previous: Option<String>,
    pub error: Option<String>,
}

impl NavigateResponse {
    pub fn success(page: Page, previous: Page) -> Self {
        Self {
            success: true,
            page: Some(page.slug().to_string()),
            previous: Some(previous.slug().to_string()),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            page: None,
            previous: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// UPLOAD
// =============================================================================

/// Query string of the raw-body upload endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadQuery {
    pub name: Option<String>,
}

/// Upload response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub receipt: Option<UploadReceipt>,
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn success(receipt: UploadReceipt) -> Self {
        Self {
            success: true,
            receipt: Some(receipt),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            receipt: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// CHART
// =============================================================================

/// Statistics of one box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStatsJson {
    pub name: String,
    pub stats: BoxStats,
}

/// Chart response. The request body is a `SelectionRequest`.
///
/// `success` is false whenever no chart could be drawn; `notices` says why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse {
    pub success: bool,
    pub heading: Option<String>,
    pub figure: Option<Figure>,
    pub groups: Vec<GroupStatsJson>,
    pub table: Option<FilteredTable>,
    pub selection: Option<Selection>,
    pub options: Option<SelectionOptions>,
    pub notices: Vec<Notice>,
}
