//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use cohortview::api::{
    ChartResponse, HealthResponse, MetricsQuery, NavigateRequest, NavigateResponse, PageJson,
    UploadQuery, UploadResponse,
};
use cohortview_core::{CacheOutcome, GroupingMode, Notice, Page, SelectionRequest, UploadReceipt};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_roundtrip_fields() {
    let json = r#"{"status":"ok","version":"0.4.1"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();
    assert_eq!(health.version, "0.4.1");
}

// =============================================================================
// NAVIGATION TESTS
// =============================================================================

#[test]
fn test_page_json_marks_current() {
    let page = PageJson::new(Page::SingleCellAtlas, Page::SingleCellAtlas);
    assert_eq!(page.slug, "single-cell-atlas");
    assert!(page.placeholder);
    assert!(page.current);

    let other = PageJson::new(Page::Team, Page::Home);
    assert!(!other.current);
    assert!(!other.placeholder);
}

#[test]
fn test_navigate_request_deserialization() {
    let request: NavigateRequest = serde_json::from_str(r#"{"page":"contact"}"#).unwrap();
    assert_eq!(request.page, "contact");
}

#[test]
fn test_navigate_response_success() {
    let response = NavigateResponse::success(Page::Metrics, Page::Home);
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains(r#""success":true"#));
    assert!(json.contains(r#""page":"metrics""#));
    assert!(json.contains(r#""previous":"home""#));
    assert!(json.contains(r#""error":null"#));
}

// =============================================================================
// UPLOAD TESTS
// =============================================================================

#[test]
fn test_upload_query_optional_name() {
    let query: UploadQuery = serde_json::from_str("{}").unwrap();
    assert!(query.name.is_none());
}

#[test]
fn test_upload_response_carries_receipt() {
    let response = UploadResponse::success(UploadReceipt {
        name: "pigs.csv".to_string(),
        digest: "ab".repeat(32),
        size: 42,
        rows: 3,
        columns: vec!["Age".to_string(), "Gender".to_string()],
        cache: CacheOutcome::Hit,
    });
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains(r#""cache":"hit""#));
    assert!(json.contains(r#""rows":3"#));
}

#[test]
fn test_upload_response_error() {
    let response = UploadResponse::error("Uploaded file is empty");
    assert!(!response.success);
    assert!(response.receipt.is_none());
    assert_eq!(response.error.as_deref(), Some("Uploaded file is empty"));
}

// =============================================================================
// SELECTION TESTS
// =============================================================================

#[test]
fn test_selection_request_partial_body() {
    let request: SelectionRequest = serde_json::from_str(r#"{"group":"age"}"#).unwrap();
    assert_eq!(request.metric, None);
    assert_eq!(request.group, Some(GroupingMode::Age));
    assert_eq!(request.ages, None);
}

#[test]
fn test_selection_request_explicit_empty_ages() {
    let request: SelectionRequest = serde_json::from_str(r#"{"ages":[]}"#).unwrap();
    assert_eq!(request.ages, Some(vec![]));
}

#[test]
fn test_metrics_query_keeps_ages() {
    let query = MetricsQuery {
        metric: Some("ALT".to_string()),
        group: Some(GroupingMode::Sex),
        ages: vec![3.0, 6.0],
        submitted: None,
    };
    let request = query.to_request();
    assert_eq!(request.metric.as_deref(), Some("ALT"));
    assert_eq!(request.ages, Some(vec![3.0, 6.0]));
}

// =============================================================================
// CHART RESPONSE TESTS
// =============================================================================

#[test]
fn test_chart_response_without_view() {
    let json = r#"{
        "success": false,
        "heading": null,
        "figure": null,
        "groups": [],
        "table": null,
        "selection": null,
        "options": null,
        "notices": [{"level": "info", "message": "Upload a CSV file to start the analysis."}]
    }"#;
    let response: ChartResponse = serde_json::from_str(json).unwrap();
    assert!(!response.success);
    assert_eq!(
        response.notices,
        vec![Notice::info("Upload a CSV file to start the analysis.")]
    );
}
