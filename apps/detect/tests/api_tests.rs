//! Integration tests for the DETECT web mode.
//!
//! Uses axum-test to drive the router in memory.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum::http::header;
use axum_test::TestServer;
use detect::api::{AppState, create_router};
use detect_core::{DetectModel, ModelBuilder};
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

const MODEL: &str = r#"{
    "size_categories": ["Small", "Medium", "Large"],
    "size_rules": [
        {"category": "Small", "when": "system_size_number <= 5"},
        {"category": "Medium", "when": "system_size_number <= 10"},
        {"category": "Large", "when": "true"}
    ],
    "inputs": [
        {"name": "team_size", "description": "People on the *model*", "question": "How many?",
         "options": [{"label": "TBD", "value": 0}, {"label": "few", "value": 1}, {"label": "many", "value": 6}]},
        {"name": "project_status", "description": "Life cycle", "question": "Which phase?",
         "options": [{"label": "TBD", "value": 0}, {"label": "Concept", "value": 2}, {"label": "In service", "value": 5}]}
    ],
    "requirements": [
        {"id": "R10", "description": "Ten", "weight": 1, "applies_when": ["system_size >= Medium"]},
        {"id": "R1", "description": "One", "weight": 2, "applies_when": ["true"]},
        {"id": "R2", "description": "Small only", "weight": 1, "applies_when": ["system_size == Small"]}
    ],
    "criteria": [
        {"id": "C1", "criteria": "Reviewed", "context": "Process", "weight": 1, "applies_when": ["true"]},
        {"id": "C9", "weight": 1, "applies_when": ["system_size == Large"]}
    ]
}"#;

fn model() -> DetectModel {
    let mut builder = ModelBuilder::new();
    assert!(builder.add_source("test", MODEL));
    let (model, diagnostics) = builder.build();
    assert!(diagnostics.is_empty());
    model
}

fn server_with_docs(docs: PathBuf) -> TestServer {
    let state = AppState::new(model(), "teal", docs).unwrap();
    TestServer::new(create_router(state)).unwrap()
}

fn server() -> TestServer {
    server_with_docs(PathBuf::from("does-not-exist.md"))
}

// =============================================================================
// PAGE TESTS
// =============================================================================

#[tokio::test]
async fn test_landing_page_renders_docs() {
    let temp: TempDir = tempfile::tempdir().unwrap();
    let docs = temp.path().join("README_web.md");
    std::fs::write(&docs, "# Welcome\n\nSome *docs*.").unwrap();

    let response = server_with_docs(docs).get("/").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("<h1>Welcome</h1>"));
    assert!(html.contains("<em>docs</em>"));
    assert!(html.contains("--theme: teal;"));
    assert!(html.contains("Start Configuration"));
}

#[tokio::test]
async fn test_landing_page_falls_back_without_docs() {
    let response = server().get("/").await;
    response.assert_status_ok();
    assert!(response.text().contains("Documentation file not found"));
}

#[tokio::test]
async fn test_tool_page_lists_fields_with_first_option_selected() {
    let response = server().get("/tool").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("1. Team Size"));
    assert!(html.contains("2. Project Status"));
    assert!(html.contains("<em>model</em>"));
    assert!(html.contains(r#"<option value="TBD" selected>TBD</option>"#));
    assert!(html.contains(r#"data-icon="flag""#));
    assert!(!html.contains("Process with System Size"));
}

#[tokio::test]
async fn test_submit_with_placeholders_warns() {
    let response = server()
        .post("/tool")
        .form(&[("team_size", "few"), ("project_status", "TBD"), ("step", "submit")])
        .await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("still set to 'TBD'"));
    assert!(html.contains("<li>Project Status</li>"));
    assert!(!html.contains("<li>Team Size</li>"));
}

#[tokio::test]
async fn test_submit_shows_size_and_process_button() {
    let response = server()
        .post("/tool")
        .form(&[("team_size", "few"), ("project_status", "Concept"), ("step", "submit")])
        .await;
    let html = response.text();
    assert!(html.contains("System Size:</strong> Small"));
    assert!(html.contains("Process with System Size"));
    assert!(!html.contains("<h2>Requirements</h2>"));
    assert!(html.contains(r#"<option value="Concept" selected>Concept</option>"#));
}

#[tokio::test]
async fn test_process_shows_tables_and_download_links() {
    let response = server()
        .post("/tool")
        .form(&[("team_size", "many"), ("project_status", "Concept"), ("step", "process")])
        .await;
    let html = response.text();
    assert!(html.contains("System Size:</strong> Medium"));
    assert!(html.contains("<h2>Requirements</h2>"));
    let r1 = html.find("<td>R1</td>").unwrap();
    let r10 = html.find("<td>R10</td>").unwrap();
    assert!(r1 < r10);
    assert!(!html.contains("<td>R2</td>"));
    assert!(html.contains("/download/requirements.csv?project_status=Concept&amp;team_size=many"));
}

#[tokio::test]
async fn test_process_failure_keeps_page_usable() {
    // Large makes C9 apply, and C9 has no criteria text.
    let response = server()
        .post("/tool")
        .form(&[("team_size", "many"), ("project_status", "In service"), ("step", "process")])
        .await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Error processing requirements and criteria"));
    assert!(html.contains("Submit Configuration"));
}

// =============================================================================
// DOWNLOAD TESTS
// =============================================================================

#[tokio::test]
async fn test_requirements_download_is_csv_attachment() {
    let response = server()
        .get("/download/requirements.csv")
        .add_query_param("team_size", "many")
        .add_query_param("project_status", "Concept")
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"requirements.csv\""
    );
    assert_eq!(
        response.text(),
        "id,value,description\r\nR1,2,One\r\nR10,1,Ten\r\n"
    );
}

#[tokio::test]
async fn test_criteria_download() {
    let response = server()
        .get("/download/criteria.csv")
        .add_query_param("team_size", "few")
        .add_query_param("project_status", "Concept")
        .await;
    response.assert_status_ok();
    assert_eq!(response.text(), "id,value,criteria,context\r\nC1,1,Reviewed,Process\r\n");
}

#[tokio::test]
async fn test_download_with_placeholder_is_unprocessable() {
    let response = server()
        .get("/download/requirements.csv")
        .add_query_param("team_size", "few")
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("project_status"));
}

// =============================================================================
// JSON API TESTS
// =============================================================================

#[tokio::test]
async fn test_evaluate_returns_sorted_records() {
    let response = server()
        .post("/api/evaluate")
        .json(&json!({"team_size": "many", "project_status": "Concept"}))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["system_size_number"], 8);
    assert_eq!(body["system_size"], "Medium");
    assert_eq!(body["requirements"][0]["id"], "R1");
    assert_eq!(body["requirements"][1]["id"], "R10");
    assert_eq!(body["criteria"][0]["context"], "Process");
}

#[tokio::test]
async fn test_evaluate_unknown_field_is_unprocessable() {
    let response = server()
        .post("/api/evaluate")
        .json(&json!({"team_size": "many", "project_status": "Concept", "budget": "huge"}))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_health() {
    let response = server().get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({"status": "ok"}));
}
