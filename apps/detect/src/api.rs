//! # HTTP Server
//!
//! The web mode: documentation landing page, configuration form, CSV
//! downloads and a JSON API.
//!
//! The loaded model is shared read-only across handlers. Each submission runs
//! one independent evaluation; nothing is stored between requests, so the
//! selection travels in the form fields and the download query strings.

use crate::cli::load_model;
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::form::{FormField, form_fields, initial_selection, placeholder_fields, selection_from_form};
use crate::pages::{self, FALLBACK_DOCS, Status, ToolView};
use axum::extract::{Form, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use detect_core::{
    CRITERIA_FILE, DetectModel, Evaluation, REQUIREMENTS_FILE, Selection, SizeAssessment,
    criteria_csv, requirements_csv,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Form value that asks for the record tables.
const PROCESS_STEP: &str = "process";

// =============================================================================
// STATE
// =============================================================================

/// Shared, read-only server state.
#[derive(Debug, Clone)]
pub struct AppState {
    model: Arc<DetectModel>,
    fields: Arc<Vec<FormField>>,
    theme: Arc<str>,
    docs: Arc<PathBuf>,
}

impl AppState {
    /// Prepare the state; fails if the model's inputs cannot form a form.
    pub fn new(model: DetectModel, theme: &str, docs: PathBuf) -> AppResult<Self> {
        let fields = form_fields(&model.available_inputs()?);
        Ok(Self {
            model: Arc::new(model),
            fields: Arc::new(fields),
            theme: Arc::from(theme),
            docs: Arc::new(docs),
        })
    }

    #[must_use]
    pub fn model(&self) -> &DetectModel {
        &self.model
    }

    #[must_use]
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }
}

// =============================================================================
// ROUTER
// =============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_handler))
        .route("/tool", get(tool_handler).post(submit_handler))
        .route("/download/requirements.csv", get(requirements_download_handler))
        .route("/download/criteria.csv", get(criteria_download_handler))
        .route("/api/evaluate", post(evaluate_handler))
        .route("/health", get(health_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Load the model, bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> AppResult<()> {
    let (model, _diagnostics) = load_model(&config.model_dir);
    let state = AppState::new(model, &config.theme, config.docs.clone())?;
    let app = create_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(AppError::Server)?;
    info!(%addr, theme = %config.theme, "DETECT web mode listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}

// =============================================================================
// PAGES
// =============================================================================

async fn landing_handler(State(state): State<AppState>) -> Html<String> {
    let docs = match tokio::fs::read_to_string(state.docs.as_path()).await {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %state.docs.display(), error = %e, "documentation file not readable");
            FALLBACK_DOCS.to_string()
        }
    };
    Html(pages::landing_page(&state.theme, &docs))
}

async fn tool_handler(State(state): State<AppState>) -> Html<String> {
    let selection = initial_selection(state.fields());
    Html(pages::tool_page(
        &state.theme,
        ToolView {
            fields: state.fields(),
            selection: &selection,
            status: None,
            evaluation: None,
        },
    ))
}

async fn submit_handler(
    State(state): State<AppState>,
    Form(submitted): Form<BTreeMap<String, String>>,
) -> Html<String> {
    let selection = selection_from_form(state.fields(), &submitted);
    let process = submitted.get("step").map(String::as_str) == Some(PROCESS_STEP);
    let (status, evaluation) = submit(&state, &selection, process);

    Html(pages::tool_page(
        &state.theme,
        ToolView {
            fields: state.fields(),
            selection: &selection,
            status: Some(&status),
            evaluation: evaluation.as_ref(),
        },
    ))
}

/// Evaluate a submission. Errors become a status message; the page stays usable.
fn submit(state: &AppState, selection: &Selection, process: bool) -> (Status, Option<Evaluation>) {
    let placeholders = placeholder_fields(state.fields(), selection);
    if !placeholders.is_empty() {
        return (Status::Placeholder(placeholders), None);
    }

    let assessment = match SizeAssessment::assess(state.model(), selection) {
        Ok(assessment) => assessment,
        Err(e) => return (Status::Failed(e.to_string()), None),
    };
    let size = assessment.system_size.name().to_string();
    if !process {
        return (Status::Sized(size), None);
    }

    match Evaluation::for_assessment(state.model(), assessment) {
        Ok(evaluation) => (Status::Sized(size), Some(evaluation)),
        Err(e) => (Status::ProcessFailed(e.to_string()), None),
    }
}

// =============================================================================
// DOWNLOADS & API
// =============================================================================

async fn requirements_download_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> AppResult<Response> {
    let evaluation = evaluate_query(&state, &query)?;
    let bytes = requirements_csv(&evaluation.requirements)?;
    Ok(csv_attachment(REQUIREMENTS_FILE, bytes))
}

async fn criteria_download_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> AppResult<Response> {
    let evaluation = evaluate_query(&state, &query)?;
    let bytes = criteria_csv(&evaluation.criteria)?;
    Ok(csv_attachment(CRITERIA_FILE, bytes))
}

fn evaluate_query(state: &AppState, query: &BTreeMap<String, String>) -> AppResult<Evaluation> {
    let selection = selection_from_form(state.fields(), query);
    Ok(Evaluation::run(state.model(), &selection)?)
}

fn csv_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn evaluate_handler(
    State(state): State<AppState>,
    Json(selection): Json<Selection>,
) -> AppResult<Json<Evaluation>> {
    Ok(Json(Evaluation::run(state.model(), &selection)?))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
