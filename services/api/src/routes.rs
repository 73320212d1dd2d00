use crate::infra::{preview_item, AppState, PreviewReport};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use competency_engine::competency::{
    SubmissionEntry, TemplateDraft, TemplateIssue, ValidationReport,
};
use competency_engine::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub(crate) struct ValidateResponse {
    pub(crate) errors: Vec<TemplateIssue>,
    pub(crate) warnings: Vec<TemplateIssue>,
    pub(crate) can_save: bool,
    pub(crate) requires_confirmation: bool,
}

impl From<ValidationReport> for ValidateResponse {
    fn from(report: ValidationReport) -> Self {
        let can_save = !report.has_errors();
        let requires_confirmation = can_save && report.has_warnings();
        Self {
            errors: report.errors,
            warnings: report.warnings,
            can_save,
            requires_confirmation,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewRequest {
    pub(crate) template: TemplateDraft,
    #[serde(default)]
    pub(crate) entries: Vec<SubmissionEntry>,
    #[serde(default)]
    pub(crate) user_fields: BTreeMap<String, serde_json::Value>,
    /// Accept a template that only has warnings.
    #[serde(default)]
    pub(crate) confirmed: bool,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/templates/validate", post(validate_endpoint))
        .route("/api/v1/templates/preview", post(preview_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn validate_endpoint(Json(draft): Json<TemplateDraft>) -> Json<ValidateResponse> {
    Json(draft.validate().into())
}

pub(crate) async fn preview_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<PreviewRequest>,
) -> Result<Json<PreviewReport>, AppError> {
    let PreviewRequest {
        template,
        entries,
        user_fields,
        confirmed,
    } = payload;

    let report = preview_item(
        template,
        confirmed,
        &entries,
        &user_fields,
        state.max_entries,
    )?;
    Ok(Json(report))
}
