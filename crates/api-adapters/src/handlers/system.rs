//! Liveness, metrics and the scheduled image cleanup.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use auth_adapters::secrets_match;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use services::CleanupReport;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "application/openmetrics-text; version=1.0.0; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CleanupQuery {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: CleanupReport,
}

/// Called daily by an external scheduler with `?key=<cron secret>`.
pub async fn cleanup_images(
    State(state): State<AppState>,
    Query(query): Query<CleanupQuery>,
) -> ApiResult<Json<CleanupResponse>> {
    if !secrets_match(&query.key, state.web.cron_secret.expose_secret()) {
        return Err(ApiError::unauthorized("Unauthorized"));
    }
    let report = state.cleanup.run().await?;
    tracing::info!(deleted = report.deleted_count, "expired event images cleaned up");
    Ok(Json(CleanupResponse { success: true, report }))
}
