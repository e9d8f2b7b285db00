//! Moderation queue for privileged actors.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::Application;
use serde::{Deserialize, Serialize};
use services::{Decision, Delivery, ReportEntry};

use crate::error::ApiResult;
use crate::extract::CurrentActor;
use crate::state::AppState;

pub async fn pending_applications(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<Vec<Application>>> {
    Ok(Json(state.moderation.pending_applications(&actor).await?))
}

pub async fn approve(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> ApiResult<Json<Decision>> {
    let decision = state.moderation.approve(&actor, id).await?;
    record(&state, "approved", &decision);
    Ok(Json(decision))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RejectBody {
    pub reason: Option<String>,
}

pub async fn reject(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(body): Json<RejectBody>,
) -> ApiResult<Json<Decision>> {
    let decision = state.moderation.reject(&actor, id, body.reason.as_deref()).await?;
    record(&state, "rejected", &decision);
    Ok(Json(decision))
}

pub async fn open_reports(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<Vec<ReportEntry>>> {
    Ok(Json(state.moderation.open_reports(&actor).await?))
}

pub async fn dismiss_report(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.moderation.dismiss_report(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct InviteLink {
    pub url: String,
}

pub async fn invite_link(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<InviteLink>> {
    Ok(Json(InviteLink {
        url: state.moderation.invite_link(&actor)?,
    }))
}

fn record(state: &AppState, decision: &str, outcome: &Decision) {
    state.metrics.decision(decision);
    state.metrics.email(match outcome.delivery {
        Delivery::Sent => "sent",
        Delivery::Fallback { .. } => "fallback",
    });
}
