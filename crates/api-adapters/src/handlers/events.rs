//! Dashboard event management.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::DomainError;
use serde::{Deserialize, Serialize};
use services::OwnerNotice;

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentActor;
use crate::metrics::Metrics;
use crate::multipart::read_event_form;
use crate::state::AppState;
use crate::views::{DashboardView, EventView};

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<DashboardView>> {
    let dashboard = state.events.dashboard(&actor).await?;
    Ok(Json(DashboardView::new(dashboard, state.media.as_ref())))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<EventView>)> {
    let form = read_event_form(&mut multipart).await?;
    let event = state
        .events
        .create(&actor, form.draft, form.image, form.extra_images)
        .await
        .map_err(|e| rejected(&state.metrics, e))?;

    state.metrics.event_created();
    Ok((StatusCode::CREATED, Json(EventView::new(event, state.media.as_ref()))))
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub event: EventView,
    pub notice: OwnerNotice,
}

pub async fn update(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<Json<UpdateResponse>> {
    let form = read_event_form(&mut multipart).await?;
    let update = state
        .events
        .update(&actor, id, form.draft, form.reason.as_deref(), form.image)
        .await
        .map_err(|e| rejected(&state.metrics, e))?;

    Ok(Json(UpdateResponse {
        event: EventView::new(update.event, state.media.as_ref()),
        notice: update.notice,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteBody {
    pub confirmed: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub notice: OwnerNotice,
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(body): Json<DeleteBody>,
) -> ApiResult<Json<DeleteResponse>> {
    let notice = state
        .events
        .delete(&actor, id, body.confirmed, body.reason.as_deref())
        .await?;
    Ok(Json(DeleteResponse { deleted: true, notice }))
}

#[derive(Debug, Deserialize)]
pub struct VisibilityBody {
    pub hidden: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    pub hidden: bool,
    pub notice: OwnerNotice,
}

pub async fn set_visibility(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(body): Json<VisibilityBody>,
) -> ApiResult<Json<VisibilityResponse>> {
    let notice = state
        .events
        .set_visibility(&actor, id, body.hidden, body.reason.as_deref())
        .await?;
    Ok(Json(VisibilityResponse {
        hidden: body.hidden,
        notice,
    }))
}

/// Counts refusals by the posting rules before handing the error on.
fn rejected(metrics: &Metrics, err: DomainError) -> ApiError {
    let reason = match &err {
        DomainError::Validation(_) => Some("validation"),
        DomainError::QuotaExceeded(_) => Some("quota"),
        DomainError::Forbidden(_) => Some("forbidden"),
        _ => None,
    };
    if let Some(reason) = reason {
        metrics.posting_rejected(reason);
    }
    err.into()
}
