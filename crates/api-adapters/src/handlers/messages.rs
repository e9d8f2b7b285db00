//! Direct messages between members.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use services::InboxEntry;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::CurrentActor;
use crate::state::AppState;
use crate::views::PosterView;

#[derive(Debug, Serialize)]
pub struct Inbox {
    pub messages: Vec<InboxEntry>,
    pub unread: usize,
    /// Messages the actor may still send today, `null` when unlimited.
    pub remaining: Option<u32>,
}

pub async fn inbox(State(state): State<AppState>, CurrentActor(actor): CurrentActor) -> ApiResult<Json<Inbox>> {
    let messages = state.messages.inbox(&actor).await?;
    let remaining = state.messages.remaining(&actor).await?;
    Ok(Json(Inbox {
        unread: messages.iter().filter(|m| !m.message.is_read).count(),
        messages,
        remaining,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SendBody {
    pub receiver_ids: Vec<Uuid>,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct Sent {
    pub sent: usize,
}

pub async fn send(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<SendBody>,
) -> ApiResult<(StatusCode, Json<Sent>)> {
    let sent = state.messages.send(&actor, &body.receiver_ids, &body.content).await?;
    Ok((StatusCode::CREATED, Json(Sent { sent: sent.len() })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.messages.mark_read(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.messages.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recipients(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<Vec<PosterView>>> {
    let recipients = state.messages.recipients(&actor).await?;
    Ok(Json(
        recipients
            .into_iter()
            .map(|p| PosterView::new(p, state.media.as_ref()))
            .collect(),
    ))
}
