//! Profile registration and settings.

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use services::NameCheck;

use crate::error::ApiResult;
use crate::extract::{CurrentActor, MaybeActor};
use crate::multipart::read_profile_form;
use crate::state::AppState;
use crate::views::ProfileView;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub name: String,
}

pub async fn register(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<RegisterBody>,
) -> ApiResult<(StatusCode, Json<ProfileView>)> {
    let profile = state.profiles.register(actor.id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(ProfileView::new(profile, state.media.as_ref()))))
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
}

/// A signed-in actor never collides with their own current name.
pub async fn name_check(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Query(query): Query<NameQuery>,
) -> ApiResult<Json<NameCheck>> {
    let owner = actor.map(|a| a.id);
    Ok(Json(state.profiles.check_name(&query.name, owner).await?))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<ProfileView>> {
    let profile = state.profiles.get(&actor).await?;
    Ok(Json(ProfileView::new(profile, state.media.as_ref())))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    mut multipart: Multipart,
) -> ApiResult<Json<ProfileView>> {
    let form = read_profile_form(&mut multipart).await?;
    let profile = state.profiles.update(&actor, form.edit, form.avatar).await?;
    Ok(Json(ProfileView::new(profile, state.media.as_ref())))
}
