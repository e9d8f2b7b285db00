//! Anonymous routes: the public list, event detail, view counting and the
//! two visitor submissions (applications and reports).

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{
    Application, Area, Category, DomainError, EventFilter, NewApplication, Report, SortOrder,
    RAIN_OK_TAG,
};
use serde::{Deserialize, Serialize};
use services::kept_only;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::views::{EventCardView, EventPageView};

/// Raw query string of the public list. Empty values mean "not set".
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub category: Option<String>,
    pub area: Option<String>,
    pub keyword: Option<String>,
    pub rain_ok: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    /// Comma-separated ids the visitor has kept; narrows the fetched page.
    pub kept: Option<String>,
}

impl ListParams {
    pub fn to_filter(&self) -> Result<EventFilter, DomainError> {
        Ok(EventFilter {
            category: present(&self.category).map(str::parse::<Category>).transpose()?,
            area: present(&self.area).map(str::parse::<Area>).transpose()?,
            keyword: present(&self.keyword).map(str::to_string),
            rain_ok: present(&self.rain_ok).is_some_and(|v| matches!(v, "1" | "true" | "on")),
            sort: match present(&self.sort) {
                None | Some("date") | Some("date_asc") => SortOrder::DateAsc,
                Some("newest") => SortOrder::Newest,
                Some(other) => return Err(DomainError::validation(format!("unknown sort order: {other}"))),
            },
            page: self.page.unwrap_or(1).max(1),
        })
    }

    pub fn kept_ids(&self) -> Option<HashSet<i64>> {
        present(&self.kept).map(|ids| ids.split(',').filter_map(|id| id.trim().parse().ok()).collect())
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<EventPageView>> {
    let filter = params.to_filter()?;
    let mut page = state.listing.list(&filter).await?;
    if let Some(kept) = params.kept_ids() {
        page.events = kept_only(page.events, &kept);
    }
    Ok(Json(EventPageView::new(page, state.media.as_ref())))
}

pub async fn event_detail(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<EventCardView>> {
    let card = state.listing.detail(id).await?;
    Ok(Json(EventCardView::new(card, state.media.as_ref())))
}

pub async fn record_view(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.events.record_view(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ReportBody {
    #[serde(default)]
    pub reason: String,
}

pub async fn submit_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ReportBody>,
) -> ApiResult<(StatusCode, Json<Report>)> {
    let report = state.moderation.submit_report(id, &body.reason).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn submit_application(
    State(state): State<AppState>,
    Json(body): Json<NewApplication>,
) -> ApiResult<(StatusCode, Json<Application>)> {
    let application = state.moderation.submit_application(body).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub categories: Vec<&'static str>,
    pub areas: Vec<&'static str>,
    pub rain_ok_tag: &'static str,
    pub max_tags: usize,
}

pub async fn meta(State(state): State<AppState>) -> Json<Meta> {
    Json(Meta {
        categories: Category::ALL.iter().map(|c| c.label()).collect(),
        areas: Area::ALL.iter().map(|a| a.label()).collect(),
        rain_ok_tag: RAIN_OK_TAG,
        max_tags: state.events.policy().max_tags,
    })
}
