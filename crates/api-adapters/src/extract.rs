//! Per-request actor context.
//!
//! The session token comes from `Authorization: Bearer <token>` or, for
//! browser requests, the session cookie. Handlers take `CurrentActor` (or
//! `MaybeActor`) as an explicit argument; nothing reads a global session.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use services::Actor;

use crate::cookies;
use crate::error::ApiError;
use crate::state::AppState;

/// Bearer header first, then the session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| cookies::read(headers, cookie_name).filter(|token| !token.is_empty()))
}

/// Verifies the session and resolves the actor's role. A missing or invalid
/// token is `Unauthorized`; a store failure is passed through.
pub async fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<Actor, ApiError> {
    let token = session_token(headers, &state.web.session_cookie)
        .ok_or_else(|| ApiError::unauthorized("ログインが必要です"))?;
    let claims = state.sessions.verify(&token)?;
    Ok(state.resolver.resolve(claims.actor_id).await?)
}

/// The signed-in actor. Rejects with 401 when there is no valid session.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already resolved by the dashboard guard.
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(Self(actor.clone()));
        }
        authenticate(&parts.headers, state).await.map(Self)
    }
}

/// The signed-in actor if there is one; anonymous visitors get `None`.
#[derive(Debug, Clone)]
pub struct MaybeActor(pub Option<Actor>);

impl FromRequestParts<AppState> for MaybeActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match authenticate(&parts.headers, state).await {
            Ok(actor) => Ok(Self(Some(actor))),
            Err(err) if err.status() == axum::http::StatusCode::UNAUTHORIZED => Ok(Self(None)),
            Err(err) => Err(err),
        }
    }
}
