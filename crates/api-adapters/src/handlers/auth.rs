//! Session and invitation endpoints.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use auth_adapters::{secrets_match, INVITE_COOKIE};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::cookies::{self, SetCookie};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Cookie the browser client leaves behind when it starts a PKCE flow.
pub const CODE_VERIFIER_COOKIE: &str = "sb-code-verifier";

const REFRESH_MAX_AGE: i64 = 60 * 60 * 24 * 30;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

/// Completes the OAuth / magic-link flow and stores the session cookies.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let web = &state.web;
    let Some(code) = query.code.filter(|c| !c.trim().is_empty()) else {
        return Redirect::to(&web.error_path).into_response();
    };
    let verifier = cookies::read(&headers, CODE_VERIFIER_COOKIE);

    let tokens = match state.auth.exchange_code(&code, verifier).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::warn!(error = %e, "auth callback failed");
            return Redirect::to(&web.error_path).into_response();
        }
    };

    let mut response = Redirect::to(&local_path(query.next.as_deref())).into_response();
    let max_age = i64::try_from(tokens.expires_in).unwrap_or(i64::MAX);
    set_cookie(
        &mut response,
        SetCookie::new(&web.session_cookie, &tokens.access_token, max_age, web.secure_cookies),
    );
    if let Some(refresh) = &tokens.refresh_token {
        set_cookie(
            &mut response,
            SetCookie::new(&web.refresh_cookie, refresh, REFRESH_MAX_AGE, web.secure_cookies),
        );
    }
    set_cookie(&mut response, SetCookie::removal(CODE_VERIFIER_COOKIE, web.secure_cookies));
    response
}

pub async fn logout(State(state): State<AppState>) -> Response {
    let web = &state.web;
    let mut response = Redirect::to("/").into_response();
    set_cookie(&mut response, SetCookie::removal(&web.session_cookie, web.secure_cookies));
    set_cookie(&mut response, SetCookie::removal(&web.refresh_cookie, web.secure_cookies));
    response
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InviteQuery {
    pub code: String,
}

/// Trades the invite code for a signed pass cookie, then sends the visitor
/// to the login page.
pub async fn redeem_invite(
    State(state): State<AppState>,
    Query(query): Query<InviteQuery>,
) -> ApiResult<Response> {
    let web = &state.web;
    if !secrets_match(query.code.trim(), web.invite_code.expose_secret()) {
        tracing::info!("invalid invite code presented");
        return Err(ApiError::forbidden("無効な招待コードです"));
    }

    let pass = state.invite.issue(state.clock.now());
    let mut response = Redirect::to(&web.login_path).into_response();
    set_cookie(
        &mut response,
        SetCookie::new(INVITE_COOKIE, &pass, state.invite.ttl().num_seconds(), web.secure_cookies),
    );
    Ok(response)
}

/// Only same-origin paths are accepted as a post-login destination.
pub fn local_path(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path.to_string(),
        _ => "/".to_string(),
    }
}

fn set_cookie(response: &mut Response, cookie: SetCookie<'_>) {
    if let Some(value) = cookie.to_header() {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}
