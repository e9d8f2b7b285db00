//! Route guards.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use auth_adapters::INVITE_COOKIE;

use crate::cookies;
use crate::extract::authenticate;
use crate::state::AppState;

/// Pages reachable only with a valid invitation pass.
pub const INVITE_ONLY_PATHS: [&str; 4] = ["/login", "/register", "/forgot-password", "/update-password"];

/// Dashboard routes: a visitor without a valid session is sent to the login
/// page with `303 See Other`. The resolved actor is stored in the request
/// extensions for `CurrentActor`.
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match authenticate(request.headers(), &state).await {
        Ok(actor) => {
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        Err(err) if err.status() == StatusCode::UNAUTHORIZED => {
            Redirect::to(&state.web.login_path).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// Redirects invite-only pages to `/` unless the request carries a pass
/// whose signature and expiry both check out.
pub async fn invite_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if INVITE_ONLY_PATHS.iter().any(|guarded| path.starts_with(guarded)) {
        let admitted = cookies::read(request.headers(), INVITE_COOKIE)
            .is_some_and(|pass| state.invite.verify(&pass, state.clock.now()));
        if !admitted {
            tracing::debug!(path, "invite-only page requested without a valid pass");
            return Redirect::to("/").into_response();
        }
    }
    next.run(request).await
}
