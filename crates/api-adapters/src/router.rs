//! Route table.
//!
//! # Routes
//!
//! ## Public
//! - `GET  /health`, `GET /metrics`, `GET /api/meta`
//! - `GET  /api/events` - filtered, paginated public list
//! - `GET  /api/events/{id}`, `POST /api/events/{id}/view`
//! - `POST /api/events/{id}/reports`, `POST /api/applications`
//! - `POST /api/profile`, `GET /api/profile/name-check`
//!
//! ## External
//! - `GET  /api/cleanup-images?key=`, `GET /api/invite?code=`
//! - `GET  /auth/callback?code=&next=`, `POST /auth/logout`
//!
//! ## Dashboard (`/api/dashboard`, session required, otherwise 303 to login)
//! - `events`, `events/{id}`, `events/{id}/visibility`
//! - `profile`
//! - `applications`, `applications/{id}/approve`, `applications/{id}/reject`
//! - `reports`, `reports/{id}`, `invite-link`
//! - `messages`, `messages/recipients`, `messages/{id}`, `messages/{id}/read`

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::guard;
use crate::handlers::{auth, events, messages, moderation, profiles, public, system};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let dashboard = Router::new()
        .route("/events", get(events::dashboard).post(events::create))
        .route("/events/{id}", put(events::update).delete(events::delete))
        .route("/events/{id}/visibility", put(events::set_visibility))
        .route("/profile", get(profiles::get).put(profiles::update))
        .route("/applications", get(moderation::pending_applications))
        .route("/applications/{id}/approve", post(moderation::approve))
        .route("/applications/{id}/reject", post(moderation::reject))
        .route("/reports", get(moderation::open_reports))
        .route("/reports/{id}", delete(moderation::dismiss_report))
        .route("/invite-link", get(moderation::invite_link))
        .route("/messages", get(messages::inbox).post(messages::send))
        .route("/messages/recipients", get(messages::recipients))
        .route("/messages/{id}", delete(messages::delete))
        .route("/messages/{id}/read", post(messages::mark_read))
        .route_layer(middleware::from_fn_with_state(state.clone(), guard::require_session));

    let api = Router::new()
        .route("/meta", get(public::meta))
        .route("/events", get(public::list_events))
        .route("/events/{id}", get(public::event_detail))
        .route("/events/{id}/view", post(public::record_view))
        .route("/events/{id}/reports", post(public::submit_report))
        .route("/applications", post(public::submit_application))
        .route("/profile", post(profiles::register))
        .route("/profile/name-check", get(profiles::name_check))
        .route("/cleanup-images", get(system::cleanup_images))
        .route("/invite", get(auth::redeem_invite))
        .nest("/dashboard", dashboard);

    let mut app = Router::new()
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", post(auth::logout))
        .nest("/api", api);

    if let Some((prefix, dir)) = &state.web.uploads {
        app = app.nest_service(prefix, ServeDir::new(dir));
    }
    if let Some(dir) = &state.web.static_dir {
        app = app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    app.layer(middleware::from_fn_with_state(state.clone(), guard::invite_guard))
        .layer(DefaultBodyLimit::max(state.web.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use auth_adapters::InvitePass;
    use axum::body::to_bytes;
    use axum::http::{header, StatusCode};
    use chrono::{Duration, TimeZone, Utc};
    use domains::{
        Clock, DomainError, FixedClock, MockAuthGateway, MockEmailSender, MockSessionVerifier,
    };
    use storage_adapters::{ImageProcessor, MemoryMediaStorage, MemoryStore};
    use tower::ServiceExt;

    use super::*;
    use crate::state::{Policies, Ports, WebSettings};

    fn app() -> Router {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at(Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 0).unwrap()));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let mut sessions = MockSessionVerifier::new();
        sessions
            .expect_verify()
            .returning(|_| Err(DomainError::Unauthorized("bad token".into())));

        let ports = Ports {
            profiles: store.clone(),
            events: store.clone(),
            applications: store.clone(),
            reports: store.clone(),
            messages: store,
            media: Arc::new(MemoryMediaStorage::new("http://media.test")),
            processor: Arc::new(ImageProcessor::default()),
            email: Arc::new(MockEmailSender::new()),
            sessions: Arc::new(sessions),
            auth: Arc::new(MockAuthGateway::new()),
            clock,
        };
        let invite = InvitePass::new("router-test-key", Duration::hours(24)).unwrap();
        router(AppState::assemble(ports, Policies::default(), WebSettings::default(), invite))
    }

    #[tokio::test]
    async fn health_reports_ok_and_echoes_request_id() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn dashboard_without_session_redirects_to_login() {
        let response = app()
            .oneshot(Request::get("/api/dashboard/events").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn invalid_token_on_dashboard_also_redirects() {
        let response = app()
            .oneshot(
                Request::get("/api/dashboard/messages")
                    .header(header::AUTHORIZATION, "Bearer forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn signed_in_api_routes_answer_401_json() {
        let response = app()
            .oneshot(
                Request::post("/api/profile")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn invite_only_pages_bounce_without_a_pass() {
        let response = app()
            .oneshot(Request::get("/register").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }
}
