//! Shared harness: the full router over the in-memory store, a pinned clock
//! and mocked outbound ports.

#![allow(dead_code)]

use std::sync::Arc;

use api_adapters::{AppState, Policies, Ports, WebSettings};
use auth_adapters::InvitePass;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use domains::{
    Area, Category, Clock, DomainError, Event, EventRepository, FixedClock, MockAuthGateway,
    MockEmailSender, NewEvent, Profile, ProfileRepository, Role, SessionClaims, SessionVerifier,
};
use secrecy::SecretString;
use serde_json::Value;
use storage_adapters::{ImageProcessor, MemoryMediaStorage, MemoryStore};
use tower::ServiceExt;
use uuid::Uuid;

pub const SIGNING_KEY: &str = "integration-signing-key";
pub const INVITE_CODE: &str = "hamamatsu-2025";
pub const CRON_SECRET: &str = "nightly-cron";
pub const MEDIA_BASE: &str = "http://media.test";

const BOUNDARY: &str = "event-board-test-boundary";

/// 2025-06-01 03:00 UTC; "today" is 2025-06-01.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 0).unwrap()
}

pub fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

/// Session tokens in tests are the actor's UUID.
pub struct UuidSessions;

impl SessionVerifier for UuidSessions {
    fn verify(&self, token: &str) -> domains::Result<SessionClaims> {
        token
            .parse()
            .map(|actor_id| SessionClaims { actor_id, email: None })
            .map_err(|_| DomainError::Unauthorized("unknown token".into()))
    }
}

pub fn accepting_email() -> MockEmailSender {
    let mut email = MockEmailSender::new();
    email.expect_send().returning(|_| Ok(()));
    email
}

pub fn failing_email() -> MockEmailSender {
    let mut email = MockEmailSender::new();
    email
        .expect_send()
        .returning(|_| Err(DomainError::Delivery("webhook returned 500".into())));
    email
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub media: Arc<MemoryMediaStorage>,
}

pub struct Outbound {
    pub email: MockEmailSender,
    pub auth: MockAuthGateway,
}

impl Default for Outbound {
    fn default() -> Self {
        Self {
            email: accepting_email(),
            auth: MockAuthGateway::new(),
        }
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(Outbound::default())
    }

    pub fn with_email(email: MockEmailSender) -> Self {
        Self::with(Outbound {
            email,
            ..Outbound::default()
        })
    }

    pub fn with(outbound: Outbound) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at(now()));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let media = Arc::new(MemoryMediaStorage::new(MEDIA_BASE));

        let ports = Ports {
            profiles: store.clone(),
            events: store.clone(),
            applications: store.clone(),
            reports: store.clone(),
            messages: store.clone(),
            media: media.clone(),
            processor: Arc::new(ImageProcessor::default()),
            email: Arc::new(outbound.email),
            sessions: Arc::new(UuidSessions),
            auth: Arc::new(outbound.auth),
            clock,
        };
        let web = WebSettings {
            secure_cookies: false,
            invite_code: SecretString::from(INVITE_CODE),
            cron_secret: SecretString::from(CRON_SECRET),
            ..WebSettings::default()
        };
        let policies = Policies {
            invite_url: "https://events.test/api/invite?code=hamamatsu-2025".into(),
            ..Policies::default()
        };
        let state = AppState::assemble(ports, policies, web, invite_pass());

        Self {
            router: api_adapters::router(state),
            store,
            media,
        }
    }

    /// Stores a profile directly and returns its id.
    pub async fn profile(&self, role: Role, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        ProfileRepository::insert(
            self.store.as_ref(),
            Profile {
                id,
                name: name.to_string(),
                role,
                avatar_key: None,
                website_url: None,
                name_key: name.to_lowercase(),
                created_at: now(),
            },
        )
        .await
        .unwrap();
        id
    }

    /// Stores an event directly, bypassing the posting rules.
    pub async fn event(&self, poster: Uuid, title: &str, date: NaiveDate, category: Option<Category>) -> Event {
        EventRepository::insert(
            self.store.as_ref(),
            NewEvent {
                title: title.to_string(),
                description: String::new(),
                category,
                area: Area::ChuoNaka,
                event_date: date,
                location: "アクトシティ浜松".into(),
                contact_phone: String::new(),
                image_key: None,
                extra_image_keys: Vec::new(),
                tags: Vec::new(),
                poster_id: poster,
                created_at: now() - Duration::days(3),
            },
        )
        .await
        .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }
}

pub fn invite_pass() -> InvitePass {
    InvitePass::new(SIGNING_KEY, Duration::hours(24)).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// A request carrying `actor`'s session as a bearer token.
pub fn authed(method: Method, uri: &str, actor: Uuid, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {actor}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// The multipart form the dashboard editor submits, without images.
pub fn event_form(method: Method, uri: &str, actor: Uuid, draft: Value, reason: Option<&str>) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"event\"\r\nContent-Type: application/json\r\n\r\n{draft}\r\n"
    );
    if let Some(reason) = reason {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"reason\"\r\n\r\n{reason}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {actor}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

pub fn draft(title: &str, date: NaiveDate) -> Value {
    serde_json::json!({
        "title": title,
        "description": "市民向けのイベントです",
        "category": Category::Festival.label(),
        "area": Area::ChuoNaka.label(),
        "event_date": date,
        "location": "アクトシティ浜松",
        "tags": ["雨でもOK"],
    })
}
