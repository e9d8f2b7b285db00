//! Shared state handed to every handler.
//!
//! The binary (or a test) chooses the adapters and passes them in as
//! `Ports`; `AppState::assemble` wires the services on top of them.

use std::path::PathBuf;
use std::sync::Arc;

use auth_adapters::InvitePass;
use domains::{
    ApplicationRepository, AuthGateway, Clock, EmailSender, EventRepository, MediaProcessor,
    MediaStorage, MessageRepository, NameNormalizer, ProfileRepository, ReportRepository,
    SessionVerifier, DEFAULT_PAGE_SIZE,
};
use secrecy::SecretString;
use services::{
    CleanupService, EventService, ListingService, MessageService, MessagingPolicy,
    ModerationService, NotificationRelay, PostingPolicy, ProfileService, RoleResolver,
};

use crate::metrics::Metrics;

/// Every outbound dependency of the HTTP surface.
#[derive(Clone)]
pub struct Ports {
    pub profiles: Arc<dyn ProfileRepository>,
    pub events: Arc<dyn EventRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub media: Arc<dyn MediaStorage>,
    pub processor: Arc<dyn MediaProcessor>,
    pub email: Arc<dyn EmailSender>,
    pub sessions: Arc<dyn SessionVerifier>,
    pub auth: Arc<dyn AuthGateway>,
    pub clock: Arc<dyn Clock>,
}

/// Business limits and texts.
#[derive(Debug, Clone)]
pub struct Policies {
    pub posting: PostingPolicy,
    pub messaging: MessagingPolicy,
    pub page_size: u32,
    pub normalizer: NameNormalizer,
    pub site_name: String,
    pub invite_url: String,
}

impl Default for Policies {
    fn default() -> Self {
        Self {
            posting: PostingPolicy::default(),
            messaging: MessagingPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
            normalizer: NameNormalizer::default(),
            site_name: services::moderation::DEFAULT_SITE_NAME.to_string(),
            invite_url: "/api/invite".to_string(),
        }
    }
}

/// Cookie names, redirect targets and shared secrets of the web layer.
#[derive(Debug, Clone)]
pub struct WebSettings {
    pub session_cookie: String,
    pub refresh_cookie: String,
    pub login_path: String,
    pub error_path: String,
    pub secure_cookies: bool,
    pub invite_code: SecretString,
    pub cron_secret: SecretString,
    pub static_dir: Option<PathBuf>,
    /// Local media served as `{prefix}/{bucket}/{key}` from `dir`.
    pub uploads: Option<(String, PathBuf)>,
    pub max_body_bytes: usize,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            session_cookie: "sb-access-token".into(),
            refresh_cookie: "sb-refresh-token".into(),
            login_path: "/login".into(),
            error_path: "/auth/auth-code-error".into(),
            secure_cookies: true,
            invite_code: SecretString::from(""),
            cron_secret: SecretString::from(""),
            static_dir: None,
            uploads: None,
            max_body_bytes: 40 * 1024 * 1024,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RoleResolver>,
    pub sessions: Arc<dyn SessionVerifier>,
    pub auth: Arc<dyn AuthGateway>,
    pub listing: Arc<ListingService>,
    pub events: Arc<EventService>,
    pub moderation: Arc<ModerationService>,
    pub profiles: Arc<ProfileService>,
    pub messages: Arc<MessageService>,
    pub cleanup: Arc<CleanupService>,
    pub media: Arc<dyn MediaStorage>,
    pub clock: Arc<dyn Clock>,
    pub invite: Arc<InvitePass>,
    pub metrics: Arc<Metrics>,
    pub web: Arc<WebSettings>,
}

impl AppState {
    pub fn assemble(ports: Ports, policies: Policies, web: WebSettings, invite: InvitePass) -> Self {
        let relay = Arc::new(NotificationRelay::new(ports.messages.clone(), ports.email.clone()));

        let listing = ListingService::new(ports.events.clone(), ports.profiles.clone(), ports.clock.clone())
            .with_page_size(policies.page_size);
        let events = EventService::new(
            ports.events.clone(),
            ports.media.clone(),
            ports.processor.clone(),
            relay.clone(),
            ports.clock.clone(),
            policies.posting,
        );
        let moderation = ModerationService::new(
            ports.applications.clone(),
            ports.reports.clone(),
            ports.events.clone(),
            relay,
            policies.invite_url,
        )
        .with_site_name(policies.site_name);
        let profiles = ProfileService::new(
            ports.profiles.clone(),
            ports.media.clone(),
            ports.processor.clone(),
            policies.normalizer,
            ports.clock.clone(),
        );
        let messages = MessageService::new(
            ports.messages.clone(),
            ports.profiles.clone(),
            ports.clock.clone(),
            policies.messaging,
        );
        let cleanup = CleanupService::new(ports.events.clone(), ports.media.clone(), ports.clock.clone());

        Self {
            resolver: Arc::new(RoleResolver::new(ports.profiles)),
            sessions: ports.sessions,
            auth: ports.auth,
            listing: Arc::new(listing),
            events: Arc::new(events),
            moderation: Arc::new(moderation),
            profiles: Arc::new(profiles),
            messages: Arc::new(messages),
            cleanup: Arc::new(cleanup),
            media: ports.media,
            clock: ports.clock,
            invite: Arc::new(invite),
            metrics: Arc::new(Metrics::new()),
            web: Arc::new(web),
        }
    }
}
