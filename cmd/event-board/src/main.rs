//! # event-board
//!
//! Assembles the application from compile-time features and the layered
//! settings in `config/`, then serves it until Ctrl-C / SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use api_adapters::{AppState, Policies, Ports, WebSettings};
use auth_adapters::{HttpAuthGateway, InvitePass, JwtSessionVerifier, WebhookEmailSender};
use chrono::Duration;
use configs::{LogFormat, MediaBackend, Settings};
use domains::{Clock, MediaStorage, NameNormalizer, SystemClock};
use secrecy::ExposeSecret;
use services::{MessagingPolicy, PostingPolicy};
use storage_adapters::{ImageProcessor, MemoryMediaStorage};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings);
    settings.validate().context("validating settings")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::with_offset_hours(settings.posting.utc_offset_hours));
    let (media, uploads) = media_backend(&settings).await?;

    let email = Arc::new(WebhookEmailSender::new(settings.mail.webhook_url.clone()));
    let sessions = Arc::new(JwtSessionVerifier::new(
        settings.auth.jwt_secret.expose_secret().as_bytes(),
        &settings.auth.audience,
    ));
    let auth = Arc::new(HttpAuthGateway::new(
        settings.auth.provider_url.clone(),
        settings.auth.provider_api_key.expose_secret(),
    ));
    let processor = Arc::new(ImageProcessor::new(
        settings.media.max_dimension,
        settings.media.max_upload_bytes,
        settings.media.jpeg_quality,
    ));

    #[cfg(feature = "db-postgres")]
    let ports = {
        let store = storage_adapters::PgStore::connect(
            settings.database.url.expose_secret(),
            settings.database.max_connections,
        )
        .await
        .context("connecting to postgres")?;
        if settings.database.run_migrations {
            store.migrate().await.context("running migrations")?;
        }
        tracing::info!("postgres store ready");
        let store = Arc::new(store);
        Ports {
            profiles: store.clone(),
            events: store.clone(),
            applications: store.clone(),
            reports: store.clone(),
            messages: store,
            media,
            processor,
            email,
            sessions,
            auth,
            clock: clock.clone(),
        }
    };

    #[cfg(not(feature = "db-postgres"))]
    let ports = {
        tracing::warn!("built without db-postgres; data lives in memory and is lost on exit");
        let store = Arc::new(storage_adapters::MemoryStore::new(clock.clone()));
        Ports {
            profiles: store.clone(),
            events: store.clone(),
            applications: store.clone(),
            reports: store.clone(),
            messages: store,
            media,
            processor,
            email,
            sessions,
            auth,
            clock: clock.clone(),
        }
    };

    let policies = Policies {
        posting: PostingPolicy {
            daily_limit: settings.posting.daily_limit,
            image_change_limit: settings.posting.image_change_limit,
            max_tags: settings.posting.max_tags,
            max_extra_images: settings.posting.max_extra_images,
            window_months: settings.posting.window_months,
            quota_window: Duration::hours(24),
        },
        messaging: MessagingPolicy {
            daily_limit: settings.messaging.daily_limit,
            window: Duration::hours(24),
            cooldown: Duration::minutes(settings.messaging.cooldown_minutes),
            inbox_limit: settings.messaging.inbox_limit,
        },
        page_size: settings.posting.page_size,
        normalizer: NameNormalizer::new(settings.profile.confusable_pairs()?),
        site_name: settings.mail.site_name.clone(),
        invite_url: settings.invite.url(),
    };

    let static_dir = PathBuf::from(&settings.server.static_dir);
    let web = WebSettings {
        session_cookie: settings.auth.session_cookie.clone(),
        refresh_cookie: settings.auth.refresh_cookie.clone(),
        login_path: settings.auth.login_path.clone(),
        error_path: settings.auth.error_path.clone(),
        secure_cookies: settings.server.secure_cookies,
        invite_code: settings.invite.code.clone(),
        cron_secret: settings.cron.secret.clone(),
        static_dir: static_dir.is_dir().then_some(static_dir),
        uploads,
        max_body_bytes: settings.server.max_body_bytes,
    };

    let invite = InvitePass::new(
        settings.invite.signing_key.expose_secret(),
        Duration::hours(settings.invite.ttl_hours),
    )?;

    let app = api_adapters::router(AppState::assemble(ports, policies, web, invite));

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(address = %addr, "event board listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.telemetry.filter));
    let registry = tracing_subscriber::registry().with(filter);
    match settings.telemetry.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

type Uploads = Option<(String, PathBuf)>;

/// Picks the object store named in `media.backend`. The local backend also
/// returns the directory the web layer should serve.
async fn media_backend(settings: &Settings) -> anyhow::Result<(Arc<dyn MediaStorage>, Uploads)> {
    let media = &settings.media;
    match media.backend {
        MediaBackend::Memory => {
            tracing::warn!("media.backend = memory; uploaded images are lost on exit");
            Ok((Arc::new(MemoryMediaStorage::new(media.public_base_url.clone())), None))
        }
        #[cfg(feature = "media-local")]
        MediaBackend::Local => {
            let store = storage_adapters::media::LocalMediaStorage::new(&media.root, media.public_base_url.clone());
            let prefix = media.public_base_url.trim_end_matches('/').to_string();
            let uploads = Some((prefix, PathBuf::from(&media.root)));
            Ok((Arc::new(store), uploads))
        }
        #[cfg(feature = "media-s3")]
        MediaBackend::S3 => {
            let store = storage_adapters::media::S3MediaStorage::from_env(
                media.s3_endpoint.as_deref(),
                media.public_base_url.clone(),
            )
            .await;
            Ok((Arc::new(store), None))
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("media backend {other:?} is not compiled into this binary"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
