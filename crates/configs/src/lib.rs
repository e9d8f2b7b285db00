//! # configs
//!
//! Layered settings for the event board. Sources, later ones winning:
//!
//! 1. built-in defaults (`#[serde(default)]` on every section)
//! 2. `config/default.toml` (optional)
//! 3. `config/{APP_ENV}.toml` (optional, `APP_ENV` defaults to `development`)
//! 4. `EVENTS__SECTION__KEY` environment variables
//!
//! `.env` is read with `dotenvy` before anything else.

use std::path::Path;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "EVENTS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub invite: InviteSettings,
    pub cron: CronSettings,
    pub mail: MailSettings,
    pub media: MediaSettings,
    pub posting: PostingSettings,
    pub messaging: MessagingSettings,
    pub profile: ProfileSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory of the static pages (login, register, dashboard shell).
    pub static_dir: String,
    /// Adds `Secure` to every cookie. Disable only for plain-HTTP development.
    pub secure_cookies: bool,
    /// Upper bound for a whole multipart request.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            static_dir: "./static".into(),
            secure_cookies: true,
            max_body_bytes: 40 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: SecretString,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: SecretString::from(""),
            max_connections: 10,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Shared HS256 secret of the hosted auth provider.
    pub jwt_secret: SecretString,
    pub audience: String,
    /// Auth API base, e.g. `https://project.example.co/auth/v1`.
    pub provider_url: String,
    pub provider_api_key: SecretString,
    pub session_cookie: String,
    pub refresh_cookie: String,
    /// Where dashboard routes send visitors without a session.
    pub login_path: String,
    pub error_path: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::from(""),
            audience: "authenticated".into(),
            provider_url: "http://localhost:54321/auth/v1".into(),
            provider_api_key: SecretString::from(""),
            session_cookie: "sb-access-token".into(),
            refresh_cookie: "sb-refresh-token".into(),
            login_path: "/login".into(),
            error_path: "/auth/auth-code-error".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InviteSettings {
    /// The code handed out on flyers and in approval emails. Empty disables redemption.
    pub code: SecretString,
    pub signing_key: SecretString,
    pub ttl_hours: i64,
    /// Redemption endpoint embedded in approval emails. `?code=` is appended
    /// by [`InviteSettings::url`] unless the link already carries one.
    pub link: String,
}

impl InviteSettings {
    /// Full invitation URL, the form `/api/invite` redeems.
    pub fn url(&self) -> String {
        if self.link.contains("code=") {
            return self.link.clone();
        }
        let separator = if self.link.contains('?') { '&' } else { '?' };
        format!(
            "{}{separator}code={}",
            self.link,
            urlencoding::encode(self.code.expose_secret())
        )
    }
}

impl Default for InviteSettings {
    fn default() -> Self {
        Self {
            code: SecretString::from(""),
            signing_key: SecretString::from(""),
            ttl_hours: 24,
            link: "http://localhost:8080/api/invite".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CronSettings {
    /// Shared secret for `/api/cleanup-images`. Empty rejects every call.
    pub secret: SecretString,
}

impl Default for CronSettings {
    fn default() -> Self {
        Self {
            secret: SecretString::from(""),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub webhook_url: String,
    pub site_name: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:8787/send".into(),
            site_name: "浜松イベント情報".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    Memory,
    Local,
    S3,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    pub backend: MediaBackend,
    /// Local backend: directory holding one sub-directory per bucket.
    pub root: String,
    /// Public prefix (local) or base URL (s3) in front of `{bucket}/{key}`.
    pub public_base_url: String,
    pub s3_endpoint: Option<String>,
    pub max_dimension: u32,
    pub max_upload_bytes: usize,
    pub jpeg_quality: u8,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            backend: MediaBackend::Local,
            root: "./data/uploads".into(),
            public_base_url: "/uploads".into(),
            s3_endpoint: None,
            max_dimension: 1200,
            max_upload_bytes: 10 * 1024 * 1024,
            jpeg_quality: 80,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostingSettings {
    pub daily_limit: u32,
    pub image_change_limit: i32,
    pub max_tags: usize,
    pub max_extra_images: usize,
    pub window_months: u32,
    pub page_size: u32,
    /// Offset used to decide what "today" is.
    pub utc_offset_hours: i32,
}

impl Default for PostingSettings {
    fn default() -> Self {
        Self {
            daily_limit: 5,
            image_change_limit: 2,
            max_tags: 4,
            max_extra_images: 3,
            window_months: 1,
            page_size: 10,
            utc_offset_hours: 9,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagingSettings {
    pub daily_limit: u32,
    pub cooldown_minutes: i64,
    pub inbox_limit: u32,
}

impl Default for MessagingSettings {
    fn default() -> Self {
        Self {
            daily_limit: 10,
            cooldown_minutes: 3,
            inbox_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Confusable substitutions as `from>to` pairs, e.g. `シ>ツ`.
    pub confusables: Vec<String>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            confusables: ["ン>ソ", "シ>ツ", "口>ロ", "ー>-"].map(String::from).to_vec(),
        }
    }
}

impl ProfileSettings {
    pub fn confusable_pairs(&self) -> Result<Vec<(char, char)>, ConfigError> {
        self.confusables
            .iter()
            .map(|pair| {
                let mut chars = pair.trim().chars();
                match (chars.next(), chars.next(), chars.next(), chars.next()) {
                    (Some(from), Some('>'), Some(to), None) => Ok((from, to)),
                    _ => Err(ConfigError::Invalid(format!(
                        "profile.confusables entry '{pair}' is not of the form 'a>b'"
                    ))),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// `EnvFilter` directive, overridden by `RUST_LOG`.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=info,sqlx=warn".into(),
            format: LogFormat::Json,
        }
    }
}

impl Settings {
    /// Loads `.env`, then the layered sources rooted at `./config`.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, ".env could not be read");
            }
        }
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        Self::load_from(Path::new("config"), &app_env)
    }

    pub fn load_from(config_dir: &Path, app_env: &str) -> Result<Self, ConfigError> {
        let layer = |name: &str| File::with_name(&config_dir.join(name).to_string_lossy()).required(false);
        let settings: Settings = Config::builder()
            .add_source(layer("default"))
            .add_source(layer(app_env))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("profile.confusables")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Rejects settings the selected backends cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        #[cfg(feature = "db-postgres")]
        require_secret("database.url", &self.database.url)?;
        #[cfg(feature = "auth-jwt")]
        require_secret("auth.jwt_secret", &self.auth.jwt_secret)?;

        require_secret("invite.signing_key", &self.invite.signing_key)?;

        if self.invite.ttl_hours <= 0 {
            return Err(ConfigError::Invalid("invite.ttl_hours must be positive".into()));
        }
        if self.posting.page_size == 0 {
            return Err(ConfigError::Invalid("posting.page_size must be at least 1".into()));
        }
        if self.posting.max_tags == 0 {
            return Err(ConfigError::Invalid("posting.max_tags must be at least 1".into()));
        }
        if !(-12..=14).contains(&self.posting.utc_offset_hours) {
            return Err(ConfigError::Invalid("posting.utc_offset_hours is out of range".into()));
        }
        if self.messaging.cooldown_minutes < 0 {
            return Err(ConfigError::Invalid("messaging.cooldown_minutes must not be negative".into()));
        }
        if !(1..=100).contains(&self.media.jpeg_quality) {
            return Err(ConfigError::Invalid("media.jpeg_quality must be within 1..=100".into()));
        }
        if !self.auth.login_path.starts_with('/') {
            return Err(ConfigError::Invalid("auth.login_path must be a local path".into()));
        }
        if self.media.backend == MediaBackend::Local {
            let prefix = self.media.public_base_url.trim_end_matches('/');
            if !prefix.starts_with('/') || prefix.contains(['?', '#', '{', '}']) {
                return Err(ConfigError::Invalid(
                    "media.public_base_url must be a path such as /uploads when media.backend = local".into(),
                ));
            }
        }
        self.profile.confusable_pairs()?;

        if self.cron.secret.expose_secret().is_empty() {
            tracing::warn!("cron.secret is empty; the image cleanup endpoint will reject every call");
        }
        if self.invite.code.expose_secret().is_empty() {
            tracing::warn!("invite.code is empty; invitation redemption is disabled");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn require_secret(name: &str, secret: &SecretString) -> Result<(), ConfigError> {
    if secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{name} must be set")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn with_signing_key() -> Settings {
        let mut settings = Settings::default();
        settings.invite.signing_key = SecretString::from("pass-signing-key");
        settings.database.url = SecretString::from("postgres://localhost/events");
        settings.auth.jwt_secret = SecretString::from("jwt");
        settings
    }

    #[test]
    fn defaults_carry_documented_limits() {
        let settings = Settings::default();
        assert_eq!(settings.posting.daily_limit, 5);
        assert_eq!(settings.posting.image_change_limit, 2);
        assert_eq!(settings.posting.max_tags, 4);
        assert_eq!(settings.posting.page_size, 10);
        assert_eq!(settings.posting.max_extra_images, 3);
        assert_eq!(settings.posting.utc_offset_hours, 9);
        assert_eq!(settings.messaging.daily_limit, 10);
        assert_eq!(settings.messaging.cooldown_minutes, 3);
        assert_eq!(settings.invite.ttl_hours, 24);
    }

    #[test]
    fn missing_signing_key_is_rejected() {
        let err = Settings::default().validate().unwrap_err();
        assert!(err.to_string().contains("invite.signing_key"));
        assert!(with_signing_key().validate().is_ok());
    }

    #[test]
    fn confusables_parse_into_pairs() {
        let pairs = ProfileSettings::default().confusable_pairs().unwrap();
        assert_eq!(pairs, vec![('ン', 'ソ'), ('シ', 'ツ'), ('口', 'ロ'), ('ー', '-')]);

        let bad = ProfileSettings {
            confusables: vec!["シツ".into()],
        };
        assert!(matches!(bad.confusable_pairs(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn file_layers_override_defaults() {
        let dir = std::env::temp_dir().join(format!("event-board-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("default.toml"),
            "[invite]\nsigning_key = \"k\"\n[database]\nurl = \"postgres://db\"\n[auth]\njwt_secret = \"s\"\n[posting]\ndaily_limit = 7\n",
        )
        .unwrap();
        fs::write(dir.join("staging.toml"), "[posting]\npage_size = 20\n[telemetry]\nformat = \"pretty\"\n").unwrap();

        let settings = Settings::load_from(&dir, "staging").unwrap();

        assert_eq!(settings.posting.daily_limit, 7);
        assert_eq!(settings.posting.page_size, 20);
        assert_eq!(settings.posting.max_tags, 4);
        assert_eq!(settings.telemetry.format, LogFormat::Pretty);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut settings = with_signing_key();
        settings.media.jpeg_quality = 0;
        assert!(settings.validate().is_err());

        let mut settings = with_signing_key();
        settings.auth.login_path = "https://elsewhere".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn local_media_needs_a_path_prefix() {
        let mut settings = with_signing_key();
        settings.media.backend = MediaBackend::Local;
        for bad in ["https://cdn.example.org/uploads", "uploads", "/", ""] {
            settings.media.public_base_url = bad.into();
            assert!(settings.validate().is_err(), "{bad} should be rejected");
        }
        settings.media.public_base_url = "/uploads/".into();
        assert!(settings.validate().is_ok());

        settings.media.backend = MediaBackend::S3;
        settings.media.public_base_url = "https://cdn.example.org/uploads".into();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn invite_url_carries_the_code() {
        let mut invite = InviteSettings {
            code: SecretString::from("hamamatsu 2025"),
            ..Default::default()
        };
        assert_eq!(invite.url(), "http://localhost:8080/api/invite?code=hamamatsu%202025");

        invite.link = "https://events.example.org/api/invite?ref=mail".into();
        assert_eq!(invite.url(), "https://events.example.org/api/invite?ref=mail&code=hamamatsu%202025");

        invite.link = "https://events.example.org/api/invite?code=flyer".into();
        assert_eq!(invite.url(), "https://events.example.org/api/invite?code=flyer");
    }
}
