//! Bootstraps the first super admin.
//!
//! ```text
//! seed <auth-user-uuid> <display-name>
//! ```
//!
//! The user must already exist at the auth provider. An existing profile is
//! promoted; otherwise one is created with the given name.

use anyhow::{bail, Context};
use chrono::Utc;
use configs::Settings;
use domains::{NameNormalizer, Profile, ProfileRepository, Role};
use secrecy::ExposeSecret;
use storage_adapters::PgStore;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(id), Some(name)) = (args.next(), args.next()) else {
        bail!("usage: seed <auth-user-uuid> <display-name>");
    };
    let id = Uuid::parse_str(&id).context("first argument must be a UUID")?;
    let name = name.trim().to_string();
    if name.is_empty() {
        bail!("display name must not be blank");
    }

    let settings = Settings::load().context("loading settings")?;
    let store = PgStore::connect(settings.database.url.expose_secret(), 1)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;

    if let Some(mut profile) = store.find(id).await? {
        profile.role = Role::SuperAdmin;
        let profile = store.update(profile).await?;
        tracing::info!(id = %profile.id, name = %profile.name, "existing profile promoted to super_admin");
        return Ok(());
    }

    let normalizer = NameNormalizer::new(settings.profile.confusable_pairs()?);
    let profile = store
        .insert(Profile {
            id,
            name_key: normalizer.normalize(&name),
            name,
            role: Role::SuperAdmin,
            avatar_key: None,
            website_url: None,
            created_at: Utc::now(),
        })
        .await?;
    tracing::info!(id = %profile.id, name = %profile.name, "super_admin profile created");
    Ok(())
}
