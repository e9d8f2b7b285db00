//! Profile registration and settings, with the normalized-name duplicate
//! check applied on every name change.

use std::sync::Arc;

use domains::{
    Bucket, Clock, DomainError, ImageUpload, MediaProcessor, MediaStorage, NameNormalizer,
    Profile, ProfileRepository, Result, Role, MIN_KEY_CHARS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Actor;
use crate::imaging::prepare_one;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCheck {
    pub key: String,
    pub available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfileEdit {
    pub name: String,
    /// Blank clears the link.
    pub website_url: Option<String>,
}

pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
    media: Arc<dyn MediaStorage>,
    processor: Arc<dyn MediaProcessor>,
    normalizer: NameNormalizer,
    clock: Arc<dyn Clock>,
}

impl ProfileService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        media: Arc<dyn MediaStorage>,
        processor: Arc<dyn MediaProcessor>,
        normalizer: NameNormalizer,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            media,
            processor,
            normalizer,
            clock,
        }
    }

    /// Computes the key of `name` and whether it is free. `owner` is ignored
    /// as a holder so a profile never collides with itself.
    pub async fn check_name(&self, name: &str, owner: Option<Uuid>) -> Result<NameCheck> {
        let key = self.normalizer.normalize(name);
        if key.chars().count() < MIN_KEY_CHARS {
            return Err(DomainError::validation(format!(
                "name must contain at least {MIN_KEY_CHARS} letters or digits"
            )));
        }
        let holder = self.profiles.find_by_name_key(&key).await?;
        let available = holder.is_none_or(|p| Some(p.id) == owner);
        Ok(NameCheck { key, available })
    }

    /// Creates the actor's profile with the lowest role.
    pub async fn register(&self, actor_id: Uuid, name: &str) -> Result<Profile> {
        if self.profiles.find(actor_id).await?.is_some() {
            return Err(DomainError::Conflict("profile already registered".into()));
        }
        let name = display_name(name)?;
        let check = self.check_name(&name, None).await?;
        if !check.available {
            return Err(DomainError::Conflict("this name is already in use".into()));
        }

        let profile = self
            .profiles
            .insert(Profile {
                id: actor_id,
                name,
                role: Role::Poster,
                avatar_key: None,
                website_url: None,
                name_key: check.key,
                created_at: self.clock.now(),
            })
            .await?;
        tracing::info!(actor = %actor_id, "profile registered");
        Ok(profile)
    }

    pub async fn get(&self, actor: &Actor) -> Result<Profile> {
        self.profiles
            .find(actor.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Profile", actor.id))
    }

    pub async fn update(
        &self,
        actor: &Actor,
        edit: ProfileEdit,
        avatar: Option<ImageUpload>,
    ) -> Result<Profile> {
        let mut profile = self.get(actor).await?;

        let name = display_name(&edit.name)?;
        if name != profile.name {
            let check = self.check_name(&name, Some(profile.id)).await?;
            if !check.available {
                return Err(DomainError::Conflict("this name is already in use".into()));
            }
            profile.name = name;
            profile.name_key = check.key;
        }
        profile.website_url = website_url(edit.website_url.as_deref())?;

        let prepared = match avatar {
            Some(upload) => Some(prepare_one(&self.processor, upload).await?),
            None => None,
        };
        let mut previous_avatar = None;
        let mut new_avatar = None;
        if let Some(prepared) = prepared {
            let key = format!("{}/{}.{}", profile.id, Uuid::new_v4(), prepared.extension);
            self.media.put(Bucket::ProfileImages, &key, &prepared).await?;
            new_avatar = Some(key.clone());
            previous_avatar = profile.avatar_key.replace(key);
        }

        let profile = match self.profiles.update(profile).await {
            Ok(profile) => profile,
            Err(e) => {
                if let Some(key) = new_avatar {
                    self.discard(key).await;
                }
                return Err(e);
            }
        };
        if let Some(key) = previous_avatar {
            self.discard(key).await;
        }
        tracing::info!(actor = %actor.id, "profile updated");
        Ok(profile)
    }

    async fn discard(&self, key: String) {
        if let Err(e) = self.media.delete(Bucket::ProfileImages, &[key]).await {
            tracing::warn!(error = %e, "stale avatar left in storage");
        }
    }
}

fn display_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name is required"));
    }
    Ok(name.to_string())
}

fn website_url(raw: Option<&str>) -> Result<Option<String>> {
    match raw.map(str::trim).filter(|u| !u.is_empty()) {
        None => Ok(None),
        Some(url) if url.starts_with("https://") || url.starts_with("http://") => {
            Ok(Some(url.to_string()))
        }
        Some(_) => Err(DomainError::validation(
            "website URL must start with http:// or https://",
        )),
    }
}
