//! Multipart forms used by the dashboard.
//!
//! Event form: an `event` JSON part, an optional `reason` text part, an
//! optional `image` file and any number of `extra_images` files.
//! Profile form: a `profile` JSON part and an optional `avatar` file.
//! File parts without content (an untouched file input) are skipped.

use axum::extract::Multipart;
use domains::{DomainError, ImageUpload};
use serde::de::DeserializeOwned;
use services::{EventDraft, ProfileEdit};

use crate::error::ApiResult;

#[derive(Debug, Default)]
pub struct EventForm {
    pub draft: EventDraft,
    pub reason: Option<String>,
    pub image: Option<ImageUpload>,
    pub extra_images: Vec<ImageUpload>,
}

#[derive(Debug, Default)]
pub struct ProfileForm {
    pub edit: ProfileEdit,
    pub avatar: Option<ImageUpload>,
}

pub async fn read_event_form(multipart: &mut Multipart) -> ApiResult<EventForm> {
    let mut form = EventForm::default();
    let mut has_event = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "event" => {
                form.draft = parse_json("event", &field.text().await?)?;
                has_event = true;
            }
            "reason" => {
                let reason = field.text().await?;
                form.reason = Some(reason).filter(|r| !r.trim().is_empty());
            }
            "image" => form.image = read_file(field).await?,
            "extra_images" => form.extra_images.extend(read_file(field).await?),
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    if !has_event {
        return Err(DomainError::validation("the 'event' part is missing").into());
    }
    Ok(form)
}

pub async fn read_profile_form(multipart: &mut Multipart) -> ApiResult<ProfileForm> {
    let mut form = ProfileForm::default();
    let mut has_profile = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "profile" => {
                form.edit = parse_json("profile", &field.text().await?)?;
                has_profile = true;
            }
            "avatar" => form.avatar = read_file(field).await?,
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    if !has_profile {
        return Err(DomainError::validation("the 'profile' part is missing").into());
    }
    Ok(form)
}

async fn read_file(field: axum::extract::multipart::Field<'_>) -> ApiResult<Option<ImageUpload>> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(ImageUpload {
        file_name,
        content_type,
        bytes,
    }))
}

fn parse_json<T: DeserializeOwned>(part: &str, text: &str) -> Result<T, DomainError> {
    serde_json::from_str(text).map_err(|e| DomainError::validation(format!("invalid '{part}' part: {e}")))
}
