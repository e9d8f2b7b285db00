//! Event lifecycle: create, edit, delete and visibility, with every
//! eligibility check applied before the first write.

use std::sync::Arc;

use chrono::NaiveDate;
use domains::{
    Area, Bucket, Category, Clock, DomainError, Event, EventRepository, ImageUpload,
    MediaProcessor, MediaStorage, NewEvent, PreparedImage, Result,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::eligibility::{check_can_mutate, check_can_toggle_visibility, owner_notice_reason, PostingPolicy};
use crate::identity::Actor;
use crate::imaging::{prepare_all, prepare_one};
use crate::notification::{notices, NotificationRelay};

/// Form fields of an event as submitted. Required fields are optional here so
/// a missing one becomes a validation error rather than a decode error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub area: Option<Area>,
    pub event_date: Option<NaiveDate>,
    pub location: String,
    pub contact_phone: String,
    pub tags: Vec<String>,
}

struct Required {
    title: String,
    area: Area,
    event_date: NaiveDate,
}

impl EventDraft {
    fn required(&self) -> Result<Required> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title is required"));
        }
        let area = self.area.ok_or_else(|| DomainError::validation("area is required"))?;
        let event_date = self
            .event_date
            .ok_or_else(|| DomainError::validation("event date is required"))?;
        Ok(Required {
            title: title.to_string(),
            area,
            event_date,
        })
    }
}

/// Whether the owner was told about an action taken on their event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerNotice {
    /// Own event, non-privileged actor, or no reason given.
    NotRequested,
    Sent,
    /// The action itself succeeded; only the message insert failed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventUpdate {
    pub event: Event,
    pub notice: OwnerNotice,
}

/// Dashboard listing plus the remaining daily quota (`None` = unlimited).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub events: Vec<Event>,
    pub remaining_quota: Option<u32>,
}

pub struct EventService {
    events: Arc<dyn EventRepository>,
    media: Arc<dyn MediaStorage>,
    processor: Arc<dyn MediaProcessor>,
    relay: Arc<NotificationRelay>,
    clock: Arc<dyn Clock>,
    policy: PostingPolicy,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        media: Arc<dyn MediaStorage>,
        processor: Arc<dyn MediaProcessor>,
        relay: Arc<NotificationRelay>,
        clock: Arc<dyn Clock>,
        policy: PostingPolicy,
    ) -> Self {
        Self {
            events,
            media,
            processor,
            relay,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &PostingPolicy {
        &self.policy
    }

    /// Remaining creates in the rolling window, `None` when unlimited.
    pub async fn quota(&self, actor: &Actor) -> Result<Option<u32>> {
        if actor.has_elevated_privileges() {
            return Ok(None);
        }
        let since = self.policy.quota_window_start(self.clock.now());
        let used = self.events.count_created_since(actor.id, since).await?;
        Ok(self.policy.remaining_quota(actor, used))
    }

    pub async fn dashboard(&self, actor: &Actor) -> Result<Dashboard> {
        let scope = (!actor.has_elevated_privileges()).then_some(actor.id);
        let events = self.events.list_for_dashboard(scope).await?;
        let remaining_quota = self.quota(actor).await?;
        Ok(Dashboard {
            events,
            remaining_quota,
        })
    }

    /// Creates an event.
    ///
    /// Order: required fields, date window, extra-image bound, quota, image
    /// preparation. Only then are objects uploaded and the row inserted. The
    /// quota is counted again here, but two concurrent creates can still both
    /// pass it.
    pub async fn create(
        &self,
        actor: &Actor,
        draft: EventDraft,
        image: Option<ImageUpload>,
        extras: Vec<ImageUpload>,
    ) -> Result<Event> {
        let required = draft.required()?;
        self.policy
            .check_date(actor, required.event_date, self.clock.today())?;
        self.policy.check_extra_images(extras.len())?;

        if !actor.has_elevated_privileges() {
            let since = self.policy.quota_window_start(self.clock.now());
            let used = self.events.count_created_since(actor.id, since).await?;
            self.policy.check_quota(actor, used)?;
        }

        let has_main = image.is_some();
        let mut prepared = prepare_all(&self.processor, image.into_iter().chain(extras).collect())
            .await?
            .into_iter();
        let main = if has_main { prepared.next() } else { None };
        let extras: Vec<_> = prepared.collect();

        let mut uploaded = Vec::new();
        let image_key = match main {
            Some(prepared) => Some(self.upload(actor.id, &prepared, &mut uploaded).await?),
            None => None,
        };
        let mut extra_image_keys = Vec::with_capacity(extras.len());
        for prepared in &extras {
            extra_image_keys.push(self.upload(actor.id, prepared, &mut uploaded).await?);
        }

        let new_event = NewEvent {
            title: required.title,
            description: draft.description,
            category: draft.category,
            area: required.area,
            event_date: required.event_date,
            location: draft.location,
            contact_phone: draft.contact_phone,
            image_key,
            extra_image_keys,
            tags: self.policy.tags(&draft.tags),
            poster_id: actor.id,
            created_at: self.clock.now(),
        };

        match self.events.insert(new_event).await {
            Ok(event) => {
                tracing::info!(event_id = event.id, actor = %actor.id, "event created");
                Ok(event)
            }
            Err(e) => {
                tracing::error!(actor = %actor.id, error = %e, "event insert failed");
                self.discard(&uploaded).await;
                Err(e)
            }
        }
    }

    /// Edits an event. A new main image replaces the old one, which is then
    /// deleted best effort.
    pub async fn update(
        &self,
        actor: &Actor,
        id: i64,
        draft: EventDraft,
        reason: Option<&str>,
        image: Option<ImageUpload>,
    ) -> Result<EventUpdate> {
        let mut event = self.load(id).await?;
        check_can_mutate(actor, &event)?;
        let required = draft.required()?;
        if required.event_date != event.event_date {
            self.policy
                .check_date(actor, required.event_date, self.clock.today())?;
        }

        let replacement = match image {
            Some(upload) => {
                self.policy.check_image_change(actor, &event)?;
                Some(prepare_one(&self.processor, upload).await?)
            }
            None => None,
        };

        let mut uploaded = Vec::new();
        let previous_image = match replacement {
            Some(prepared) => {
                let key = self.upload(event.poster_id, &prepared, &mut uploaded).await?;
                event.image_change_count += 1;
                event.image_key.replace(key)
            }
            None => None,
        };

        event.title = required.title;
        event.description = draft.description;
        event.category = draft.category;
        event.area = required.area;
        event.event_date = required.event_date;
        event.location = draft.location;
        event.contact_phone = draft.contact_phone;
        event.tags = self.policy.tags(&draft.tags);
        event.updated_at = self.clock.now();

        let event = match self.events.update(event).await {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(event_id = id, error = %e, "event update failed");
                self.discard(&uploaded).await;
                return Err(e);
            }
        };
        if let Some(old) = previous_image {
            self.discard(&[old]).await;
        }
        tracing::info!(event_id = id, actor = %actor.id, "event updated");

        let notice = match owner_notice_reason(actor, &event, reason) {
            Some(reason) => {
                self.notify_owner(actor, &event, notices::event_edited(&event.title, reason))
                    .await
            }
            None => OwnerNotice::NotRequested,
        };
        Ok(EventUpdate { event, notice })
    }

    /// Deletes the row, then its stored images best effort.
    pub async fn delete(
        &self,
        actor: &Actor,
        id: i64,
        confirmed: bool,
        reason: Option<&str>,
    ) -> Result<OwnerNotice> {
        if !confirmed {
            return Err(DomainError::validation("deletion must be confirmed"));
        }
        let event = self.load(id).await?;
        check_can_mutate(actor, &event)?;

        if !self.events.delete(id).await? {
            return Err(DomainError::not_found("Event", id));
        }
        self.discard(&event.image_keys()).await;
        tracing::info!(event_id = id, actor = %actor.id, "event deleted");

        Ok(match owner_notice_reason(actor, &event, reason) {
            Some(reason) => {
                self.notify_owner(actor, &event, notices::event_deleted(&event.title, reason))
                    .await
            }
            None => OwnerNotice::NotRequested,
        })
    }

    /// Sets the hidden flag. Touches no other field.
    pub async fn set_visibility(
        &self,
        actor: &Actor,
        id: i64,
        hidden: bool,
        reason: Option<&str>,
    ) -> Result<OwnerNotice> {
        check_can_toggle_visibility(actor)?;
        let event = self.load(id).await?;

        if !self.events.set_hidden(id, hidden).await? {
            return Err(DomainError::not_found("Event", id));
        }
        tracing::info!(event_id = id, hidden, actor = %actor.id, "event visibility changed");

        Ok(match owner_notice_reason(actor, &event, reason) {
            Some(reason) => {
                let content = notices::visibility_changed(&event.title, hidden, reason);
                self.notify_owner(actor, &event, content).await
            }
            None => OwnerNotice::NotRequested,
        })
    }

    /// Counts a public view. Hidden events are as absent here as on the detail page.
    pub async fn record_view(&self, id: i64) -> Result<()> {
        if self.load(id).await?.is_hidden {
            return Err(DomainError::not_found("Event", id));
        }
        if self.events.increment_views(id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("Event", id))
        }
    }

    async fn load(&self, id: i64) -> Result<Event> {
        self.events
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event", id))
    }

    async fn upload(
        &self,
        owner: Uuid,
        image: &PreparedImage,
        uploaded: &mut Vec<String>,
    ) -> Result<String> {
        let key = format!("{owner}/{}.{}", Uuid::new_v4(), image.extension);
        if let Err(e) = self.media.put(Bucket::EventImages, &key, image).await {
            tracing::error!(key = %key, error = %e, "image upload failed");
            self.discard(uploaded).await;
            return Err(e);
        }
        uploaded.push(key.clone());
        Ok(key)
    }

    /// Best-effort object removal; a failure only leaves an orphaned file.
    async fn discard(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        if let Err(e) = self.media.delete(Bucket::EventImages, keys).await {
            tracing::warn!(keys = ?keys, error = %e, "stale images left in storage");
        }
    }

    async fn notify_owner(&self, actor: &Actor, event: &Event, content: String) -> OwnerNotice {
        match self
            .relay
            .notify_in_app(Some(actor.id), event.poster_id, content)
            .await
        {
            Ok(_) => OwnerNotice::Sent,
            Err(e) => {
                tracing::warn!(event_id = event.id, error = %e, "owner notice not stored");
                OwnerNotice::Failed
            }
        }
    }
}
