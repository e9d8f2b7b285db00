//! # In-memory adapters
//!
//! `dashmap`-backed implementations of every store port. Used by the test
//! suites and by the server when no database URL is configured. Nothing
//! survives a restart.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    Application, ApplicationRepository, ApplicationStatus, Bucket, Clock, DomainError, Event,
    EventQuery, EventRepository, MediaStorage, Message, MessageRepository, NewApplication,
    NewEvent, NewMessage, NewReport, PreparedImage, Profile, ProfileRepository, Report,
    ReportRepository, Result, Role, SearchResult, SystemClock,
};
use uuid::Uuid;

/// Position of a role in directory listings: highest privilege first.
fn role_rank(role: Role) -> u8 {
    match role {
        Role::SuperAdmin => 0,
        Role::Admin => 1,
        Role::Poster => 2,
    }
}

/// All five tables in one place so event deletion can clear report links
/// the way the relational schema does.
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    profiles: DashMap<Uuid, Profile>,
    name_keys: DashMap<String, Uuid>,
    events: DashMap<i64, Event>,
    applications: DashMap<i64, Application>,
    reports: DashMap<i64, Report>,
    messages: DashMap<Uuid, Message>,
    next_event_id: AtomicI64,
    next_application_id: AtomicI64,
    next_report_id: AtomicI64,
}

impl MemoryStore {
    /// `clock` stamps rows whose creation time the store assigns.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            profiles: DashMap::new(),
            name_keys: DashMap::new(),
            events: DashMap::new(),
            applications: DashMap::new(),
            reports: DashMap::new(),
            messages: DashMap::new(),
            next_event_id: AtomicI64::new(1),
            next_application_id: AtomicI64::new(1),
            next_report_id: AtomicI64::new(1),
        }
    }

    fn claim_name_key(&self, key: &str, owner: Uuid) -> Result<()> {
        match self.name_keys.entry(key.to_string()) {
            Entry::Occupied(held) if *held.get() != owner => {
                Err(DomainError::Conflict(format!("name key '{key}' is already taken")))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(owner);
                Ok(())
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock::with_offset_hours(0)))
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<Profile>> {
        Ok(self.profiles.get(&id).map(|p| p.clone()))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Profile>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.profiles.get(id).map(|p| p.clone()))
            .collect())
    }

    async fn find_by_name_key(&self, name_key: &str) -> Result<Option<Profile>> {
        let Some(owner) = self.name_keys.get(name_key).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.profiles.get(&owner).map(|p| p.clone()))
    }

    async fn insert(&self, profile: Profile) -> Result<Profile> {
        if self.profiles.contains_key(&profile.id) {
            return Err(DomainError::Conflict(format!("profile {} already exists", profile.id)));
        }
        self.claim_name_key(&profile.name_key, profile.id)?;
        self.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn update(&self, profile: Profile) -> Result<Profile> {
        let previous_key = self
            .profiles
            .get(&profile.id)
            .map(|p| p.name_key.clone())
            .ok_or_else(|| DomainError::not_found("Profile", profile.id))?;

        if previous_key != profile.name_key {
            self.claim_name_key(&profile.name_key, profile.id)?;
            self.name_keys.remove(&previous_key);
        }
        self.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn list(&self, roles: Option<Vec<Role>>) -> Result<Vec<Profile>> {
        let mut profiles: Vec<Profile> = self
            .profiles
            .iter()
            .filter(|p| roles.as_ref().is_none_or(|r| r.contains(&p.role)))
            .map(|p| p.clone())
            .collect();
        profiles.sort_by(|a, b| {
            role_rank(a.role)
                .cmp(&role_rank(b.role))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(profiles)
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn find(&self, id: i64) -> Result<Option<Event>> {
        Ok(self.events.get(&id).map(|e| e.clone()))
    }

    async fn insert(&self, event: NewEvent) -> Result<Event> {
        let id = self.next_event_id.fetch_add(1, Ordering::SeqCst);
        let stored = Event {
            id,
            title: event.title,
            description: event.description,
            category: event.category,
            area: event.area,
            event_date: event.event_date,
            location: event.location,
            contact_phone: event.contact_phone,
            image_key: event.image_key,
            extra_image_keys: event.extra_image_keys,
            tags: event.tags,
            poster_id: event.poster_id,
            is_hidden: false,
            view_count: 0,
            image_change_count: 0,
            created_at: event.created_at,
            updated_at: event.created_at,
        };
        self.events.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, event: Event) -> Result<Event> {
        let mut stored = self
            .events
            .get_mut(&event.id)
            .ok_or_else(|| DomainError::not_found("Event", event.id))?;
        // Visibility and views belong to their own operations.
        let is_hidden = stored.is_hidden;
        let view_count = stored.view_count;
        *stored = Event {
            is_hidden,
            view_count,
            ..event
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        if self.events.remove(&id).is_none() {
            return Ok(false);
        }
        for mut report in self.reports.iter_mut() {
            if report.event_id == Some(id) {
                report.event_id = None;
            }
        }
        Ok(true)
    }

    async fn set_hidden(&self, id: i64, hidden: bool) -> Result<bool> {
        Ok(self
            .events
            .get_mut(&id)
            .map(|mut e| e.is_hidden = hidden)
            .is_some())
    }

    async fn increment_views(&self, id: i64) -> Result<bool> {
        Ok(self
            .events
            .get_mut(&id)
            .map(|mut e| e.view_count += 1)
            .is_some())
    }

    async fn count_created_since(&self, poster_id: Uuid, since: DateTime<Utc>) -> Result<u64> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.poster_id == poster_id && e.created_at >= since)
            .count() as u64)
    }

    async fn list_for_dashboard(&self, poster_id: Option<Uuid>) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .iter()
            .filter(|e| poster_id.is_none_or(|p| e.poster_id == p))
            .map(|e| e.clone())
            .collect();
        events.sort_by(|a, b| b.event_date.cmp(&a.event_date).then(b.id.cmp(&a.id)));
        Ok(events)
    }

    async fn search(&self, query: &EventQuery) -> Result<SearchResult> {
        let mut matching: Vec<Event> = self
            .events
            .iter()
            .filter(|e| query.matches(e))
            .map(|e| e.clone())
            .collect();
        matching.sort_by(|a, b| query.compare(a, b));

        let total = matching.len() as u64;
        let events = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .collect();
        Ok(SearchResult { events, total })
    }

    async fn expired_with_images(&self, before: NaiveDate) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .iter()
            .filter(|e| e.event_date < before && e.image_key.is_some())
            .map(|e| e.clone())
            .collect();
        events.sort_by_key(|e| e.id);
        Ok(events)
    }

    async fn clear_images(&self, ids: &[i64]) -> Result<u64> {
        let mut cleared = 0;
        for id in ids {
            if let Some(mut event) = self.events.get_mut(id) {
                if event.image_key.take().is_some() {
                    cleared += 1;
                }
            }
        }
        Ok(cleared)
    }
}

#[async_trait]
impl ApplicationRepository for MemoryStore {
    async fn insert(&self, application: NewApplication) -> Result<Application> {
        let id = self.next_application_id.fetch_add(1, Ordering::SeqCst);
        let stored = Application {
            id,
            organization_name: application.organization_name,
            email: application.email,
            activity_details: application.activity_details,
            status: ApplicationStatus::Pending,
            created_at: self.clock.now(),
        };
        self.applications.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_pending(&self) -> Result<Vec<Application>> {
        let mut pending: Vec<Application> = self
            .applications
            .iter()
            .filter(|a| a.status == ApplicationStatus::Pending)
            .map(|a| a.clone())
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(pending)
    }

    async fn find(&self, id: i64) -> Result<Option<Application>> {
        Ok(self.applications.get(&id).map(|a| a.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.applications.remove(&id).is_some())
    }
}

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn insert(&self, report: NewReport) -> Result<Report> {
        if !self.events.contains_key(&report.event_id) {
            return Err(DomainError::not_found("Event", report.event_id));
        }
        let id = self.next_report_id.fetch_add(1, Ordering::SeqCst);
        let stored = Report {
            id,
            reason: report.reason,
            event_id: Some(report.event_id),
            created_at: self.clock.now(),
        };
        self.reports.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Report>> {
        let mut reports: Vec<Report> = self.reports.iter().map(|r| r.clone()).collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reports)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.reports.remove(&id).is_some())
    }
}

impl MemoryStore {
    fn store_message(&self, message: NewMessage) -> Message {
        let stored = Message {
            id: Uuid::new_v4(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            is_read: false,
            created_at: self.clock.now(),
        };
        self.messages.insert(stored.id, stored.clone());
        stored
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn insert(&self, message: NewMessage) -> Result<Message> {
        Ok(self.store_message(message))
    }

    async fn insert_many(&self, messages: Vec<NewMessage>) -> Result<Vec<Message>> {
        Ok(messages.into_iter().map(|m| self.store_message(m)).collect())
    }

    async fn inbox(&self, receiver_id: Uuid, limit: u32) -> Result<Vec<Message>> {
        let mut inbox: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.receiver_id == receiver_id)
            .map(|m| m.clone())
            .collect();
        inbox.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        inbox.truncate(limit as usize);
        Ok(inbox)
    }

    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> Result<bool> {
        Ok(match self.messages.get_mut(&id) {
            Some(mut m) if m.receiver_id == receiver_id => {
                m.is_read = true;
                true
            }
            _ => false,
        })
    }

    async fn delete(&self, id: Uuid, receiver_id: Uuid) -> Result<bool> {
        Ok(self
            .messages
            .remove_if(&id, |_, m| m.receiver_id == receiver_id)
            .is_some())
    }

    async fn count_sent_since(&self, sender_id: Uuid, since: DateTime<Utc>) -> Result<u64> {
        Ok(self
            .messages
            .iter()
            .filter(|m| m.sender_id == Some(sender_id) && m.created_at >= since)
            .count() as u64)
    }

    async fn last_sent_at(&self, sender_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .messages
            .iter()
            .filter(|m| m.sender_id == Some(sender_id))
            .map(|m| m.created_at)
            .max())
    }
}

/// Object storage kept in a map; URLs point at `base_url`.
pub struct MemoryMediaStorage {
    objects: DashMap<(Bucket, String), PreparedImage>,
    base_url: String,
}

impl MemoryMediaStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            objects: DashMap::new(),
            base_url: base_url.into(),
        }
    }

    pub fn contains(&self, bucket: Bucket, key: &str) -> bool {
        self.objects.contains_key(&(bucket, key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl MediaStorage for MemoryMediaStorage {
    async fn put(&self, bucket: Bucket, key: &str, image: &PreparedImage) -> Result<()> {
        self.objects.insert((bucket, key.to_string()), image.clone());
        Ok(())
    }

    async fn delete(&self, bucket: Bucket, keys: &[String]) -> Result<()> {
        for key in keys {
            self.objects.remove(&(bucket, key.clone()));
        }
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), bucket.name(), key)
    }
}
