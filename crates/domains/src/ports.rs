//! # Ports
//!
//! Every adapter in `storage-adapters` and `auth-adapters` implements one of
//! these traits; services only ever see `Arc<dyn Port>`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::catalog::Role;
use crate::error::Result;
use crate::models::{
    Application, Bucket, Event, ImageUpload, Message, NewApplication, NewEvent, NewMessage,
    NewReport, OutboundEmail, PreparedImage, Profile, Report, SessionClaims, SessionTokens,
};
use crate::query::EventQuery;

/// One page of the public list plus the total row count for the same predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub events: Vec<Event>,
    pub total: u64,
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Profile>>;
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Profile>>;
    async fn find_by_name_key(&self, name_key: &str) -> Result<Option<Profile>>;
    /// Fails with `Conflict` when the name key is taken.
    async fn insert(&self, profile: Profile) -> Result<Profile>;
    /// Fails with `Conflict` when the name key is taken by another profile.
    async fn update(&self, profile: Profile) -> Result<Profile>;
    /// Ordered by role, then name. `None` lists every role.
    async fn list(&self, roles: Option<Vec<Role>>) -> Result<Vec<Profile>>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<Event>>;
    async fn insert(&self, event: NewEvent) -> Result<Event>;
    /// Saves editable fields, image references, counters and `updated_at`.
    async fn update(&self, event: Event) -> Result<Event>;
    async fn delete(&self, id: i64) -> Result<bool>;
    /// Touches only the visibility flag.
    async fn set_hidden(&self, id: i64, hidden: bool) -> Result<bool>;
    async fn increment_views(&self, id: i64) -> Result<bool>;
    async fn count_created_since(&self, poster_id: Uuid, since: DateTime<Utc>) -> Result<u64>;
    /// `None` lists every poster's events. Ordered by event date, newest first.
    async fn list_for_dashboard(&self, poster_id: Option<Uuid>) -> Result<Vec<Event>>;
    async fn search(&self, query: &EventQuery) -> Result<SearchResult>;
    /// Events dated strictly before `before` that still hold a main image.
    async fn expired_with_images(&self, before: NaiveDate) -> Result<Vec<Event>>;
    async fn clear_images(&self, ids: &[i64]) -> Result<u64>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn insert(&self, application: NewApplication) -> Result<Application>;
    /// Newest first.
    async fn list_pending(&self) -> Result<Vec<Application>>;
    async fn find(&self, id: i64) -> Result<Option<Application>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn insert(&self, report: NewReport) -> Result<Report>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Report>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: NewMessage) -> Result<Message>;
    async fn insert_many(&self, messages: Vec<NewMessage>) -> Result<Vec<Message>>;
    /// Newest first, at most `limit` rows.
    async fn inbox(&self, receiver_id: Uuid, limit: u32) -> Result<Vec<Message>>;
    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> Result<bool>;
    async fn delete(&self, id: Uuid, receiver_id: Uuid) -> Result<bool>;
    async fn count_sent_since(&self, sender_id: Uuid, since: DateTime<Utc>) -> Result<u64>;
    async fn last_sent_at(&self, sender_id: Uuid) -> Result<Option<DateTime<Utc>>>;
}

/// Validates and re-encodes uploads before they reach storage.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait MediaProcessor: Send + Sync {
    fn prepare(&self, upload: &ImageUpload) -> Result<PreparedImage>;
}

/// Object storage contract for uploaded images.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn put(&self, bucket: Bucket, key: &str, image: &PreparedImage) -> Result<()>;
    /// Missing keys are not an error.
    async fn delete(&self, bucket: Bucket, keys: &[String]) -> Result<()>;
    fn public_url(&self, bucket: Bucket, key: &str) -> String;
}

/// Outbound email through the fixed webhook. No retries.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<()>;
}

/// Verifies session tokens issued by the hosted auth provider.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<SessionClaims>;
}

/// Completes the OAuth / magic-link code exchange with the auth provider.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn exchange_code(&self, code: &str, code_verifier: Option<String>) -> Result<SessionTokens>;
}
