//! # Domain Models
//!
//! These structs represent the persisted entities of the event board.
//! Events, applications and reports use store-assigned integer ids; profiles
//! share the auth provider's actor UUID; messages use UUID v4.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Area, Category, Role};

/// One per authenticated actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    /// Object key in the profile-images bucket
    pub avatar_key: Option<String>,
    pub website_url: Option<String>,
    /// Normalized-name key, unique across all profiles
    pub name_key: String,
    pub created_at: DateTime<Utc>,
}

/// Public-facing view of whoever posted an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar_key: Option<String>,
    pub website_url: Option<String>,
}

impl From<&Profile> for PosterSummary {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            avatar_key: p.avatar_key.clone(),
            website_url: p.website_url.clone(),
        }
    }
}

/// A posted listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub area: Area,
    pub event_date: NaiveDate,
    pub location: String,
    pub contact_phone: String,
    /// Object key of the main image in the event-images bucket
    pub image_key: Option<String>,
    pub extra_image_keys: Vec<String>,
    pub tags: Vec<String>,
    pub poster_id: Uuid,
    /// Settable only by the highest privilege role
    pub is_hidden: bool,
    pub view_count: i64,
    /// Successful image replacements through editing
    pub image_change_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_owned_by(&self, actor_id: Uuid) -> bool {
        self.poster_id == actor_id
    }

    /// Every stored object this event references.
    pub fn image_keys(&self) -> Vec<String> {
        self.image_key
            .iter()
            .chain(self.extra_image_keys.iter())
            .cloned()
            .collect()
    }
}

/// Insert payload for an event; the store assigns id and counters.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub area: Area,
    pub event_date: NaiveDate,
    pub location: String,
    pub contact_phone: String,
    pub image_key: Option<String>,
    pub extra_image_keys: Vec<String>,
    pub tags: Vec<String>,
    pub poster_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// A pending organization sign-up request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub organization_name: String,
    pub email: String,
    pub activity_details: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewApplication {
    pub organization_name: String,
    pub email: String,
    pub activity_details: String,
}

/// An abuse flag raised by a visitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub reason: String,
    /// Cleared when the reported event is deleted
    pub event_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub reason: String,
    pub event_id: i64,
}

/// An in-app notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Option<Uuid>,
    pub receiver_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub sender_id: Option<Uuid>,
    pub receiver_id: Uuid,
    pub content: String,
}

/// Object storage buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    EventImages,
    ProfileImages,
}

impl Bucket {
    pub fn name(self) -> &'static str {
        match self {
            Bucket::EventImages => "event-images",
            Bucket::ProfileImages => "profile-images",
        }
    }
}

/// Raw file part received from a form.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Upload after validation and re-encoding, ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub bytes: Bytes,
    pub content_type: mime::Mime,
    pub extension: &'static str,
}

/// Email handed to the outbound webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEmail {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub html_content: String,
}

/// Identity asserted by a verified session token.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClaims {
    pub actor_id: Uuid,
    pub email: Option<String>,
}

/// Tokens returned by the auth provider after a code exchange.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}
