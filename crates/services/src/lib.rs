//! # services
//!
//! The business rules of the event board. Every type here works against the
//! port traits in `domains`; adapters are chosen by the binary.

pub mod cleanup;
pub mod eligibility;
pub mod events;
pub mod identity;
mod imaging;
pub mod listing;
pub mod messaging;
pub mod moderation;
pub mod notification;
pub mod profiles;

pub use cleanup::{CleanupReport, CleanupService};
pub use eligibility::PostingPolicy;
pub use events::{Dashboard, EventDraft, EventService, EventUpdate, OwnerNotice};
pub use identity::{Actor, RoleResolver};
pub use listing::{kept_only, EventCard, EventPage, ListingService};
pub use messaging::{InboxEntry, MessageService, MessagingPolicy};
pub use moderation::{Decision, Delivery, ModerationService, ReportEntry};
pub use notification::{notices, EmailDraft, NotificationRelay};
pub use profiles::{NameCheck, ProfileEdit, ProfileService};
