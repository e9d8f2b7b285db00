//! Posting-Eligibility Engine.
//!
//! Pure decisions over already-fetched rows: no method here touches a store.
//! Callers run every check before the first write so a rejection never
//! leaves partial state behind.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use domains::{DomainError, Event, Result, TagList, DEFAULT_MAX_TAGS};

use crate::identity::Actor;

/// Limits applied to event creation and editing.
#[derive(Debug, Clone)]
pub struct PostingPolicy {
    /// Creates per rolling window for non-privileged actors.
    pub daily_limit: u32,
    /// Image replacements allowed for non-privileged owners.
    pub image_change_limit: i32,
    pub max_tags: usize,
    pub max_extra_images: usize,
    /// Latest allowed event date, in months after today.
    pub window_months: u32,
    pub quota_window: Duration,
}

impl Default for PostingPolicy {
    fn default() -> Self {
        Self {
            daily_limit: 5,
            image_change_limit: 2,
            max_tags: DEFAULT_MAX_TAGS,
            max_extra_images: 3,
            window_months: 1,
            quota_window: Duration::hours(24),
        }
    }
}

impl PostingPolicy {
    /// `today <= date <= today + window`; the super admin is exempt.
    pub fn check_date(&self, actor: &Actor, date: NaiveDate, today: NaiveDate) -> Result<()> {
        if actor.is_super() {
            return Ok(());
        }
        if date < today {
            return Err(DomainError::validation("event date must not be in the past"));
        }
        let latest = today
            .checked_add_months(Months::new(self.window_months))
            .unwrap_or(NaiveDate::MAX);
        if date > latest {
            return Err(DomainError::validation(format!(
                "event date must be on or before {latest}"
            )));
        }
        Ok(())
    }

    /// Start of the rolling quota window ending at `now`.
    pub fn quota_window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.quota_window
    }

    /// Remaining creates for the window, `None` when the actor is unlimited.
    pub fn remaining_quota(&self, actor: &Actor, created_in_window: u64) -> Option<u32> {
        if actor.has_elevated_privileges() {
            return None;
        }
        let used = u32::try_from(created_in_window).unwrap_or(u32::MAX);
        Some(self.daily_limit.saturating_sub(used))
    }

    pub fn check_quota(&self, actor: &Actor, created_in_window: u64) -> Result<()> {
        match self.remaining_quota(actor, created_in_window) {
            Some(0) => Err(DomainError::QuotaExceeded(format!(
                "at most {} events may be posted per 24 hours",
                self.daily_limit
            ))),
            _ => Ok(()),
        }
    }

    /// Blocks the (M+1)-th replacement for non-privileged owners.
    pub fn check_image_change(&self, actor: &Actor, event: &Event) -> Result<()> {
        if actor.has_elevated_privileges() || event.image_change_count < self.image_change_limit {
            return Ok(());
        }
        Err(DomainError::QuotaExceeded(format!(
            "the image of an event may be changed at most {} times",
            self.image_change_limit
        )))
    }

    pub fn check_extra_images(&self, count: usize) -> Result<()> {
        if count > self.max_extra_images {
            return Err(DomainError::validation(format!(
                "at most {} additional images are allowed",
                self.max_extra_images
            )));
        }
        Ok(())
    }

    /// Bounded, deduplicated tags; overflow and duplicates are dropped silently.
    pub fn tags<S: AsRef<str>>(&self, raw: &[S]) -> Vec<String> {
        TagList::collect(self.max_tags, raw).into_vec()
    }
}

/// Only the owner or a privileged role may edit or delete.
pub fn check_can_mutate(actor: &Actor, event: &Event) -> Result<()> {
    if event.is_owned_by(actor.id) || actor.has_elevated_privileges() {
        return Ok(());
    }
    Err(DomainError::forbidden("only the poster or an administrator may change this event"))
}

/// Visibility is reserved for the highest privilege role.
pub fn check_can_toggle_visibility(actor: &Actor) -> Result<()> {
    if actor.is_super() {
        return Ok(());
    }
    Err(DomainError::forbidden("only a super admin may change event visibility"))
}

/// The reason to forward to the owner, when a privileged actor acted on
/// someone else's event and supplied one.
pub fn owner_notice_reason<'a>(actor: &Actor, event: &Event, reason: Option<&'a str>) -> Option<&'a str> {
    if !actor.has_elevated_privileges() || event.is_owned_by(actor.id) {
        return None;
    }
    reason.map(str::trim).filter(|r| !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{Area, Role};
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event_owned_by(owner: Uuid) -> Event {
        Event {
            id: 1,
            title: "朝市".into(),
            description: String::new(),
            category: None,
            area: Area::ChuoNaka,
            event_date: day(2026, 5, 1),
            location: String::new(),
            contact_phone: String::new(),
            image_key: None,
            extra_image_keys: vec![],
            tags: vec![],
            poster_id: owner,
            is_hidden: false,
            view_count: 0,
            image_change_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn date_window_bounds_for_posters() {
        let policy = PostingPolicy::default();
        let poster = Actor::new(Uuid::new_v4(), Role::Poster);
        let today = day(2026, 4, 10);

        assert!(policy.check_date(&poster, today, today).is_ok());
        assert!(policy.check_date(&poster, day(2026, 5, 10), today).is_ok());
        assert!(policy.check_date(&poster, day(2026, 4, 9), today).is_err());
        assert!(policy.check_date(&poster, day(2026, 5, 11), today).is_err());
    }

    #[test]
    fn admins_are_bound_but_super_admins_are_exempt() {
        let policy = PostingPolicy::default();
        let today = day(2026, 4, 10);
        let far = day(2026, 12, 24);

        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let sup = Actor::new(Uuid::new_v4(), Role::SuperAdmin);
        assert!(policy.check_date(&admin, far, today).is_err());
        assert!(policy.check_date(&sup, far, today).is_ok());
    }

    #[test]
    fn quota_counts_down_for_posters_only() {
        let policy = PostingPolicy::default();
        let poster = Actor::new(Uuid::new_v4(), Role::Poster);
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);

        assert_eq!(policy.remaining_quota(&poster, 3), Some(2));
        assert_eq!(policy.remaining_quota(&poster, 9), Some(0));
        assert!(matches!(
            policy.check_quota(&poster, 5),
            Err(DomainError::QuotaExceeded(_))
        ));
        assert_eq!(policy.remaining_quota(&admin, 50), None);
        assert!(policy.check_quota(&admin, 50).is_ok());
    }

    #[test]
    fn third_image_change_is_rejected_for_owner() {
        let policy = PostingPolicy::default();
        let owner = Actor::new(Uuid::new_v4(), Role::Poster);
        let mut event = event_owned_by(owner.id);

        event.image_change_count = 1;
        assert!(policy.check_image_change(&owner, &event).is_ok());
        event.image_change_count = 2;
        assert!(policy.check_image_change(&owner, &event).is_err());

        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        assert!(policy.check_image_change(&admin, &event).is_ok());
    }

    #[test]
    fn only_owner_or_privileged_may_mutate() {
        let owner = Actor::new(Uuid::new_v4(), Role::Poster);
        let stranger = Actor::new(Uuid::new_v4(), Role::Poster);
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let event = event_owned_by(owner.id);

        assert!(check_can_mutate(&owner, &event).is_ok());
        assert!(check_can_mutate(&admin, &event).is_ok());
        assert!(matches!(
            check_can_mutate(&stranger, &event),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn visibility_requires_super_admin() {
        assert!(check_can_toggle_visibility(&Actor::new(Uuid::new_v4(), Role::Admin)).is_err());
        assert!(check_can_toggle_visibility(&Actor::new(Uuid::new_v4(), Role::SuperAdmin)).is_ok());
    }

    #[test]
    fn notice_reason_only_for_off_owner_privileged_actions() {
        let owner = Actor::new(Uuid::new_v4(), Role::Admin);
        let other_admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let event = event_owned_by(owner.id);

        assert_eq!(owner_notice_reason(&owner, &event, Some("spam")), None);
        assert_eq!(owner_notice_reason(&other_admin, &event, Some("  ")), None);
        assert_eq!(owner_notice_reason(&other_admin, &event, Some(" spam ")), Some("spam"));
    }

    #[test]
    fn tags_are_bounded() {
        let policy = PostingPolicy::default();
        let tags = policy.tags(&["a", "b", "a", "c", "d", "e"]);
        assert_eq!(tags, ["a", "b", "c", "d"]);
    }
}
