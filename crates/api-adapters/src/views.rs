//! Response bodies. Stored object keys are turned into public URLs here so
//! clients never have to know the storage layout.

use domains::{Bucket, Event, MediaStorage, PosterSummary, Profile};
use serde::Serialize;
use services::{Dashboard, EventCard, EventPage};

#[derive(Debug, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub image_url: Option<String>,
    pub extra_image_urls: Vec<String>,
}

impl EventView {
    pub fn new(event: Event, media: &dyn MediaStorage) -> Self {
        let image_url = event
            .image_key
            .as_deref()
            .map(|key| media.public_url(Bucket::EventImages, key));
        let extra_image_urls = event
            .extra_image_keys
            .iter()
            .map(|key| media.public_url(Bucket::EventImages, key))
            .collect();
        Self {
            event,
            image_url,
            extra_image_urls,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PosterView {
    #[serde(flatten)]
    pub poster: PosterSummary,
    pub avatar_url: Option<String>,
}

impl PosterView {
    pub fn new(poster: PosterSummary, media: &dyn MediaStorage) -> Self {
        let avatar_url = poster
            .avatar_key
            .as_deref()
            .map(|key| media.public_url(Bucket::ProfileImages, key));
        Self { poster, avatar_url }
    }
}

#[derive(Debug, Serialize)]
pub struct EventCardView {
    #[serde(flatten)]
    pub event: EventView,
    pub poster: Option<PosterView>,
}

impl EventCardView {
    pub fn new(card: EventCard, media: &dyn MediaStorage) -> Self {
        Self {
            event: EventView::new(card.event, media),
            poster: card.poster.map(|p| PosterView::new(p, media)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventPageView {
    pub events: Vec<EventCardView>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
}

impl EventPageView {
    pub fn new(page: EventPage, media: &dyn MediaStorage) -> Self {
        Self {
            events: page
                .events
                .into_iter()
                .map(|card| EventCardView::new(card, media))
                .collect(),
            page: page.page,
            total_pages: page.total_pages,
            total: page.total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub events: Vec<EventView>,
    /// `null` when the actor has no daily limit.
    pub remaining_quota: Option<u32>,
}

impl DashboardView {
    pub fn new(dashboard: Dashboard, media: &dyn MediaStorage) -> Self {
        Self {
            events: dashboard
                .events
                .into_iter()
                .map(|event| EventView::new(event, media))
                .collect(),
            remaining_quota: dashboard.remaining_quota,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub avatar_url: Option<String>,
}

impl ProfileView {
    pub fn new(profile: Profile, media: &dyn MediaStorage) -> Self {
        let avatar_url = profile
            .avatar_key
            .as_deref()
            .map(|key| media.public_url(Bucket::ProfileImages, key));
        Self { profile, avatar_url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use domains::Area;
    use storage_adapters::MemoryMediaStorage;
    use uuid::Uuid;

    #[test]
    fn event_keys_become_public_urls() {
        let media = MemoryMediaStorage::new("https://cdn.example.com/storage");
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
        let event = Event {
            id: 7,
            title: "春の音楽祭".into(),
            description: String::new(),
            category: None,
            area: Area::ChuoNaka,
            event_date: NaiveDate::from_ymd_opt(2026, 4, 20).unwrap(),
            location: String::new(),
            contact_phone: String::new(),
            image_key: Some("owner/main.jpg".into()),
            extra_image_keys: vec!["owner/extra.jpg".into()],
            tags: vec![],
            poster_id: Uuid::new_v4(),
            is_hidden: false,
            view_count: 0,
            image_change_count: 0,
            created_at: at,
            updated_at: at,
        };

        let json = serde_json::to_value(EventView::new(event, &media)).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["image_key"], "owner/main.jpg");
        assert_eq!(json["image_url"], "https://cdn.example.com/storage/event-images/owner/main.jpg");
        assert_eq!(
            json["extra_image_urls"][0],
            "https://cdn.example.com/storage/event-images/owner/extra.jpg"
        );
    }
}
