//! Display Projection: the public, paginated event list.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use domains::{
    total_pages, Clock, DomainError, Event, EventFilter, EventQuery, EventRepository,
    PosterSummary, ProfileRepository, Result, DEFAULT_PAGE_SIZE,
};
use serde::Serialize;
use uuid::Uuid;

/// A visible event together with whoever posted it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventCard {
    pub event: Event,
    /// `None` when the poster has no profile row.
    pub poster: Option<PosterSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPage {
    pub events: Vec<EventCard>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
}

pub struct ListingService {
    events: Arc<dyn EventRepository>,
    profiles: Arc<dyn ProfileRepository>,
    clock: Arc<dyn Clock>,
    page_size: u32,
}

impl ListingService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        profiles: Arc<dyn ProfileRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            events,
            profiles,
            clock,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// One page of visible, non-expired events matching `filter`.
    pub async fn list(&self, filter: &EventFilter) -> Result<EventPage> {
        let query = EventQuery::resolve(filter, self.clock.today(), self.page_size);
        let result = self.events.search(&query).await?;
        tracing::debug!(
            page = query.page,
            total = result.total,
            returned = result.events.len(),
            "event list query"
        );

        Ok(EventPage {
            events: self.attach_posters(result.events).await?,
            page: query.page,
            total_pages: total_pages(result.total, self.page_size),
            total: result.total,
        })
    }

    /// Public detail. Hidden events do not exist for visitors.
    pub async fn detail(&self, id: i64) -> Result<EventCard> {
        let event = self
            .events
            .find(id)
            .await?
            .filter(|e| !e.is_hidden)
            .ok_or_else(|| DomainError::not_found("Event", id))?;
        let poster = self.profiles.find(event.poster_id).await?;
        Ok(EventCard {
            poster: poster.as_ref().map(PosterSummary::from),
            event,
        })
    }

    async fn attach_posters(&self, events: Vec<Event>) -> Result<Vec<EventCard>> {
        let mut ids: Vec<Uuid> = events.iter().map(|e| e.poster_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let posters: HashMap<Uuid, PosterSummary> = if ids.is_empty() {
            HashMap::new()
        } else {
            self.profiles
                .find_many(&ids)
                .await?
                .iter()
                .map(|p| (p.id, PosterSummary::from(p)))
                .collect()
        };

        Ok(events
            .into_iter()
            .map(|event| EventCard {
                poster: posters.get(&event.poster_id).cloned(),
                event,
            })
            .collect())
    }
}

/// The "kept" view: the already-fetched cards whose ids the visitor saved.
pub fn kept_only(cards: Vec<EventCard>, kept: &HashSet<i64>) -> Vec<EventCard> {
    cards
        .into_iter()
        .filter(|card| kept.contains(&card.event.id))
        .collect()
}
