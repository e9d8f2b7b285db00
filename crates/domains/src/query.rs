//! Typed filter for the public event list.
//!
//! `EventFilter` is what a visitor asks for; `EventQuery` is the same request
//! resolved against a calendar date and page size, which is what the store
//! adapters translate into SQL (or evaluate in memory).

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::catalog::{Area, Category, RAIN_OK_TAG};
use crate::models::Event;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Ascending event date.
    #[default]
    DateAsc,
    /// Descending creation time.
    Newest,
}

/// A visitor's filter selection. All present fields are AND-combined.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub category: Option<Category>,
    pub area: Option<Area>,
    /// Case-insensitive title substring, or exact tag element
    pub keyword: Option<String>,
    pub rain_ok: bool,
    pub sort: SortOrder,
    /// 1-based
    pub page: u32,
}

impl EventFilter {
    /// True when any narrowing filter is set (sort and page do not count).
    pub fn is_narrowed(&self) -> bool {
        self.category.is_some() || self.area.is_some() || self.keyword().is_some() || self.rain_ok
    }

    /// Trimmed keyword, `None` when blank.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// A filter resolved to concrete bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub from: NaiveDate,
    pub until: Option<NaiveDate>,
    pub category: Option<Category>,
    pub area: Option<Area>,
    pub keyword: Option<String>,
    pub required_tag: Option<String>,
    pub sort: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl EventQuery {
    /// Visible events dated today or later; capped at one month ahead when
    /// nothing else narrows the list.
    pub fn resolve(filter: &EventFilter, today: NaiveDate, page_size: u32) -> Self {
        let until = if filter.is_narrowed() {
            None
        } else {
            today.checked_add_months(Months::new(1))
        };

        Self {
            from: today,
            until,
            category: filter.category,
            area: filter.area,
            keyword: filter.keyword().map(str::to_string),
            required_tag: filter.rain_ok.then(|| RAIN_OK_TAG.to_string()),
            sort: filter.sort,
            page: filter.page.max(1),
            limit: page_size.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// In-memory evaluation of the predicate; the SQL adapter must agree with it.
    pub fn matches(&self, event: &Event) -> bool {
        if event.is_hidden || event.event_date < self.from {
            return false;
        }
        if self.until.is_some_and(|until| event.event_date > until) {
            return false;
        }
        if self.category.is_some() && event.category != self.category {
            return false;
        }
        if self.area.is_some_and(|area| event.area != area) {
            return false;
        }
        if let Some(keyword) = &self.keyword {
            let in_title = event.title.to_lowercase().contains(&keyword.to_lowercase());
            let in_tags = event.tags.iter().any(|t| t == keyword);
            if !in_title && !in_tags {
                return false;
            }
        }
        if let Some(tag) = &self.required_tag {
            if !event.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        true
    }

    /// Ordering matching `sort`, with id as the tiebreaker.
    pub fn compare(&self, a: &Event, b: &Event) -> std::cmp::Ordering {
        match self.sort {
            SortOrder::DateAsc => a.event_date.cmp(&b.event_date).then(a.id.cmp(&b.id)),
            SortOrder::Newest => b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)),
        }
    }
}

/// Total pages for `total` rows, at least one.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    u32::try_from(total.div_ceil(size).max(1)).unwrap_or(u32::MAX)
}
