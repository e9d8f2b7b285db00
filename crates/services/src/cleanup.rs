//! Scheduled sweep of images that belong to past events.

use std::sync::Arc;

use domains::{Bucket, Clock, EventRepository, MediaStorage, Result};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Rows whose image reference was cleared.
    pub deleted_count: u64,
    pub deleted_files: Vec<String>,
}

pub struct CleanupService {
    events: Arc<dyn EventRepository>,
    media: Arc<dyn MediaStorage>,
    clock: Arc<dyn Clock>,
}

impl CleanupService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        media: Arc<dyn MediaStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { events, media, clock }
    }

    /// Deletes the main image of every event dated before today, then clears
    /// the reference. If storage fails the rows keep their keys and the next
    /// run retries them.
    pub async fn run(&self) -> Result<CleanupReport> {
        let today = self.clock.today();
        let expired = self.events.expired_with_images(today).await?;
        if expired.is_empty() {
            tracing::info!(%today, "no expired images");
            return Ok(CleanupReport::default());
        }

        let ids: Vec<i64> = expired.iter().map(|e| e.id).collect();
        let keys: Vec<String> = expired.into_iter().filter_map(|e| e.image_key).collect();

        self.media.delete(Bucket::EventImages, &keys).await?;
        let deleted_count = self.events.clear_images(&ids).await?;
        tracing::info!(%today, deleted_count, files = keys.len(), "expired images removed");

        Ok(CleanupReport {
            deleted_count,
            deleted_files: keys,
        })
    }
}
