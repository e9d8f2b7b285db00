//! Image decoding and re-encoding is CPU bound, so it runs on tokio's
//! blocking pool rather than on the request's worker thread.

use std::sync::Arc;

use domains::{DomainError, ImageUpload, MediaProcessor, PreparedImage, Result};

pub(crate) async fn prepare_one(
    processor: &Arc<dyn MediaProcessor>,
    upload: ImageUpload,
) -> Result<PreparedImage> {
    let mut prepared = prepare_all(processor, vec![upload]).await?;
    prepared
        .pop()
        .ok_or_else(|| DomainError::internal("image preparation returned nothing"))
}

/// Prepares every upload in order, failing on the first rejected one.
pub(crate) async fn prepare_all(
    processor: &Arc<dyn MediaProcessor>,
    uploads: Vec<ImageUpload>,
) -> Result<Vec<PreparedImage>> {
    if uploads.is_empty() {
        return Ok(Vec::new());
    }
    let processor = Arc::clone(processor);
    tokio::task::spawn_blocking(move || {
        uploads
            .iter()
            .map(|upload| processor.prepare(upload))
            .collect::<Result<Vec<_>>>()
    })
    .await
    .map_err(|e| DomainError::internal(format!("image task failed: {e}")))?
}
