//! Local filesystem implementation of `MediaStorage`.
//!
//! Objects live at `{root}/{bucket}/{key}` and are served by the web layer
//! under `{url_prefix}/{bucket}/{key}`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use domains::{Bucket, DomainError, MediaStorage, PreparedImage, Result};
use tokio::fs;

pub struct LocalMediaStorage {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root: PathBuf,
    /// Public URL prefix (e.g., "/uploads")
    url_prefix: String,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a key inside its bucket directory. Keys are generated by the
    /// services, but anything escaping the root is still refused.
    fn object_path(&self, bucket: Bucket, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !is_plain {
            return Err(DomainError::validation(format!("invalid object key '{key}'")));
        }
        Ok(self.root.join(bucket.name()).join(relative))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn put(&self, bucket: Bucket, key: &str, image: &PreparedImage) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        fs::write(&path, &image.bytes).await.map_err(io_error)?;
        tracing::debug!(path = %path.display(), bytes = image.bytes.len(), "object stored");
        Ok(())
    }

    async fn delete(&self, bucket: Bucket, keys: &[String]) -> Result<()> {
        for key in keys {
            let path = self.object_path(bucket, key)?;
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(e)),
            }
        }
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!("{}/{}/{}", self.url_prefix.trim_end_matches('/'), bucket.name(), key)
    }
}

fn io_error(e: std::io::Error) -> DomainError {
    tracing::error!(error = %e, "media storage I/O failed");
    DomainError::internal(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn image() -> PreparedImage {
        PreparedImage {
            bytes: Bytes::from_static(b"jpeg"),
            content_type: mime::IMAGE_JPEG,
            extension: "jpg",
        }
    }

    fn storage() -> LocalMediaStorage {
        let root = std::env::temp_dir().join(format!("event-board-media-{}", uuid::Uuid::new_v4()));
        LocalMediaStorage::new(root, "/uploads/")
    }

    #[tokio::test]
    async fn put_then_delete_round_trip() {
        let storage = storage();
        storage.put(Bucket::EventImages, "poster/a.jpg", &image()).await.unwrap();
        let path = storage.root().join("event-images/poster/a.jpg");
        assert!(path.exists());

        let keys = vec!["poster/a.jpg".to_string(), "poster/missing.jpg".to_string()];
        storage.delete(Bucket::EventImages, &keys).await.unwrap();
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(storage.root());
    }

    #[tokio::test]
    async fn traversal_keys_are_refused() {
        let storage = storage();
        let err = storage
            .put(Bucket::ProfileImages, "../escape.jpg", &image())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn public_url_joins_prefix_bucket_and_key() {
        assert_eq!(
            storage().public_url(Bucket::ProfileImages, "u/1.jpg"),
            "/uploads/profile-images/u/1.jpg"
        );
    }
}
