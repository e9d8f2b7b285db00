//! S3-compatible object storage. Each `Bucket` maps to the bucket of the
//! same name; public URLs are `{public_base_url}/{bucket}/{key}`.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use domains::{Bucket, DomainError, MediaStorage, PreparedImage, Result};

pub struct S3MediaStorage {
    client: Client,
    public_base_url: String,
}

impl S3MediaStorage {
    pub fn new(client: Client, public_base_url: impl Into<String>) -> Self {
        Self {
            client,
            public_base_url: public_base_url.into(),
        }
    }

    /// Builds a client from the standard AWS environment (region,
    /// credentials, optional `endpoint` for S3-compatible services).
    pub async fn from_env(endpoint: Option<&str>, public_base_url: impl Into<String>) -> Self {
        let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self::new(Client::from_conf(builder.build()), public_base_url)
    }
}

#[async_trait]
impl MediaStorage for S3MediaStorage {
    async fn put(&self, bucket: Bucket, key: &str, image: &PreparedImage) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket.name())
            .key(key)
            .content_type(image.content_type.as_ref())
            .body(ByteStream::from(image.bytes.clone()))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(bucket = bucket.name(), key, error = %e, "s3 put failed");
                DomainError::internal(format!("object upload failed: {e}"))
            })?;
        Ok(())
    }

    /// S3 treats deleting a missing key as success.
    async fn delete(&self, bucket: Bucket, keys: &[String]) -> Result<()> {
        for key in keys {
            self.client
                .delete_object()
                .bucket(bucket.name())
                .key(key)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(bucket = bucket.name(), key = %key, error = %e, "s3 delete failed");
                    DomainError::internal(format!("object delete failed: {e}"))
                })?;
        }
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url.trim_end_matches('/'), bucket.name(), key)
    }
}
