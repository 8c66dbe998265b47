use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use std::sync::atomic::{AtomicI64, Ordering};

/// Public object storage for template images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key` and return the URL they are served from.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String, StorageError>;
}

/// Object key for an uploaded template image.
pub fn template_key(template_code: &str, stamp: i64) -> String {
    format!("templates/{template_code}-{stamp}.png")
}

/// Millisecond wall-clock stamps, strictly increasing within the process.
#[derive(Debug, Default)]
pub struct KeyClock {
    last: AtomicI64,
}

impl KeyClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_stamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Client for Cloudflare R2 object storage (S3-compatible).
pub struct R2Client {
    bucket: Box<Bucket>,
    public_url: String,
}

impl R2Client {
    pub fn new(
        bucket_name: &str,
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        public_url: &str,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: "auto".to_string(),
            endpoint: endpoint.to_string(),
        };

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            bucket,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

#[async_trait]
impl BlobStore for R2Client {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String, StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(StorageError::S3)?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Rejected(status));
        }

        tracing::info!(key, bytes = data.len(), "Uploaded template image");
        Ok(self.public_url_for(key))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("Storage rejected upload with status {0}")]
    Rejected(u16),

    #[error("Storage configuration error: {0}")]
    Config(String),
}
