//! Blob store capability: minting short-lived signed download URLs.
//!
//! The delivery gateway never streams audio itself; it hands out expiring
//! URLs pointing directly at the blob store. [`BlobStore`] is the seam the
//! API depends on, [`S3BlobStore`] the production implementation.

use std::time::Duration;

use async_trait::async_trait;

/// Error type for blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// URL signing failed (bad expiry, SDK error).
    #[error("Presigning failed: {0}")]
    Presign(String),

    /// The store is not configured.
    #[error("Blob store configuration error: {0}")]
    Config(String),
}

/// Capability to mint signed, expiring download URLs for stored objects.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Sign a GET for `key`, valid for `expires_in`, delivered as an
    /// attachment named `filename`.
    async fn presign_download(
        &self,
        key: &str,
        filename: &str,
        expires_in: Duration,
    ) -> Result<String, BlobError>;
}

/// S3-backed blob store.
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Build the store from the ambient AWS environment.
    ///
    /// | Env Var     | Required | Purpose              |
    /// |-------------|----------|----------------------|
    /// | `S3_BUCKET` | **yes**  | Bucket holding audio |
    ///
    /// Credentials and region resolve through the standard AWS provider
    /// chain (env vars, profile, instance role).
    pub async fn from_env() -> Result<Self, BlobError> {
        let bucket = std::env::var("S3_BUCKET")
            .map_err(|_| BlobError::Config("S3_BUCKET must be set".to_string()))?;
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Ok(Self::new(aws_sdk_s3::Client::new(&config), bucket))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn presign_download(
        &self,
        key: &str,
        filename: &str,
        expires_in: Duration,
    ) -> Result<String, BlobError> {
        let presigning = aws_sdk_s3::presigning::PresigningConfig::expires_in(expires_in)
            .map_err(|e| BlobError::Presign(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .response_content_disposition(attachment_disposition(filename))
            .presigned(presigning)
            .await
            .map_err(|e| BlobError::Presign(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}

/// Content-Disposition for a browser download prompt. Quotes and control
/// characters are stripped from the filename rather than escaped; object
/// keys and beat titles never legitimately contain them.
fn attachment_disposition(filename: &str) -> String {
    let clean: String = filename
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    format!("attachment; filename=\"{clean}\"")
}
