//! Object storage for processed videos

use crate::error::{SignError, UploadError};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use common::config::StorageConfig;
use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Location of a stored object.
///
/// Persisted in video records as `bucket,key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectReference {
    pub bucket: String,
    pub key: String,
}

impl ObjectReference {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.bucket, self.key)
    }
}

impl FromStr for ObjectReference {
    type Err = SignError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once(',') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Ok(Self::new(bucket, key))
            }
            _ => Err(SignError::MalformedReference(value.to_string())),
        }
    }
}

/// Whole-object writes and presigned reads against a bucket store
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store the file at `source` as `object` with `content_type` metadata.
    ///
    /// The file is read from its beginning. Returns the number of bytes stored.
    async fn put_object(
        &self,
        object: &ObjectReference,
        source: &Path,
        content_type: &str,
    ) -> Result<u64, UploadError>;

    /// A URL granting read access to `object` for `expires_in`
    async fn presign_get(
        &self,
        object: &ObjectReference,
        expires_in: Duration,
    ) -> Result<String, SignError>;
}

/// S3 (or S3-compatible) implementation of [`ObjectStorage`]
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Build a client for the configured region and optional custom endpoint
    pub async fn new(config: &StorageConfig) -> Self {
        let region_provider =
            RegionProviderChain::first_try(aws_config::Region::new(config.region.clone()));

        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = &config.endpoint_url {
            // MinIO and friends need path-style addressing
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!(
            region = %config.region,
            endpoint = config.endpoint_url.as_deref().unwrap_or("aws"),
            "S3 client initialized"
        );

        Self::from_client(Client::from_conf(builder.build()))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_object(
        &self,
        object: &ObjectReference,
        source: &Path,
        content_type: &str,
    ) -> Result<u64, UploadError> {
        let start = Instant::now();

        let size = tokio::fs::metadata(source)
            .await
            .map_err(|e| UploadError::Read {
                path: source.to_path_buf(),
                source: e,
            })?
            .len();

        let body = ByteStream::from_path(source)
            .await
            .map_err(|e| UploadError::Read {
                path: source.to_path_buf(),
                source: io::Error::other(e.to_string()),
            })?;

        self.client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                error!(
                    error = %message,
                    bucket = %object.bucket,
                    key = %object.key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "S3 upload failed"
                );
                UploadError::Storage(message)
            })?;

        info!(
            bucket = %object.bucket,
            key = %object.key,
            size_bytes = size,
            duration_ms = start.elapsed().as_millis() as u64,
            "S3 upload successful"
        );

        Ok(size)
    }

    async fn presign_get(
        &self,
        object: &ObjectReference,
        expires_in: Duration,
    ) -> Result<String, SignError> {
        let presigning_config = PresigningConfig::expires_in(expires_in)
            .map_err(|_| SignError::InvalidLifetime(expires_in))?;

        let request = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .presigned(presigning_config)
            .await
            .map_err(|e| SignError::Presign(DisplayErrorContext(&e).to_string()))?;

        Ok(request.uri().to_string())
    }
}
