//! Signed URL issuance for stored videos

use crate::error::SignError;
use crate::records::VideoRecord;
use crate::storage::{ObjectReference, ObjectStorage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// A time-limited read URL. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Turns stored object references into fresh signed URLs
#[derive(Clone)]
pub struct SignedUrlIssuer {
    storage: Arc<dyn ObjectStorage>,
    ttl: Duration,
}

impl SignedUrlIssuer {
    pub fn new(storage: Arc<dyn ObjectStorage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign `object` with the default lifetime
    pub async fn issue(&self, object: &ObjectReference) -> Result<SignedUrl, SignError> {
        self.issue_with_ttl(object, self.ttl).await
    }

    pub async fn issue_with_ttl(
        &self,
        object: &ObjectReference,
        ttl: Duration,
    ) -> Result<SignedUrl, SignError> {
        let lifetime =
            chrono::Duration::from_std(ttl).map_err(|_| SignError::InvalidLifetime(ttl))?;

        // Taken before signing so the reported expiry never outlives the URL.
        let expires_at = Utc::now() + lifetime;
        let url = self.storage.presign_get(object, ttl).await?;

        Ok(SignedUrl { url, expires_at })
    }

    /// Replace the stored `bucket,key` reference of `record` with a signed URL.
    ///
    /// Records without a video are returned unchanged.
    pub async fn sign_record(&self, mut record: VideoRecord) -> Result<VideoRecord, SignError> {
        let Some(stored) = record.video_url.as_deref() else {
            return Ok(record);
        };

        let object: ObjectReference = stored.parse()?;
        let signed = self.issue(&object).await?;
        record.video_url = Some(signed.url);

        Ok(record)
    }
}
