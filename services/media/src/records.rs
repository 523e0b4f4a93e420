//! Video metadata records and the store that owns them

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata for one video owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VideoRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    /// Stored object as `bucket,key`; replaced by a signed URL in responses
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// A record with no uploaded content yet
    pub fn draft(user_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: String::new(),
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Read/write access to video records
#[async_trait]
pub trait VideoRecordStore: Send + Sync {
    async fn create_video(&self, record: &VideoRecord) -> DatabaseResult<()>;

    async fn get_video(&self, id: Uuid) -> DatabaseResult<Option<VideoRecord>>;

    async fn list_videos_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<VideoRecord>>;

    /// Overwrite the stored record (last writer wins)
    async fn update_video(&self, record: &VideoRecord) -> DatabaseResult<()>;
}
