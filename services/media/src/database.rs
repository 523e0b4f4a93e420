use crate::records::{VideoRecord, VideoRecordStore};
use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, types::Uuid};

const VIDEO_COLUMNS: &str =
    "id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at";

/// PostgreSQL-backed [`VideoRecordStore`]
#[derive(Clone)]
pub struct PgVideoStore {
    pool: PgPool,
}

impl PgVideoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRecordStore for PgVideoStore {
    async fn create_video(&self, record: &VideoRecord) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO videos (id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.thumbnail_url)
        .bind(&record.video_url)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    async fn get_video(&self, id: Uuid) -> DatabaseResult<Option<VideoRecord>> {
        let query = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1");

        sqlx::query_as::<_, VideoRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<VideoRecord>> {
        let query = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE user_id = $1 ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, VideoRecord>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    async fn update_video(&self, record: &VideoRecord) -> DatabaseResult<()> {
        let result = sqlx::query(
            "UPDATE videos
             SET title = $2, description = $3, thumbnail_url = $4, video_url = $5, updated_at = $6
             WHERE id = $1",
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.thumbnail_url)
        .bind(&record.video_url)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::Query(sqlx::Error::RowNotFound));
        }

        Ok(())
    }
}
