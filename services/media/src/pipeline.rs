//! Ingestion orchestrator
//!
//! Sequences one upload through validation, staging, probing, classification,
//! fast-start remuxing, key generation, storage upload and the metadata
//! update. Both staged files are owned by [`StagedFile`] guards scoped to
//! [`IngestPipeline::ingest`], so they are removed on every exit path.

use crate::aspect::Orientation;
use crate::error::{ProbeError, RemuxError, UploadError};
use crate::keys;
use crate::records::{VideoRecord, VideoRecordStore};
use crate::remux;
use crate::staging::{self, StagedFile, StagingError};
use crate::storage::{ObjectReference, ObjectStorage};
use crate::tools::MediaTools;
use chrono::Utc;
use common::config::AppConfig;
use common::error::DatabaseError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

/// The only media type accepted for upload
pub const SUPPORTED_MEDIA_TYPE: &str = "video/mp4";

/// Steps of an ingestion, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Validating,
    Staging,
    Probing,
    Classifying,
    Remuxing,
    KeyGen,
    Uploading,
    MetadataSync,
    Done,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Validating => "validating",
            IngestStage::Staging => "staging",
            IngestStage::Probing => "probing",
            IngestStage::Classifying => "classifying",
            IngestStage::Remuxing => "remuxing",
            IngestStage::KeyGen => "key_gen",
            IngestStage::Uploading => "uploading",
            IngestStage::MetadataSync => "metadata_sync",
            IngestStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Request rejected before any file is written
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("video {0} not found")]
    NotFound(Uuid),

    #[error("caller does not own this video")]
    NotOwner,

    #[error("unsupported media type {0:?}, expected {SUPPORTED_MEDIA_TYPE}")]
    UnsupportedMediaType(String),
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to load video record: {0}")]
    Lookup(#[source] DatabaseError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error("failed to probe upload: {0}")]
    Probe(#[from] ProbeError),

    #[error("failed to remux upload: {0}")]
    Remux(#[from] RemuxError),

    #[error("failed to store video: {0}")]
    Upload(#[from] UploadError),

    /// The object is already stored; the record still points at the previous one
    #[error("video stored but record update failed: {0}")]
    MetadataSync(#[source] DatabaseError),
}

impl IngestError {
    /// The stage at which the ingestion stopped
    pub fn stage(&self) -> IngestStage {
        match self {
            IngestError::Validation(_) | IngestError::Lookup(_) => IngestStage::Validating,
            IngestError::Staging(_) => IngestStage::Staging,
            IngestError::Probe(_) => IngestStage::Probing,
            IngestError::Remux(_) => IngestStage::Remuxing,
            IngestError::Upload(_) => IngestStage::Uploading,
            IngestError::MetadataSync(_) => IngestStage::MetadataSync,
        }
    }
}

/// One upload to ingest
pub struct UploadRequest<R> {
    pub video_id: Uuid,
    /// Authenticated caller
    pub user_id: Uuid,
    /// Declared content type of the uploaded body
    pub content_type: String,
    pub body: R,
}

/// Result of a successful ingestion
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// The record as persisted, `video_url` holding the `bucket,key` reference
    pub record: VideoRecord,
    pub object: ObjectReference,
    pub orientation: Orientation,
    /// Size of the stored object
    pub bytes: u64,
}

/// Immutable settings for the pipeline
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub bucket: String,
    pub staging_dir: PathBuf,
    pub max_upload_bytes: u64,
}

impl IngestSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            bucket: config.storage.bucket.clone(),
            staging_dir: config.media.staging_dir(),
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }
}

/// Parse a declared content type down to its lowercase `type/subtype`
pub fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[derive(Clone)]
pub struct IngestPipeline {
    tools: Arc<dyn MediaTools>,
    storage: Arc<dyn ObjectStorage>,
    records: Arc<dyn VideoRecordStore>,
    settings: IngestSettings,
}

impl IngestPipeline {
    pub fn new(
        tools: Arc<dyn MediaTools>,
        storage: Arc<dyn ObjectStorage>,
        records: Arc<dyn VideoRecordStore>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            tools,
            storage,
            records,
            settings,
        }
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Check that `user_id` may upload to `video_id` as `content_type`.
    ///
    /// Touches no files; returns the current record.
    pub async fn validate(
        &self,
        video_id: Uuid,
        user_id: Uuid,
        content_type: &str,
    ) -> Result<VideoRecord, IngestError> {
        let record = self
            .records
            .get_video(video_id)
            .await
            .map_err(IngestError::Lookup)?
            .ok_or(ValidationError::NotFound(video_id))?;

        if record.user_id != user_id {
            return Err(ValidationError::NotOwner.into());
        }

        let media_type = media_type_essence(content_type);
        if media_type != SUPPORTED_MEDIA_TYPE {
            return Err(ValidationError::UnsupportedMediaType(content_type.to_string()).into());
        }

        Ok(record)
    }

    /// Run one upload through the whole pipeline
    pub async fn ingest<R>(&self, request: UploadRequest<R>) -> Result<IngestOutcome, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let span = info_span!(
            "ingest",
            video_id = %request.video_id,
            user_id = %request.user_id
        );

        async move {
            match self.run(request).await {
                Ok(outcome) => {
                    info!(
                        key = %outcome.object.key,
                        orientation = %outcome.orientation,
                        bytes = outcome.bytes,
                        "Video ingested"
                    );
                    Ok(outcome)
                }
                Err(e) => {
                    error!(stage = %e.stage(), error = %e, "Video ingestion failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run<R>(&self, request: UploadRequest<R>) -> Result<IngestOutcome, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        debug!(stage = %IngestStage::Validating, "Ingest stage");
        let mut record = self
            .validate(request.video_id, request.user_id, &request.content_type)
            .await?;

        debug!(stage = %IngestStage::Staging, "Ingest stage");
        let (raw, _) = staging::stage_upload(
            &self.settings.staging_dir,
            request.body,
            self.settings.max_upload_bytes,
        )
        .await?;

        debug!(stage = %IngestStage::Probing, "Ingest stage");
        let geometry = self.tools.probe(raw.path()).await?;

        debug!(stage = %IngestStage::Classifying, "Ingest stage");
        let orientation = geometry.orientation();

        debug!(stage = %IngestStage::Remuxing, "Ingest stage");
        let processed = StagedFile::claim(remux::fast_start_path(raw.path()));
        self.tools
            .remux_fast_start(raw.path(), processed.path())
            .await?;

        debug!(stage = %IngestStage::KeyGen, "Ingest stage");
        let object = ObjectReference::new(
            self.settings.bucket.clone(),
            keys::generate_object_key(orientation, SUPPORTED_MEDIA_TYPE),
        );

        debug!(stage = %IngestStage::Uploading, "Ingest stage");
        let bytes = self
            .storage
            .put_object(&object, processed.path(), SUPPORTED_MEDIA_TYPE)
            .await?;

        debug!(stage = %IngestStage::MetadataSync, "Ingest stage");
        record.video_url = Some(object.to_string());
        record.updated_at = Utc::now();
        self.records
            .update_video(&record)
            .await
            .map_err(IngestError::MetadataSync)?;

        debug!(stage = %IngestStage::Done, "Ingest stage");
        Ok(IngestOutcome {
            record,
            object,
            orientation,
            bytes,
        })
    }
}
