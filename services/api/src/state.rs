//! Application state shared across handlers

use std::sync::Arc;

use common::config::AppConfig;
use media::{
    IngestPipeline, IngestSettings, MediaTools, ObjectStorage, SignedUrlIssuer, VideoRecordStore,
};

use crate::middleware::JwtVerifier;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: IngestPipeline,
    pub records: Arc<dyn VideoRecordStore>,
    pub signer: SignedUrlIssuer,
    pub jwt: Arc<JwtVerifier>,
    /// Request body ceiling for uploads
    pub max_upload_bytes: u64,
}

impl AppState {
    /// Wire the pipeline and signer from `config` around the given collaborators
    pub fn new(
        config: &AppConfig,
        tools: Arc<dyn MediaTools>,
        storage: Arc<dyn ObjectStorage>,
        records: Arc<dyn VideoRecordStore>,
        jwt: JwtVerifier,
    ) -> Self {
        let pipeline = IngestPipeline::new(
            tools,
            storage.clone(),
            records.clone(),
            IngestSettings::from_config(config),
        );
        let signer = SignedUrlIssuer::new(storage, config.storage.presign_ttl());

        Self {
            pipeline,
            records,
            signer,
            jwt: Arc::new(jwt),
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }
}
