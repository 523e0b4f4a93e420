//! In-memory stand-ins for the pipeline's collaborators
//!
//! Available to this crate's tests and, through the `test-support` feature,
//! to dependants that drive the pipeline without ffmpeg, S3 or PostgreSQL.

use crate::error::{ProbeError, RemuxError, SignError, ToolError, UploadError};
use crate::probe::VideoGeometry;
use crate::records::{VideoRecord, VideoRecordStore};
use crate::storage::{ObjectReference, ObjectStorage};
use crate::tools::MediaTools;
use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// What [`FakeTools::probe`] reports
#[derive(Debug, Clone, Copy)]
pub enum FakeProbe {
    Geometry { width: u32, height: u32 },
    /// The tool ran but listed no streams
    EmptyStreams,
    /// The tool could not be run
    ToolFailure,
}

/// What [`FakeTools::remux_fast_start`] does
#[derive(Debug, Clone, Copy)]
pub enum FakeRemux {
    /// Copy the input to the output unchanged
    Copy,
    /// Fail, optionally after writing part of the output
    Fail { partial_output: bool },
}

/// Scripted [`MediaTools`]
#[derive(Debug)]
pub struct FakeTools {
    probe: FakeProbe,
    remux: FakeRemux,
    probe_calls: AtomicUsize,
    remux_calls: AtomicUsize,
}

impl FakeTools {
    pub fn new(probe: FakeProbe, remux: FakeRemux) -> Self {
        Self {
            probe,
            remux,
            probe_calls: AtomicUsize::new(0),
            remux_calls: AtomicUsize::new(0),
        }
    }

    /// Tools that report `width`x`height` and remux by copying
    pub fn with_geometry(width: u32, height: u32) -> Self {
        Self::new(FakeProbe::Geometry { width, height }, FakeRemux::Copy)
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn remux_calls(&self) -> usize {
        self.remux_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTools for FakeTools {
    async fn probe(&self, _path: &Path) -> Result<VideoGeometry, ProbeError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);

        match self.probe {
            FakeProbe::Geometry { width, height } => Ok(VideoGeometry { width, height }),
            FakeProbe::EmptyStreams => Err(ProbeError::NoStreams),
            FakeProbe::ToolFailure => Err(ProbeError::Tool(ToolError::Failed {
                program: "ffprobe".to_string(),
                code: Some(1),
                stderr: "Invalid data found when processing input".to_string(),
            })),
        }
    }

    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), RemuxError> {
        self.remux_calls.fetch_add(1, Ordering::SeqCst);

        match self.remux {
            FakeRemux::Copy => {
                tokio::fs::copy(input, output)
                    .await
                    .map_err(|source| ToolError::Wait {
                        program: "ffmpeg".to_string(),
                        source,
                    })?;
                Ok(())
            }
            FakeRemux::Fail { partial_output } => {
                if partial_output {
                    let _ = tokio::fs::write(output, b"moov").await;
                }
                Err(RemuxError::Tool(ToolError::Failed {
                    program: "ffmpeg".to_string(),
                    code: Some(1),
                    stderr: "moov atom not found".to_string(),
                }))
            }
        }
    }
}

/// An object held by [`MemoryStorage`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// [`ObjectStorage`] keeping objects in memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<ObjectReference, StoredObject>>,
    fail_puts: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent put fail
    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }

    pub fn get(&self, object: &ObjectReference) -> Option<StoredObject> {
        lock(&self.objects).get(object).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_object(
        &self,
        object: &ObjectReference,
        source: &Path,
        content_type: &str,
    ) -> Result<u64, UploadError> {
        let data = tokio::fs::read(source)
            .await
            .map_err(|source_err| UploadError::Read {
                path: source.to_path_buf(),
                source: source_err,
            })?;

        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(UploadError::Storage("simulated storage outage".to_string()));
        }

        let size = data.len() as u64;
        lock(&self.objects).insert(
            object.clone(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );

        Ok(size)
    }

    async fn presign_get(
        &self,
        object: &ObjectReference,
        expires_in: Duration,
    ) -> Result<String, SignError> {
        Ok(format!(
            "https://{}.storage.test/{}?expires_in={}",
            object.bucket,
            object.key,
            expires_in.as_secs()
        ))
    }
}

/// [`VideoRecordStore`] keeping records in memory
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<Uuid, VideoRecord>>,
    fail_updates: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: VideoRecord) {
        lock(&self.records).insert(record.id, record);
    }

    pub fn get(&self, id: Uuid) -> Option<VideoRecord> {
        lock(&self.records).get(&id).cloned()
    }

    /// Make every subsequent update fail
    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl VideoRecordStore for MemoryRecordStore {
    async fn create_video(&self, record: &VideoRecord) -> DatabaseResult<()> {
        self.insert(record.clone());
        Ok(())
    }

    async fn get_video(&self, id: Uuid) -> DatabaseResult<Option<VideoRecord>> {
        Ok(self.get(id))
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<VideoRecord>> {
        let mut records: Vec<VideoRecord> = lock(&self.records)
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn update_video(&self, record: &VideoRecord) -> DatabaseResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query(sqlx::Error::PoolTimedOut));
        }

        let mut records = lock(&self.records);
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(DatabaseError::Query(sqlx::Error::RowNotFound)),
        }
    }
}
