//! Video ingestion for the Tubely services
//!
//! Uploaded videos are staged to disk, probed for their geometry, classified
//! by orientation, remuxed for fast-start playback and stored under a random
//! key in object storage. Stored objects are later served through
//! short-lived signed URLs.

pub mod aspect;
pub mod database;
pub mod error;
pub mod keys;
pub mod pipeline;
pub mod probe;
pub mod records;
pub mod remux;
pub mod signer;
pub mod staging;
pub mod storage;
pub mod tools;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use aspect::Orientation;
pub use pipeline::{IngestError, IngestOutcome, IngestPipeline, IngestSettings, UploadRequest};
pub use records::{VideoRecord, VideoRecordStore};
pub use signer::{SignedUrl, SignedUrlIssuer};
pub use storage::{ObjectReference, ObjectStorage};
pub use tools::MediaTools;
