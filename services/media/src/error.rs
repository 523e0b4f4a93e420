//! Error types for the media pipeline components

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Process-level failure of an external media tool
#[derive(Error, Debug)]
pub enum ToolError {
    /// The executable could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Waiting for the process or collecting its output failed
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process exceeded its time budget and was killed
    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    /// The process ran but exited unsuccessfully
    #[error("{program} exited with code {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Failure to read the geometry of a staged video
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The probe output was not the expected JSON document
    #[error("malformed probe output: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("probe output contains no streams")]
    NoStreams,

    #[error("invalid stream resolution {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },
}

/// Failure to produce the fast-start copy of a staged video
#[derive(Error, Debug)]
pub enum RemuxError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The tool reported success but wrote nothing
    #[error("remux output missing at {}", .0.display())]
    MissingOutput(PathBuf),
}

/// Failure to store a processed video
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Transport or storage service error
    #[error("storage request failed: {0}")]
    Storage(String),
}

/// Failure to produce a signed read URL
#[derive(Error, Debug)]
pub enum SignError {
    /// A stored reference that cannot be split into bucket and key
    #[error("malformed object reference: {0:?}")]
    MalformedReference(String),

    #[error("invalid signed URL lifetime: {0:?}")]
    InvalidLifetime(Duration),

    #[error("failed to presign request: {0}")]
    Presign(String),
}
