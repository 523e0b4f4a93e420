//! External media tools
//!
//! [`MediaTools`] is the seam between the ingestion pipeline and the
//! ffprobe/ffmpeg binaries. [`FfmpegTools`] runs the real executables with a
//! bounded wait; tests use the fakes in `crate::testing`.

use crate::error::{ProbeError, RemuxError, ToolError};
use crate::probe::{self, VideoGeometry};
use crate::remux;
use async_trait::async_trait;
use common::config::MediaConfig;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Inspection and remuxing of staged video files
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Read the geometry of the primary video stream in `path`
    async fn probe(&self, path: &Path) -> Result<VideoGeometry, ProbeError>;

    /// Write a fast-start copy of `input` to `output`, leaving `input` untouched
    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), RemuxError>;
}

/// [`MediaTools`] backed by the ffprobe and ffmpeg executables
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffprobe_path: String,
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegTools {
    pub fn new(ffprobe_path: String, ffmpeg_path: String, timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            ffmpeg_path,
            timeout,
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(
            config.ffprobe_path.clone(),
            config.ffmpeg_path.clone(),
            config.tool_timeout(),
        )
    }
}

#[async_trait]
impl MediaTools for FfmpegTools {
    async fn probe(&self, path: &Path) -> Result<VideoGeometry, ProbeError> {
        let output = run_tool(&self.ffprobe_path, &probe::probe_args(path), self.timeout).await?;
        let geometry = probe::parse_probe_output(&output.stdout)?;

        debug!(
            path = %path.display(),
            width = geometry.width,
            height = geometry.height,
            "Probed staged video"
        );

        Ok(geometry)
    }

    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), RemuxError> {
        run_tool(
            &self.ffmpeg_path,
            &remux::fast_start_args(input, output),
            self.timeout,
        )
        .await?;

        if tokio::fs::metadata(output).await.is_err() {
            return Err(RemuxError::MissingOutput(output.to_path_buf()));
        }

        Ok(())
    }
}

/// Run `program` to completion, killing it once `timeout` elapses.
///
/// Stdout and stderr are captured; a non-zero exit is reported as
/// [`ToolError::Failed`] with the trimmed stderr.
pub async fn run_tool(
    program: &str,
    args: &[&OsStr],
    timeout: Duration,
) -> Result<Output, ToolError> {
    let start = Instant::now();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    // Dropping the wait future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| ToolError::Wait {
            program: program.to_string(),
            source,
        })?,
        Err(_) => {
            warn!(
                program,
                timeout_ms = timeout.as_millis() as u64,
                "External tool timed out and was killed"
            );
            return Err(ToolError::TimedOut {
                program: program.to_string(),
                timeout,
            });
        }
    };

    debug!(
        program,
        status = %output.status,
        duration_ms = start.elapsed().as_millis() as u64,
        "External tool finished"
    );

    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}
