//! Request-local temporary files
//!
//! A [`StagedFile`] owns a path on disk and removes it when dropped, so every
//! exit from the ingestion pipeline (success, `?` propagation, panic unwind or
//! a dropped request future) releases its files. Removal failures are logged
//! and never replace the error that caused the exit.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

const STAGED_PREFIX: &str = "tubely-upload-";
const STAGED_SUFFIX: &str = ".mp4";

/// Failure while writing an upload to disk
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("upload exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("failed to stage upload: {0}")]
    Io(#[from] io::Error),
}

/// A file that is deleted when this guard goes out of scope
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    /// Create a new, uniquely named empty file in `dir`
    pub async fn create_in(dir: &Path) -> io::Result<(Self, File)> {
        let (file, path) = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(STAGED_SUFFIX)
            .tempfile_in(dir)?
            .keep()
            .map_err(|e| e.error)?;

        Ok((Self { path }, File::from_std(file)))
    }

    /// Take ownership of `path` for cleanup; the file need not exist yet
    pub fn claim(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed staged file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staged file"
            ),
        }
    }
}

/// Write `body` to a new staged file in `dir`, failing once it exceeds `limit` bytes.
///
/// Returns the staged file and the number of bytes written.
pub async fn stage_upload<R>(
    dir: &Path,
    body: R,
    limit: u64,
) -> Result<(StagedFile, u64), StagingError>
where
    R: AsyncRead + Unpin,
{
    let (staged, file) = StagedFile::create_in(dir).await?;
    let mut writer = BufWriter::new(file);

    // One byte past the limit is enough to tell an oversized body apart.
    let mut body = body.take(limit.saturating_add(1));
    let written = tokio::io::copy(&mut body, &mut writer).await?;

    if written > limit {
        return Err(StagingError::TooLarge { limit });
    }

    writer.flush().await?;
    writer.into_inner().sync_all().await?;

    debug!(path = %staged.path().display(), bytes = written, "Staged upload");

    Ok((staged, written))
}
