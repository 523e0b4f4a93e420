//! Fast-start remux arguments and output naming
//!
//! Uploaded MP4 files usually carry their `moov` index at the end, so a
//! player has to fetch the whole object before it can start. Remuxing with
//! `-movflags faststart` moves the index in front of the media data. Streams
//! are copied, never re-encoded.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Suffix appended to the staged upload path for the remuxed copy
pub const PROCESSING_SUFFIX: &str = ".processing";

/// `<input>.processing`
pub fn fast_start_path(input: &Path) -> PathBuf {
    let mut path = OsString::from(input.as_os_str());
    path.push(PROCESSING_SUFFIX);
    PathBuf::from(path)
}

/// ffmpeg arguments for a stream-copy remux of `input` into `output`
pub fn fast_start_args<'a>(input: &'a Path, output: &'a Path) -> Vec<&'a OsStr> {
    vec![
        OsStr::new("-nostdin"),
        OsStr::new("-v"),
        OsStr::new("error"),
        OsStr::new("-i"),
        input.as_os_str(),
        OsStr::new("-c"),
        OsStr::new("copy"),
        OsStr::new("-movflags"),
        OsStr::new("faststart"),
        OsStr::new("-f"),
        OsStr::new("mp4"),
        output.as_os_str(),
    ]
}
