//! Parsing of ffprobe stream output
//!
//! The prober asks ffprobe for the primary video stream as JSON and turns
//! the result into a [`VideoGeometry`]. The payload is always validated,
//! even when the tool exited successfully: a failing ffprobe can still
//! print an empty or partial document.

use crate::aspect::Orientation;
use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;

/// Width and height of the primary video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
}

impl VideoGeometry {
    pub fn orientation(&self) -> Orientation {
        Orientation::classify(self.width, self.height)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Arguments selecting JSON output for the first video stream of `path`
pub fn probe_args(path: &Path) -> Vec<&OsStr> {
    vec![
        OsStr::new("-v"),
        OsStr::new("error"),
        OsStr::new("-print_format"),
        OsStr::new("json"),
        OsStr::new("-select_streams"),
        OsStr::new("v:0"),
        OsStr::new("-show_streams"),
        path.as_os_str(),
    ]
}

/// Parse ffprobe JSON output into the geometry of the primary video stream
pub fn parse_probe_output(stdout: &[u8]) -> Result<VideoGeometry, ProbeError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)?;

    let stream = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .or_else(|| output.streams.first())
        .ok_or(ProbeError::NoStreams)?;

    let width = stream.width.unwrap_or(0);
    let height = stream.height.unwrap_or(0);

    if width == 0 || height == 0 {
        return Err(ProbeError::ZeroDimensions { width, height });
    }

    Ok(VideoGeometry { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extracts_video_stream() {
        let json = br#"{
            "streams": [
                {
                    "index": 0,
                    "codec_name": "h264",
                    "codec_type": "video",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "30/1"
                }
            ]
        }"#;

        let geometry = parse_probe_output(json).unwrap();
        assert_eq!(
            geometry,
            VideoGeometry {
                width: 1920,
                height: 1080
            }
        );
        assert_eq!(geometry.orientation(), Orientation::Landscape);
    }

    #[test]
    fn test_parse_prefers_video_over_audio() {
        let json = br#"{
            "streams": [
                { "codec_type": "audio", "sample_rate": "48000" },
                { "codec_type": "video", "width": 1080, "height": 1920 }
            ]
        }"#;

        let geometry = parse_probe_output(json).unwrap();
        assert_eq!(geometry.orientation(), Orientation::Portrait);
    }

    #[test]
    fn test_parse_empty_stream_list() {
        let err = parse_probe_output(br#"{"streams": []}"#).unwrap_err();
        assert!(matches!(err, ProbeError::NoStreams));
    }

    #[test]
    fn test_parse_missing_streams_key() {
        let err = parse_probe_output(b"{}").unwrap_err();
        assert!(matches!(err, ProbeError::NoStreams));
    }

    #[test]
    fn test_parse_empty_output() {
        let err = parse_probe_output(b"").unwrap_err();
        assert!(matches!(err, ProbeError::MalformedOutput(_)));
    }

    #[test]
    fn test_parse_garbage_output() {
        let err = parse_probe_output(b"Invalid data found when processing input").unwrap_err();
        assert!(matches!(err, ProbeError::MalformedOutput(_)));
    }

    #[test]
    fn test_parse_zero_dimensions() {
        let err = parse_probe_output(br#"{"streams": [{"codec_type": "video", "width": 0, "height": 720}]}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ProbeError::ZeroDimensions {
                width: 0,
                height: 720
            }
        ));

        let err = parse_probe_output(br#"{"streams": [{"codec_type": "video"}]}"#).unwrap_err();
        assert!(matches!(err, ProbeError::ZeroDimensions { .. }));
    }

    #[test]
    fn test_probe_args_end_with_path() {
        let path = Path::new("/tmp/upload.mp4");
        let args = probe_args(path);
        assert_eq!(args.last(), Some(&path.as_os_str()));
        assert!(args.contains(&OsStr::new("json")));
    }
}
