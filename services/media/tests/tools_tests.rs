//! FfmpegTools against stand-in executables.
//!
//! Each test writes small shell scripts that behave like ffprobe/ffmpeg so the
//! subprocess handling can be exercised without the real tools installed.
//! Tests run serially: a script still open for writing in one test thread
//! while another forks fails to exec with ETXTBSY.

#![cfg(unix)]

use media::MediaTools;
use media::error::{ProbeError, RemuxError, ToolError};
use media::probe::VideoGeometry;
use media::remux::fast_start_path;
use media::tools::FfmpegTools;
use serial_test::serial;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(10);

fn script(dir: &Path, name: &str, body: &str) -> String {
    let path: PathBuf = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

fn probe_printing(dir: &Path, json: &str) -> FfmpegTools {
    let ffprobe = script(dir, "ffprobe", &format!("cat <<'JSON'\n{json}\nJSON"));
    FfmpegTools::new(ffprobe, "ffmpeg".to_string(), TIMEOUT)
}

/// An ffmpeg stand-in that copies the `-i` input to the last argument
fn copying_ffmpeg(dir: &Path) -> String {
    script(
        dir,
        "ffmpeg",
        r#"input=""
while [ $# -gt 1 ]; do
  if [ "$1" = "-i" ]; then input="$2"; fi
  shift
done
cp "$input" "$1""#,
    )
}

fn staged_video(dir: &Path) -> PathBuf {
    let path = dir.join("tubely-upload-test.mp4");
    std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42 not really").unwrap();
    path
}

#[tokio::test]
#[serial]
async fn test_probe_reads_geometry() {
    let dir = TempDir::new().unwrap();
    let tools = probe_printing(
        dir.path(),
        r#"{"streams":[{"index":0,"codec_type":"video","width":1080,"height":1920}]}"#,
    );

    let geometry = tools.probe(&staged_video(dir.path())).await.unwrap();

    assert_eq!(
        geometry,
        VideoGeometry {
            width: 1080,
            height: 1920
        }
    );
}

#[tokio::test]
#[serial]
async fn test_probe_validates_output_of_successful_run() {
    let dir = TempDir::new().unwrap();
    let tools = probe_printing(dir.path(), r#"{"streams":[]}"#);

    let err = tools.probe(&staged_video(dir.path())).await.unwrap_err();
    assert!(matches!(err, ProbeError::NoStreams));
}

#[tokio::test]
#[serial]
async fn test_probe_rejects_non_json_output() {
    let dir = TempDir::new().unwrap();
    let tools = probe_printing(dir.path(), "moov atom not found");

    let err = tools.probe(&staged_video(dir.path())).await.unwrap_err();
    assert!(matches!(err, ProbeError::MalformedOutput(_)));
}

#[tokio::test]
#[serial]
async fn test_probe_reports_failed_process() {
    let dir = TempDir::new().unwrap();
    let ffprobe = script(
        dir.path(),
        "ffprobe",
        "echo 'Invalid data found when processing input' >&2\nexit 1",
    );
    let tools = FfmpegTools::new(ffprobe, "ffmpeg".to_string(), TIMEOUT);

    let err = tools.probe(&staged_video(dir.path())).await.unwrap_err();

    match err {
        ProbeError::Tool(ToolError::Failed { code, stderr, .. }) => {
            assert_eq!(code, Some(1));
            assert!(stderr.contains("Invalid data"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
#[serial]
async fn test_probe_hung_tool_is_killed() {
    let dir = TempDir::new().unwrap();
    let ffprobe = script(dir.path(), "ffprobe", "sleep 30");
    let tools = FfmpegTools::new(ffprobe, "ffmpeg".to_string(), Duration::from_millis(200));

    let err = tools.probe(&staged_video(dir.path())).await.unwrap_err();
    assert!(matches!(err, ProbeError::Tool(ToolError::TimedOut { .. })));
}

#[tokio::test]
#[serial]
async fn test_remux_writes_processing_copy() {
    let dir = TempDir::new().unwrap();
    let tools = FfmpegTools::new("ffprobe".to_string(), copying_ffmpeg(dir.path()), TIMEOUT);
    let input = staged_video(dir.path());
    let output = fast_start_path(&input);

    tools.remux_fast_start(&input, &output).await.unwrap();

    assert_eq!(
        std::fs::read(&output).unwrap(),
        std::fs::read(&input).unwrap()
    );
    assert!(output.to_string_lossy().ends_with(".mp4.processing"));
}

#[tokio::test]
#[serial]
async fn test_remux_without_output_is_an_error() {
    let dir = TempDir::new().unwrap();
    let ffmpeg = script(dir.path(), "ffmpeg", "exit 0");
    let tools = FfmpegTools::new("ffprobe".to_string(), ffmpeg, TIMEOUT);
    let input = staged_video(dir.path());

    let err = tools
        .remux_fast_start(&input, &fast_start_path(&input))
        .await
        .unwrap_err();
    assert!(matches!(err, RemuxError::MissingOutput(_)));
}

#[tokio::test]
#[serial]
async fn test_remux_failure_reports_stderr() {
    let dir = TempDir::new().unwrap();
    let ffmpeg = script(
        dir.path(),
        "ffmpeg",
        "echo 'Error opening input file' >&2\nexit 1",
    );
    let tools = FfmpegTools::new("ffprobe".to_string(), ffmpeg, TIMEOUT);
    let input = staged_video(dir.path());

    let err = tools
        .remux_fast_start(&input, &fast_start_path(&input))
        .await
        .unwrap_err();

    match err {
        RemuxError::Tool(ToolError::Failed { stderr, .. }) => {
            assert_eq!(stderr, "Error opening input file");
        }
        other => panic!("unexpected error: {other}"),
    }
}
