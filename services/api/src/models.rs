//! API models for request and response payloads

use media::VideoRecord;
use serde::{Deserialize, Serialize};

/// Request for creating a video record
#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Response listing the caller's videos
#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub items: Vec<VideoRecord>,
    pub total: usize,
}
