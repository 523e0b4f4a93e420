//! Orientation classification from video geometry

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse orientation of a video, used to partition object keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// 16:9
    Landscape,
    /// 9:16
    Portrait,
    Other,
}

impl Orientation {
    /// Classify a width/height pair.
    ///
    /// Zero heights are rejected by the prober; they classify as `Other` here.
    pub fn classify(width: u32, height: u32) -> Self {
        if height == 0 {
            return Orientation::Other;
        }

        Self::from_ratio(f64::from(width) / f64::from(height))
    }

    /// Classify a width/height ratio after truncating it to three decimals.
    ///
    /// Truncation floors, so 1.7779 and 1.7774 both match 16:9 (1.777)
    /// while 1.7765 does not.
    pub fn from_ratio(ratio: f64) -> Self {
        let truncated = truncate_millis(ratio);

        if truncated == truncate_millis(16.0 / 9.0) {
            Orientation::Landscape
        } else if truncated == truncate_millis(9.0 / 16.0) {
            Orientation::Portrait
        } else {
            Orientation::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `floor(ratio * 1000)`, i.e. the ratio truncated to three decimals, in thousandths
fn truncate_millis(ratio: f64) -> i64 {
    (ratio * 1000.0).floor() as i64
}
