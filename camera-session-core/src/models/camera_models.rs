use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physical camera module type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    UltraWide,
    WideAngle,
    Telephoto,
    External,
}

/// Which side of the device the camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePosition {
    Back,
    Front,
    Unspecified,
}

/// Static description of a camera device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    pub unique_id: String,
    pub name: String,
    pub device_type: DeviceType,
    pub position: DevicePosition,
}

/// A supported frame-rate range of a device format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameRateRange {
    pub min_fps: f64,
    pub max_fps: f64,
}

impl FrameRateRange {
    pub fn new(min_fps: f64, max_fps: f64) -> Self {
        Self { min_fps, max_fps }
    }

    /// Picks the range with the highest maximum rate.
    pub fn highest(ranges: &[FrameRateRange]) -> Option<FrameRateRange> {
        ranges
            .iter()
            .copied()
            .filter(|r| r.max_fps > 0.0)
            .max_by(|a, b| a.max_fps.total_cmp(&b.max_fps))
    }
}

/// Pixel format delivered by the video output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Bgra32,
    Nv12,
    Yuyv,
}

/// Capture quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPreset {
    High,
    Medium,
    Hd1280x720,
    Hd1920x1080,
}

/// Fixed settings of the single video data output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoOutputSettings {
    pub pixel_format: PixelFormat,
    /// Late frames are dropped instead of queued; the newest frame always wins.
    pub discards_late_frames: bool,
}

/// Metadata of a delivered frame. Pixel data never reaches the core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub timestamp_secs: f64,
}

/// Rectangle in host-surface points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Identity of a preview surface attached to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PreviewId(Uuid);

impl PreviewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PreviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
