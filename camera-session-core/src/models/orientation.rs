use serde::Serialize;

/// Physical orientation of the handheld device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceOrientation {
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
}

/// Orientation applied to the preview connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl From<DeviceOrientation> for CaptureOrientation {
    /// Landscape is cross-wired: the sensor is mounted rotated relative to the
    /// notch axis, so device-left means capture-right. Verify on hardware
    /// before changing.
    fn from(orientation: DeviceOrientation) -> Self {
        match orientation {
            DeviceOrientation::LandscapeLeft => CaptureOrientation::LandscapeRight,
            DeviceOrientation::LandscapeRight => CaptureOrientation::LandscapeLeft,
            DeviceOrientation::PortraitUpsideDown => CaptureOrientation::PortraitUpsideDown,
            DeviceOrientation::Portrait
            | DeviceOrientation::FaceUp
            | DeviceOrientation::FaceDown
            | DeviceOrientation::Unknown => CaptureOrientation::Portrait,
        }
    }
}
