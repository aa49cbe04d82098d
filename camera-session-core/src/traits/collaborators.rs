use std::path::PathBuf;

use crate::models::error::CameraError;
use crate::storage::settings::OverlaySettings;

/// Persists the overlay placement between launches.
pub trait SettingsStore: Send + Sync {
    /// Load settings, falling back to defaults when nothing was saved yet.
    fn load(&self) -> Result<OverlaySettings, CameraError>;

    fn save(&self, settings: &OverlaySettings) -> Result<(), CameraError>;
}

/// An image chosen by the user, copied to a durable on-device location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedImage {
    pub file: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Presents the image picker.
pub trait ImagePicker: Send + Sync {
    /// `Ok(None)` when the user cancelled.
    fn pick(&self) -> Result<Option<PickedImage>, CameraError>;
}
