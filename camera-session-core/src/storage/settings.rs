use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::error::CameraError;
use crate::traits::collaborators::{PickedImage, SettingsStore};

const MIN_SCALE: f64 = 0.1;
const MAX_SCALE: f64 = 10.0;

/// Placement of the reference image over the camera feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub image_path: Option<PathBuf>,
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
    pub opacity: f64,
    pub rotation_degrees: f64,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            image_path: None,
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
            opacity: 0.5,
            rotation_degrees: 0.0,
        }
    }
}

impl OverlaySettings {
    /// Bring every field back into its valid range. Non-finite values fall
    /// back to their defaults.
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        Self {
            offset_x: finite_or(self.offset_x, defaults.offset_x),
            offset_y: finite_or(self.offset_y, defaults.offset_y),
            scale: finite_or(self.scale, defaults.scale).clamp(MIN_SCALE, MAX_SCALE),
            opacity: finite_or(self.opacity, defaults.opacity).clamp(0.0, 1.0),
            rotation_degrees: finite_or(self.rotation_degrees, 0.0).rem_euclid(360.0),
            image_path: self.image_path,
        }
    }

    /// Switch to a newly picked image, resetting the transform.
    pub fn with_image(self, image: &PickedImage) -> Self {
        Self {
            image_path: Some(image.file.clone()),
            opacity: self.opacity,
            ..Self::default()
        }
    }
}

/// [`SettingsStore`] backed by a pretty-printed JSON file.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<OverlaySettings, CameraError> {
        if !self.path.exists() {
            return Ok(OverlaySettings::default());
        }
        let json = fs::read_to_string(&self.path)
            .map_err(|e| CameraError::Storage(format!("failed to read settings: {}", e)))?;
        let settings: OverlaySettings = serde_json::from_str(&json)
            .map_err(|e| CameraError::Storage(format!("failed to parse settings: {}", e)))?;
        Ok(settings.clamped())
    }

    fn save(&self, settings: &OverlaySettings) -> Result<(), CameraError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CameraError::Storage(format!("failed to create directory: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(&settings.clone().clamped())
            .map_err(|e| CameraError::Storage(format!("failed to serialize settings: {}", e)))?;

        // Write-then-rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| CameraError::Storage(format!("failed to write settings: {}", e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| CameraError::Storage(format!("failed to replace settings: {}", e)))?;
        Ok(())
    }
}
