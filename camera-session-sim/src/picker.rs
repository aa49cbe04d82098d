//! Image picker that hands back a preconfigured file.

use std::path::PathBuf;

use camera_session_core::models::error::CameraError;
use camera_session_core::traits::collaborators::{ImagePicker, PickedImage};

use crate::error::SimError;

/// Always "picks" the same file, or reports a cancelled picker when none is set.
pub struct FixedImagePicker {
    image: Option<(PathBuf, u32, u32)>,
}

impl FixedImagePicker {
    pub fn new(file: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            image: Some((file.into(), width, height)),
        }
    }

    pub fn cancelled() -> Self {
        Self { image: None }
    }
}

impl ImagePicker for FixedImagePicker {
    fn pick(&self) -> Result<Option<PickedImage>, CameraError> {
        let Some((ref file, width, height)) = self.image else {
            return Ok(None);
        };
        if !file.exists() {
            return Err(SimError::ImageMissing(file.display().to_string()).into());
        }
        Ok(Some(PickedImage {
            file: file.clone(),
            width,
            height,
        }))
    }
}
