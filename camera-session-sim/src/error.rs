use thiserror::Error;

use camera_session_core::models::error::CameraError;

/// Failures of the simulated backend's own machinery.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("image file not found: {0}")]
    ImageMissing(String),
}

impl From<SimError> for CameraError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::ImageMissing(path) => CameraError::Storage(format!("image file not found: {}", path)),
            other => CameraError::Internal(other.to_string()),
        }
    }
}
