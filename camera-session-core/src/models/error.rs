use thiserror::Error;

/// Errors surfaced by the camera session core.
///
/// Every variant is recoverable in the sense that the service always returns
/// to a nameable [`LifecycleState`](super::state::LifecycleState); none of
/// them abort the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("no camera device available")]
    CameraUnavailable,

    #[error("capture session rejected the device input")]
    CannotAddInput,

    #[error("capture session rejected the video output")]
    CannotAddOutput,

    #[error("failed to create capture input: {0}")]
    CreateCaptureInput(String),

    #[error("camera access denied")]
    DeniedAuthorization,

    #[error("camera access restricted")]
    RestrictedAuthorization,

    #[error("camera authorization state unknown")]
    UnknownAuthorization,

    #[error("capture session failed to start")]
    SessionStartFailed,

    #[error("device unresponsive")]
    DeviceUnresponsive,

    #[error("capture session configuration failed")]
    ConfigurationFailed,

    #[error("camera is in use by another process")]
    DeviceLocked,

    #[error("no video signal")]
    NoVideoSignal,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CameraError {
    /// Permission errors need the user to visit system settings; they are
    /// never retried automatically.
    pub fn is_permission_error(&self) -> bool {
        matches!(
            self,
            Self::DeniedAuthorization | Self::RestrictedAuthorization | Self::UnknownAuthorization
        )
    }

    /// Whether the lifecycle controller may retry the failed step locally.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CameraUnavailable
                | Self::CannotAddInput
                | Self::CannotAddOutput
                | Self::CreateCaptureInput(_)
                | Self::SessionStartFailed
                | Self::ConfigurationFailed
                | Self::DeviceLocked
                | Self::NoVideoSignal
        )
    }

    /// Short call-to-action the UI can show next to the error banner.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::DeniedAuthorization | Self::RestrictedAuthorization => {
                "Open Settings > Privacy > Camera and allow access"
            }
            Self::UnknownAuthorization => "Restart the app and try again",
            Self::DeviceLocked => "Close other apps that are using the camera",
            Self::DeviceUnresponsive => "The app is busy, wait a moment",
            _ => "Tap refresh to restart the camera",
        }
    }
}
