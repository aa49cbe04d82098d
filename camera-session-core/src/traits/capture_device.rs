use std::sync::Arc;

use crate::models::camera_models::{DeviceDescriptor, FrameInfo, FrameRateRange};
use crate::models::error::CameraError;

/// Callback invoked by the video output for every delivered frame.
///
/// Fires on the backend's frame thread. Implementations must return quickly;
/// the core only records arrival time.
pub type FrameCallback = Arc<dyn Fn(FrameInfo) + Send + Sync + 'static>;

/// A physical camera as exposed by the platform backend.
///
/// Implemented by:
/// - `SimCamera` (camera-session-sim)
pub trait CaptureDevice: Send + Sync {
    fn descriptor(&self) -> DeviceDescriptor;

    /// False once the device has been unplugged or disabled by the OS.
    fn is_connected(&self) -> bool;

    /// Whether the device currently provides video media.
    fn has_video(&self) -> bool;

    /// Frame-rate ranges of the active format.
    fn frame_rate_ranges(&self) -> Vec<FrameRateRange>;

    /// Take the exclusive configuration lock.
    ///
    /// Fails with [`CameraError::DeviceLocked`] when another process holds
    /// the device. Every successful call must be paired with
    /// [`unlock_for_configuration`](Self::unlock_for_configuration).
    fn lock_for_configuration(&self) -> Result<(), CameraError>;

    fn unlock_for_configuration(&self);

    /// Apply a frame-rate range. Requires the configuration lock.
    fn set_active_frame_rate(&self, range: FrameRateRange) -> Result<(), CameraError>;
}
