use crate::models::error::CameraError;
use crate::models::state::LifecycleState;

/// Event delegate for camera service notifications.
///
/// All methods are called from the session queue, not the UI thread.
/// Implementations should marshal to the UI thread if needed.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the lifecycle state changes.
    fn on_state_changed(&self, state: &LifecycleState);

    /// Called when an error is published to the `last_error` slot.
    fn on_error(&self, error: &CameraError);

    /// Called when the `last_error` slot is cleared.
    fn on_error_cleared(&self) {}

    fn on_running_changed(&self, _is_running: bool) {}

    fn on_authorization_changed(&self, _is_authorized: bool) {}
}
