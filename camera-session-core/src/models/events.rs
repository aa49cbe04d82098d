use super::camera_models::PreviewId;
use super::state::InterruptionReason;

/// App-lifecycle and OS notifications consumed by the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    DidEnterBackground,
    WillEnterForeground,
    SessionInterrupted(InterruptionReason),
    InterruptionEnded,
    /// The backend reported a runtime error while capturing.
    RuntimeError(String),
    /// The host view tore down its preview surface.
    PreviewReleased(PreviewId),
}
