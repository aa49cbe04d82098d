//! # camera-session-core
//!
//! Platform-agnostic camera session lifecycle manager.
//!
//! Acquires camera permission, builds the capture graph, starts and verifies
//! the session, polls its health and recovers from interruptions, contention
//! and configuration races. Platform backends implement the `CaptureSession`
//! and `CaptureDevice` traits and plug into the generic `CameraService`.
//!
//! ## Architecture
//!
//! ```text
//! camera-session-core (this crate)
//! ├── traits/       ← CaptureSession, CaptureDevice, CaptureDelegate, CameraAuthorizer, HostSurface, UiDispatcher
//! ├── models/       ← CameraError, LifecycleState, SessionConfiguration, HealthSnapshot, StatusReport, etc.
//! ├── processing/   ← FrameClock (frame arrival and staleness)
//! ├── session/      ← LifecycleController, Configurator, HealthMonitor, PermissionGate, PreviewBinder, CameraService
//! └── storage/      ← JSON overlay settings store
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::authorization::AuthorizationState;
pub use models::camera_models::{
    DeviceDescriptor, DevicePosition, DeviceType, FrameInfo, FrameRateRange, PixelFormat, PreviewId, Rect,
    SessionPreset, VideoOutputSettings,
};
pub use models::config::SessionConfiguration;
pub use models::error::CameraError;
pub use models::events::LifecycleEvent;
pub use models::health::{HealthIssue, HealthSnapshot};
pub use models::orientation::{CaptureOrientation, DeviceOrientation};
pub use models::state::{DegradedReason, InterruptionReason, LifecycleState};
pub use models::status::StatusReport;
pub use processing::frame_clock::FrameClock;
pub use session::command::LifecycleNotifier;
pub use session::controller::LifecycleController;
pub use session::preview_binder::PreviewSurface;
pub use session::service::CameraService;
pub use storage::settings::{JsonSettingsStore, OverlaySettings};
pub use traits::authorizer::{AuthorizationCallback, CameraAuthorizer};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::capture_device::{CaptureDevice, FrameCallback};
pub use traits::capture_session::{CaptureSession, DeviceInput, VideoOutput};
pub use traits::collaborators::{ImagePicker, PickedImage, SettingsStore};
pub use traits::dispatch::{InlineDispatcher, Job, ResponsivenessProbe, UiDispatcher};
pub use traits::host_surface::{HostSurface, PreviewLink};
