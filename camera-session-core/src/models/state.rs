use std::fmt;

use serde::Serialize;

/// Why the OS took the camera away from a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionReason {
    /// Another app claimed the camera (e.g. a video call).
    DeviceInUseByAnotherClient,
    /// The app is running in a multitasking layout that disallows capture.
    VideoDeviceNotAvailableWithMultipleForegroundApps,
    /// System pressure (thermal or power) forced the device off.
    SystemPressure,
    Unknown,
}

/// Why a running session was declared unhealthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// The backend reported a runtime error.
    RuntimeError(String),
    /// The health monitor crossed its consecutive-failure threshold.
    HealthCheckFailed,
    /// The session was running but never delivered a frame.
    NoFrames,
    /// Starting failed after the retry.
    StartFailed,
    /// An explicit refresh was requested.
    Refresh,
}

/// Lifecycle state machine.
///
/// ```text
/// idle → authorizing → configuring → starting → verifying → running
///                          ↑                                   ↓
///                      resetting ← ─ ─ ─ ─ ─ ─ ─ ─ interrupted / degraded
///
/// permission_denied        (terminal until the user changes settings)
/// configuration_failed     (waits for the next external trigger)
/// suspended / stopped      (backgrounded / explicitly stopped)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "detail")]
pub enum LifecycleState {
    Idle,
    Authorizing,
    Configuring,
    Starting,
    Verifying,
    Running,
    Interrupted(InterruptionReason),
    Degraded(DegradedReason),
    Resetting,
    Suspended,
    Stopped,
    ConfigurationFailed,
    PermissionDenied,
}

impl LifecycleState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// States in which the pipeline is actively working towards `Running`.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Authorizing | Self::Configuring | Self::Starting | Self::Verifying | Self::Resetting
        )
    }

    /// Resting states from which an external trigger restarts the pipeline.
    pub fn is_resting(&self) -> bool {
        matches!(
            self,
            Self::Idle | Self::Suspended | Self::Stopped | Self::ConfigurationFailed
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Authorizing => "authorizing",
            Self::Configuring => "configuring",
            Self::Starting => "starting",
            Self::Verifying => "verifying",
            Self::Running => "running",
            Self::Interrupted(_) => "interrupted",
            Self::Degraded(_) => "degraded",
            Self::Resetting => "resetting",
            Self::Suspended => "suspended",
            Self::Stopped => "stopped",
            Self::ConfigurationFailed => "configuration_failed",
            Self::PermissionDenied => "permission_denied",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted(reason) => write!(f, "interrupted ({:?})", reason),
            Self::Degraded(reason) => write!(f, "degraded ({:?})", reason),
            other => f.write_str(other.name()),
        }
    }
}
