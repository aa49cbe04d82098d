use std::time::Duration;

use serde::Serialize;

use super::error::CameraError;

/// One health poll's view of the session. Recomputed every poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub session_running: bool,
    pub has_input: bool,
    pub device_connected: bool,
    pub device_has_video: bool,
    /// `None` when no preview surface is attached.
    pub preview_connection_enabled: Option<bool>,
    /// False when locking the device for configuration failed, i.e. another
    /// process holds it.
    pub device_lockable: bool,
    pub frames_seen: bool,
    pub since_last_frame: Option<Duration>,
}

/// A single reason a poll was classified unhealthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthIssue {
    NotRunning,
    NoInput,
    DeviceDisconnected,
    NoVideoMedia,
    PreviewDisabled,
    LockContention,
    StaleFrames,
}

impl HealthSnapshot {
    pub fn issues(&self, stale_after: Duration) -> Vec<HealthIssue> {
        let mut issues = Vec::new();
        if !self.session_running {
            issues.push(HealthIssue::NotRunning);
        }
        if !self.has_input {
            issues.push(HealthIssue::NoInput);
        } else {
            if !self.device_connected {
                issues.push(HealthIssue::DeviceDisconnected);
            }
            if !self.device_has_video {
                issues.push(HealthIssue::NoVideoMedia);
            }
            if !self.device_lockable {
                issues.push(HealthIssue::LockContention);
            }
        }
        if self.preview_connection_enabled == Some(false) {
            issues.push(HealthIssue::PreviewDisabled);
        }
        // Startup latency: staleness only counts once a frame has arrived.
        if self.frames_seen && self.since_last_frame.is_some_and(|age| age > stale_after) {
            issues.push(HealthIssue::StaleFrames);
        }
        issues
    }

    pub fn is_healthy(&self, stale_after: Duration) -> bool {
        self.issues(stale_after).is_empty()
    }

    /// Error to publish when this snapshot pushes the monitor over its
    /// threshold. Lock contention beats missing frames beats the generic
    /// start failure.
    pub fn best_guess_error(&self, stale_after: Duration) -> CameraError {
        let issues = self.issues(stale_after);
        if issues.contains(&HealthIssue::LockContention) {
            CameraError::DeviceLocked
        } else if !self.frames_seen || issues.contains(&HealthIssue::StaleFrames) {
            CameraError::NoVideoSignal
        } else {
            CameraError::SessionStartFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STALE: Duration = Duration::from_secs(3);

    fn healthy() -> HealthSnapshot {
        HealthSnapshot {
            session_running: true,
            has_input: true,
            device_connected: true,
            device_has_video: true,
            preview_connection_enabled: Some(true),
            device_lockable: true,
            frames_seen: true,
            since_last_frame: Some(Duration::from_millis(30)),
        }
    }

    #[test]
    fn healthy_snapshot_has_no_issues() {
        assert!(healthy().is_healthy(STALE));
    }

    #[test]
    fn no_frames_yet_is_not_stale() {
        let snapshot = HealthSnapshot {
            frames_seen: false,
            since_last_frame: None,
            ..healthy()
        };
        assert!(snapshot.is_healthy(STALE));
    }

    #[test]
    fn old_frame_is_stale() {
        let snapshot = HealthSnapshot {
            since_last_frame: Some(Duration::from_secs(4)),
            ..healthy()
        };
        assert_eq!(snapshot.issues(STALE), vec![HealthIssue::StaleFrames]);
        assert_eq!(snapshot.best_guess_error(STALE), CameraError::NoVideoSignal);
    }

    #[test]
    fn missing_preview_is_ignored() {
        let snapshot = HealthSnapshot {
            preview_connection_enabled: None,
            ..healthy()
        };
        assert!(snapshot.is_healthy(STALE));

        let snapshot = HealthSnapshot {
            preview_connection_enabled: Some(false),
            ..healthy()
        };
        assert_eq!(snapshot.issues(STALE), vec![HealthIssue::PreviewDisabled]);
    }

    #[test]
    fn lock_contention_has_priority() {
        let snapshot = HealthSnapshot {
            device_lockable: false,
            since_last_frame: Some(Duration::from_secs(10)),
            ..healthy()
        };
        assert_eq!(snapshot.best_guess_error(STALE), CameraError::DeviceLocked);
    }

    #[test]
    fn never_seen_frames_guess_no_signal() {
        let snapshot = HealthSnapshot {
            session_running: false,
            frames_seen: false,
            since_last_frame: None,
            ..healthy()
        };
        assert_eq!(snapshot.best_guess_error(STALE), CameraError::NoVideoSignal);
    }

    #[test]
    fn generic_failure_falls_back_to_start_failed() {
        let snapshot = HealthSnapshot {
            session_running: false,
            ..healthy()
        };
        assert_eq!(snapshot.best_guess_error(STALE), CameraError::SessionStartFailed);
    }

    #[test]
    fn no_input_skips_device_checks() {
        let snapshot = HealthSnapshot {
            has_input: false,
            device_connected: false,
            device_lockable: false,
            ..healthy()
        };
        assert_eq!(snapshot.issues(STALE), vec![HealthIssue::NoInput]);
    }
}
