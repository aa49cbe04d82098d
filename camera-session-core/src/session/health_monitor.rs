use std::time::Duration;

use log::{debug, warn};

use crate::models::camera_models::PreviewId;
use crate::models::config::SessionConfiguration;
use crate::models::error::CameraError;
use crate::models::health::HealthSnapshot;
use crate::processing::frame_clock::FrameClock;
use crate::session::generation::Generation;
use crate::session::guards::DeviceLock;
use crate::traits::capture_session::CaptureSession;

/// Result of one health poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Healthy,
    Unhealthy { consecutive: u32 },
    /// Threshold reached: reset and publish the best-guess error.
    ResetRequired(CameraError),
}

/// Classifies periodic health polls and counts consecutive failures.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    threshold: u32,
    stale_after: Duration,
}

impl HealthMonitor {
    pub fn new(config: &SessionConfiguration) -> Self {
        Self {
            threshold: config.health_failure_threshold,
            stale_after: config.frame_stale_after,
        }
    }

    /// Observe the session. Probes lock contention by taking and immediately
    /// releasing the device lock.
    pub fn snapshot<S: CaptureSession + ?Sized>(
        session: &S,
        frames: &FrameClock,
        preview: Option<PreviewId>,
    ) -> HealthSnapshot {
        let input = session.inputs().into_iter().next();
        let (device_connected, device_has_video, device_lockable) = match input {
            Some(ref input) => {
                let device = input.device().as_ref();
                let lockable = DeviceLock::acquire(device).is_ok();
                (device.is_connected(), device.has_video(), lockable)
            }
            None => (false, false, true),
        };

        HealthSnapshot {
            session_running: session.is_running(),
            has_input: input.is_some(),
            device_connected,
            device_has_video,
            preview_connection_enabled: preview.and_then(|id| session.preview_connection_enabled(id)),
            device_lockable,
            frames_seen: frames.has_frames(),
            since_last_frame: frames.since_last_frame(),
        }
    }

    /// Fold a snapshot into the generation's failure counter.
    pub fn evaluate(&self, snapshot: &HealthSnapshot, generation: &mut Generation) -> PollOutcome {
        let issues = snapshot.issues(self.stale_after);
        if issues.is_empty() {
            if generation.consecutive_failures > 0 {
                debug!(
                    "session healthy again after {} failed polls",
                    generation.consecutive_failures
                );
            }
            generation.consecutive_failures = 0;
            return PollOutcome::Healthy;
        }

        generation.consecutive_failures += 1;
        warn!(
            "unhealthy poll {}/{}: {:?}",
            generation.consecutive_failures, self.threshold, issues
        );
        if generation.consecutive_failures >= self.threshold {
            PollOutcome::ResetRequired(snapshot.best_guess_error(self.stale_after))
        } else {
            PollOutcome::Unhealthy {
                consecutive: generation.consecutive_failures,
            }
        }
    }
}
