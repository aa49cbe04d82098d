use std::time::Duration;

use super::camera_models::{DevicePosition, DeviceType, PixelFormat, SessionPreset, VideoOutputSettings};

/// Tuning knobs for the camera session lifecycle.
///
/// Defaults match a phone camera: two-second health polls, three strikes
/// before a reset, three configuration attempts.
#[derive(Debug, Clone)]
pub struct SessionConfiguration {
    /// Capture quality preset applied when the graph is built.
    pub preset: SessionPreset,

    /// Pixel format of the video data output (default: BGRA).
    pub pixel_format: PixelFormat,

    /// Device selection order. The first matching device wins; if none
    /// match, the first device of any position is used.
    pub device_preference: Vec<(DeviceType, DevicePosition)>,

    /// Attempts per configuration round before giving up (default: 3).
    pub configure_max_attempts: u32,

    /// Backoff between configuration attempts, multiplied by the attempt number.
    pub configure_backoff: Duration,

    /// An attempt slower than this counts as failed.
    pub configure_timeout: Duration,

    /// Delay between issuing start and checking that the session runs.
    pub start_grace: Duration,

    /// How long a running session may go without its first frame.
    pub frame_grace: Duration,

    /// Interval between health polls while running (default: 2s).
    pub health_interval: Duration,

    /// Consecutive unhealthy polls that trigger a reset (default: 3).
    pub health_failure_threshold: u32,

    /// Frames older than this mark the session as stale (default: 3s).
    pub frame_stale_after: Duration,

    /// Pause after tearing down the graph before configuring again.
    pub reset_cooldown: Duration,

    /// Cooldown used instead of `reset_cooldown` when the host looks stalled.
    pub unresponsive_cooldown: Duration,

    /// Round-trip budget for the UI-context responsiveness probe.
    pub probe_timeout: Duration,

    /// Re-post delay for reset requests that arrive while one is in flight.
    pub deferral_delay: Duration,
}

impl SessionConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.configure_max_attempts == 0 {
            return Err("configure_max_attempts must be at least 1".into());
        }
        if self.health_failure_threshold == 0 {
            return Err("health_failure_threshold must be at least 1".into());
        }
        if self.health_interval.is_zero() {
            return Err("health_interval must be positive".into());
        }
        if self.configure_timeout.is_zero() {
            return Err("configure_timeout must be positive".into());
        }
        if self.probe_timeout.is_zero() {
            return Err("probe_timeout must be positive".into());
        }
        if self.frame_stale_after < self.health_interval / 2 {
            return Err(format!(
                "frame_stale_after ({:?}) is shorter than half the health interval ({:?})",
                self.frame_stale_after, self.health_interval
            ));
        }
        Ok(())
    }

    pub fn output_settings(&self) -> VideoOutputSettings {
        VideoOutputSettings {
            pixel_format: self.pixel_format,
            discards_late_frames: true,
        }
    }

    /// Backoff before configuration attempt `attempt` (1-based) is retried.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.configure_backoff * attempt.max(1)
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            preset: SessionPreset::High,
            pixel_format: PixelFormat::Bgra32,
            device_preference: vec![
                (DeviceType::UltraWide, DevicePosition::Back),
                (DeviceType::WideAngle, DevicePosition::Back),
            ],
            configure_max_attempts: 3,
            configure_backoff: Duration::from_millis(500),
            configure_timeout: Duration::from_secs(5),
            start_grace: Duration::from_millis(500),
            frame_grace: Duration::from_secs(3),
            health_interval: Duration::from_secs(2),
            health_failure_threshold: 3,
            frame_stale_after: Duration::from_secs(3),
            reset_cooldown: Duration::from_secs(1),
            unresponsive_cooldown: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(1),
            deferral_delay: Duration::from_millis(250),
        }
    }
}
