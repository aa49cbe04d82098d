use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::authorization::AuthorizationState;
use super::error::CameraError;
use super::state::LifecycleState;

/// Observable snapshot of the camera service, refreshed on every transition
/// and health poll.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state: LifecycleState,
    pub authorization: AuthorizationState,
    pub is_authorized: bool,
    pub is_running: bool,
    pub generation: u64,
    pub configured: bool,
    pub input_count: usize,
    pub output_count: usize,
    pub frames_received: u64,
    pub last_frame_age_ms: Option<u64>,
    pub consecutive_health_failures: u32,
    pub resets: u64,
    pub preview_attached: bool,
    #[serde(serialize_with = "serialize_error")]
    pub last_error: Option<CameraError>,
    pub last_error_at: Option<DateTime<Utc>>,
    /// Underlying cause of the last exhausted configuration round.
    #[serde(serialize_with = "serialize_error")]
    pub last_configuration_error: Option<CameraError>,
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<CameraError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            state: LifecycleState::Idle,
            authorization: AuthorizationState::NotDetermined,
            is_authorized: false,
            is_running: false,
            generation: 0,
            configured: false,
            input_count: 0,
            output_count: 0,
            frames_received: 0,
            last_frame_age_ms: None,
            consecutive_health_failures: 0,
            resets: 0,
            preview_attached: false,
            last_error: None,
            last_error_at: None,
            last_configuration_error: None,
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "state: {}", self.state)?;
        writeln!(
            f,
            "authorization: {:?} (authorized: {})",
            self.authorization, self.is_authorized
        )?;
        writeln!(f, "running: {}", self.is_running)?;
        writeln!(
            f,
            "generation: {} (configured: {}, inputs: {}, outputs: {})",
            self.generation, self.configured, self.input_count, self.output_count
        )?;
        match self.last_frame_age_ms {
            Some(age) => writeln!(f, "frames: {} (last {} ms ago)", self.frames_received, age)?,
            None => writeln!(f, "frames: {}", self.frames_received)?,
        }
        writeln!(
            f,
            "health failures: {}, resets: {}",
            self.consecutive_health_failures, self.resets
        )?;
        writeln!(f, "preview attached: {}", self.preview_attached)?;
        match (&self.last_error, &self.last_error_at) {
            (Some(err), Some(at)) => write!(f, "last error: {} at {}", err, at.to_rfc3339())?,
            (Some(err), None) => write!(f, "last error: {}", err)?,
            _ => write!(f, "last error: none")?,
        }
        if let Some(ref cause) = self.last_configuration_error {
            write!(f, "\nlast configuration failure: {}", cause)?;
        }
        Ok(())
    }
}
