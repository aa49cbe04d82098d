use serde::Serialize;

use super::error::CameraError;

/// Camera authorization as reported by the OS.
///
/// Only `NotDetermined` can change through this process (via the one-shot
/// OS prompt); denial sticks until the user changes it in system settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    NotDetermined,
    Authorized,
    Denied,
    Restricted,
    Unknown,
}

impl AuthorizationState {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// The error to surface for a state that blocks capture, if any.
    pub fn blocking_error(&self) -> Option<CameraError> {
        match self {
            Self::Denied => Some(CameraError::DeniedAuthorization),
            Self::Restricted => Some(CameraError::RestrictedAuthorization),
            Self::Unknown => Some(CameraError::UnknownAuthorization),
            Self::NotDetermined | Self::Authorized => None,
        }
    }
}
