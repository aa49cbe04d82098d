use crate::models::authorization::AuthorizationState;

/// Completion of an authorization request: `true` when access was granted.
pub type AuthorizationCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// OS camera-permission API.
pub trait CameraAuthorizer: Send + Sync {
    fn authorization_status(&self) -> AuthorizationState;

    /// Show the one-shot OS prompt. `completion` may run on any thread,
    /// whenever the OS responds.
    fn request_access(&self, completion: AuthorizationCallback);
}
