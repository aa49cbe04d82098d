use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;

use crate::models::authorization::AuthorizationState;
use crate::traits::authorizer::{AuthorizationCallback, CameraAuthorizer};
use crate::traits::dispatch::UiDispatcher;

/// Resolves camera authorization. At most one OS request is in flight;
/// callers arriving meanwhile wait for the same answer.
pub struct PermissionGate {
    authorizer: Arc<dyn CameraAuthorizer>,
    dispatcher: Arc<dyn UiDispatcher>,
    waiters: Arc<Mutex<Option<Vec<AuthorizationCallback>>>>,
}

impl PermissionGate {
    pub fn new(authorizer: Arc<dyn CameraAuthorizer>, dispatcher: Arc<dyn UiDispatcher>) -> Self {
        Self {
            authorizer,
            dispatcher,
            waiters: Arc::new(Mutex::new(None)),
        }
    }

    pub fn check(&self) -> AuthorizationState {
        self.authorizer.authorization_status()
    }

    /// Resolve authorization, prompting only while `NotDetermined`.
    ///
    /// `on_result` runs on the UI dispatcher. Denied, restricted and unknown
    /// states answer `false` without prompting; the user has to change them
    /// in system settings.
    pub fn request(&self, on_result: AuthorizationCallback) {
        let status = self.check();
        if status != AuthorizationState::NotDetermined {
            let granted = status.is_authorized();
            self.dispatcher.dispatch(Box::new(move || on_result(granted)));
            return;
        }

        {
            let mut waiters = self.waiters.lock();
            if let Some(pending) = waiters.as_mut() {
                pending.push(on_result);
                return;
            }
            *waiters = Some(vec![on_result]);
        }

        info!("requesting camera access");
        let waiters = Arc::clone(&self.waiters);
        let dispatcher = Arc::clone(&self.dispatcher);
        self.authorizer.request_access(Box::new(move |granted| {
            if !granted {
                warn!("camera access not granted");
            }
            let pending = waiters.lock().take().unwrap_or_default();
            for callback in pending {
                dispatcher.dispatch(Box::new(move || callback(granted)));
            }
        }));
    }
}
