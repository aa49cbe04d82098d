//! Simulated camera permission.
//!
//! Mirrors a one-shot OS consent prompt: while `NotDetermined` the first
//! request shows the prompt, and the stored answer decides every later
//! status query. Once denied, only a settings change flips it back.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use camera_session_core::models::authorization::AuthorizationState;
use camera_session_core::traits::authorizer::{AuthorizationCallback, CameraAuthorizer};

/// How the simulated user answers the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    Grant,
    Deny,
    /// Leave the prompt open until [`SimAuthorizer::answer`] is called.
    Manual,
}

struct Inner {
    status: Mutex<AuthorizationState>,
    pending: Mutex<Vec<AuthorizationCallback>>,
    prompts: AtomicU32,
}

impl Inner {
    fn resolve(&self, granted: bool) {
        *self.status.lock() = if granted {
            AuthorizationState::Authorized
        } else {
            AuthorizationState::Denied
        };
        let waiting: Vec<_> = self.pending.lock().drain(..).collect();
        for completion in waiting {
            completion(granted);
        }
    }
}

pub struct SimAuthorizer {
    inner: Arc<Inner>,
    answer: PromptAnswer,
    delay: Duration,
}

impl SimAuthorizer {
    pub fn new(status: AuthorizationState, answer: PromptAnswer) -> Self {
        Self {
            inner: Arc::new(Inner {
                status: Mutex::new(status),
                pending: Mutex::new(Vec::new()),
                prompts: AtomicU32::new(0),
            }),
            answer,
            delay: Duration::from_millis(20),
        }
    }

    /// Already authorized; never prompts.
    pub fn authorized() -> Self {
        Self::new(AuthorizationState::Authorized, PromptAnswer::Grant)
    }

    /// How long the simulated user takes to answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answer an open prompt by hand.
    pub fn answer(&self, granted: bool) {
        self.inner.resolve(granted);
    }

    /// Change the status as the user would in system settings.
    pub fn set_status(&self, status: AuthorizationState) {
        log::info!("authorization changed in settings: {:?}", status);
        *self.inner.status.lock() = status;
    }

    pub fn prompt_count(&self) -> u32 {
        self.inner.prompts.load(Ordering::SeqCst)
    }
}

impl CameraAuthorizer for SimAuthorizer {
    fn authorization_status(&self) -> AuthorizationState {
        *self.inner.status.lock()
    }

    fn request_access(&self, completion: AuthorizationCallback) {
        let status = self.authorization_status();
        if status != AuthorizationState::NotDetermined {
            completion(status.is_authorized());
            return;
        }

        self.inner.prompts.fetch_add(1, Ordering::SeqCst);
        log::info!("showing camera permission prompt");
        self.inner.pending.lock().push(completion);

        let granted = match self.answer {
            PromptAnswer::Grant => true,
            PromptAnswer::Deny => false,
            PromptAnswer::Manual => return,
        };
        let inner = Arc::clone(&self.inner);
        let delay = self.delay;
        let spawned = thread::Builder::new()
            .name("sim-permission-prompt".into())
            .spawn(move || {
                thread::sleep(delay);
                inner.resolve(granted);
            });
        if let Err(e) = spawned {
            log::warn!("prompt thread unavailable ({}); answering inline", e);
            self.inner.resolve(granted);
        }
    }
}
