use std::sync::Arc;
use std::time::Duration;

use crate::models::camera_models::PreviewId;
use crate::models::events::LifecycleEvent;
use crate::models::orientation::CaptureOrientation;

/// Work posted back to the lifecycle controller.
///
/// Deferred commands carry the controller epoch current when they were
/// scheduled; the controller drops them if a transition happened since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AuthorizationResolved { granted: bool },
    ConfigureRetry { epoch: u64 },
    RetryStart { epoch: u64 },
    VerifyStart { epoch: u64 },
    VerifyFrames { epoch: u64 },
    FrameArrived { generation: u64 },
    HealthPoll { epoch: u64 },
    ResetCooldownElapsed { epoch: u64 },
    Initialize,
    StartSession,
    StopSession,
    Refresh,
    AttachPreview { id: PreviewId, orientation: CaptureOrientation },
    DetachPreview { id: PreviewId },
    Event(LifecycleEvent),
}

/// Delivers commands to the controller on the session queue.
pub trait CommandSink: Send + Sync {
    fn post(&self, delay: Duration, command: Command);
}

/// Handle the UI layer and the app-lifecycle notifier use to feed events to
/// the controller without holding a reference to it.
#[derive(Clone)]
pub struct LifecycleNotifier {
    sink: Arc<dyn CommandSink>,
}

impl LifecycleNotifier {
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self { sink }
    }

    pub fn notify(&self, event: LifecycleEvent) {
        log::debug!("lifecycle event: {:?}", event);
        self.sink.post(Duration::ZERO, Command::Event(event));
    }
}
