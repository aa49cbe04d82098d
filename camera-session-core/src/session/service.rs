use std::sync::{Arc, Weak};
use std::time::Duration;

use log::info;
use parking_lot::Mutex;

use crate::models::authorization::AuthorizationState;
use crate::models::config::SessionConfiguration;
use crate::models::error::CameraError;
use crate::models::state::LifecycleState;
use crate::models::status::StatusReport;
use crate::session::command::{Command, CommandSink, LifecycleNotifier};
use crate::session::controller::LifecycleController;
use crate::session::permission_gate::PermissionGate;
use crate::session::preview_binder::{PreviewBinder, PreviewSurface, QueuedPreviewLink};
use crate::session::queue::{QueueHandle, SessionQueue};
use crate::traits::authorizer::CameraAuthorizer;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_session::CaptureSession;
use crate::traits::dispatch::{DispatcherProbe, InlineDispatcher, UiDispatcher};
use crate::traits::host_surface::{HostSurface, PreviewLink};

/// Name of the session queue thread.
pub const SESSION_QUEUE_NAME: &str = "camera.session";

struct Shared<S: CaptureSession> {
    controller: Mutex<LifecycleController<S>>,
}

/// Routes controller commands onto the session queue. Holds the controller
/// weakly so pending timers never keep a dropped service alive.
struct QueueSink<S: CaptureSession> {
    shared: Weak<Shared<S>>,
    queue: QueueHandle,
}

impl<S: CaptureSession + 'static> CommandSink for QueueSink<S> {
    fn post(&self, delay: Duration, command: Command) {
        let shared = Weak::clone(&self.shared);
        self.queue.dispatch_after(
            delay,
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.controller.lock().handle(command);
                }
            }),
        );
    }
}

/// Public face of the camera session lifecycle manager.
///
/// Every operation is posted to the session queue and returns immediately;
/// observable state is readable from any thread.
///
/// ```text
/// UI thread ──post──▶ [session queue] ──▶ LifecycleController ──▶ CaptureSession
///     ▲                                         │
///     └────── status / CaptureDelegate ◀────────┘
/// ```
pub struct CameraService<S: CaptureSession + 'static> {
    // Dropped first: runs the stop posted by `drop` and joins the queue
    // thread while the controller is still alive.
    _queue: SessionQueue,
    shared: Arc<Shared<S>>,
    status: Arc<Mutex<StatusReport>>,
    gate: Arc<PermissionGate>,
    sink: Arc<dyn CommandSink>,
    binder: Mutex<PreviewBinder>,
    link: Arc<dyn PreviewLink>,
}

impl<S: CaptureSession + 'static> CameraService<S> {
    /// Service that delivers authorization results inline.
    pub fn new(
        session: S,
        authorizer: Arc<dyn CameraAuthorizer>,
        config: SessionConfiguration,
    ) -> Result<Self, CameraError> {
        Self::with_dispatcher(session, authorizer, Arc::new(InlineDispatcher), config)
    }

    /// Service bound to a UI-affine dispatcher. The dispatcher receives
    /// authorization results and backs the responsiveness probe.
    pub fn with_dispatcher(
        session: S,
        authorizer: Arc<dyn CameraAuthorizer>,
        dispatcher: Arc<dyn UiDispatcher>,
        config: SessionConfiguration,
    ) -> Result<Self, CameraError> {
        config.validate().map_err(CameraError::InvalidConfiguration)?;

        let queue = SessionQueue::spawn(SESSION_QUEUE_NAME)?;
        let gate = Arc::new(PermissionGate::new(authorizer, Arc::clone(&dispatcher)));
        let status = Arc::new(Mutex::new(StatusReport::default()));
        let probe = Arc::new(DispatcherProbe::new(dispatcher));

        let handle = queue.handle();
        let shared = Arc::new_cyclic(|weak: &Weak<Shared<S>>| {
            let sink: Arc<dyn CommandSink> = Arc::new(QueueSink {
                shared: Weak::clone(weak),
                queue: handle,
            });
            let mut controller = LifecycleController::new(
                session,
                config,
                Arc::clone(&gate),
                sink,
                Arc::clone(&status),
            );
            controller.set_probe(probe);
            Shared {
                controller: Mutex::new(controller),
            }
        });

        let sink: Arc<dyn CommandSink> = Arc::new(QueueSink {
            shared: Arc::downgrade(&shared),
            queue: queue.handle(),
        });
        let binder = PreviewBinder::new(LifecycleNotifier::new(Arc::clone(&sink)));
        let registry = shared.controller.lock().preview_registry();
        let link: Arc<dyn PreviewLink> =
            Arc::new(QueuedPreviewLink::new(registry, Arc::clone(&sink)));

        info!("camera service ready");
        Ok(Self {
            _queue: queue,
            shared,
            status,
            gate,
            sink,
            binder: Mutex::new(binder),
            link,
        })
    }

    /// Install the delegate. Callbacks run on the session queue with the
    /// controller locked; they must not call `set_delegate` or
    /// `with_session`. Everything else on the service only posts to the
    /// queue or reads shared state.
    pub fn set_delegate(&self, delegate: Arc<dyn CaptureDelegate>) {
        self.shared.controller.lock().set_delegate(delegate);
    }

    // --- Authorization ---

    pub fn check_authorization(&self) -> AuthorizationState {
        self.gate.check()
    }

    /// Ask for camera access. `on_result` runs on the UI dispatcher; a grant
    /// also starts configuration.
    pub fn request_authorization<F>(&self, on_result: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let sink = Arc::clone(&self.sink);
        self.gate.request(Box::new(move |granted| {
            sink.post(Duration::ZERO, Command::AuthorizationResolved { granted });
            on_result(granted);
        }));
    }

    // --- Session control ---

    /// Authorize, configure and start. Safe to call repeatedly.
    pub fn initialize(&self) {
        self.post(Command::Initialize);
    }

    pub fn start_session(&self) {
        self.post(Command::StartSession);
    }

    pub fn stop_session(&self) {
        self.post(Command::StopSession);
    }

    /// Tear the graph down and rebuild it.
    pub fn refresh(&self) {
        self.post(Command::Refresh);
    }

    fn post(&self, command: Command) {
        self.sink.post(Duration::ZERO, command);
    }

    // --- Preview ---

    /// Surface for `host`. The session-side connection is made on the
    /// session queue; the returned surface is usable right away.
    pub fn bind_preview_surface(&self, host: &dyn HostSurface) -> PreviewSurface {
        self.binder.lock().bind(host, &self.link)
    }

    pub fn recreate_preview_surface(&self, host: &dyn HostSurface) -> PreviewSurface {
        self.binder.lock().recreate(host, &self.link)
    }

    pub fn release_preview_surface(&self, host: &dyn HostSurface) {
        self.binder.lock().release(host);
    }

    /// Handle for app-lifecycle and capture-runtime events.
    pub fn lifecycle_notifier(&self) -> LifecycleNotifier {
        LifecycleNotifier::new(Arc::clone(&self.sink))
    }

    // --- Observables ---

    pub fn is_authorized(&self) -> bool {
        self.status.lock().is_authorized
    }

    pub fn is_running(&self) -> bool {
        self.status.lock().is_running
    }

    pub fn last_error(&self) -> Option<CameraError> {
        self.status.lock().last_error.clone()
    }

    pub fn state(&self) -> LifecycleState {
        self.status.lock().state.clone()
    }

    pub fn status_report(&self) -> StatusReport {
        self.status.lock().clone()
    }

    pub fn status_description(&self) -> String {
        self.status_report().to_string()
    }

    /// Run `f` against the capture graph on the calling thread. Blocks while
    /// the session queue is busy with the controller.
    pub fn with_session<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(self.shared.controller.lock().session())
    }
}

impl<S: CaptureSession + 'static> Drop for CameraService<S> {
    fn drop(&mut self) {
        self.post(Command::StopSession);
        info!("camera service shutting down");
    }
}
