use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;

use crate::models::camera_models::{PreviewId, Rect};
use crate::models::events::LifecycleEvent;
use crate::models::orientation::CaptureOrientation;
use crate::session::command::{Command, CommandSink, LifecycleNotifier};
use crate::traits::host_surface::{HostSurface, PreviewLink};

/// Preview connections as last seen by the controller, readable from any
/// thread without touching the session.
///
/// The UI side registers a connection when it attaches a surface; the
/// controller refreshes entries from the session and drops them on detach.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    connections: Arc<Mutex<HashMap<PreviewId, bool>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: PreviewId) {
        self.connections.lock().insert(id, true);
    }

    pub fn remove(&self, id: PreviewId) {
        self.connections.lock().remove(&id);
    }

    /// Record the session's view of `id`. Ids no longer registered stay out.
    pub fn update(&self, id: PreviewId, enabled: bool) {
        if let Some(entry) = self.connections.lock().get_mut(&id) {
            *entry = enabled;
        }
    }

    pub fn connection_enabled(&self, id: PreviewId) -> Option<bool> {
        self.connections.lock().get(&id).copied()
    }
}

/// Preview link that never touches the session from the calling thread:
/// connection changes are posted to the controller, and lookups are answered
/// from the registry.
pub struct QueuedPreviewLink {
    registry: PreviewRegistry,
    sink: Arc<dyn CommandSink>,
}

impl QueuedPreviewLink {
    pub fn new(registry: PreviewRegistry, sink: Arc<dyn CommandSink>) -> Self {
        Self { registry, sink }
    }
}

impl PreviewLink for QueuedPreviewLink {
    fn attach(&self, id: PreviewId, orientation: CaptureOrientation) {
        self.registry.insert(id);
        self.sink
            .post(Duration::ZERO, Command::AttachPreview { id, orientation });
    }

    fn detach(&self, id: PreviewId) {
        self.registry.remove(id);
        self.sink.post(Duration::ZERO, Command::DetachPreview { id });
    }

    fn connection_enabled(&self, id: PreviewId) -> Option<bool> {
        self.registry.connection_enabled(id)
    }
}

struct SurfaceInner {
    id: PreviewId,
    host_id: u64,
    frame: Rect,
    orientation: CaptureOrientation,
    valid: AtomicBool,
    link: Weak<dyn PreviewLink>,
}

/// Drawable bound to the capture session, owned by the UI host.
///
/// Cloning is cheap and yields a handle to the same surface.
#[derive(Clone)]
pub struct PreviewSurface {
    inner: Arc<SurfaceInner>,
}

impl PreviewSurface {
    fn new(host: &dyn HostSurface, link: Weak<dyn PreviewLink>) -> Self {
        Self {
            inner: Arc::new(SurfaceInner {
                id: PreviewId::new(),
                host_id: host.surface_id(),
                frame: host.bounds(),
                orientation: CaptureOrientation::from(host.device_orientation()),
                valid: AtomicBool::new(true),
                link,
            }),
        }
    }

    pub fn id(&self) -> PreviewId {
        self.inner.id
    }

    pub fn host_id(&self) -> u64 {
        self.inner.host_id
    }

    pub fn frame(&self) -> Rect {
        self.inner.frame
    }

    pub fn orientation(&self) -> CaptureOrientation {
        self.inner.orientation
    }

    /// Still attached to a live session and not invalidated.
    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::Acquire)
            && self
                .inner
                .link
                .upgrade()
                .and_then(|link| link.connection_enabled(self.inner.id))
                .is_some()
    }

    fn invalidate(&self) {
        self.inner.valid.store(false, Ordering::Release);
    }
}

impl fmt::Debug for PreviewSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewSurface")
            .field("id", &self.inner.id)
            .field("host_id", &self.inner.host_id)
            .field("frame", &self.inner.frame)
            .field("orientation", &self.inner.orientation)
            .finish_non_exhaustive()
    }
}

/// Hands out the preview surface for the host view. Independent of session
/// state: binding or rebuilding a surface never stops or reconfigures the
/// session.
pub struct PreviewBinder {
    current: Option<PreviewSurface>,
    notifier: LifecycleNotifier,
}

impl PreviewBinder {
    pub fn new(notifier: LifecycleNotifier) -> Self {
        Self {
            current: None,
            notifier,
        }
    }

    pub fn current(&self) -> Option<&PreviewSurface> {
        self.current.as_ref()
    }

    /// Return the bound surface for `host`, building one if needed.
    pub fn bind(&mut self, host: &dyn HostSurface, link: &Arc<dyn PreviewLink>) -> PreviewSurface {
        if let Some(surface) = &self.current {
            if surface.host_id() == host.surface_id() && surface.is_valid() {
                return surface.clone();
            }
        }
        self.recreate(host, link)
    }

    /// Discard any existing surface and build a fresh one.
    pub fn recreate(&mut self, host: &dyn HostSurface, link: &Arc<dyn PreviewLink>) -> PreviewSurface {
        if let Some(old) = self.current.take() {
            debug!("discarding preview surface {}", old.id());
            old.invalidate();
            link.detach(old.id());
        }

        let surface = PreviewSurface::new(host, Arc::downgrade(link));
        link.attach(surface.id(), surface.orientation());
        info!(
            "preview surface {} bound ({:.0}x{:.0}, {:?})",
            surface.id(),
            surface.frame().width,
            surface.frame().height,
            surface.orientation()
        );
        self.current = Some(surface.clone());
        surface
    }

    /// Host view teardown: drop the surface and tell the controller.
    pub fn release(&mut self, host: &dyn HostSurface) {
        let Some(surface) = self.current.take_if(|s| s.host_id() == host.surface_id()) else {
            return;
        };
        surface.invalidate();
        debug!("preview surface {} released", surface.id());
        self.notifier.notify(LifecycleEvent::PreviewReleased(surface.id()));
    }
}
