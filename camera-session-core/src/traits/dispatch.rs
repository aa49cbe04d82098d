use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// A unit of work posted to an execution context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// The UI-affine execution context.
///
/// Authorization results are delivered through it, and the responsiveness
/// probe measures its round-trip latency.
pub trait UiDispatcher: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// Runs jobs immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl UiDispatcher for InlineDispatcher {
    fn dispatch(&self, job: Job) {
        job();
    }
}

/// Detects a stalled host context.
pub trait ResponsivenessProbe: Send + Sync {
    /// Whether the context answered within `timeout`.
    fn is_responsive(&self, timeout: Duration) -> bool;
}

/// Probe that posts a no-op to a [`UiDispatcher`] and waits for it to run.
pub struct DispatcherProbe {
    dispatcher: Arc<dyn UiDispatcher>,
}

impl DispatcherProbe {
    pub fn new(dispatcher: Arc<dyn UiDispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl ResponsivenessProbe for DispatcherProbe {
    fn is_responsive(&self, timeout: Duration) -> bool {
        let (tx, rx) = mpsc::channel();
        self.dispatcher.dispatch(Box::new(move || {
            let _ = tx.send(());
        }));
        let responsive = rx.recv_timeout(timeout).is_ok();
        if !responsive {
            log::warn!("UI context did not answer within {:?}", timeout);
        }
        responsive
    }
}
