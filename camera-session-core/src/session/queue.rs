use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::models::error::CameraError;
use crate::traits::dispatch::Job;

enum Message {
    Run { due: Instant, job: Job },
    Shutdown,
}

struct Delayed {
    due: Instant,
    seq: u64,
    job: Job,
}

impl PartialEq for Delayed {
    fn eq(&self, other: &Self) -> bool {
        (self.due, self.seq) == (other.due, other.seq)
    }
}

impl Eq for Delayed {}

impl PartialOrd for Delayed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Delayed {
    // Earliest deadline first; ties run in posting order.
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

/// Cloneable sender side of a [`SessionQueue`].
#[derive(Clone)]
pub struct QueueHandle {
    tx: mpsc::Sender<Message>,
}

impl QueueHandle {
    pub fn dispatch(&self, job: Job) {
        self.dispatch_after(Duration::ZERO, job);
    }

    /// Run `job` on the queue no earlier than `delay` from now.
    pub fn dispatch_after(&self, delay: Duration, job: Job) {
        let due = Instant::now() + delay;
        if self.tx.send(Message::Run { due, job }).is_err() {
            debug!("session queue is shut down; job dropped");
        }
    }
}

/// Serial executor on one dedicated thread.
///
/// Jobs run one at a time in deadline order. All capture-graph mutation and
/// start/stop calls go through here. Dropping the queue still runs jobs that
/// are already due; later ones are discarded.
pub struct SessionQueue {
    handle: QueueHandle,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl SessionQueue {
    pub fn spawn(name: &str) -> Result<Self, CameraError> {
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(name.into())
            .spawn(move || Self::run(rx))
            .map_err(|e| CameraError::Internal(format!("failed to spawn session queue: {}", e)))?;

        Ok(Self {
            handle: QueueHandle { tx },
            worker_id: worker.thread().id(),
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }

    /// Whether the caller is running on the queue thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.worker_id
    }

    fn run(rx: mpsc::Receiver<Message>) {
        let mut pending: BinaryHeap<Delayed> = BinaryHeap::new();
        let mut seq = 0u64;

        loop {
            let message = match pending.peek() {
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                Some(Delayed { due, .. }) => {
                    let wait = due.saturating_duration_since(Instant::now());
                    rx.recv_timeout(wait)
                }
            };

            match message {
                Ok(Message::Run { due, job }) => {
                    pending.push(Delayed { due, seq, job });
                    seq += 1;
                }
                Ok(Message::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }

            let now = Instant::now();
            while pending.peek().is_some_and(|next| next.due <= now) {
                if let Some(next) = pending.pop() {
                    (next.job)();
                }
            }
        }

        if !pending.is_empty() {
            debug!("session queue exiting with {} pending jobs", pending.len());
        }
    }
}

impl Drop for SessionQueue {
    fn drop(&mut self) {
        let _ = self.handle.tx.send(Message::Shutdown);
        let Some(worker) = self.worker.take() else {
            return;
        };
        if self.is_current() {
            warn!("session queue dropped from its own thread; detaching");
            return;
        }
        let _ = worker.join();
    }
}
