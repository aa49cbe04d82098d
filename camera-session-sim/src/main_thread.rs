//! Simulated UI main thread.
//!
//! A dedicated thread draining a job channel, standing in for the host
//! application's main run loop. `stall_for` blocks it to exercise the
//! responsiveness probe.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use camera_session_core::traits::dispatch::{Job, UiDispatcher};

use crate::error::SimError;

pub struct SimMainThread {
    tx: Mutex<Option<mpsc::Sender<Job>>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl SimMainThread {
    pub fn spawn() -> Result<Self, SimError> {
        let (tx, rx) = mpsc::channel::<Job>();
        let handle = thread::Builder::new()
            .name("sim-main".into())
            .spawn(move || {
                for job in rx {
                    job();
                }
            })
            .map_err(|source| SimError::ThreadSpawn {
                name: "main",
                source,
            })?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Block the main thread for `duration`, as a long synchronous UI task would.
    pub fn stall_for(&self, duration: Duration) {
        log::info!("stalling main thread for {:?}", duration);
        self.dispatch(Box::new(move || thread::sleep(duration)));
    }

    pub fn shutdown(&self) {
        self.tx.lock().take();
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

impl UiDispatcher for SimMainThread {
    fn dispatch(&self, job: Job) {
        match self.tx.lock().as_ref() {
            Some(tx) => {
                if tx.send(job).is_err() {
                    log::debug!("main thread gone; job dropped");
                }
            }
            None => log::debug!("main thread shut down; job dropped"),
        }
    }
}

impl Drop for SimMainThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}
