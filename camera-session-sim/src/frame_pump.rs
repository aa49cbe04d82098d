//! Frame delivery thread for the simulated capture graph.
//!
//! Stands in for the platform's video data output queue: while running it
//! calls every attached output's frame callback at a fixed rate. Late
//! frames are never queued; a slow callback just delays the next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use camera_session_core::models::camera_models::FrameInfo;
use camera_session_core::traits::capture_session::VideoOutput;

use crate::error::SimError;

/// Outputs shared between the session graph and the pump thread.
pub type SharedOutputs = Arc<Mutex<Vec<(u64, VideoOutput)>>>;

pub struct FramePump {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FramePump {
    /// Start delivering `width`x`height` frames at `fps` to `outputs`.
    /// Nothing is delivered while `frozen` is set.
    pub fn start(
        fps: f64,
        (width, height): (u32, u32),
        outputs: SharedOutputs,
        frozen: Arc<AtomicBool>,
    ) -> Result<Self, SimError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let interval = Duration::from_secs_f64(1.0 / fps.max(1.0));

        let handle = thread::Builder::new()
            .name("sim-frame-pump".into())
            .spawn(move || {
                let started = Instant::now();
                let mut delivered = 0u64;
                while flag.load(Ordering::SeqCst) {
                    thread::sleep(interval);
                    if frozen.load(Ordering::SeqCst) || !flag.load(Ordering::SeqCst) {
                        continue;
                    }
                    let frame = FrameInfo {
                        width,
                        height,
                        timestamp_secs: started.elapsed().as_secs_f64(),
                    };
                    for (_, output) in outputs.lock().iter() {
                        (output.on_frame)(frame);
                    }
                    delivered += 1;
                }
                log::debug!("frame pump stopped after {} frames", delivered);
            })
            .map_err(|source| SimError::ThreadSpawn {
                name: "frame pump",
                source,
            })?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FramePump {
    fn drop(&mut self) {
        self.stop();
    }
}
