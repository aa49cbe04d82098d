use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free record of frame arrivals for one generation.
///
/// Written from the backend's frame thread, read by the health monitor on
/// the session queue. Only the newest arrival is kept; nothing is queued.
#[derive(Debug)]
pub struct FrameClock {
    origin: Instant,
    /// Nanoseconds since `origin` of the newest frame, plus one. Zero means
    /// no frame has arrived.
    last_frame: AtomicU64,
    count: AtomicU64,
    /// Set by [`arm`](Self::arm); the next frame clears it and is flagged.
    armed: AtomicBool,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_frame: AtomicU64::new(0),
            count: AtomicU64::new(0),
            armed: AtomicBool::new(true),
        }
    }

    /// Record a frame. Returns `true` for the first frame since the clock
    /// was created or last armed.
    pub fn record(&self) -> bool {
        let stamp = self.origin.elapsed().as_nanos() as u64 + 1;
        self.last_frame.store(stamp, Ordering::Release);
        self.count.fetch_add(1, Ordering::AcqRel);
        self.armed.swap(false, Ordering::AcqRel)
    }

    /// Flag the next frame again and return the current count as a mark for
    /// [`frames_since`](Self::frames_since). Called on every session start.
    pub fn arm(&self) -> u64 {
        let mark = self.frames_received();
        self.armed.store(true, Ordering::Release);
        mark
    }

    /// Whether any frame arrived after `mark` was taken.
    pub fn frames_since(&self, mark: u64) -> bool {
        self.frames_received() > mark
    }

    pub fn frames_received(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub fn has_frames(&self) -> bool {
        self.frames_received() > 0
    }

    /// Time since the newest frame, or `None` before the first one.
    pub fn since_last_frame(&self) -> Option<Duration> {
        match self.last_frame.load(Ordering::Acquire) {
            0 => None,
            stamp => {
                let at = Duration::from_nanos(stamp - 1);
                Some(self.origin.elapsed().saturating_sub(at))
            }
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
