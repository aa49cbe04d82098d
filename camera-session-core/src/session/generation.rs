use std::sync::Arc;

use crate::processing::frame_clock::FrameClock;

/// One lifetime of a configured capture graph, from configure to the next
/// full reset. Nothing here survives a reset.
#[derive(Debug)]
pub struct Generation {
    pub number: u64,
    pub configured: bool,
    pub frames: Arc<FrameClock>,
    /// Frame count when the session was last told to start.
    pub frames_at_start: u64,
    pub consecutive_failures: u32,
    pub configure_attempt: u32,
    pub start_retried: bool,
    pub start_refusals: u32,
}

impl Generation {
    pub fn first() -> Self {
        Self::numbered(1)
    }

    /// A zeroed successor. Frame callbacks still registered against the old
    /// generation write to its orphaned clock.
    pub fn next(&self) -> Self {
        Self::numbered(self.number + 1)
    }

    fn numbered(number: u64) -> Self {
        Self {
            number,
            configured: false,
            frames: Arc::new(FrameClock::new()),
            frames_at_start: 0,
            consecutive_failures: 0,
            configure_attempt: 0,
            start_retried: false,
            start_refusals: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_generation_is_zeroed() {
        let mut current = Generation::first();
        current.configured = true;
        current.consecutive_failures = 2;
        current.start_retried = true;
        current.frames.record();
        current.frames_at_start = 1;

        let next = current.next();
        assert_eq!(next.number, 2);
        assert!(!next.configured);
        assert_eq!(next.consecutive_failures, 0);
        assert!(!next.start_retried);
        assert!(!next.frames.has_frames());
        assert_eq!(next.frames_at_start, 0);
    }
}
