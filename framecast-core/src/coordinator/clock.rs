//! Nominal presentation timestamps
//!
//! Timestamps advance by a fixed frame duration per buffer and ignore wall
//! time, so they drift from real time whenever capture runs slower or
//! faster than the declared framerate.

use std::time::Duration;

/// Per-session running clock
#[derive(Debug, Clone)]
pub struct PresentationClock {
    next: Duration,
    frame_duration: Duration,
    frames: u64,
}

impl PresentationClock {
    pub fn new(frame_duration: Duration) -> Self {
        Self {
            next: Duration::ZERO,
            frame_duration,
            frames: 0,
        }
    }

    /// Stamp one buffer: returns (pts, duration) and moves the clock on
    pub fn advance(&mut self) -> (Duration, Duration) {
        let pts = self.next;
        self.next += self.frame_duration;
        self.frames += 1;
        (pts, self.frame_duration)
    }

    /// Timestamp the next buffer will get
    pub fn peek(&self) -> Duration {
        self.next
    }

    /// Buffers stamped so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
