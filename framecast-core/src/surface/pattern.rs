//! Synthetic black/white test frames

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::{Snapshot, SnapshotReply, UiSurface};
use crate::error::Result;
use crate::types::{Dimensions, RawImage};

const BLACK: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Alternates full black and full white frames
///
/// Delivers synchronously from `request_snapshot`.
pub struct TestPattern {
    dimensions: Dimensions,
    white: AtomicBool,
    frames: AtomicU64,
}

impl TestPattern {
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            white: AtomicBool::new(false),
            frames: AtomicU64::new(0),
        }
    }

    /// Number of frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    fn render(&self) -> RawImage {
        // fetch_xor returns the previous value, so the first frame is black
        let white = self.white.fetch_xor(true, Ordering::SeqCst);
        self.frames.fetch_add(1, Ordering::Relaxed);
        RawImage::solid(self.dimensions, if white { WHITE } else { BLACK })
    }
}

impl UiSurface for TestPattern {
    fn width(&self) -> u32 {
        self.dimensions.width
    }

    fn height(&self) -> u32 {
        self.dimensions.height
    }

    fn request_snapshot(&self, reply: SnapshotReply) -> Result<()> {
        reply.deliver(Snapshot::Raw(self.render()));
        Ok(())
    }
}
