//! UI surfaces and frame sources
//!
//! A surface is anything that can be asked to rasterize itself. The request
//! is asynchronous: the surface gets a [`SnapshotReply`] and completes it
//! whenever the image is ready, on whatever thread it likes.
//!
//! Built-in sources:
//! - [`TestPattern`]: alternating black and white frames
//! - [`ImageSequence`]: JPEG files from a directory, looped

mod pattern;
mod sequence;

pub use pattern::TestPattern;
pub use sequence::ImageSequence;

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::error::Result;
use crate::types::{Dimensions, RawImage};

/// Result of one snapshot
#[derive(Debug, Clone)]
pub enum Snapshot {
    /// Raw pixels that still need encoding
    Raw(RawImage),
    /// Bytes already in JPEG form
    Encoded(Bytes),
}

impl Snapshot {
    /// Dimensions of a raw snapshot (encoded ones are opaque)
    pub fn dimensions(&self) -> Option<Dimensions> {
        match self {
            Self::Raw(img) => Some(img.dimensions),
            Self::Encoded(_) => None,
        }
    }
}

type Continuation = Box<dyn FnOnce(Option<Snapshot>) + Send>;

/// Completion handle for one snapshot request
///
/// Delivering consumes the reply, so a request completes at most once.
/// Dropping it without delivering reports the request as abandoned.
pub struct SnapshotReply {
    continuation: Option<Continuation>,
}

impl SnapshotReply {
    /// Wrap a continuation; it receives `None` if the reply is dropped
    pub fn new(continuation: impl FnOnce(Option<Snapshot>) + Send + 'static) -> Self {
        Self {
            continuation: Some(Box::new(continuation)),
        }
    }

    /// A reply that forwards into a oneshot channel
    pub fn channel() -> (Self, oneshot::Receiver<Snapshot>) {
        let (tx, rx) = oneshot::channel();
        let reply = Self::new(move |snapshot| {
            if let Some(snapshot) = snapshot {
                let _ = tx.send(snapshot);
            }
        });
        (reply, rx)
    }

    /// Complete the request
    pub fn deliver(mut self, snapshot: Snapshot) {
        if let Some(continuation) = self.continuation.take() {
            continuation(Some(snapshot));
        }
    }
}

impl Drop for SnapshotReply {
    fn drop(&mut self) {
        if let Some(continuation) = self.continuation.take() {
            continuation(None);
        }
    }
}

impl std::fmt::Debug for SnapshotReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotReply")
            .field("pending", &self.continuation.is_some())
            .finish()
    }
}

/// A render target that can be captured
pub trait UiSurface: Send + Sync {
    /// Current width in pixels
    fn width(&self) -> u32;

    /// Current height in pixels
    fn height(&self) -> u32;

    /// Ask for one snapshot
    ///
    /// The surface may call `reply.deliver` before returning or later from
    /// another thread. An error means the request was refused and the reply
    /// has been dropped.
    fn request_snapshot(&self, reply: SnapshotReply) -> Result<()>;

    /// Current dimensions
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }
}
