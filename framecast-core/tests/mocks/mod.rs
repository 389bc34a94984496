//! Mock infrastructure for testing
//!
//! Provides a controllable UI surface and a sink that records every buffer.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use framecast_core::error::{FramecastError, Result};
use framecast_core::pipeline::{MediaSink, NeedDataCallback, SinkBuffer};
use framecast_core::surface::{Snapshot, SnapshotReply, UiSurface};
use framecast_core::types::{Dimensions, RawImage};
use parking_lot::Mutex;

/// Create a raw snapshot with a solid color
pub fn solid_snapshot(width: u32, height: u32, rgba: [u8; 4]) -> Snapshot {
    Snapshot::Raw(RawImage::solid(Dimensions::new(width, height), rgba))
}

/// Surface whose replies are held until the test releases them
///
/// With `auto_deliver` set it answers synchronously with a solid frame of
/// its current size instead.
pub struct MockSurface {
    width: AtomicU32,
    height: AtomicU32,
    auto_deliver: AtomicBool,
    refuse_next: AtomicBool,
    requests: AtomicUsize,
    pending: Mutex<VecDeque<SnapshotReply>>,
}

impl MockSurface {
    /// A surface that holds every reply
    pub fn holding(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            width: AtomicU32::new(width),
            height: AtomicU32::new(height),
            auto_deliver: AtomicBool::new(false),
            refuse_next: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
            pending: Mutex::new(VecDeque::new()),
        })
    }

    /// A surface that answers every request immediately
    pub fn immediate(width: u32, height: u32) -> Arc<Self> {
        let surface = Self::holding(width, height);
        surface.auto_deliver.store(true, Ordering::SeqCst);
        surface
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.width.store(width, Ordering::SeqCst);
        self.height.store(height, Ordering::SeqCst);
    }

    /// Refuse the next snapshot request
    pub fn refuse_next(&self) {
        self.refuse_next.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Complete the oldest held request
    pub fn deliver_next(&self, snapshot: Snapshot) -> bool {
        let reply = self.pending.lock().pop_front();
        match reply {
            Some(reply) => {
                reply.deliver(snapshot);
                true
            }
            None => false,
        }
    }

    /// Complete the oldest held request with a frame of the current size
    pub fn deliver_current(&self) -> bool {
        let snapshot = solid_snapshot(
            self.width.load(Ordering::SeqCst),
            self.height.load(Ordering::SeqCst),
            [40, 80, 120, 255],
        );
        self.deliver_next(snapshot)
    }

    /// Drop the oldest held request without answering it
    pub fn abandon_next(&self) -> bool {
        let reply = self.pending.lock().pop_front();
        reply.is_some()
    }
}

impl UiSurface for MockSurface {
    fn width(&self) -> u32 {
        self.width.load(Ordering::SeqCst)
    }

    fn height(&self) -> u32 {
        self.height.load(Ordering::SeqCst)
    }

    fn request_snapshot(&self, reply: SnapshotReply) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if self.refuse_next.swap(false, Ordering::SeqCst) {
            drop(reply);
            return Err(FramecastError::surface("not visible"));
        }

        if self.auto_deliver.load(Ordering::SeqCst) {
            reply.deliver(solid_snapshot(self.width(), self.height(), [255, 255, 255, 255]));
        } else {
            self.pending.lock().push_back(reply);
        }
        Ok(())
    }
}

/// Surface that answers every request from its own thread after a delay
///
/// Delays are used in turn, so a test can make some replies slower than
/// the snapshot timeout.
pub struct ThreadedSurface {
    dimensions: Dimensions,
    delays: Vec<Duration>,
    requests: AtomicUsize,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadedSurface {
    pub fn new(width: u32, height: u32, delays: Vec<Duration>) -> Arc<Self> {
        assert!(!delays.is_empty());
        Arc::new(Self {
            dimensions: Dimensions::new(width, height),
            delays,
            requests: AtomicUsize::new(0),
            workers: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Wait until every reply has been delivered
    pub fn join_all(&self) {
        loop {
            let workers: Vec<_> = self.workers.lock().drain(..).collect();
            if workers.is_empty() {
                return;
            }
            for worker in workers {
                worker.join().unwrap();
            }
        }
    }
}

impl UiSurface for ThreadedSurface {
    fn width(&self) -> u32 {
        self.dimensions.width
    }

    fn height(&self) -> u32 {
        self.dimensions.height
    }

    fn request_snapshot(&self, reply: SnapshotReply) -> Result<()> {
        let n = self.requests.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays[n % self.delays.len()];
        let Dimensions { width, height } = self.dimensions;

        let worker = std::thread::spawn(move || {
            std::thread::sleep(delay);
            reply.deliver(solid_snapshot(width, height, [10, 200, 30, 255]));
        });
        self.workers.lock().push(worker);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingInner {
    buffers: Mutex<Vec<SinkBuffer>>,
    reject: AtomicUsize,
    attempts: AtomicUsize,
    finished: AtomicBool,
    need_data: Mutex<Option<NeedDataCallback>>,
}

/// Sink that keeps every accepted buffer in memory
///
/// Clones share state, so a test can keep one and hand the other to the
/// coordinator.
#[derive(Clone, Default)]
pub struct RecordingSink {
    inner: Arc<RecordingInner>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn MediaSink> {
        Box::new(self.clone())
    }

    /// Fail the next `count` pushes
    pub fn reject_next(&self, count: usize) {
        self.inner.reject.store(count, Ordering::SeqCst);
    }

    pub fn buffers(&self) -> Vec<SinkBuffer> {
        self.inner.buffers.lock().clone()
    }

    pub fn accepted(&self) -> usize {
        self.inner.buffers.lock().len()
    }

    /// Pushes attempted, including rejected ones
    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::SeqCst)
    }

    /// Fire the registered need-data callback
    pub fn request_data(&self) {
        let callback = self.inner.need_data.lock().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl MediaSink for RecordingSink {
    fn push(&self, buffer: SinkBuffer) -> Result<()> {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);

        let rejected = self
            .inner
            .reject
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(FramecastError::sink("flow error: flushing"));
        }

        self.inner.buffers.lock().push(buffer);
        Ok(())
    }

    fn set_need_data_callback(&self, callback: NeedDataCallback) {
        *self.inner.need_data.lock() = Some(callback);
    }

    fn finish(&self) -> Result<()> {
        self.inner.finished.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holding_surface_queues_replies() {
        let surface = MockSurface::holding(4, 4);
        let (reply, mut rx) = SnapshotReply::channel();
        surface.request_snapshot(reply).unwrap();
        assert_eq!(surface.pending(), 1);

        assert!(surface.deliver_current());
        assert!(rx.try_recv().is_ok());
        assert!(!surface.deliver_current());
    }

    #[test]
    fn test_recording_sink_rejects_then_accepts() {
        let sink = RecordingSink::new();
        sink.reject_next(1);
        let buffer = SinkBuffer {
            data: bytes::Bytes::from_static(b"x"),
            pts: std::time::Duration::ZERO,
            duration: std::time::Duration::ZERO,
        };
        assert!(sink.push(buffer.clone()).is_err());
        assert!(sink.push(buffer).is_ok());
        assert_eq!(sink.accepted(), 1);
        assert_eq!(sink.attempts(), 2);
    }
}
