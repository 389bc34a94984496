//! Capture session counters and latency tracking

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;

/// Maximum number of samples to keep for rolling averages
const MAX_SAMPLES: usize = 120;

/// Rolling average calculator for timing data
#[derive(Debug)]
struct RollingAverage {
    samples: VecDeque<Duration>,
    max_samples: usize,
}

impl RollingAverage {
    fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    fn add(&mut self, duration: Duration) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(duration);
    }

    fn average_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: Duration = self.samples.iter().sum();
        (total / self.samples.len() as u32).as_secs_f64() * 1000.0
    }
}

/// Thread-safe counters for one coordinator
#[derive(Debug)]
pub struct CaptureStats {
    ticks: AtomicU64,
    ticks_busy: AtomicU64,
    ticks_awaiting_sink: AtomicU64,
    captures_started: AtomicU64,
    frames_pushed: AtomicU64,
    bytes_pushed: AtomicU64,
    push_failures: AtomicU64,
    frames_dropped: AtomicU64,
    snapshots_timed_out: AtomicU64,
    stale_snapshots: AtomicU64,
    snapshot_latency: RwLock<RollingAverage>,
    encode_latency: RwLock<RollingAverage>,
    start_time: Instant,
}

impl Default for CaptureStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureStats {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            ticks_busy: AtomicU64::new(0),
            ticks_awaiting_sink: AtomicU64::new(0),
            captures_started: AtomicU64::new(0),
            frames_pushed: AtomicU64::new(0),
            bytes_pushed: AtomicU64::new(0),
            push_failures: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            snapshots_timed_out: AtomicU64::new(0),
            stale_snapshots: AtomicU64::new(0),
            snapshot_latency: RwLock::new(RollingAverage::new(MAX_SAMPLES)),
            encode_latency: RwLock::new(RollingAverage::new(MAX_SAMPLES)),
            start_time: Instant::now(),
        }
    }

    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_busy(&self) {
        self.ticks_busy.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_awaiting_sink(&self) {
        self.ticks_awaiting_sink.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_capture_started(&self) {
        self.captures_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_snapshot_latency(&self, latency: Duration) {
        self.snapshot_latency.write().add(latency);
    }

    pub(crate) fn record_encode_latency(&self, latency: Duration) {
        self.encode_latency.write().add(latency);
    }

    pub(crate) fn record_pushed(&self, bytes: usize) {
        self.frames_pushed.fetch_add(1, Ordering::Relaxed);
        self.bytes_pushed.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_push_failure(&self) {
        self.push_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timed_out(&self) {
        self.snapshots_timed_out.fetch_add(1, Ordering::Relaxed);
        self.record_dropped();
    }

    pub(crate) fn record_stale(&self) {
        self.stale_snapshots.fetch_add(1, Ordering::Relaxed);
    }

    /// Frames successfully handed to the sink
    pub fn frames_pushed(&self) -> u64 {
        self.frames_pushed.load(Ordering::Relaxed)
    }

    /// Take a consistent-enough copy of all counters
    pub fn snapshot(&self) -> CaptureStatsSnapshot {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let frames_pushed = self.frames_pushed.load(Ordering::Relaxed);
        let fps = if elapsed > 0.0 {
            frames_pushed as f64 / elapsed
        } else {
            0.0
        };

        CaptureStatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            ticks_busy: self.ticks_busy.load(Ordering::Relaxed),
            ticks_awaiting_sink: self.ticks_awaiting_sink.load(Ordering::Relaxed),
            captures_started: self.captures_started.load(Ordering::Relaxed),
            frames_pushed,
            bytes_pushed: self.bytes_pushed.load(Ordering::Relaxed),
            push_failures: self.push_failures.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            snapshots_timed_out: self.snapshots_timed_out.load(Ordering::Relaxed),
            stale_snapshots: self.stale_snapshots.load(Ordering::Relaxed),
            snapshot_latency_ms: self.snapshot_latency.read().average_ms(),
            encode_latency_ms: self.encode_latency.read().average_ms(),
            fps,
            uptime_secs: elapsed,
        }
    }
}

/// Point-in-time copy of [`CaptureStats`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaptureStatsSnapshot {
    pub ticks: u64,
    pub ticks_busy: u64,
    pub ticks_awaiting_sink: u64,
    pub captures_started: u64,
    pub frames_pushed: u64,
    pub bytes_pushed: u64,
    pub push_failures: u64,
    /// Stalled, abandoned, refused or unencodable snapshots
    pub frames_dropped: u64,
    pub snapshots_timed_out: u64,
    pub stale_snapshots: u64,
    pub snapshot_latency_ms: f64,
    pub encode_latency_ms: f64,
    pub fps: f64,
    pub uptime_secs: f64,
}

impl CaptureStatsSnapshot {
    /// Format as a single log line
    pub fn format_summary(&self) -> String {
        format!(
            "pushed={} dropped={} push_failures={} timed_out={} | snapshot {:.1}ms encode {:.1}ms | {:.1}fps",
            self.frames_pushed,
            self.frames_dropped,
            self.push_failures,
            self.snapshots_timed_out,
            self.snapshot_latency_ms,
            self.encode_latency_ms,
            self.fps
        )
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
