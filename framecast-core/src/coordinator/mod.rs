//! Frame capture coordinator
//!
//! Drives a strictly sequential capture → encode → push cycle:
//!
//! ```text
//!   tick ──▶ Idle ──request──▶ Capturing ──snapshot──▶ Pushing ──push──▶ Idle
//!             ▲                    │                                    │
//!             └──── timeout / abandoned / encode failure ◀──────────────┘
//! ```
//!
//! A tick only starts a capture from `Idle`, so at most one snapshot is
//! ever outstanding. In sink-driven mode it also waits for the sink's
//! need-data signal. Every request carries a sequence number, and late
//! replies for a request that has already been dropped are discarded.

mod clock;
mod stats;

pub use clock::PresentationClock;
pub use stats::{CaptureStats, CaptureStatsSnapshot};

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::config::{CaptureConfig, DriveMode};
use crate::encode::FrameEncoder;
use crate::error::{FramecastError, Result, ResultExt};
use crate::pipeline::{self, MediaSink, PipelineHandle, SinkBuffer, SinkCaps};
use crate::surface::{Snapshot, SnapshotReply, UiSurface};
use crate::types::{CaptureState, Dimensions, FrameBuffer, Handle};

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A snapshot request was issued
    Started,
    /// A cycle is already in flight
    Busy(CaptureState),
    /// Sink-driven mode and the sink has not asked for data
    AwaitingSink,
    /// The surface refused the request; the cycle was dropped
    Refused,
    /// The coordinator has been shut down
    Stopped,
}

/// Mutable cycle state, only touched under the lock
#[derive(Debug)]
struct Cycle {
    state: CaptureState,
    /// Set by need-data, consumed when a capture starts
    sink_ready: bool,
    /// Sequence number of the latest snapshot request
    request: u64,
    /// When the outstanding snapshot was requested (None once it arrived)
    requested_at: Option<Instant>,
    /// Set once by shutdown; nothing is requested or pushed afterwards
    stopped: bool,
}

struct Shared {
    config: CaptureConfig,
    surface: Arc<dyn UiSurface>,
    pipeline: PipelineHandle,
    encoder: FrameEncoder,
    cycle: Mutex<Cycle>,
    clock: Mutex<PresentationClock>,
    stats: CaptureStats,
    state_tx: watch::Sender<CaptureState>,
    resize_warned: AtomicBool,
}

/// Owns the capture state machine and the pipeline it feeds
///
/// Cheap to clone; clones share the same session. Create it once per
/// pipeline; there is no re-initialization.
#[derive(Clone)]
pub struct FrameCaptureCoordinator {
    shared: Arc<Shared>,
}

impl FrameCaptureCoordinator {
    /// Build and start the pipeline for `config.sink` and attach it to a surface
    ///
    /// The surface size is read once here and frozen into the sink caps.
    /// Any pipeline construction failure is fatal.
    pub fn initialize<S>(surface: Arc<S>, config: CaptureConfig) -> Result<Self>
    where
        S: UiSurface + 'static,
    {
        let caps = prepare(surface.as_ref(), &config)?;
        let sink = pipeline::open(&config.sink, &caps).context("Failed to build pipeline")?;
        Ok(Self::assemble(surface, config, caps, sink))
    }

    /// Same as [`initialize`](Self::initialize) with an already constructed sink
    pub fn with_sink<S>(surface: Arc<S>, config: CaptureConfig, sink: Box<dyn MediaSink>) -> Result<Self>
    where
        S: UiSurface + 'static,
    {
        let caps = prepare(surface.as_ref(), &config)?;
        Ok(Self::assemble(surface, config, caps, sink))
    }

    fn assemble(
        surface: Arc<dyn UiSurface>,
        config: CaptureConfig,
        caps: SinkCaps,
        sink: Box<dyn MediaSink>,
    ) -> Self {
        let pipeline = PipelineHandle::new(caps, sink);
        let (state_tx, _) = watch::channel(CaptureState::Idle);

        info!(
            "Capture session {} ready: {} -> {} ({:?}, {}ms ticks)",
            pipeline.handle(),
            caps,
            config.sink,
            config.drive,
            config.tick_interval_ms
        );

        let shared = Arc::new(Shared {
            encoder: FrameEncoder::from_config(&config),
            clock: Mutex::new(PresentationClock::new(config.frame_duration())),
            config,
            surface,
            pipeline,
            cycle: Mutex::new(Cycle {
                state: CaptureState::Idle,
                sink_ready: true,
                request: 0,
                requested_at: None,
                stopped: false,
            }),
            stats: CaptureStats::new(),
            state_tx,
            resize_warned: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&shared);
        shared
            .pipeline
            .sink()
            .set_need_data_callback(Arc::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.on_sink_needs_data();
                }
            }));

        Self { shared }
    }

    /// Session handle
    pub fn handle(&self) -> Handle {
        self.shared.pipeline.handle()
    }

    /// Current cycle state
    pub fn state(&self) -> CaptureState {
        self.shared.cycle.lock().state
    }

    /// Receive every state change
    pub fn subscribe_state(&self) -> watch::Receiver<CaptureState> {
        self.shared.state_tx.subscribe()
    }

    /// Caps declared to the sink at initialization
    pub fn caps(&self) -> &SinkCaps {
        self.shared.pipeline.caps()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.shared.config
    }

    pub fn stats(&self) -> CaptureStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Frames successfully handed to the sink so far
    pub fn frames_pushed(&self) -> u64 {
        self.shared.stats.frames_pushed()
    }

    /// Periodic tick: start a capture if the cycle is idle
    pub fn on_tick(&self) -> TickOutcome {
        Shared::on_tick(&self.shared)
    }

    /// The sink is ready for another buffer
    pub fn on_sink_needs_data(&self) {
        self.shared.on_sink_needs_data();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_stopped(&self) -> bool {
        self.shared.cycle.lock().stopped
    }

    /// Tick every `config.tick_interval` until `shutdown` resolves or the
    /// coordinator is shut down
    ///
    /// Missed ticks are skipped rather than bursted.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.shared.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!("Capture loop started for {}", self.handle());
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    if self.on_tick() == TickOutcome::Stopped {
                        break;
                    }
                }
            }
        }
        info!(
            "Capture loop stopped for {}: {}",
            self.handle(),
            self.stats().format_summary()
        );
    }

    /// Stop capturing, then send end of stream and stop the pipeline
    ///
    /// Later ticks return [`TickOutcome::Stopped`] and a snapshot still in
    /// flight is discarded. Calling it again does nothing.
    pub fn shutdown(&self) -> Result<()> {
        {
            let mut cycle = self.shared.cycle.lock();
            if cycle.stopped {
                return Ok(());
            }
            cycle.stopped = true;
            cycle.requested_at = None;
            self.shared.transition(&mut cycle, CaptureState::Idle);
        }

        info!("Shutting down capture session {}", self.handle());
        self.shared.pipeline.sink().finish()
    }
}

impl std::fmt::Debug for FrameCaptureCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCaptureCoordinator")
            .field("pipeline", &self.shared.pipeline)
            .field("state", &self.state())
            .finish()
    }
}

/// Validate config and freeze the surface size into caps
fn prepare(surface: &dyn UiSurface, config: &CaptureConfig) -> Result<SinkCaps> {
    config.validate_strict().map_err(FramecastError::Config)?;
    for warning in config.validate() {
        warn!("{}", warning);
    }

    let dimensions = surface.dimensions();
    if dimensions.is_empty() {
        return Err(FramecastError::config(format!(
            "Surface has no area ({})",
            dimensions
        )));
    }
    if dimensions.exceeds_limit() {
        return Err(FramecastError::config(format!(
            "Surface {} exceeds the {}px limit per side",
            dimensions,
            Dimensions::MAX_SIDE
        )));
    }

    Ok(SinkCaps::from_config(config, dimensions))
}

impl Shared {
    fn transition(&self, cycle: &mut Cycle, next: CaptureState) {
        trace!("Capture state {} -> {}", cycle.state, next);
        cycle.state = next;
        self.state_tx.send_replace(next);
    }

    /// Back to Idle without pushing anything
    ///
    /// The sink never got a buffer for its last request, so its demand is
    /// still outstanding and the ready flag is restored.
    fn reset_to_idle(&self, cycle: &mut Cycle) {
        cycle.requested_at = None;
        cycle.sink_ready = true;
        self.transition(cycle, CaptureState::Idle);
    }

    fn on_tick(this: &Arc<Self>) -> TickOutcome {
        this.stats.record_tick();

        let request = {
            let mut cycle = this.cycle.lock();
            if cycle.stopped {
                return TickOutcome::Stopped;
            }
            this.expire_stalled(&mut cycle);

            if cycle.state != CaptureState::Idle {
                this.stats.record_busy();
                trace!("Tick skipped: {}", cycle.state);
                return TickOutcome::Busy(cycle.state);
            }

            if this.config.drive == DriveMode::SinkDriven {
                if !cycle.sink_ready {
                    this.stats.record_awaiting_sink();
                    trace!("Tick skipped: sink has not asked for data");
                    return TickOutcome::AwaitingSink;
                }
                cycle.sink_ready = false;
            }

            cycle.request += 1;
            cycle.requested_at = Some(Instant::now());
            this.transition(&mut cycle, CaptureState::Capturing);
            cycle.request
        };

        this.stats.record_capture_started();
        trace!("Requesting snapshot #{}", request);

        let reply = Self::reply_for(this, request);
        match this.surface.request_snapshot(reply) {
            Ok(()) => TickOutcome::Started,
            Err(e) => {
                this.drop_request(request, &format!("surface refused snapshot: {}", e));
                TickOutcome::Refused
            }
        }
    }

    fn reply_for(this: &Arc<Self>, request: u64) -> SnapshotReply {
        let weak: Weak<Self> = Arc::downgrade(this);
        SnapshotReply::new(move |snapshot| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match snapshot {
                Some(snapshot) => shared.on_snapshot_ready(request, snapshot),
                None => shared.drop_request(request, "snapshot reply dropped without delivery"),
            }
        })
    }

    /// Force-reset a capture that has been outstanding too long
    fn expire_stalled(&self, cycle: &mut Cycle) {
        let (Some(timeout), Some(requested_at)) = (self.config.snapshot_timeout(), cycle.requested_at)
        else {
            return;
        };
        if cycle.state != CaptureState::Capturing || requested_at.elapsed() < timeout {
            return;
        }

        warn!(
            "Snapshot #{} stalled for {:?}, dropping frame",
            cycle.request,
            requested_at.elapsed()
        );
        self.stats.record_timed_out();
        self.reset_to_idle(cycle);
    }

    /// Abandon a capture cycle, if it is still the current one
    fn drop_request(&self, request: u64, reason: &str) {
        let mut cycle = self.cycle.lock();
        if cycle.state != CaptureState::Capturing || cycle.request != request {
            debug!("Ignoring drop of snapshot #{}: {}", request, reason);
            return;
        }

        warn!("Dropping frame for snapshot #{}: {}", request, reason);
        self.stats.record_dropped();
        self.reset_to_idle(&mut cycle);
    }

    fn on_snapshot_ready(&self, request: u64, snapshot: Snapshot) {
        {
            let mut cycle = self.cycle.lock();
            if cycle.stopped
                || cycle.state != CaptureState::Capturing
                || cycle.request != request
                || cycle.requested_at.is_none()
            {
                self.stats.record_stale();
                debug!("Discarding stale snapshot #{}", request);
                return;
            }
            if let Some(requested_at) = cycle.requested_at.take() {
                self.stats.record_snapshot_latency(requested_at.elapsed());
            }
        }

        if let Some(dimensions) = snapshot.dimensions() {
            let declared = self.pipeline.caps().dimensions;
            if dimensions != declared && !self.resize_warned.swap(true, Ordering::Relaxed) {
                warn!(
                    "Surface is now {} but the pipeline was declared {}; resizing is not supported",
                    dimensions, declared
                );
            }
        }

        let started = Instant::now();
        let frame = match self.encoder.encode(snapshot) {
            Ok(frame) => frame,
            Err(e) => {
                self.drop_request(request, &e.to_string());
                return;
            }
        };
        self.stats.record_encode_latency(started.elapsed());

        {
            let mut cycle = self.cycle.lock();
            if cycle.stopped || cycle.state != CaptureState::Capturing || cycle.request != request {
                self.stats.record_stale();
                debug!("Snapshot #{} was dropped while encoding", request);
                return;
            }
            self.transition(&mut cycle, CaptureState::Pushing);
        }

        self.push_frame(frame);
    }

    /// Stamp and submit one frame, then return to Idle whatever happens
    fn push_frame(&self, frame: FrameBuffer) {
        let (pts, duration) = self.clock.lock().advance();
        let size = frame.len();
        let buffer = SinkBuffer {
            data: frame.into_bytes(),
            pts,
            duration,
        };

        let result = self.pipeline.sink().push(buffer);

        let mut cycle = self.cycle.lock();
        match result {
            Ok(()) => {
                self.stats.record_pushed(size);
                trace!("Pushed {} bytes at pts {:?}", size, pts);
                cycle.requested_at = None;
                self.transition(&mut cycle, CaptureState::Idle);
            }
            Err(e) => {
                self.stats.record_push_failure();
                warn!("Push failed, dropping frame at pts {:?}: {}", pts, e);
                self.reset_to_idle(&mut cycle);
            }
        }
    }

    fn on_sink_needs_data(&self) {
        let mut cycle = self.cycle.lock();
        if !cycle.sink_ready {
            trace!("Sink needs data");
        }
        cycle.sink_ready = true;
    }
}
