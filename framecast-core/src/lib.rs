//! Framecast Core Library
//!
//! Periodic UI snapshots encoded and pushed into a media pipeline.
//!
//! This library provides:
//! - A capture coordinator that never overlaps snapshot requests
//! - JPEG and RGB16 frame encoding
//! - GStreamer appsrc sinks (local display, UDP) and a frame-per-file sink
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────┐    ┌─────────────────┐
//! │ UI Surface      │───▶│ JPEG / RGB16 │───▶│ Media Sink      │
//! │ (snapshot)      │    │ Encode       │    │ (appsrc / dir)  │
//! └─────────────────┘    └──────────────┘    └─────────────────┘
//!          ▲                                          │
//!          └──────── tick / need-data ◀───────────────┘
//! ```

pub mod config;
pub mod coordinator;
pub mod encode;
pub mod error;
pub mod pipeline;
pub mod surface;
pub mod types;

pub use config::{CaptureConfig, DriveMode, SinkTarget, StreamFormat};
pub use coordinator::{CaptureStatsSnapshot, FrameCaptureCoordinator, TickOutcome};
pub use error::{FramecastError, Result};
pub use pipeline::{MediaSink, SinkBuffer, SinkCaps};
pub use surface::{Snapshot, SnapshotReply, UiSurface};
pub use types::{CaptureState, Dimensions, FrameBuffer, Handle, RawImage};
