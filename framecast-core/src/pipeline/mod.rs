//! Media sinks
//!
//! The sink is the ingestion end of an external media pipeline. It accepts
//! timestamped buffers in the format declared at construction, and may
//! signal when it wants the next one.
//!
//! Supported targets:
//! - Local display: `jpegdec ! clockoverlay ! videoconvert ! autovideosink`
//! - UDP: `rtpjpegpay ! udpsink` (port 5007 by default)
//! - Directory: one file per frame, no GStreamer involved

mod directory;
#[cfg(feature = "gstreamer")]
mod appsrc;
mod launch;

pub use directory::DirectorySink;
#[cfg(feature = "gstreamer")]
pub use appsrc::GstSink;
pub use launch::{describe, APPSRC_NAME};

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{CaptureConfig, SinkTarget, StreamFormat};
use crate::error::Result;
use crate::types::{Dimensions, Handle};

/// Called by a sink when it is ready for the next buffer
pub type NeedDataCallback = Arc<dyn Fn() + Send + Sync>;

/// Input format declared to the sink, fixed for the whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkCaps {
    pub format: StreamFormat,
    pub dimensions: Dimensions,
    pub framerate_num: u32,
    pub framerate_den: u32,
}

impl SinkCaps {
    pub fn new(format: StreamFormat, dimensions: Dimensions, framerate: u32) -> Self {
        Self {
            format,
            dimensions,
            framerate_num: framerate,
            framerate_den: 1,
        }
    }

    /// Caps for a configuration and frozen surface size
    pub fn from_config(config: &CaptureConfig, dimensions: Dimensions) -> Self {
        Self::new(config.format, dimensions, config.framerate)
    }

    /// MIME-style media type
    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }
}

impl std::fmt::Display for SinkCaps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.media_type())?;
        if self.format == StreamFormat::Rgb16 {
            write!(f, ",format=RGB16")?;
        }
        write!(
            f,
            ",width={},height={},framerate={}/{}",
            self.dimensions.width, self.dimensions.height, self.framerate_num, self.framerate_den
        )
    }
}

/// One buffer handed to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkBuffer {
    pub data: Bytes,
    /// Presentation timestamp from the session start
    pub pts: Duration,
    pub duration: Duration,
}

/// Ingestion endpoint of a media pipeline
pub trait MediaSink: Send + Sync {
    /// Submit one buffer
    fn push(&self, buffer: SinkBuffer) -> Result<()>;

    /// Register the need-data callback, replacing any previous one
    fn set_need_data_callback(&self, callback: NeedDataCallback);

    /// Signal end of stream and release the pipeline
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// An opened pipeline and the caps it was built for
pub struct PipelineHandle {
    handle: Handle,
    caps: SinkCaps,
    sink: Box<dyn MediaSink>,
}

impl PipelineHandle {
    pub fn new(caps: SinkCaps, sink: Box<dyn MediaSink>) -> Self {
        Self {
            handle: Handle::new(),
            caps,
            sink,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn caps(&self) -> &SinkCaps {
        &self.caps
    }

    pub fn sink(&self) -> &dyn MediaSink {
        self.sink.as_ref()
    }
}

impl std::fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("handle", &self.handle)
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

/// Build and start the sink for a target
///
/// Display and UDP targets need the `gstreamer` feature (on by default);
/// without it they return [`FramecastError::Unsupported`]. There is no
/// fallback: any construction failure is returned as a pipeline error.
///
/// [`FramecastError::Unsupported`]: crate::error::FramecastError::Unsupported
pub fn open(target: &SinkTarget, caps: &SinkCaps) -> Result<Box<dyn MediaSink>> {
    info!("Opening {} sink with caps {}", target, caps);

    match target {
        SinkTarget::Directory { path } => Ok(Box::new(DirectorySink::create(path, caps.format)?)),
        #[cfg(feature = "gstreamer")]
        SinkTarget::Display | SinkTarget::Udp { .. } => Ok(Box::new(GstSink::launch(target, caps)?)),
        #[cfg(not(feature = "gstreamer"))]
        SinkTarget::Display | SinkTarget::Udp { .. } => Err(crate::error::FramecastError::unsupported(format!(
            "The {} sink requires framecast to be built with the `gstreamer` feature",
            target
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(not(feature = "gstreamer"))]
    use crate::error::FramecastError;

    #[test]
    fn test_caps_display() {
        let caps = SinkCaps::new(StreamFormat::Jpeg, Dimensions::new(400, 300), 15);
        assert_eq!(
            caps.to_string(),
            "image/jpeg,width=400,height=300,framerate=15/1"
        );

        let caps = SinkCaps::new(StreamFormat::Rgb16, Dimensions::new(384, 288), 4);
        assert_eq!(
            caps.to_string(),
            "video/x-raw,format=RGB16,width=384,height=288,framerate=4/1"
        );
    }

    #[cfg(not(feature = "gstreamer"))]
    #[test]
    fn test_gstreamer_targets_fail_without_feature() {
        let caps = SinkCaps::new(StreamFormat::Jpeg, Dimensions::new(400, 300), 15);
        let err = open(&SinkTarget::udp(), &caps).err().unwrap();
        assert!(matches!(err, FramecastError::Unsupported(_)));
        assert!(!err.is_recoverable());
        assert!(err.user_hint().is_some());
    }
}
