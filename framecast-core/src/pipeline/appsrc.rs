//! GStreamer appsrc pipelines for the display and UDP targets

use std::sync::Arc;

use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::{describe, MediaSink, NeedDataCallback, SinkBuffer, SinkCaps, APPSRC_NAME};
use crate::config::SinkTarget;
use crate::error::{FramecastError, Result};

/// A running `appsrc ! ...` pipeline
pub struct GstSink {
    pipeline: gst::Pipeline,
    appsrc: gst_app::AppSrc,
    need_data: Arc<Mutex<Option<NeedDataCallback>>>,
}

impl GstSink {
    /// Parse, configure and start the pipeline for a target
    pub fn launch(target: &SinkTarget, caps: &SinkCaps) -> Result<Self> {
        let description = describe(target, caps).ok_or_else(|| {
            FramecastError::pipeline(format!("{} is not a GStreamer target", target))
        })?;

        let sink = Self::from_description(&description)?;
        info!("Pipeline playing: {} ({})", target, caps);
        Ok(sink)
    }

    /// Start any launch description that has an appsrc named `framesrc`
    pub fn from_description(description: &str) -> Result<Self> {
        gst::init()?;
        debug!("Launching pipeline: {}", description);

        let pipeline = gst::parse::launch(description)?
            .downcast::<gst::Pipeline>()
            .map_err(|_| FramecastError::pipeline("Launch description did not produce a pipeline"))?;

        let appsrc = pipeline
            .by_name(APPSRC_NAME)
            .and_then(|element| element.downcast::<gst_app::AppSrc>().ok())
            .ok_or_else(|| FramecastError::pipeline("Failed to get appsrc element"))?;

        appsrc.set_format(gst::Format::Time);
        appsrc.set_is_live(true);
        appsrc.set_stream_type(gst_app::AppStreamType::Stream);

        let need_data: Arc<Mutex<Option<NeedDataCallback>>> = Arc::new(Mutex::new(None));
        let slot = need_data.clone();
        appsrc.set_callbacks(
            gst_app::AppSrcCallbacks::builder()
                .need_data(move |_src, _hint| {
                    let callback = slot.lock().clone();
                    if let Some(callback) = callback {
                        callback();
                    }
                })
                .build(),
        );

        pipeline.set_state(gst::State::Playing)?;

        Ok(Self {
            pipeline,
            appsrc,
            need_data,
        })
    }

    fn log_bus_errors(&self) {
        let Some(bus) = self.pipeline.bus() else {
            return;
        };
        while let Some(msg) = bus.pop_filtered(&[gst::MessageType::Error]) {
            if let gst::MessageView::Error(err) = msg.view() {
                error!(
                    "Pipeline error from {:?}: {} ({:?})",
                    err.src().map(|s| s.path_string()),
                    err.error(),
                    err.debug()
                );
            }
        }
    }
}

impl MediaSink for GstSink {
    fn push(&self, buffer: SinkBuffer) -> Result<()> {
        let mut gst_buffer = gst::Buffer::from_slice(buffer.data);
        {
            let buf = gst_buffer.make_mut();
            buf.set_pts(gst::ClockTime::from_nseconds(buffer.pts.as_nanos() as u64));
            buf.set_duration(gst::ClockTime::from_nseconds(
                buffer.duration.as_nanos() as u64,
            ));
        }

        self.appsrc.push_buffer(gst_buffer).map(|_| ()).map_err(|flow| {
            self.log_bus_errors();
            FramecastError::sink(format!("appsrc rejected buffer: {:?}", flow))
        })
    }

    fn set_need_data_callback(&self, callback: NeedDataCallback) {
        *self.need_data.lock() = Some(callback);
    }

    fn finish(&self) -> Result<()> {
        if let Err(flow) = self.appsrc.end_of_stream() {
            warn!("Failed to send end of stream: {:?}", flow);
        }
        self.pipeline.set_state(gst::State::Null)?;
        info!("Pipeline stopped");
        Ok(())
    }
}

impl Drop for GstSink {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}
