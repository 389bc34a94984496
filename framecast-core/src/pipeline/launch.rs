//! gst-launch descriptions for the supported topologies

use crate::config::{SinkTarget, StreamFormat};

use super::SinkCaps;

/// Name of the appsrc element frames are pushed into
pub const APPSRC_NAME: &str = "framesrc";

/// Render the pipeline description for a target
///
/// Returns `None` for targets that are not GStreamer pipelines.
pub fn describe(target: &SinkTarget, caps: &SinkCaps) -> Option<String> {
    let src = format!(
        "appsrc name={} is-live=true format=time caps=\"{}\"",
        APPSRC_NAME, caps
    );

    let tail = match (target, caps.format) {
        (SinkTarget::Display, StreamFormat::Jpeg) => {
            "jpegdec ! clockoverlay ! videoconvert ! autovideosink".to_string()
        }
        (SinkTarget::Display, StreamFormat::Rgb16) => {
            "videoconvert ! clockoverlay ! videoconvert ! autovideosink".to_string()
        }
        (SinkTarget::Udp { host, port }, StreamFormat::Jpeg) => {
            format!("rtpjpegpay ! udpsink host={} port={}", host, port)
        }
        (SinkTarget::Udp { host, port }, StreamFormat::Rgb16) => {
            format!(
                "videoconvert ! rtpvrawpay ! udpsink host={} port={}",
                host, port
            )
        }
        (SinkTarget::Directory { .. }, _) => return None,
    };

    Some(format!("{} ! {}", src, tail))
}
