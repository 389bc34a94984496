//! Snapshot encoding
//!
//! Turns a surface snapshot into the byte format declared in the sink
//! caps: JPEG images, or raw RGB565 video.

mod convert;

pub use convert::{rgb565, to_rgb16, to_rgb8};

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tracing::trace;

use crate::config::{CaptureConfig, StreamFormat};
use crate::error::{FramecastError, Result};
use crate::surface::Snapshot;
use crate::types::FrameBuffer;

/// JPEG SOI marker
pub const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

/// Encodes snapshots into the declared wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEncoder {
    format: StreamFormat,
    quality: u8,
}

impl FrameEncoder {
    pub fn new(format: StreamFormat, quality: u8) -> Self {
        Self {
            format,
            quality: quality.clamp(1, 100),
        }
    }

    /// Encoder matching a capture configuration
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.format, config.jpeg_quality)
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode one snapshot
    pub fn encode(&self, snapshot: Snapshot) -> Result<FrameBuffer> {
        let frame = match (self.format, snapshot) {
            (StreamFormat::Jpeg, Snapshot::Encoded(bytes)) => {
                if !bytes.starts_with(&JPEG_MAGIC) {
                    return Err(FramecastError::encoder(
                        "Pre-encoded snapshot is not a JPEG image",
                    ));
                }
                FrameBuffer::new(bytes)
            }
            (StreamFormat::Jpeg, Snapshot::Raw(img)) => {
                let rgb = to_rgb8(&img)?;
                let mut out = Vec::new();
                JpegEncoder::new_with_quality(&mut out, self.quality).write_image(
                    &rgb,
                    img.dimensions.width,
                    img.dimensions.height,
                    ExtendedColorType::Rgb8,
                )?;
                FrameBuffer::new(out)
            }
            (StreamFormat::Rgb16, Snapshot::Raw(img)) => FrameBuffer::new(to_rgb16(&img)?),
            (StreamFormat::Rgb16, Snapshot::Encoded(bytes)) => {
                let decoded = image::load_from_memory(&bytes)?.to_rgb8();
                FrameBuffer::new(convert::rgb8_to_rgb16(decoded.as_raw()))
            }
        };

        trace!("Encoded {} frame: {} bytes", self.format, frame.len());
        Ok(frame)
    }
}
