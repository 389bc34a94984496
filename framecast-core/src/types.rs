//! Core types for framecast
//!
//! These types represent the fundamental data structures passed between
//! the UI surface, the capture coordinator, and the media sink.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global handle counter for unique session IDs
static HANDLE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque handle for a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    /// Create a new unique handle
    pub fn new() -> Self {
        Self(HANDLE_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw handle value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

/// Frame dimensions in pixels
///
/// Read once from the surface when a session starts and frozen into the
/// sink caps. Resizing the surface mid-session is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Largest accepted width or height
    pub const MAX_SIDE: u32 = 8192;

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either side is larger than [`MAX_SIDE`](Self::MAX_SIDE)
    pub fn exceeds_limit(&self) -> bool {
        self.width > Self::MAX_SIDE || self.height > Self::MAX_SIDE
    }

    /// Number of pixels in a frame
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether either side is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Memory order of 32-bit pixels in a raw snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelLayout {
    /// R, G, B, A bytes
    #[default]
    Rgba,
    /// B, G, R, A bytes (little-endian ARGB32)
    Bgra,
}

impl PixelLayout {
    /// Read (r, g, b) from one 4-byte pixel
    #[inline]
    pub fn rgb(&self, px: &[u8]) -> (u8, u8, u8) {
        match self {
            Self::Rgba => (px[0], px[1], px[2]),
            Self::Bgra => (px[2], px[1], px[0]),
        }
    }
}

/// Raw pixels produced by one surface snapshot
#[derive(Debug, Clone)]
pub struct RawImage {
    pub dimensions: Dimensions,
    pub layout: PixelLayout,
    /// Tightly packed pixels, 4 bytes each
    pub data: Vec<u8>,
}

impl RawImage {
    pub fn new(dimensions: Dimensions, layout: PixelLayout, data: Vec<u8>) -> Self {
        Self {
            dimensions,
            layout,
            data,
        }
    }

    /// A frame filled with a single RGBA color
    pub fn solid(dimensions: Dimensions, rgba: [u8; 4]) -> Self {
        let data = rgba.repeat(dimensions.pixel_count());
        Self::new(dimensions, PixelLayout::Rgba, data)
    }

    /// Expected byte length for the declared dimensions
    pub fn expected_len(&self) -> usize {
        self.dimensions.pixel_count() * 4
    }
}

/// One encoded frame, ready to be pushed
///
/// Exclusively owned: it is not `Clone`, and pushing consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameBuffer(Bytes);

impl FrameBuffer {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Give up ownership of the bytes
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

/// Capture cycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    /// No capture in flight, a tick may start one
    #[default]
    Idle,
    /// A snapshot request is outstanding
    Capturing,
    /// An encoded frame is being handed to the sink
    Pushing,
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Capturing => write!(f, "capturing"),
            Self::Pushing => write!(f, "pushing"),
        }
    }
}
