//! Configuration types for framecast
//!
//! Provides sink targets, wire formats, pacing settings and the TOML
//! configuration file.

mod file;

pub use file::{sample_config, ConfigFile};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default UDP port for the network sink
pub const DEFAULT_UDP_PORT: u16 = 5007;

/// Default UDP host for the network sink
pub const DEFAULT_UDP_HOST: &str = "127.0.0.1";

/// Default JPEG quality
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Where pushed frames end up
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkTarget {
    /// Decode and show in a local window, with a clock overlay
    #[default]
    Display,
    /// RTP-payload and send over UDP
    Udp {
        /// Destination host
        host: String,
        /// Destination port
        port: u16,
    },
    /// Write each frame to a numbered file in a directory
    Directory {
        /// Output directory
        path: PathBuf,
    },
}

impl SinkTarget {
    /// UDP sink with the default host and port
    pub fn udp() -> Self {
        Self::Udp {
            host: DEFAULT_UDP_HOST.to_string(),
            port: DEFAULT_UDP_PORT,
        }
    }

    /// Directory sink
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory { path: path.into() }
    }

    /// Whether this target needs a GStreamer pipeline
    pub fn needs_gstreamer(&self) -> bool {
        !matches!(self, Self::Directory { .. })
    }
}

impl std::fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Display => write!(f, "display"),
            Self::Udp { host, port } => write!(f, "udp://{}:{}", host, port),
            Self::Directory { path } => write!(f, "dir:{}", path.display()),
        }
    }
}

/// Wire format of pushed buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    /// JPEG images (`image/jpeg`)
    #[default]
    Jpeg,
    /// Raw RGB565 video (`video/x-raw, format=RGB16`)
    Rgb16,
}

impl StreamFormat {
    /// MIME-style media type for the sink caps
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Rgb16 => "video/x-raw",
        }
    }

    /// File extension for frames written to disk
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Rgb16 => "rgb16",
        }
    }
}

impl std::fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jpeg => write!(f, "jpeg"),
            Self::Rgb16 => write!(f, "rgb16"),
        }
    }
}

impl std::str::FromStr for StreamFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" | "mjpeg" => Ok(Self::Jpeg),
            "rgb16" | "rgb565" | "raw" => Ok(Self::Rgb16),
            _ => Err(format!("Unknown stream format: {}", s)),
        }
    }
}

/// What paces new captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DriveMode {
    /// Every tick starts a capture if none is in flight
    #[default]
    Timer,
    /// A tick starts a capture only after the sink asked for data
    SinkDriven,
}

/// Complete capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Output target
    pub sink: SinkTarget,
    /// Wire format pushed to the sink
    pub format: StreamFormat,
    /// Declared framerate; each buffer lasts 1/framerate seconds
    pub framerate: u32,
    /// Period between ticks in milliseconds
    pub tick_interval_ms: u64,
    /// Capture pacing
    pub drive: DriveMode,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// How long a snapshot may stay outstanding before it is dropped
    /// (None = wait forever)
    pub snapshot_timeout_ms: Option<u64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::live()
    }
}

impl CaptureConfig {
    /// Live capture streaming: 15ms ticks, paced by sink demand
    pub fn live() -> Self {
        Self {
            sink: SinkTarget::default(),
            format: StreamFormat::default(),
            framerate: 15,
            tick_interval_ms: 15,
            drive: DriveMode::SinkDriven,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            snapshot_timeout_ms: Some(1000),
        }
    }

    /// Disk-backed demo playback: 500ms ticks, timer paced
    pub fn playback() -> Self {
        Self {
            sink: SinkTarget::default(),
            format: StreamFormat::default(),
            framerate: 2,
            tick_interval_ms: 500,
            drive: DriveMode::Timer,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            snapshot_timeout_ms: Some(5000),
        }
    }

    /// Set the output target
    pub fn with_sink(mut self, sink: SinkTarget) -> Self {
        self.sink = sink;
        self
    }

    /// Set the wire format
    pub fn with_format(mut self, format: StreamFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the declared framerate
    pub fn with_framerate(mut self, framerate: u32) -> Self {
        self.framerate = framerate;
        self
    }

    /// Set the tick period, rounded up to whole milliseconds
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = ceil_millis(interval);
        self
    }

    /// Set the pacing mode
    pub fn with_drive(mut self, drive: DriveMode) -> Self {
        self.drive = drive;
        self
    }

    /// Set the JPEG quality
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Set the stalled snapshot timeout (None disables it), rounded up to
    /// whole milliseconds
    pub fn with_snapshot_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.snapshot_timeout_ms = timeout.map(ceil_millis);
        self
    }

    /// Tick period
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Stalled snapshot timeout
    pub fn snapshot_timeout(&self) -> Option<Duration> {
        self.snapshot_timeout_ms.map(Duration::from_millis)
    }

    /// Nominal duration of one buffer, truncated to whole nanoseconds
    pub fn frame_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.framerate.max(1)))
    }

    /// Validate the configuration and return any warnings
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let frame_ms = self.frame_duration().as_millis() as u64;
        if self.drive == DriveMode::Timer && self.tick_interval_ms < frame_ms {
            warnings.push(format!(
                "Tick interval {}ms is shorter than the frame duration {}ms; timestamps will run ahead of wall time",
                self.tick_interval_ms, frame_ms
            ));
        }

        if self.format == StreamFormat::Rgb16 && matches!(self.sink, SinkTarget::Udp { .. }) {
            warnings.push(
                "Raw RGB16 over UDP uses far more bandwidth than JPEG".to_string(),
            );
        }

        if self.snapshot_timeout_ms.is_none() {
            warnings.push(
                "No snapshot timeout: a surface that never answers will stall capture".to_string(),
            );
        }

        warnings
    }

    /// Validate and return an error if configuration is invalid
    pub fn validate_strict(&self) -> Result<(), String> {
        if self.framerate == 0 {
            return Err("Framerate cannot be zero".to_string());
        }

        if self.framerate > 240 {
            return Err(format!(
                "Framerate {} exceeds maximum supported (240)",
                self.framerate
            ));
        }

        if self.tick_interval_ms == 0 {
            return Err("Tick interval cannot be zero".to_string());
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!(
                "JPEG quality {} must be between 1 and 100",
                self.jpeg_quality
            ));
        }

        if self.snapshot_timeout_ms == Some(0) {
            return Err("Snapshot timeout cannot be zero".to_string());
        }

        if let SinkTarget::Udp { host, port } = &self.sink {
            if host.is_empty() {
                return Err("UDP host cannot be empty".to_string());
            }
            if *port == 0 {
                return Err("UDP port cannot be zero".to_string());
            }
        }

        Ok(())
    }
}

/// A non-zero duration never becomes zero milliseconds
fn ceil_millis(duration: Duration) -> u64 {
    let nanos = duration.as_nanos().div_ceil(1_000_000);
    u64::try_from(nanos).unwrap_or(u64::MAX)
}
