//! Configuration file loading and merging
//!
//! Loads user configuration from `~/.config/framecast/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::{
    CaptureConfig, DriveMode, SinkTarget, StreamFormat, DEFAULT_JPEG_QUALITY, DEFAULT_UDP_HOST,
    DEFAULT_UDP_PORT,
};
use crate::error::{FramecastError, Result};

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Capture pacing settings
    #[serde(default)]
    pub capture: CaptureSettings,

    /// Encoder settings
    #[serde(default)]
    pub encoder: EncoderSettings,

    /// Output sink settings
    #[serde(default)]
    pub sink: SinkSettings,
}

/// Capture pacing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Declared framerate
    #[serde(default = "default_framerate")]
    pub framerate: u32,

    /// Tick period in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Pacing mode (timer, sink-driven)
    #[serde(default = "default_drive")]
    pub drive: String,

    /// Stalled snapshot timeout in milliseconds (0 = wait forever)
    #[serde(default = "default_timeout_ms")]
    pub snapshot_timeout_ms: u64,
}

/// Encoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// Wire format (jpeg, rgb16)
    #[serde(default = "default_format")]
    pub format: String,

    /// JPEG quality (1-100)
    #[serde(default = "default_quality")]
    pub quality: u8,
}

/// Output sink settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkSettings {
    /// Sink kind (display, udp, dir)
    #[serde(default = "default_sink_kind")]
    pub kind: String,

    /// UDP destination host
    #[serde(default = "default_host")]
    pub host: String,

    /// UDP destination port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Output directory for the dir sink
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_framerate() -> u32 {
    15
}

fn default_interval_ms() -> u64 {
    15
}

fn default_drive() -> String {
    "sink-driven".to_string()
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_format() -> String {
    "jpeg".to_string()
}

fn default_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_sink_kind() -> String {
    "display".to_string()
}

fn default_host() -> String {
    DEFAULT_UDP_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_UDP_PORT
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            framerate: default_framerate(),
            interval_ms: default_interval_ms(),
            drive: default_drive(),
            snapshot_timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            quality: default_quality(),
        }
    }
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            kind: default_sink_kind(),
            host: default_host(),
            port: default_port(),
            path: None,
        }
    }
}

impl ConfigFile {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("framecast").join("config.toml")
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("framecast")
                .join("config.toml")
        } else {
            PathBuf::from("/etc/framecast/config.toml")
        }
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| FramecastError::Config(format!("Failed to read config file: {}", e)))?;

        let config: ConfigFile = toml::from_str(&content)?;

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration, logging warnings but returning defaults on error
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    FramecastError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| FramecastError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&path, content)
            .map_err(|e| FramecastError::Config(format!("Failed to write config file: {}", e)))?;

        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Convert the file settings into a capture configuration
    pub fn to_capture_config(&self) -> Result<CaptureConfig> {
        let drive = match self.capture.drive.to_lowercase().as_str() {
            "timer" => DriveMode::Timer,
            "sink-driven" | "sink" | "need-data" => DriveMode::SinkDriven,
            other => {
                return Err(FramecastError::config(format!(
                    "Unknown drive mode '{}'. Valid options: timer, sink-driven",
                    other
                )));
            }
        };

        let format: StreamFormat = self
            .encoder
            .format
            .parse()
            .map_err(FramecastError::Config)?;

        let sink = match self.sink.kind.to_lowercase().as_str() {
            "display" => SinkTarget::Display,
            "udp" => SinkTarget::Udp {
                host: self.sink.host.clone(),
                port: self.sink.port,
            },
            "dir" | "directory" => {
                let path = self.sink.path.clone().ok_or_else(|| {
                    FramecastError::config("sink.path is required for the dir sink")
                })?;
                SinkTarget::Directory { path }
            }
            other => {
                return Err(FramecastError::config(format!(
                    "Unknown sink '{}'. Valid options: display, udp, dir",
                    other
                )));
            }
        };

        let timeout = match self.capture.snapshot_timeout_ms {
            0 => None,
            ms => Some(ms),
        };

        let config = CaptureConfig {
            sink,
            format,
            framerate: self.capture.framerate,
            tick_interval_ms: self.capture.interval_ms,
            drive,
            jpeg_quality: self.encoder.quality,
            snapshot_timeout_ms: timeout,
        };

        config.validate_strict().map_err(FramecastError::Config)?;
        Ok(config)
    }
}

/// Generate a sample configuration file
pub fn sample_config() -> String {
    r#"# framecast configuration

[capture]
# Declared framerate; every pushed buffer lasts 1/framerate seconds
framerate = 15

# Period between capture ticks in milliseconds
interval_ms = 15

# Pacing: "timer" (every tick) or "sink-driven" (only when the sink asks for data)
drive = "sink-driven"

# Drop a snapshot that has not completed after this many milliseconds (0 = never)
snapshot_timeout_ms = 1000

[encoder]
# Wire format: jpeg, rgb16
format = "jpeg"

# JPEG quality (1-100)
quality = 85

[sink]
# Output: display, udp, dir
kind = "display"

# UDP destination (udp sink only)
host = "127.0.0.1"
port = 5007

# Output directory (dir sink only)
# path = "/tmp/framecast"
"#
    .to_string()
}
