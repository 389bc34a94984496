//! Sink and pacing flags shared by `cast` and `describe`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use framecast_core::config::{
    CaptureConfig, ConfigFile, DriveMode, SinkTarget, StreamFormat, DEFAULT_UDP_HOST,
    DEFAULT_UDP_PORT,
};
use framecast_core::types::Dimensions;

/// Output flags; anything left unset comes from the config file
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Sink (display, udp, dir)
    #[arg(short, long)]
    sink: Option<String>,

    /// UDP destination host
    #[arg(long)]
    host: Option<String>,

    /// UDP destination port
    #[arg(short, long)]
    port: Option<u16>,

    /// Output directory for the dir sink
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Wire format (jpeg, rgb16)
    #[arg(short, long)]
    format: Option<String>,

    /// Declared framerate
    #[arg(long)]
    fps: Option<u32>,

    /// Tick period in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Only capture when the sink asks for data
    #[arg(long, conflicts_with = "timer")]
    sink_driven: bool,

    /// Capture on every tick
    #[arg(long)]
    timer: bool,

    /// JPEG quality (1-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Drop a stalled snapshot after this many milliseconds (0 = never)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl OutputArgs {
    /// Config file settings with the command line applied on top
    pub fn resolve(&self) -> Result<CaptureConfig> {
        let file = ConfigFile::load_or_default();
        let base = file
            .to_capture_config()
            .context("Invalid configuration file")?;
        let mut config = self.apply(base)?;

        if let SinkTarget::Udp { host, port } = &mut config.sink {
            if let Some(h) = &self.host {
                *host = h.clone();
            }
            if let Some(p) = self.port {
                *port = p;
            }
        }

        config
            .validate_strict()
            .map_err(anyhow::Error::msg)
            .context("Invalid capture settings")?;
        Ok(config)
    }

    fn apply(&self, mut config: CaptureConfig) -> Result<CaptureConfig> {
        if let Some(kind) = &self.sink {
            config.sink = match kind.to_lowercase().as_str() {
                "display" => SinkTarget::Display,
                "udp" => SinkTarget::Udp {
                    host: DEFAULT_UDP_HOST.to_string(),
                    port: DEFAULT_UDP_PORT,
                },
                "dir" | "directory" => {
                    let path = self
                        .out
                        .clone()
                        .ok_or_else(|| anyhow::anyhow!("--out is required with --sink dir"))?;
                    SinkTarget::Directory { path }
                }
                other => {
                    return Err(anyhow::anyhow!(
                        "Invalid sink '{}'. Valid options: display, udp, dir",
                        other
                    ));
                }
            };
        } else if let (Some(path), SinkTarget::Directory { .. }) = (&self.out, &config.sink) {
            config.sink = SinkTarget::directory(path);
        }

        if let Some(format) = &self.format {
            let format: StreamFormat = format.parse().map_err(anyhow::Error::msg)?;
            config = config.with_format(format);
        }
        if let Some(fps) = self.fps {
            config = config.with_framerate(fps);
        }
        if let Some(ms) = self.interval_ms {
            config = config.with_tick_interval(Duration::from_millis(ms));
        }
        if self.sink_driven {
            config = config.with_drive(DriveMode::SinkDriven);
        } else if self.timer {
            config = config.with_drive(DriveMode::Timer);
        }
        if let Some(quality) = self.quality {
            config = config.with_jpeg_quality(quality);
        }
        if let Some(ms) = self.timeout_ms {
            let timeout = (ms > 0).then(|| Duration::from_millis(ms));
            config = config.with_snapshot_timeout(timeout);
        }

        Ok(config)
    }
}

/// Check `--width/--height` before anything is allocated for them
pub fn surface_size(width: u32, height: u32) -> Result<Dimensions> {
    let dimensions = Dimensions::new(width, height);
    if dimensions.is_empty() {
        anyhow::bail!("Surface size {} has no area", dimensions);
    }
    if dimensions.exceeds_limit() {
        anyhow::bail!(
            "Surface size {} is too large (at most {} pixels per side)",
            dimensions,
            Dimensions::MAX_SIDE
        );
    }
    Ok(dimensions)
}
