//! Cast command - capture a frame source into the pipeline

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use framecast_core::config::CaptureConfig;
use framecast_core::coordinator::FrameCaptureCoordinator;
use framecast_core::surface::{ImageSequence, TestPattern};
use tokio::signal;
use tracing::{info, warn};

use super::output::{surface_size, OutputArgs};

/// Arguments for the cast command
#[derive(Args)]
pub struct CastArgs {
    /// Loop over the JPEG files in this directory instead of a test pattern
    #[arg(short, long)]
    images: Option<PathBuf>,

    /// Test pattern width in pixels
    #[arg(long, default_value = "400")]
    width: u32,

    /// Test pattern height in pixels
    #[arg(long, default_value = "300")]
    height: u32,

    /// Stop after this many frames have been pushed
    #[arg(short = 'n', long)]
    frames: Option<u64>,

    /// Print final statistics as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    output: OutputArgs,
}

/// Run a capture session until Ctrl+C or the frame limit
pub async fn cast(args: CastArgs) -> Result<()> {
    let config = args.output.resolve()?;

    if !args.json {
        print_config(&config);
    }

    let coordinator = match &args.images {
        Some(dir) => {
            let source = ImageSequence::open(dir)
                .with_context(|| format!("Failed to open image directory {}", dir.display()))?;
            info!("Casting {} images from {}", source.len(), dir.display());
            FrameCaptureCoordinator::initialize(Arc::new(source), config)
        }
        None => {
            let source = TestPattern::new(surface_size(args.width, args.height)?);
            FrameCaptureCoordinator::initialize(Arc::new(source), config)
        }
    }
    .map_err(|e| {
        if let Some(hint) = e.user_hint() {
            eprintln!("Hint: {}", hint);
        }
        e
    })
    .context("Failed to start capture")?;

    if !args.json {
        println!("Capturing {}", coordinator.caps());
        println!("Press Ctrl+C to stop...\n");
    }

    let limit = args.frames;
    let stop = {
        let coordinator = coordinator.clone();
        async move {
            tokio::select! {
                _ = wait_for_ctrl_c() => {
                    info!("Received interrupt signal");
                }
                _ = wait_for_frames(&coordinator, limit) => {
                    info!("Frame limit reached");
                }
            }
        }
    };

    coordinator.run_until(stop).await;
    coordinator.shutdown().context("Failed to stop pipeline")?;

    let stats = coordinator.stats();
    if args.json {
        println!("{}", stats.to_json());
    } else {
        println!("\nCapture stopped.");
        println!("  Frames pushed:  {}", stats.frames_pushed);
        println!("  Frames dropped: {}", stats.frames_dropped);
        println!("  Push failures:  {}", stats.push_failures);
        println!("  Snapshot:       {:.1} ms avg", stats.snapshot_latency_ms);
        println!("  Encode:         {:.1} ms avg", stats.encode_latency_ms);
        println!("  Rate:           {:.1} fps", stats.fps);
    }

    Ok(())
}

fn print_config(config: &CaptureConfig) {
    println!("Framecast - Starting Capture\n");
    println!("Configuration:");
    println!("  Sink:      {}", config.sink);
    println!("  Format:    {}", config.format);
    println!("  Framerate: {} fps", config.framerate);
    println!("  Interval:  {} ms ({:?})", config.tick_interval_ms, config.drive);
    match config.snapshot_timeout() {
        Some(timeout) => println!("  Timeout:   {:?}", timeout),
        None => println!("  Timeout:   none"),
    }
    println!();
}

async fn wait_for_ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn wait_for_frames(coordinator: &FrameCaptureCoordinator, limit: Option<u64>) {
    let Some(limit) = limit else {
        return std::future::pending().await;
    };

    let mut state = coordinator.subscribe_state();
    while coordinator.frames_pushed() < limit {
        if state.changed().await.is_err() {
            return;
        }
    }
}
