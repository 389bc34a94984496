//! Framecast CLI
//!
//! Capture a frame source on a timer and push it into a media pipeline.
//!
//! # Usage
//!
//! ```bash
//! # Test pattern to a local window
//! framecast cast
//!
//! # A folder of JPEGs over UDP, paced by a 500ms timer
//! framecast cast --images ./slides --sink udp --timer --interval-ms 500 --fps 2
//!
//! # Show the GStreamer pipeline that would be built
//! framecast describe --sink udp
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Framecast - UI frame capture into media pipelines
#[derive(Parser)]
#[command(name = "framecast")]
#[command(version)]
#[command(about = "Capture UI frames and push them into a GStreamer pipeline", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start capturing and pushing frames
    Cast(commands::CastArgs),

    /// Print the pipeline description for a sink
    Describe(commands::DescribeArgs),

    /// Manage the configuration file
    Config(commands::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("framecast={}", level).parse()?),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Cast(args) => commands::cast(args).await?,
        Commands::Describe(args) => commands::describe(args)?,
        Commands::Config(args) => commands::config(args).await?,
    }

    Ok(())
}
