//! Describe command - print the pipeline that `cast` would build

use anyhow::Result;
use clap::Args;
use framecast_core::config::SinkTarget;
use framecast_core::pipeline::{self, SinkCaps};

use super::output::{surface_size, OutputArgs};

/// Arguments for the describe command
#[derive(Args)]
pub struct DescribeArgs {
    /// Surface width in pixels
    #[arg(long, default_value = "400")]
    width: u32,

    /// Surface height in pixels
    #[arg(long, default_value = "300")]
    height: u32,

    #[command(flatten)]
    output: OutputArgs,
}

/// Print the caps and pipeline description
pub fn describe(args: DescribeArgs) -> Result<()> {
    let config = args.output.resolve()?;
    let caps = SinkCaps::from_config(&config, surface_size(args.width, args.height)?);

    println!("Sink:  {}", config.sink);
    println!("Caps:  {}", caps);
    match pipeline::describe(&config.sink, &caps) {
        Some(description) => println!("Pipeline:\n  {}", description),
        None => {
            if let SinkTarget::Directory { path } = &config.sink {
                println!(
                    "Pipeline:\n  (none) frames are written to {}",
                    path.display()
                );
            }
        }
    }

    if config.sink.needs_gstreamer() && !cfg!(feature = "gstreamer") {
        println!();
        println!("Note: this build has no GStreamer support; `cast` will fail for this sink.");
    }

    Ok(())
}
