//! Config command - inspect and create the configuration file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use framecast_core::config::{sample_config, ConfigFile};

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Use this file instead of ~/.config/framecast/config.toml
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Print the effective capture settings
    Show,

    /// Write the sample config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the sample config to stdout
    Sample,
}

/// Run config subcommand
pub async fn config(args: ConfigArgs) -> Result<()> {
    let path = args.file.unwrap_or_else(ConfigFile::default_path);

    match args.command {
        ConfigCommand::Path => {
            let state = if path.exists() { "exists" } else { "missing" };
            println!("{} ({})", path.display(), state);
        }
        ConfigCommand::Show => {
            if !path.exists() {
                println!("No configuration file at {}; showing defaults.", path.display());
                println!("Create one with: framecast config init\n");
            }

            let file = ConfigFile::load_from(path.clone())
                .with_context(|| format!("Failed to load {}", path.display()))?;
            let capture = file
                .to_capture_config()
                .context("Configuration file is invalid")?;

            println!("Sink:       {}", capture.sink);
            println!("Format:     {} (quality {})", capture.format, capture.jpeg_quality);
            println!("Framerate:  {} fps", capture.framerate);
            println!("Interval:   {} ms", capture.tick_interval_ms);
            println!("Drive:      {:?}", capture.drive);
            match capture.snapshot_timeout_ms {
                Some(ms) => println!("Timeout:    {} ms", ms),
                None => println!("Timeout:    none"),
            }
            for warning in capture.validate() {
                println!("Warning:    {}", warning);
            }
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                println!("{} already exists; use --force to overwrite.", path.display());
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            std::fs::write(&path, sample_config()).context("Failed to write config file")?;

            println!("Created {}", path.display());
        }
        ConfigCommand::Sample => {
            print!("{}", sample_config());
        }
    }

    Ok(())
}
