//! Coverstego - LSB steganography for images, audio and video
//!
//! A CLI tool for hiding payloads in the least significant bits of PNG/BMP
//! images, 16-bit WAV audio and (through ffmpeg) video.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use commands::{CapacityCommand, CommandExecutor, DecodeCommand, EncodeCommand, InfoCommand};
use coverstego::Config;

/// Coverstego - LSB steganography for images, audio and video
///
/// Hides a message or file in the lowest bits of a cover file and extracts
/// it again. Defaults are read from ~/.coverstego/config.toml.
#[derive(Parser)]
#[command(name = "coverstego")]
#[command(version)]
#[command(about = "LSB steganography for PNG/BMP images, WAV audio and video")]
#[command(long_about = None)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.coverstego/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a message or file in a cover file
    Encode(EncodeCommand),

    /// Extract a hidden payload from a stego file
    Decode(DecodeCommand),

    /// Show how many bytes a cover file can hold
    Capacity(CapacityCommand),

    /// Show the properties of a cover file
    Info(InfoCommand),
}

impl Commands {
    fn executor(&self) -> &dyn CommandExecutor {
        match self {
            Commands::Encode(cmd) => cmd,
            Commands::Decode(cmd) => cmd,
            Commands::Capacity(cmd) => cmd,
            Commands::Info(cmd) => cmd,
        }
    }
}

/// Logs go to stderr so stdout stays clean for decoded payloads.
/// `RUST_LOG` overrides the default filter.
fn init_logging(verbose: bool) {
    let default = if verbose { "coverstego=debug" } else { "coverstego=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    cli.command.executor().execute(&config)
}
