//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.

mod capacity;
mod decode;
mod encode;
mod info;

pub use capacity::CapacityCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use info::InfoCommand;

use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Args;

use coverstego::{Config, Medium, StegoOptions};

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments and the loaded config.
    fn execute(&self, config: &Config) -> Result<()>;
}

/// Embedding options shared by every command.
///
/// Flags left unset fall back to the config file.
#[derive(Args, Debug, Default)]
pub struct StegoArgs {
    /// Cover medium: image, audio or video (default: guessed from the extension)
    #[arg(long)]
    pub medium: Option<Medium>,

    /// Bits per color channel (1-4). Selects the multi-bit image engine,
    /// which never compresses
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub bits_per_channel: Option<u8>,

    /// Maximum number of video frames to embed into
    #[arg(long)]
    pub max_frames: Option<usize>,

    /// Do not compress the payload (must match between encode and decode)
    #[arg(long)]
    pub no_compress: bool,
}

impl StegoArgs {
    /// Merges these flags over the config defaults.
    pub fn options(&self, config: &Config) -> StegoOptions {
        let mut options = config.options();
        if self.no_compress {
            options.compress = false;
        }
        if self.bits_per_channel.is_some() {
            options.bits_per_channel = self.bits_per_channel;
        }
        if let Some(max_frames) = self.max_frames {
            options.max_frames = max_frames;
        }
        options
    }

    /// The medium given with `--medium`, or guessed from `path`.
    pub fn medium(&self, path: &Path) -> Result<Medium> {
        match self.medium {
            Some(medium) => Ok(medium),
            None => Medium::from_path(path).ok_or_else(|| {
                anyhow!(
                    "Cannot tell the medium of {} from its extension. Use --medium",
                    path.display()
                )
            }),
        }
    }
}
