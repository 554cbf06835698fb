//! Decode command - extract a hidden payload from a stego file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use coverstego::{decode, Config};

use super::{CommandExecutor, StegoArgs};

/// Extract the payload hidden in a stego file.
///
/// Use the same --bits-per-channel and --no-compress flags as when
/// encoding; neither is recorded in the file.
///
/// Use -o/--output to write raw bytes to a file (required for binary data).
/// Without -o, output is printed as text (lossy UTF-8 conversion).
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// Path to the stego file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file for the decoded bytes
    /// If not specified, prints decoded text to stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub stego: StegoArgs,
}

impl CommandExecutor for DecodeCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let medium = self.stego.medium(&self.input)?;
        let options = self.stego.options(config);

        let payload = decode(medium, &self.input, &options)
            .with_context(|| format!("Failed to decode {}", self.input.display()))?;

        match &self.output {
            Some(output_path) => {
                std::fs::write(output_path, &payload).with_context(|| {
                    format!("Failed to write output file {}", output_path.display())
                })?;
                eprintln!("Decoded {} bytes to {}", payload.len(), output_path.display());
            }
            None => println!("{}", String::from_utf8_lossy(&payload)),
        }

        Ok(())
    }
}
