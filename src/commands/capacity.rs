//! Capacity command - how many bytes a cover can hold.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use coverstego::{capacity, Config};

use super::{CommandExecutor, StegoArgs};

/// Show how many payload bytes a cover file can hold.
///
/// Only the file's metadata is read.
#[derive(Args, Debug)]
pub struct CapacityCommand {
    /// Path to the cover file
    pub cover: PathBuf,

    #[command(flatten)]
    pub stego: StegoArgs,
}

impl CommandExecutor for CapacityCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let medium = self.stego.medium(&self.cover)?;
        let options = self.stego.options(config);

        let cap = capacity(medium, &self.cover, &options)
            .with_context(|| format!("Failed to read {}", self.cover.display()))?;

        println!("Capacity of {} ({})", self.cover.display(), medium);
        println!("  Units:        {} x {} bits", cap.unit_count, cap.bits_per_unit);
        println!("  Total bits:   {}", cap.total_bits);
        println!("  Raw bytes:    {}", cap.raw_bytes);
        println!("  Sentinel:     {} bytes", cap.sentinel_len);
        println!("  Max payload:  {} bytes (~{} chars)", cap.max_bytes, cap.max_chars_approx);

        Ok(())
    }
}
