//! Info command - describe a cover file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use coverstego::stego::image::lossless_format;
use coverstego::{AudioStego, Config, Medium, VideoStego};

use super::{CommandExecutor, StegoArgs};

/// Show the properties of a cover file and whether it can be used.
#[derive(Args, Debug)]
pub struct InfoCommand {
    /// Path to the cover file
    pub cover: PathBuf,

    #[command(flatten)]
    pub stego: StegoArgs,
}

impl CommandExecutor for InfoCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let medium = self.stego.medium(&self.cover)?;
        println!("{} ({})", self.cover.display(), medium);

        match medium {
            Medium::Image => {
                let (width, height) = image::image_dimensions(&self.cover)
                    .with_context(|| format!("Failed to read {}", self.cover.display()))?;
                println!("  Dimensions:   {}x{}", width, height);
                match lossless_format(&self.cover) {
                    Ok(format) => println!("  Stego output: yes ({:?})", format),
                    Err(e) => println!("  Stego output: no ({})", e),
                }
            }
            Medium::Audio => {
                let info = AudioStego::validate(&self.cover)
                    .with_context(|| format!("Not a usable cover: {}", self.cover.display()))?;
                println!("  Channels:     {}", info.channels);
                println!("  Sample rate:  {} Hz", info.sample_rate);
                println!("  Bit depth:    {}", info.bits_per_sample);
                println!("  Frames:       {}", info.frames);
                println!("  Duration:     {:.2}s", info.duration_secs);
            }
            Medium::Video => {
                let options = self.stego.options(config);
                let info = VideoStego::ffmpeg(options.transcoder.clone())
                    .info(&self.cover)
                    .with_context(|| format!("Failed to probe {}", self.cover.display()))?;
                println!("  Dimensions:   {}x{}", info.width, info.height);
                println!("  Frames:       {}", info.frames);
                println!("  Duration:     {:.2}s", info.duration_secs);
                println!("  Reassembly:   {}", options.transcoder.codec);
            }
        }

        Ok(())
    }
}
