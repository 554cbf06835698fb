//! Encode command - hide a message or file inside a cover medium.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use coverstego::{encode, Config, Medium};

use super::{CommandExecutor, StegoArgs};

/// Hide a message or file inside an image, WAV file or video.
///
/// The payload comes from --message, --file, or stdin when neither is given.
/// Image output must be PNG or BMP, audio output must be WAV.
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// Path to the cover file
    #[arg(short, long)]
    pub cover: PathBuf,

    /// Text message to hide (mutually exclusive with --file)
    #[arg(short, long, conflicts_with = "file")]
    pub message: Option<String>,

    /// File whose bytes are hidden (mutually exclusive with --message)
    #[arg(short, long, conflicts_with = "message")]
    pub file: Option<PathBuf>,

    /// Where to write the stego file
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub stego: StegoArgs,
}

impl EncodeCommand {
    fn read_payload(&self) -> Result<Vec<u8>> {
        if let Some(file_path) = &self.file {
            return std::fs::read(file_path)
                .with_context(|| format!("Failed to read file {}", file_path.display()));
        }

        match &self.message {
            Some(message) => Ok(message.as_bytes().to_vec()),
            None => {
                eprintln!("Reading message from stdin (Ctrl+D to finish):");
                let mut buffer = Vec::new();
                io::stdin()
                    .read_to_end(&mut buffer)
                    .context("Failed to read message from stdin")?;
                Ok(buffer)
            }
        }
    }
}

impl CommandExecutor for EncodeCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let medium = self.stego.medium(&self.cover)?;
        let options = self.stego.options(config);
        let payload = self.read_payload()?;

        tracing::debug!(
            medium = %medium,
            cover = %self.cover.display(),
            payload_len = payload.len(),
            "encoding"
        );

        let report = encode(medium, &self.cover, &payload, &self.output, &options)
            .with_context(|| format!("Failed to encode into {}", self.cover.display()))?;

        println!("Wrote {}", report.output_path.display());
        println!("  Medium:       {}", report.medium);
        println!(
            "  Payload:      {} bytes{}",
            report.message_size,
            if report.compressed { " (compressed)" } else { "" }
        );
        if let Some(bits) = report.bits_per_channel {
            println!("  Bits/channel: {}", bits);
        }
        if let (Some(used), Some(total)) = (report.frames_used, report.total_frames) {
            println!("  Frames:       {} of {}", used, total);
        }
        if let Some(duration) = report.duration_secs {
            println!("  Duration:     {:.2}s", duration);
        }
        if medium == Medium::Video && !options.transcoder.codec.is_lossless() {
            eprintln!("Warning: lossy reassembly destroys the hidden bits");
        }

        Ok(())
    }
}
