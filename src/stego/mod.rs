//! Steganography engines for hiding payloads in cover media.
//!
//! Supports:
//! - Image LSB steganography (PNG, BMP output), 1 to 4 bits per channel
//! - Audio LSB steganography (16-bit PCM WAV)
//! - Video LSB steganography over extracted frames (ffmpeg)
//!
//! The medium is chosen once per call with [`Medium`]; [`encode`],
//! [`decode`] and [`capacity`] then hand off to the matching engine.

pub mod audio;
pub mod capacity;
pub mod compression;
pub mod error;
pub mod framing;
pub mod image;
pub mod video;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use self::audio::{AudioInfo, AudioStego};
pub use self::capacity::Capacity;
pub use self::error::StegoError;
pub use self::framing::{BitStream, Sentinel, Unframer};
pub use self::image::{ImageStego, LsbConfig};
pub use self::video::{
    Ffmpeg, FrameTranscoder, ReassemblyCodec, TranscoderSettings, VideoInfo, VideoStego,
    DEFAULT_MAX_FRAMES,
};

/// Kind of cover medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    Image,
    Audio,
    Video,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "bmp", "jpg", "jpeg", "gif", "tif", "tiff", "webp", "ppm", "pgm", "tga", "ico",
];
const AUDIO_EXTENSIONS: &[&str] = &["wav", "wave"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "m4v", "flv"];

impl Medium {
    /// Guesses the medium from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Audio)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for Medium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Medium {
    type Err = StegoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            other => Err(StegoError::UnsupportedFormat(format!(
                "unknown medium '{}', expected image, audio or video",
                other
            ))),
        }
    }
}

/// Per-call options. Decode must be given the same `compress` and
/// `bits_per_channel` that were used to encode; neither is stored in the
/// stego file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StegoOptions {
    /// Compress the payload before embedding (basic image engine only).
    pub compress: bool,
    /// `None` selects the basic image engine, `Some(k)` the multi-bit one.
    pub bits_per_channel: Option<u8>,
    /// Frame budget for video.
    pub max_frames: usize,
    /// Video transcoder settings.
    pub transcoder: TranscoderSettings,
}

impl Default for StegoOptions {
    fn default() -> Self {
        Self {
            compress: true,
            bits_per_channel: None,
            max_frames: DEFAULT_MAX_FRAMES,
            transcoder: TranscoderSettings::default(),
        }
    }
}

impl StegoOptions {
    /// Image bit layout selected by `bits_per_channel`.
    pub fn lsb_config(&self) -> Result<LsbConfig, StegoError> {
        match self.bits_per_channel {
            None => Ok(LsbConfig::basic()),
            Some(bits) => LsbConfig::advanced(bits),
        }
    }

    /// Whether compression applies. The multi-bit image engine never
    /// compresses.
    pub fn compresses(&self) -> bool {
        self.compress && self.bits_per_channel.is_none()
    }
}

/// Outcome of a successful encode.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeReport {
    pub medium: Medium,
    /// Embedded payload size in bytes, after compression, sentinel excluded.
    pub message_size: usize,
    pub compressed: bool,
    pub output_path: PathBuf,
    pub bits_per_channel: Option<u8>,
    pub frames_used: Option<usize>,
    pub total_frames: Option<usize>,
    pub duration_secs: Option<f64>,
}

/// Hides `payload` in `cover` and writes the stego file to `output`.
pub fn encode(
    medium: Medium,
    cover: &Path,
    payload: &[u8],
    output: &Path,
    options: &StegoOptions,
) -> Result<EncodeReport, StegoError> {
    let report = match medium {
        Medium::Image => self::image::encode_file(
            cover,
            payload,
            output,
            &options.lsb_config()?,
            options.compresses(),
        )?,
        Medium::Audio => audio::encode_file(cover, payload, output)?,
        Medium::Video => VideoStego::ffmpeg(options.transcoder.clone()).encode(
            cover,
            payload,
            output,
            options.max_frames,
        )?,
    };

    tracing::info!(
        medium = %medium,
        message_size = report.message_size,
        compressed = report.compressed,
        output = %report.output_path.display(),
        "encoded payload"
    );
    Ok(report)
}

/// Extracts the payload hidden in `stego`.
pub fn decode(medium: Medium, stego: &Path, options: &StegoOptions) -> Result<Vec<u8>, StegoError> {
    match medium {
        Medium::Image => self::image::decode_file(stego, &options.lsb_config()?, options.compresses()),
        Medium::Audio => audio::decode_file(stego),
        Medium::Video => {
            VideoStego::ffmpeg(options.transcoder.clone()).decode(stego, options.max_frames)
        }
    }
}

/// Capacity of `cover`, read from its metadata only.
pub fn capacity(medium: Medium, cover: &Path, options: &StegoOptions) -> Result<Capacity, StegoError> {
    match medium {
        Medium::Image => capacity::image_file_capacity(cover, &options.lsb_config()?),
        Medium::Audio => capacity::audio_file_capacity(cover, Sentinel::TEXT.len()),
        Medium::Video => {
            VideoStego::ffmpeg(options.transcoder.clone()).capacity(cover, options.max_frames)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medium_from_path() {
        assert_eq!(Medium::from_path(Path::new("a.PNG")), Some(Medium::Image));
        assert_eq!(Medium::from_path(Path::new("dir/b.wav")), Some(Medium::Audio));
        assert_eq!(Medium::from_path(Path::new("c.mp4")), Some(Medium::Video));
        assert_eq!(Medium::from_path(Path::new("d.txt")), None);
        assert_eq!(Medium::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_medium_from_str() {
        assert_eq!("Image".parse::<Medium>().unwrap(), Medium::Image);
        assert_eq!("audio".parse::<Medium>().unwrap(), Medium::Audio);
        assert!("pdf".parse::<Medium>().is_err());
        assert_eq!(Medium::Video.to_string(), "video");
    }

    #[test]
    fn test_options_select_engine() {
        let basic = StegoOptions::default();
        assert_eq!(basic.lsb_config().unwrap(), LsbConfig::basic());
        assert!(basic.compresses());

        let advanced = StegoOptions {
            bits_per_channel: Some(3),
            ..Default::default()
        };
        assert_eq!(advanced.lsb_config().unwrap().sentinel(), Sentinel::ONES);
        assert!(!advanced.compresses());

        let invalid = StegoOptions {
            bits_per_channel: Some(9),
            ..Default::default()
        };
        assert!(invalid.lsb_config().is_err());
    }
}
