//! Capacity arithmetic for each cover medium.
//!
//! Capacity is a property of the cover alone. File-level helpers read only
//! container metadata (dimensions, sample count), never the pixel or sample
//! data itself.

use hound::WavReader;
use serde::Serialize;
use std::path::Path;

use super::audio;
use super::error::StegoError;
use super::image::LsbConfig;

/// Low-order-bit capacity of a cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capacity {
    /// Number of addressable units (channels, samples).
    pub unit_count: usize,
    /// Bits written per unit.
    pub bits_per_unit: u8,
    /// `unit_count * bits_per_unit`.
    pub total_bits: usize,
    /// `total_bits / 8`, before sentinel overhead.
    pub raw_bytes: usize,
    /// Bytes reserved for the end-of-message sentinel.
    pub sentinel_len: usize,
    /// Largest payload that fits, in bytes.
    pub max_bytes: usize,
    /// Approximate character count for display (one byte per character).
    pub max_chars_approx: usize,
}

impl Capacity {
    /// Computes capacity from a unit count, bits per unit and sentinel length.
    pub fn new(unit_count: usize, bits_per_unit: u8, sentinel_len: usize) -> Self {
        let total_bits = unit_count * bits_per_unit as usize;
        let raw_bytes = total_bits / 8;
        let max_bytes = raw_bytes.saturating_sub(sentinel_len);
        Self {
            unit_count,
            bits_per_unit,
            total_bits,
            raw_bytes,
            sentinel_len,
            max_bytes,
            max_chars_approx: max_bytes,
        }
    }

    /// Whether a framed stream of `bit_len` bits fits.
    pub fn fits(&self, bit_len: usize) -> bool {
        bit_len <= self.total_bits
    }
}

/// Capacity of a `width` x `height` RGB image.
pub fn image_capacity(width: u32, height: u32, config: &LsbConfig) -> Capacity {
    let channels = width as usize * height as usize * 3;
    Capacity::new(channels, config.bits_per_channel(), config.sentinel().len())
}

/// Capacity of a PCM stream at one bit per sample.
pub fn audio_capacity(n_frames: u32, n_channels: u16, sentinel_len: usize) -> Capacity {
    Capacity::new(n_frames as usize * n_channels as usize, 1, sentinel_len)
}

/// Capacity of the first `min(frames, max_frames)` frames of a video.
pub fn video_capacity(
    width: u32,
    height: u32,
    frames: usize,
    max_frames: usize,
    config: &LsbConfig,
) -> Capacity {
    let channels = width as usize * height as usize * 3 * frames.min(max_frames);
    Capacity::new(channels, config.bits_per_channel(), config.sentinel().len())
}

/// Reads image dimensions from the file header and computes capacity.
pub fn image_file_capacity<P: AsRef<Path>>(
    path: P,
    config: &LsbConfig,
) -> Result<Capacity, StegoError> {
    let (width, height) = image::image_dimensions(path.as_ref())
        .map_err(|e| StegoError::ImageLoadError(e.to_string()))?;
    Ok(image_capacity(width, height, config))
}

/// Reads the WAV header and computes capacity. Only 16-bit PCM covers
/// are accepted, as for encoding.
pub fn audio_file_capacity<P: AsRef<Path>>(
    path: P,
    sentinel_len: usize,
) -> Result<Capacity, StegoError> {
    let reader = WavReader::open(path).map_err(audio::open_error)?;
    let spec = reader.spec();
    audio::check_spec(&spec)?;
    Ok(audio_capacity(reader.duration(), spec.channels, sentinel_len))
}
