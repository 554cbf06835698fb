//! LSB (Least Significant Bit) steganography for images.
//!
//! Hides a framed payload in the low bits of pixel color values.
//! Output must be lossless (PNG, BMP); any input the `image` crate can read
//! is accepted as a cover.
//!
//! Scan order: pixels row-major, channels R, G, B. Alpha is never touched.
//! Each channel carries `bits_per_channel` bits (1 for classic LSB, up to 4),
//! most significant first; the last group is right-padded with zeros.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use super::capacity::{image_capacity, Capacity};
use super::compression;
use super::error::StegoError;
use super::framing::{self, Sentinel, Unframer};
use super::{EncodeReport, Medium};

/// Number of color channels carrying payload bits per pixel.
const RGB_CHANNELS: usize = 3;

/// Maximum bits per channel supported by the multi-bit variant.
pub const MAX_BITS_PER_CHANNEL: u8 = 4;

/// Bit-plane layout for the image engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LsbConfig {
    bits_per_channel: u8,
    sentinel: Sentinel,
}

impl LsbConfig {
    /// Classic LSB: one bit per channel, text sentinel.
    pub fn basic() -> Self {
        Self {
            bits_per_channel: 1,
            sentinel: Sentinel::TEXT,
        }
    }

    /// Multi-bit variant: `bits_per_channel` bits per channel, 16-bit
    /// all-ones sentinel.
    pub fn advanced(bits_per_channel: u8) -> Result<Self, StegoError> {
        Self::new(bits_per_channel, Sentinel::ONES)
    }

    /// Arbitrary layout.
    pub fn new(bits_per_channel: u8, sentinel: Sentinel) -> Result<Self, StegoError> {
        if !(1..=MAX_BITS_PER_CHANNEL).contains(&bits_per_channel) {
            return Err(StegoError::InvalidBitsPerChannel(bits_per_channel));
        }
        Ok(Self {
            bits_per_channel,
            sentinel,
        })
    }

    pub fn bits_per_channel(&self) -> u8 {
        self.bits_per_channel
    }

    pub fn sentinel(&self) -> Sentinel {
        self.sentinel
    }

    /// Mask covering the low `bits_per_channel` bits.
    pub fn mask(&self) -> u8 {
        (1u8 << self.bits_per_channel) - 1
    }
}

impl Default for LsbConfig {
    fn default() -> Self {
        Self::basic()
    }
}

/// Writes bits into the RGB channels of a flat pixel buffer.
///
/// `pixel_stride` is 3 for RGB and 4 for RGBA buffers. Returns the number of
/// stream bits consumed; stops early once `bits` is exhausted.
pub(crate) fn embed_rgb<I>(
    buffer: &mut [u8],
    pixel_stride: usize,
    bits: &mut I,
    config: &LsbConfig,
) -> usize
where
    I: Iterator<Item = u8>,
{
    let k = config.bits_per_channel();
    let mask = config.mask();
    let mut written = 0;

    for pixel in buffer.chunks_exact_mut(pixel_stride) {
        for channel in pixel.iter_mut().take(RGB_CHANNELS) {
            let mut group = 0u8;
            let mut taken = 0;
            for _ in 0..k {
                group <<= 1;
                if let Some(bit) = bits.next() {
                    group |= bit & 1;
                    taken += 1;
                }
            }

            if taken == 0 {
                return written;
            }

            *channel = (*channel & !mask) | group;
            written += taken;
        }
    }

    written
}

/// Feeds the low bits of the RGB channels of a flat pixel buffer into
/// `unframer`. Returns `true` once the sentinel has been seen.
pub(crate) fn extract_rgb(
    buffer: &[u8],
    pixel_stride: usize,
    config: &LsbConfig,
    unframer: &mut Unframer,
) -> bool {
    let k = config.bits_per_channel();

    for pixel in buffer.chunks_exact(pixel_stride) {
        for &channel in pixel.iter().take(RGB_CHANNELS) {
            for shift in (0..k).rev() {
                if unframer.push_bit((channel >> shift) & 1) {
                    return true;
                }
            }
        }
    }

    false
}

/// Checks that `path` names a lossless raster format we can write.
pub fn lossless_format(path: &Path) -> Result<ImageFormat, StegoError> {
    match ImageFormat::from_path(path) {
        Ok(format @ (ImageFormat::Png | ImageFormat::Bmp)) => Ok(format),
        Ok(other) => Err(StegoError::UnsupportedFormat(format!(
            "{:?} output would destroy the embedded bits, use PNG or BMP",
            other
        ))),
        Err(_) => Err(StegoError::UnsupportedFormat(format!(
            "cannot determine image format of {}, use a .png or .bmp extension",
            path.display()
        ))),
    }
}

/// Image steganography handler.
pub struct ImageStego {
    image: DynamicImage,
}

impl ImageStego {
    /// Creates a new ImageStego from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StegoError> {
        let image =
            image::open(path).map_err(|e| StegoError::ImageLoadError(e.to_string()))?;
        Ok(Self { image })
    }

    /// Creates a new ImageStego from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StegoError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| StegoError::ImageLoadError(e.to_string()))?;
        Ok(Self { image })
    }

    /// Creates a new ImageStego from a DynamicImage.
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Returns the capacity of this image under `config`.
    pub fn capacity(&self, config: &LsbConfig) -> Capacity {
        let (width, height) = self.image.dimensions();
        image_capacity(width, height, config)
    }

    /// Hides `payload` in the image.
    ///
    /// With `compress`, the payload is compressed before framing. Fails with
    /// `CapacityExceeded` before touching any pixel if the framed payload
    /// does not fit.
    pub fn encode(
        &self,
        payload: &[u8],
        config: &LsbConfig,
        compress: bool,
    ) -> Result<DynamicImage, StegoError> {
        self.embed(payload, config, compress).map(|(image, _)| image)
    }

    /// Encodes and also returns the number of payload bytes embedded
    /// (after compression, sentinel excluded).
    fn embed(
        &self,
        payload: &[u8],
        config: &LsbConfig,
        compress: bool,
    ) -> Result<(DynamicImage, usize), StegoError> {
        let payload: Cow<'_, [u8]> = if compress {
            let compressed = compression::compress(payload)?;
            debug!(
                original = payload.len(),
                compressed = compressed.len(),
                ratio = compression::compression_ratio(payload, &compressed),
                "compressed payload"
            );
            Cow::Owned(compressed)
        } else {
            Cow::Borrowed(payload)
        };

        let stream = framing::frame(&payload, config.sentinel());
        let capacity = self.capacity(config);
        if !capacity.fits(stream.len()) {
            return Err(StegoError::CapacityExceeded {
                required: payload.len(),
                available: capacity.max_bytes,
            });
        }

        debug!(
            payload_bytes = payload.len(),
            stream_bits = stream.len(),
            capacity_bits = capacity.total_bits,
            bits_per_channel = config.bits_per_channel(),
            "embedding payload in image"
        );

        let mut bits = stream.bits();
        let output = if self.image.color().has_alpha() {
            let mut rgba = self.image.to_rgba8();
            embed_rgb(&mut rgba, 4, &mut bits, config);
            DynamicImage::ImageRgba8(rgba)
        } else {
            let mut rgb = self.image.to_rgb8();
            embed_rgb(&mut rgb, RGB_CHANNELS, &mut bits, config);
            DynamicImage::ImageRgb8(rgb)
        };

        Ok((output, payload.len()))
    }

    /// Extracts the hidden payload.
    ///
    /// `config` and `compressed` must match the values used to encode.
    pub fn decode(&self, config: &LsbConfig, compressed: bool) -> Result<Vec<u8>, StegoError> {
        let rgb = self.image.to_rgb8();
        let mut unframer = Unframer::new(config.sentinel());
        extract_rgb(&rgb, RGB_CHANNELS, config, &mut unframer);

        let (payload, consumed) = unframer.finish().ok_or_else(|| {
            StegoError::sentinel_not_found(format!(
                "no payload, a re-encoded cover, or bits_per_channel other than {}",
                config.bits_per_channel()
            ))
        })?;
        debug!(payload_bytes = payload.len(), consumed_bits = consumed, "extracted payload");

        finish_payload(payload, compressed)
    }

    /// Saves the image. Only PNG and BMP targets are accepted.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StegoError> {
        let format = lossless_format(path.as_ref())?;
        self.image
            .save_with_format(path, format)
            .map_err(|e| StegoError::ImageSaveError(e.to_string()))
    }

    /// Returns the image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, StegoError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| StegoError::ImageSaveError(e.to_string()))?;
        Ok(bytes)
    }

    /// Returns a reference to the underlying image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Consumes self and returns the underlying image.
    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// Undoes compression, or rejects a compressed payload decoded as plain.
fn finish_payload(payload: Vec<u8>, compressed: bool) -> Result<Vec<u8>, StegoError> {
    if compressed {
        compression::decompress(&payload)
    } else if compression::looks_compressed(&payload) {
        Err(StegoError::DecompressionFailed(
            "payload was embedded compressed, decode with compressed = true".to_string(),
        ))
    } else {
        Ok(payload)
    }
}

/// Loads `cover`, hides `payload` and writes the stego image to `output`.
///
/// The output format is validated before the cover is read, and nothing is
/// written unless embedding succeeds.
pub fn encode_file(
    cover: &Path,
    payload: &[u8],
    output: &Path,
    config: &LsbConfig,
    compress: bool,
) -> Result<EncodeReport, StegoError> {
    lossless_format(output)?;

    let stego = ImageStego::from_file(cover)?;
    let (encoded, embedded_len) = stego.embed(payload, config, compress)?;
    ImageStego::from_image(encoded).save(output)?;

    Ok(EncodeReport {
        medium: Medium::Image,
        message_size: embedded_len,
        compressed: compress,
        output_path: output.to_path_buf(),
        bits_per_channel: Some(config.bits_per_channel()),
        frames_used: None,
        total_frames: None,
        duration_secs: None,
    })
}

/// Loads a stego image and extracts its payload.
pub fn decode_file(
    stego: &Path,
    config: &LsbConfig,
    compressed: bool,
) -> Result<Vec<u8>, StegoError> {
    ImageStego::from_file(stego)?.decode(config, compressed)
}
