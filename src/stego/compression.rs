//! Optional payload compression.
//!
//! Payloads are zlib-compressed (DEFLATE) and then base64-encoded, so the
//! framed payload remains printable ASCII. Whether a payload was compressed
//! is never recorded in the cover: the decoder has to be told.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use flate2::read::{ZlibDecoder, ZlibEncoder};
use flate2::Compression;
use std::io::Read;

use super::error::StegoError;

/// Compresses a payload into base64 text.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, StegoError> {
    let mut encoder = ZlibEncoder::new(data, Compression::default());
    let mut compressed = Vec::new();

    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| StegoError::CompressionFailed(e.to_string()))?;

    Ok(BASE64.encode(compressed).into_bytes())
}

/// Reverses [`compress`].
///
/// Fails with `DecompressionFailed` if the input is not base64 text wrapping
/// a valid zlib stream. This is the usual symptom of decoding with
/// `compressed = true` a payload that was embedded uncompressed.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, StegoError> {
    let compressed = BASE64
        .decode(data)
        .map_err(|e| StegoError::DecompressionFailed(format!("invalid base64: {}", e)))?;

    let mut decoder = ZlibDecoder::new(compressed.as_slice());
    let mut decompressed = Vec::new();

    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| StegoError::DecompressionFailed(format!("invalid zlib stream: {}", e)))?;

    Ok(decompressed)
}

/// Returns true if `data` is a payload produced by [`compress`].
///
/// Used to reject decodes with `compressed = false` on a payload that was
/// embedded compressed, instead of handing back base64 text as the message.
///
/// This is a content check, not a stored flag. A payload embedded
/// uncompressed that is itself base64-wrapped zlib is indistinguishable
/// from a compressed one and is rejected the same way.
pub fn looks_compressed(data: &[u8]) -> bool {
    !data.is_empty() && decompress(data).is_ok()
}

/// Returns compression ratio (compressed_size / original_size).
/// Values < 1.0 mean compression helped.
pub fn compression_ratio(original: &[u8], compressed: &[u8]) -> f64 {
    if original.is_empty() {
        return 1.0;
    }
    compressed.len() as f64 / original.len() as f64
}
