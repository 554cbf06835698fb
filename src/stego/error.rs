//! Error taxonomy shared by all embedding engines.

use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur while embedding or extracting a payload.
#[derive(Error, Debug)]
pub enum StegoError {
    /// The framed payload needs more low-order bits than the cover provides.
    #[error("Payload too large for cover: need {required} bytes, have capacity for {available}")]
    CapacityExceeded { required: usize, available: usize },

    /// A full scan of the cover did not reach the end-of-message sentinel.
    #[error("No hidden message found ({hint})")]
    SentinelNotFound { hint: String },

    #[error("Failed to compress payload: {0}")]
    CompressionFailed(String),

    /// The sentinel was found but the payload is not valid compressed data.
    #[error("Failed to decompress payload: {0}")]
    DecompressionFailed(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("bits_per_channel must be between 1 and 4, got {0}")]
    InvalidBitsPerChannel(u8),

    #[error("Transcoder not available: {0}")]
    TranscoderUnavailable(String),

    #[error("{tool} exited with {status}: {stderr}")]
    TranscoderFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Image load error: {0}")]
    ImageLoadError(String),

    #[error("Image save error: {0}")]
    ImageSaveError(String),

    #[error("Audio load error: {0}")]
    AudioLoadError(String),

    #[error("Audio save error: {0}")]
    AudioSaveError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StegoError {
    /// Builds a `SentinelNotFound` naming the settings that most often cause it.
    pub(crate) fn sentinel_not_found(hint: impl Into<String>) -> Self {
        Self::SentinelNotFound { hint: hint.into() }
    }
}
