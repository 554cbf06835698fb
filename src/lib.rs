//! # Coverstego - LSB steganography for images, audio and video
//!
//! Coverstego hides a byte payload inside the least significant bits of a
//! cover medium and recovers it later. The stego file looks and sounds like
//! the cover; only the low bits differ.
//!
//! ## Overview
//!
//! - **Images**: payload bits go into the R, G, B channels of each pixel,
//!   1 bit per channel (basic) or 1 to 4 bits per channel (multi-bit).
//!   Output must be lossless (PNG or BMP).
//! - **Audio**: one payload bit per 16-bit PCM sample of a WAV file.
//! - **Video**: frames are extracted with ffmpeg, embedded like images, and
//!   joined back into a video.
//!
//! The end of the payload is marked with a sentinel byte sequence, so no
//! length header is stored. Basic image encoding can compress the payload
//! first (zlib, then base64); decode must be told whether it was compressed.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use coverstego::{decode, encode, Medium, StegoOptions};
//! use std::path::Path;
//!
//! let options = StegoOptions::default();
//!
//! encode(
//!     Medium::Image,
//!     Path::new("cover.png"),
//!     b"meet at noon",
//!     Path::new("stego.png"),
//!     &options,
//! )
//! .unwrap();
//!
//! let payload = decode(Medium::Image, Path::new("stego.png"), &options).unwrap();
//! assert_eq!(payload, b"meet at noon");
//! ```
//!
//! ## Modules
//!
//! - [`stego`]: framing, compression, capacity and the per-medium engines
//! - [`config`]: user configuration (`~/.coverstego/config.toml`)

pub mod config;
pub mod stego;

// Re-export commonly used types at the crate root
pub use config::{Config, ConfigError};
pub use stego::{
    capacity, decode, encode, AudioStego, Capacity, EncodeReport, ImageStego, LsbConfig, Medium,
    Sentinel, StegoError, StegoOptions, VideoStego,
};
