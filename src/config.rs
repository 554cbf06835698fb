//! User configuration.
//!
//! Stored in `~/.coverstego/config.toml`. A missing file means defaults.
//!
//! ```toml
//! [defaults]
//! compress = true
//! max_frames = 30
//! # bits_per_channel = 2
//!
//! [video]
//! ffmpeg = "ffmpeg"
//! ffprobe = "ffprobe"
//! fps = 30
//! codec = "lossless"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::stego::{StegoOptions, TranscoderSettings, DEFAULT_MAX_FRAMES};

/// Errors that can occur when loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found. Unable to determine home directory.")]
    NoConfigDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

/// Default embedding options.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Defaults {
    pub compress: bool,
    pub max_frames: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits_per_channel: Option<u8>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            compress: true,
            max_frames: DEFAULT_MAX_FRAMES,
            bits_per_channel: None,
        }
    }
}

/// The configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub video: TranscoderSettings,
}

impl Config {
    /// Load the configuration from the default location.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load the configuration from `path`, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save the configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(get_config_dir()?.join("config.toml"))
    }

    /// Embedding options built from this configuration.
    pub fn options(&self) -> StegoOptions {
        StegoOptions {
            compress: self.defaults.compress,
            bits_per_channel: self.defaults.bits_per_channel,
            max_frames: self.defaults.max_frames,
            transcoder: self.video.clone(),
        }
    }
}

/// Get the config directory (`~/.coverstego`).
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".coverstego"))
        .ok_or(ConfigError::NoConfigDir)
}
