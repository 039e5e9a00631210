//! Application settings and configuration management

use crate::catalog::{SoundCatalog, DEFAULT_SOUNDS};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Volume applied when nothing has been persisted yet.
pub const DEFAULT_VOLUME_PERCENT: u8 = 50;

/// Application settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// ALSA device to use for audio playback
    #[serde(default = "default_alsa_device")]
    pub alsa_device: String,
    /// Directory or http(s) URL the catalog's relative locators resolve against
    #[serde(default = "default_sounds_base")]
    pub sounds_base: String,
    /// Sound selected at startup
    #[serde(default)]
    pub default_sound: Option<String>,
    /// Last volume the user chose, in percent
    #[serde(default = "default_volume_percent")]
    pub volume_percent: u8,
    /// Write a short silent buffer through the device before the first playback
    #[serde(default = "default_prime_on_first_play")]
    pub prime_on_first_play: bool,
}

fn default_alsa_device() -> String {
    "default".to_string()
}

fn default_sounds_base() -> String {
    ".".to_string()
}

fn default_volume_percent() -> u8 {
    DEFAULT_VOLUME_PERCENT
}

fn default_prime_on_first_play() -> bool {
    true
}

/// Error types for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    IoError(io::Error),
    ParseError(String),
    ValidationError(String),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigError::ParseError(s) => write!(f, "Parse error: {}", s),
            ConfigError::ValidationError(s) => write!(f, "Validation error: {}", s),
        }
    }
}

impl Error for ConfigError {}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            alsa_device: default_alsa_device(),
            sounds_base: default_sounds_base(),
            default_sound: None,
            volume_percent: DEFAULT_VOLUME_PERCENT,
            prime_on_first_play: default_prime_on_first_play(),
        }
    }
}

impl Settings {
    /// Load settings from a file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(&self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        let config = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        config.join("r-ambient").join("config.json")
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alsa_device.trim().is_empty() {
            return Err(ConfigError::ValidationError("ALSA device cannot be empty".to_string()));
        }

        if self.sounds_base.trim().is_empty() {
            return Err(ConfigError::ValidationError("Sounds base cannot be empty".to_string()));
        }

        if self.volume_percent > 100 {
            return Err(ConfigError::ValidationError(format!(
                "Volume must be between 0 and 100, got {}",
                self.volume_percent
            )));
        }

        if let Some(sound) = &self.default_sound {
            if !DEFAULT_SOUNDS.iter().any(|(id, _, _)| id == sound) {
                return Err(ConfigError::ValidationError(format!("Unknown default sound: {}", sound)));
            }
        }

        Ok(())
    }

    /// Builds the catalog rooted at `sounds_base`.
    pub fn catalog(&self) -> Result<SoundCatalog, ConfigError> {
        SoundCatalog::with_base(&self.sounds_base).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
