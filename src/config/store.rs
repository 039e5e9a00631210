//! The one persisted preference: last volume percent.

use super::settings::{ConfigError, Settings};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

const LOG_TARGET: &str = "r_ambient::config::store";

/// Key-value slot holding the last volume the user chose, in percent.
///
/// Loading happens once at startup; saving runs on every volume change and
/// must not block the caller's runtime thread.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the stored percent, or `None` when nothing was saved yet.
    fn load_volume_percent(&self) -> Result<Option<u8>, ConfigError>;

    async fn save_volume_percent(&self, percent: u8) -> Result<(), ConfigError>;
}

/// Persists the volume into the JSON settings file.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    fn load_volume_percent(&self) -> Result<Option<u8>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let settings = Settings::load(&self.path)?;
        Ok(Some(settings.volume_percent.min(100)))
    }

    async fn save_volume_percent(&self, percent: u8) -> Result<(), ConfigError> {
        // Other fields are preserved; a file that does not parse is left alone.
        let mut settings = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str::<Settings>(&content).map_err(|e| {
                warn!(target: LOG_TARGET, "Settings at {:?} unreadable, not saving volume: {}", self.path, e);
                ConfigError::from(e)
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Settings::default(),
            Err(e) => return Err(e.into()),
        };
        settings.volume_percent = percent.min(100);

        let content = serde_json::to_string_pretty(&settings)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, content).await?;
        debug!(target: LOG_TARGET, "Saved volume {}% to {:?}", settings.volume_percent, self.path);
        Ok(())
    }
}

/// Process-local store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    slot: Arc<Mutex<Option<u8>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_volume(percent: u8) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(percent.min(100)))),
        }
    }

    pub fn saved(&self) -> Option<u8> {
        *self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    fn load_volume_percent(&self) -> Result<Option<u8>, ConfigError> {
        Ok(self.saved())
    }

    async fn save_volume_percent(&self, percent: u8) -> Result<(), ConfigError> {
        *self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(percent.min(100));
        Ok(())
    }
}
