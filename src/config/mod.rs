//! Configuration: settings file and the persisted volume slot

mod settings;
mod store;

pub use settings::{ConfigError, Settings, DEFAULT_VOLUME_PERCENT};
pub use store::{JsonSettingsStore, MemorySettingsStore, SettingsStore};
