//! Integration tests for configuration management
//!
//! These tests verify that the configuration system works correctly
//! across module boundaries.

use r_ambient::catalog::Locator;
use r_ambient::config::{JsonSettingsStore, Settings, SettingsStore};
use std::error::Error;
use tempfile::tempdir;

#[cfg(test)]
mod config_integration_tests {
    use super::*;

    /// Test complete configuration workflow
    #[tokio::test]
    async fn test_config_lifecycle() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");

        let mut settings = Settings::default();
        settings.alsa_device = "test-audio-device".to_string();
        settings.sounds_base = dir.path().to_string_lossy().into_owned();
        settings.default_sound = Some("wave_noise".to_string());

        settings.validate()?;
        settings.save(&config_path)?;

        let loaded_settings = Settings::load(&config_path)?;
        assert_eq!(loaded_settings, settings);

        // The volume slot is written through the store without touching the rest.
        let store = JsonSettingsStore::new(&config_path);
        store.save_volume_percent(65).await?;
        let reloaded_settings = Settings::load(&config_path)?;
        assert_eq!(reloaded_settings.volume_percent, 65);
        assert_eq!(reloaded_settings.alsa_device, "test-audio-device");
        assert_eq!(reloaded_settings.default_sound.as_deref(), Some("wave_noise"));

        Ok(())
    }

    /// Test that the catalog is rooted at the configured base
    #[test]
    fn test_catalog_from_settings() -> Result<(), Box<dyn Error>> {
        let settings = Settings {
            sounds_base: "https://cdn.example.com/relax".to_string(),
            ..Settings::default()
        };
        let catalog = settings.catalog()?;
        let rain = catalog.resolve("rain_in_the_forest")?;
        match &rain.locator {
            Locator::Http(url) => assert_eq!(url.as_str(), "https://cdn.example.com/relax/sounds/rain_in_the_forest.mp3"),
            other => panic!("expected http locator, got {:?}", other),
        }
        Ok(())
    }

    /// Test invalid configuration handling
    #[test]
    fn test_invalid_config_validation() {
        let invalid_settings = Settings {
            sounds_base: "".to_string(),
            ..Settings::default()
        };
        assert!(invalid_settings.validate().is_err());
        assert!(invalid_settings.catalog().is_err());
    }
}
