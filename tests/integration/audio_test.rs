//! Integration tests for audio functionality
//!
//! These tests exercise the channel implementations through the public trait.

use r_ambient::audio::{AlsaChannel, AudioChannel, AudioError, ChannelEvent, ChannelOp, MemoryChannel, Preload};
use r_ambient::catalog::SoundCatalog;
use std::error::Error;

#[cfg(test)]
mod audio_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_channel_records_lifecycle() -> Result<(), Box<dyn Error>> {
        let catalog = SoundCatalog::with_base("/opt/ambient")?;
        let (mut channel, probe) = MemoryChannel::new();
        let mut events = channel.take_events().expect("events available once");
        assert!(channel.take_events().is_none());

        channel.set_looping(true);
        channel.set_preload(Preload::Auto);
        channel.set_source(catalog.resolve("crickets")?).await?;
        assert_eq!(
            events.recv().await,
            Some(ChannelEvent::Loaded {
                source_id: "crickets".to_string()
            })
        );

        channel.set_volume(0.4);
        channel.play().await?;
        assert!(probe.is_playing());
        assert_eq!(probe.audible_volume(), 0.4);

        channel.set_muted(true);
        assert_eq!(probe.audible_volume(), 0.0);
        assert_eq!(channel.volume(), 0.4);

        channel.pause().await?;
        channel.shutdown().await?;
        assert_eq!(
            probe.ops(),
            vec![
                ChannelOp::SetLooping(true),
                ChannelOp::SetPreload(Preload::Auto),
                ChannelOp::SetSource("crickets".to_string()),
                ChannelOp::Play,
                ChannelOp::SetMuted(true),
                ChannelOp::Pause,
                ChannelOp::Shutdown,
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_channel_play_without_source_fails() {
        let (mut channel, _probe) = MemoryChannel::new();
        assert!(matches!(channel.play().await, Err(AudioError::InvalidState(_))));
    }

    /// Loads a missing local file through the ALSA channel; no device is opened.
    #[tokio::test]
    async fn test_alsa_channel_reports_missing_file() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let catalog = SoundCatalog::with_base(&dir.path().to_string_lossy())?;
        let mut channel = AlsaChannel::new("default");
        let mut events = channel.take_events().expect("events available once");

        channel.set_source(catalog.resolve("wave_noise")?).await?;
        match events.recv().await {
            Some(ChannelEvent::Error { source_id, .. }) => assert_eq!(source_id, "wave_noise"),
            other => panic!("expected load error, got {:?}", other),
        }

        let err = channel.play().await.expect_err("nothing to play");
        assert!(err.is_load_failure());
        channel.shutdown().await?;
        Ok(())
    }

    /// Plays through a real ALSA device; requires audio hardware and a
    /// `sounds/crickets.mp3` under `R_AMBIENT_SOUNDS_BASE`.
    #[tokio::test]
    #[ignore]
    async fn test_alsa_playback() -> Result<(), Box<dyn Error>> {
        let base = std::env::var("R_AMBIENT_SOUNDS_BASE")?;
        let catalog = SoundCatalog::with_base(&base)?;
        let mut channel = AlsaChannel::new("default");
        channel.set_looping(true);
        channel.set_volume(0.3);
        channel.set_source(catalog.resolve("crickets")?).await?;
        channel.play().await?;
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        channel.pause().await?;
        channel.shutdown().await?;
        Ok(())
    }

    #[test]
    fn test_audio_error_handling() {
        let error = AudioError::AlsaError("Test error".to_string());
        assert_eq!(format!("{}", error), "ALSA error: Test error");
        assert!(!error.is_load_failure());
    }
}
