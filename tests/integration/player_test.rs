//! Integration tests for the playback controller
//!
//! Drives a player through its public handle over the in-memory channel.

use crate::test_utils::{approx, spawn_memory_player};
use r_ambient::audio::ChannelOp;
use r_ambient::config::{JsonSettingsStore, MemorySettingsStore, Settings};
use r_ambient::player::{FadeOutcome, PlaybackState, PlayerError, PlayerOptions, PlayerStateUpdate};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::time::sleep;

#[cfg(test)]
mod player_integration_tests {
    use super::*;

    fn options() -> PlayerOptions {
        PlayerOptions {
            prime_on_first_play: false,
            ..PlayerOptions::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_pause_cycle_broadcasts_transitions() -> Result<(), Box<dyn Error>> {
        let player = spawn_memory_player(Arc::new(MemorySettingsStore::new()), options());
        let mut updates = player.handle.subscribe();

        player.handle.select_sound("rain_in_the_forest").await?;
        player.handle.toggle_play().await?.wait().await;
        player.handle.toggle_play().await?.wait().await;

        let mut states = Vec::new();
        while let Ok(update) = updates.try_recv() {
            if let PlayerStateUpdate::StateChanged { state, .. } = update {
                states.push(state);
            }
        }
        assert_eq!(
            states,
            vec![
                PlaybackState::FadingIn,
                PlaybackState::Playing,
                PlaybackState::FadingOut,
                PlaybackState::Stopped
            ]
        );
        assert!(!player.probe.is_playing());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_volume_survives_restart_through_settings_file() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");

        let first = spawn_memory_player(Arc::new(JsonSettingsStore::new(&config_path)), options());
        first.handle.set_volume(35).await?;
        first.handle.shutdown().await?;
        first.task.await?;
        assert_eq!(Settings::load(&config_path)?.volume_percent, 35);

        let second = spawn_memory_player(Arc::new(JsonSettingsStore::new(&config_path)), options());
        second.handle.select_sound("crickets").await?;
        assert_eq!(second.handle.toggle_play().await?.wait().await, FadeOutcome::Completed);
        assert!(approx(second.probe.audible_volume(), 0.35));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_stop_fades_out_playing_sound() -> Result<(), Box<dyn Error>> {
        let player = spawn_memory_player(Arc::new(MemorySettingsStore::new()), options());
        player.handle.select_sound("the_sound_of_the_sea").await?;
        player.handle.toggle_play().await?.wait().await;
        player.handle.set_timer(15).await?;

        sleep(Duration::from_secs(15 * 60)).await;
        sleep(Duration::from_millis(500)).await;
        let state = player.handle.state().await?;
        assert_eq!(state.state, PlaybackState::FadingOut);
        assert!(state.channel_volume > 0.0 && state.channel_volume < 0.5);

        sleep(Duration::from_secs(1)).await;
        let state = player.handle.state().await?;
        assert_eq!(state.state, PlaybackState::Stopped);
        assert_eq!(state.timer_minutes, 0);
        assert!(player.probe.ops().ends_with(&[ChannelOp::Pause]));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_player_recovers_after_every_error_kind() -> Result<(), Box<dyn Error>> {
        let player = spawn_memory_player(Arc::new(MemorySettingsStore::new()), options());

        assert!(matches!(
            player.handle.select_sound("thunder").await,
            Err(PlayerError::UnknownSound(_))
        ));

        player.handle.select_sound("cicadas").await?;
        player.probe.set_play_blocked(true);
        assert!(matches!(
            player.handle.toggle_play().await,
            Err(PlayerError::PlaybackBlocked { .. })
        ));
        player.probe.set_play_blocked(false);

        player.probe.set_load_failure(true);
        player.handle.select_sound("in_the_cafe").await?;
        assert!(matches!(player.handle.toggle_play().await, Err(PlayerError::Load(_))));
        player.probe.set_load_failure(false);

        player.handle.select_sound("in_the_cafe").await?;
        assert_eq!(player.handle.toggle_play().await?.wait().await, FadeOutcome::Completed);
        assert_eq!(player.handle.state().await?.state, PlaybackState::Playing);
        Ok(())
    }
}
