use super::{
    volume_from_percent, volume_to_percent, FadeDirection, FadeOutcome, PendingFade, PlaybackState, Player,
    PlayerError, PlayerStateUpdate, PLAYER_LOG_TARGET,
};
use crate::audio::ChannelEvent;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

#[instrument(skip(player))]
pub async fn handle_select_sound(player: &mut Player, id: &str) -> Result<(), PlayerError> {
    let resource = match player.catalog.resolve(id) {
        Ok(resource) => resource.clone(),
        Err(e) => {
            let err = PlayerError::from(e);
            player.warn_user(&err);
            return Err(err);
        }
    };
    info!(target: PLAYER_LOG_TARGET, "Selecting sound '{}' ({})", resource.id, resource.locator);

    if player.state != PlaybackState::Stopped {
        player.stop_immediately().await;
    } else {
        player.replace_fade(None);
        player.channel.set_volume(0.0);
        player.is_playing = false;
    }

    player.selected_sound = Some(resource.id.clone());
    player.broadcast_update(PlayerStateUpdate::SoundChanged { id: resource.id.clone() });

    if let Err(e) = player.channel.set_source(&resource).await {
        let err = PlayerError::Load(e.to_string());
        player.warn_user(&err);
        return Err(err);
    }
    Ok(())
}

#[instrument(skip(player))]
pub async fn handle_toggle_play(player: &mut Player, now: Instant) -> Result<PendingFade, PlayerError> {
    if player.selected_sound.is_none() {
        debug!(target: PLAYER_LOG_TARGET, "TogglePlay ignored: no sound selected.");
        return Ok(PendingFade::ready(FadeOutcome::NotStarted));
    }

    match player.state {
        PlaybackState::Stopped => {
            player.unlock.ensure_unlocked(&mut *player.channel).await;
            player.channel.set_volume(0.0);
            if let Err(e) = player.channel.play().await {
                let err = PlayerError::from_play_failure(e);
                player.is_playing = false;
                player.warn_user(&err);
                return Err(err);
            }
            player.is_playing = true;
            let pending = player.start_fade(FadeDirection::In, now);
            player.set_state(PlaybackState::FadingIn);
            Ok(pending)
        }
        PlaybackState::FadingOut => {
            // Output is still running until the fade-out ends; resume from where it is.
            if let Err(e) = player.channel.play().await {
                let err = PlayerError::from_play_failure(e);
                player.warn_user(&err);
                player.stop_immediately().await;
                return Err(err);
            }
            player.is_playing = true;
            let pending = player.start_fade(FadeDirection::In, now);
            player.set_state(PlaybackState::FadingIn);
            Ok(pending)
        }
        PlaybackState::Playing | PlaybackState::FadingIn => {
            player.is_playing = false;
            let pending = player.start_fade(FadeDirection::Out, now);
            player.set_state(PlaybackState::FadingOut);
            Ok(pending)
        }
    }
}

#[instrument(skip(player))]
pub async fn handle_set_volume(player: &mut Player, percent: u8) {
    let percent = percent.min(100);
    player.volume = volume_from_percent(percent);
    debug!(target: PLAYER_LOG_TARGET, "Volume set to {}% ({:.2}).", percent, player.volume);

    // Running fades keep their target; the new volume applies to the next one.
    if player.state == PlaybackState::Playing && player.fade.is_none() {
        player.channel.set_volume(player.volume);
    }

    if let Err(e) = player.store.save_volume_percent(percent).await {
        warn!(target: PLAYER_LOG_TARGET, "Failed to persist volume: {}", e);
    }
    player.broadcast_update(PlayerStateUpdate::VolumeChanged {
        percent: volume_to_percent(player.volume),
    });
}

#[instrument(skip(player))]
pub async fn handle_toggle_mute(player: &mut Player) {
    player.muted = !player.muted;
    player.channel.set_muted(player.muted);
    info!(target: PLAYER_LOG_TARGET, "Muted: {}", player.muted);
    player.broadcast_update(PlayerStateUpdate::MuteChanged(player.muted));
}

#[instrument(skip(player))]
pub async fn handle_set_timer(player: &mut Player, minutes: u32, now: Instant) {
    player.timer.set(minutes, now);
    if minutes > 0 {
        info!(target: PLAYER_LOG_TARGET, "Auto-stop in {} minutes.", minutes);
    } else {
        info!(target: PLAYER_LOG_TARGET, "Auto-stop cancelled.");
    }
    player.broadcast_update(PlayerStateUpdate::TimerChanged { minutes });
}

/// Auto-stop: fades out when sound is (or is becoming) audible, then resets the timer.
#[instrument(skip(player))]
pub async fn handle_timer_fired(player: &mut Player, now: Instant) {
    if !player.timer.fire(now) {
        return;
    }
    info!(target: PLAYER_LOG_TARGET, "Auto-stop timer fired in state {:?}.", player.state);
    if matches!(player.state, PlaybackState::Playing | PlaybackState::FadingIn) {
        player.is_playing = false;
        // Nobody awaits a timer-initiated fade.
        let _ = player.start_fade(FadeDirection::Out, now);
        player.set_state(PlaybackState::FadingOut);
    }
    player.broadcast_update(PlayerStateUpdate::TimerChanged { minutes: 0 });
}

pub async fn handle_channel_event(player: &mut Player, event: ChannelEvent) {
    match event {
        ChannelEvent::Loaded { source_id } => {
            debug!(target: PLAYER_LOG_TARGET, "Channel loaded '{}'.", source_id);
        }
        ChannelEvent::Error { source_id, message } => {
            if player.selected_sound.as_deref() != Some(source_id.as_str()) {
                debug!(target: PLAYER_LOG_TARGET, "Ignoring error for stale source '{}': {}", source_id, message);
                return;
            }
            // A load failure makes `play` fail, so playback that started was not affected by it.
            if player.state != PlaybackState::Stopped {
                debug!(target: PLAYER_LOG_TARGET, "Ignoring load error for '{}' reported before playback started: {}", source_id, message);
                return;
            }
            player.warn_user(&PlayerError::Load(message));
        }
        ChannelEvent::StreamFailed { source_id, message } => {
            if player.selected_sound.as_deref() != Some(source_id.as_str()) {
                debug!(target: PLAYER_LOG_TARGET, "Ignoring stream failure for stale source '{}': {}", source_id, message);
                return;
            }
            if player.state != PlaybackState::Stopped {
                player.stop_immediately().await;
            }
            player.warn_user(&PlayerError::Load(message));
        }
        ChannelEvent::Ended { source_id } => {
            // Looping sources should not end; there is no restart logic beyond the channel's loop flag.
            info!(target: PLAYER_LOG_TARGET, "Channel reported end of '{}'.", source_id);
        }
    }
}
