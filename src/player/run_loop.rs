use super::{command_handler, FadeOutcome, Player, PlayerCommand, PlayerStateUpdate, FRAME_INTERVAL, PLAYER_LOG_TARGET};
use crate::audio::ChannelEvent;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{error, info, trace};

async fn next_channel_event(events: &mut Option<mpsc::UnboundedReceiver<ChannelEvent>>) -> Option<ChannelEvent> {
    match events.as_mut() {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Runs the player's command processing loop.
pub async fn run_player_loop(player: &mut Player) {
    info!(target: PLAYER_LOG_TARGET, "Player run loop started.");

    let mut frame_ticker = interval(FRAME_INTERVAL);
    frame_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let fading = player.fade.is_some();
        let timer_deadline = player.timer.deadline();

        tokio::select! {
            biased;

            // --- Fade frames ---
            _ = frame_ticker.tick(), if fading => {
                player.advance_fade(Instant::now()).await;
            }

            // --- Auto-stop timer ---
            _ = sleep_until(timer_deadline.unwrap_or_else(Instant::now)), if timer_deadline.is_some() => {
                let now = Instant::now();
                player.advance_fade(now).await;
                command_handler::handle_timer_fired(player, now).await;
            }

            // --- Channel notifications ---
            event = next_channel_event(&mut player.channel_events) => match event {
                Some(event) => {
                    trace!(target: PLAYER_LOG_TARGET, "Channel event: {:?}", event);
                    command_handler::handle_channel_event(player, event).await;
                }
                None => {
                    info!(target: PLAYER_LOG_TARGET, "Channel event stream closed.");
                    player.channel_events = None;
                }
            },

            // --- Command Processing ---
            command = player.command_rx.recv() => {
                let Some(command) = command else {
                    info!(target: PLAYER_LOG_TARGET, "All handles dropped. Exiting run loop.");
                    break;
                };
                trace!(target: PLAYER_LOG_TARGET, "Received command: {:?}", command);

                // Commands observe the fade as of this instant.
                let now = Instant::now();
                player.advance_fade(now).await;

                match command {
                    PlayerCommand::SelectSound { id, responder } => {
                        let result = command_handler::handle_select_sound(player, &id).await;
                        let _ = responder.send(result);
                    }
                    PlayerCommand::TogglePlay(responder) => {
                        let result = command_handler::handle_toggle_play(player, now).await;
                        let _ = responder.send(result);
                    }
                    PlayerCommand::SetVolume(percent) => command_handler::handle_set_volume(player, percent).await,
                    PlayerCommand::ToggleMute => command_handler::handle_toggle_mute(player).await,
                    PlayerCommand::SetTimer(minutes) => command_handler::handle_set_timer(player, minutes, now).await,
                    PlayerCommand::GetState(responder) => {
                        let _ = responder.send(player.snapshot(now));
                    }
                    PlayerCommand::Shutdown => {
                        info!(target: PLAYER_LOG_TARGET, "Shutdown command received. Exiting run loop.");
                        break;
                    }
                }
            }
        }
    }

    info!(target: PLAYER_LOG_TARGET, "Player run loop finished. Performing final cleanup.");
    if let Some(fade) = player.fade.take() {
        fade.resolve(FadeOutcome::Superseded);
    }
    player.timer.cancel();
    player.is_playing = false;
    if let Err(e) = player.channel.shutdown().await {
        error!(target: PLAYER_LOG_TARGET, "Error shutting down audio channel: {}", e);
    }
    player.broadcast_update(PlayerStateUpdate::Stopped);
    info!(target: PLAYER_LOG_TARGET, "Player task cleanup complete.");
}
