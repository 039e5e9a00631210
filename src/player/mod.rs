//! Playback controller: owns the audio channel and drives fades, mute,
//! volume and the auto-stop timer from a single task.

use crate::audio::{AudioChannel, ChannelEvent, Preload};
use crate::catalog::SoundCatalog;
use crate::config::{SettingsStore, DEFAULT_VOLUME_PERCENT};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

mod command_handler;
mod error;
mod fade;
mod handle;
mod run_loop;
mod state;
mod timer;
mod unlock;

pub use error::{PlayerError, PLAYBACK_BLOCKED_HINT};
pub use fade::{FadeDirection, FadeJob, PendingFade, FADE_DURATION, FRAME_INTERVAL};
pub use handle::PlayerHandle;
pub use state::{
    volume_from_percent, volume_to_percent, FadeOutcome, PlaybackState, PlayerCommand, PlayerSnapshot,
    PlayerStateUpdate,
};
pub use timer::SleepTimer;
pub use unlock::UnlockGate;

const PLAYER_LOG_TARGET: &str = "r_ambient::player";

/// Construction options for [`Player`].
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub prime_on_first_play: bool,
    /// Whether selecting a sound fetches it before the first play.
    pub preload: Preload,
    pub command_buffer_size: usize,
    pub state_update_capacity: usize,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            prime_on_first_play: true,
            preload: Preload::Auto,
            command_buffer_size: 32,
            state_update_capacity: 64,
        }
    }
}

/// Single owner of the audio channel and the playback state.
pub struct Player {
    // --- Collaborators ---
    channel: Box<dyn AudioChannel>,
    catalog: SoundCatalog,
    store: Arc<dyn SettingsStore>,
    unlock: UnlockGate,

    // --- State ---
    state: PlaybackState,
    is_playing: bool,
    selected_sound: Option<String>,
    volume: f32,
    muted: bool,
    fade: Option<FadeJob>,
    timer: SleepTimer,

    // --- Communication ---
    command_rx: mpsc::Receiver<PlayerCommand>,
    state_update_tx: broadcast::Sender<PlayerStateUpdate>,
    channel_events: Option<mpsc::UnboundedReceiver<ChannelEvent>>,
}

impl Player {
    /// Creates the player and a handle to it. Run the player with [`Player::run`].
    ///
    /// The persisted volume is read once here.
    pub fn new(
        mut channel: Box<dyn AudioChannel>,
        catalog: SoundCatalog,
        store: Arc<dyn SettingsStore>,
        options: PlayerOptions,
    ) -> (Self, PlayerHandle) {
        let (command_tx, command_rx) = mpsc::channel(options.command_buffer_size);
        let (state_update_tx, _) = broadcast::channel(options.state_update_capacity);

        let percent = match store.load_volume_percent() {
            Ok(Some(percent)) => percent,
            Ok(None) => DEFAULT_VOLUME_PERCENT,
            Err(e) => {
                warn!(target: PLAYER_LOG_TARGET, "Could not read saved volume, using default: {}", e);
                DEFAULT_VOLUME_PERCENT
            }
        };

        channel.set_looping(true);
        channel.set_preload(options.preload);
        channel.set_muted(false);
        channel.set_volume(0.0);
        let channel_events = channel.take_events();

        let player = Player {
            channel,
            catalog,
            store,
            unlock: UnlockGate::new(options.prime_on_first_play),
            state: PlaybackState::Stopped,
            is_playing: false,
            selected_sound: None,
            volume: volume_from_percent(percent),
            muted: false,
            fade: None,
            timer: SleepTimer::new(),
            command_rx,
            state_update_tx: state_update_tx.clone(),
            channel_events,
        };
        info!(target: PLAYER_LOG_TARGET, "Player created with volume {}%.", percent);

        (player, PlayerHandle::new(command_tx, state_update_tx))
    }

    /// Runs the player's command and fade loop. Spawn this as a Tokio task.
    #[instrument(skip(self))]
    pub async fn run(&mut self) {
        run_loop::run_player_loop(self).await;
    }

    /// Sends a state update via the broadcast channel, logging errors.
    fn broadcast_update(&self, update: PlayerStateUpdate) {
        trace!(target: PLAYER_LOG_TARGET, "Broadcasting state update: {:?}", update);
        if self.state_update_tx.send(update.clone()).is_err() {
            debug!(target: PLAYER_LOG_TARGET, "No active listeners for state update: {:?}", update);
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            debug!(target: PLAYER_LOG_TARGET, "State {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        self.broadcast_update(PlayerStateUpdate::StateChanged {
            state,
            is_playing: self.is_playing,
        });
    }

    fn snapshot(&self, now: Instant) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.state,
            is_playing: self.is_playing,
            selected_sound: self.selected_sound.clone(),
            volume: self.volume,
            muted: self.muted,
            channel_volume: self.channel.volume(),
            timer_minutes: self.timer.minutes(),
            timer_remaining: self.timer.remaining(now),
        }
    }

    /// Replaces the active fade, resolving the old one as superseded.
    fn replace_fade(&mut self, fade: Option<FadeJob>) {
        if let Some(old) = std::mem::replace(&mut self.fade, fade) {
            trace!(target: PLAYER_LOG_TARGET, "Superseding {:?} fade.", old.direction());
            old.resolve(FadeOutcome::Superseded);
        }
    }

    /// Starts a fade from the channel's current volume and returns its completion.
    fn start_fade(&mut self, direction: FadeDirection, now: Instant) -> PendingFade {
        let target = match direction {
            FadeDirection::In => self.volume,
            FadeDirection::Out => 0.0,
        };
        let mut fade = FadeJob::new(direction, self.channel.volume(), target, now, FADE_DURATION);
        let pending = fade.subscribe();
        debug!(target: PLAYER_LOG_TARGET, "Fade {:?} {:.3} -> {:.3}", direction, fade.start_value(), target);
        self.replace_fade(Some(fade));
        pending
    }

    /// Writes the fade's value for `now` to the channel and finishes it when due.
    async fn advance_fade(&mut self, now: Instant) {
        let Some(fade) = self.fade.as_ref() else {
            return;
        };
        let value = fade.sample(now);
        self.channel.set_volume(value);
        if !fade.is_complete(now) {
            return;
        }

        let Some(fade) = self.fade.take() else {
            return;
        };
        match fade.direction() {
            FadeDirection::In => self.set_state(PlaybackState::Playing),
            FadeDirection::Out => {
                if let Err(e) = self.channel.pause().await {
                    warn!(target: PLAYER_LOG_TARGET, "Pausing channel after fade-out failed: {}", e);
                }
                self.channel.set_volume(0.0);
                self.set_state(PlaybackState::Stopped);
            }
        }
        fade.resolve(FadeOutcome::Completed);
    }

    /// Silences and stops the channel at once, without a fade.
    async fn stop_immediately(&mut self) {
        self.replace_fade(None);
        self.channel.set_volume(0.0);
        if let Err(e) = self.channel.pause().await {
            warn!(target: PLAYER_LOG_TARGET, "Pausing channel failed: {}", e);
        }
        self.is_playing = false;
        self.set_state(PlaybackState::Stopped);
    }

    fn warn_user(&self, error: &PlayerError) {
        warn!(target: PLAYER_LOG_TARGET, "{}", error);
        self.broadcast_update(PlayerStateUpdate::Warning(error.to_string()));
    }
}
