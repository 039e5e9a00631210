use super::error::PlayerError;
use super::fade::PendingFade;
use std::time::Duration;
use tokio::sync::oneshot;

/// Playback state machine of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    FadingIn,
    Playing,
    FadingOut,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::FadingIn => "fading in",
            PlaybackState::Playing => "playing",
            PlaybackState::FadingOut => "fading out",
        }
    }
}

/// How a fade ended, as seen by a caller waiting on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeOutcome {
    /// The fade ran to its target.
    Completed,
    /// A newer command replaced the fade before it finished.
    Superseded,
    /// No fade was started because no sound is selected.
    NotStarted,
}

/// Commands that can be sent to the Player task.
#[derive(Debug)]
pub enum PlayerCommand {
    SelectSound {
        id: String,
        responder: oneshot::Sender<Result<(), PlayerError>>,
    },
    TogglePlay(oneshot::Sender<Result<PendingFade, PlayerError>>),
    /// Volume in percent; values above 100 are clamped.
    SetVolume(u8),
    ToggleMute,
    /// Auto-stop after the given minutes; `0` cancels.
    SetTimer(u32),
    GetState(oneshot::Sender<PlayerSnapshot>),
    Shutdown,
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub state: PlaybackState,
    /// Flips when play/pause is requested, not when the fade finishes.
    pub is_playing: bool,
    pub selected_sound: Option<String>,
    pub volume: f32,
    pub muted: bool,
    /// Gain currently set on the audio channel, before mute.
    pub channel_volume: f32,
    pub timer_minutes: u32,
    pub timer_remaining: Option<Duration>,
}

impl PlayerSnapshot {
    pub fn volume_percent(&self) -> u8 {
        volume_to_percent(self.volume)
    }
}

/// Updates broadcast by the Player task about its state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerStateUpdate {
    StateChanged { state: PlaybackState, is_playing: bool },
    SoundChanged { id: String },
    VolumeChanged { percent: u8 },
    MuteChanged(bool),
    TimerChanged { minutes: u32 },
    /// User-facing problem report for the warning banner.
    Warning(String),
    /// The player task has shut down.
    Stopped,
}

/// Maps a UI percent (0..=100) to the internal gain.
pub fn volume_from_percent(percent: u8) -> f32 {
    f32::from(percent.min(100)) / 100.0
}

pub fn volume_to_percent(volume: f32) -> u8 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u8
}
