use crate::audio::AudioError;
use crate::catalog::CatalogError;
use std::error::Error;
use std::fmt;

/// Shown with playback failures that are not caused by the resource itself.
pub const PLAYBACK_BLOCKED_HINT: &str =
    "Check that the audio output device exists and is not in use by another program, then press play again.";

/// Errors reported by the playback controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The requested id is not in the catalog.
    UnknownSound(String),
    /// The resource could not be fetched or decoded.
    Load(String),
    /// The output refused to start.
    PlaybackBlocked { reason: String, hint: &'static str },
    /// The player task is no longer running.
    ChannelClosed,
}

impl PlayerError {
    /// Classifies a failed `play` call.
    pub fn from_play_failure(err: AudioError) -> Self {
        if err.is_load_failure() {
            PlayerError::Load(err.to_string())
        } else {
            PlayerError::PlaybackBlocked {
                reason: err.to_string(),
                hint: PLAYBACK_BLOCKED_HINT,
            }
        }
    }
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerError::UnknownSound(id) => write!(f, "Unknown sound: {}", id),
            PlayerError::Load(reason) => write!(f, "Could not load sound: {}", reason),
            PlayerError::PlaybackBlocked { reason, hint } => write!(f, "Playback blocked: {}. {}", reason, hint),
            PlayerError::ChannelClosed => write!(f, "Player is not running"),
        }
    }
}

impl Error for PlayerError {}

impl From<CatalogError> for PlayerError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownSound(id) => PlayerError::UnknownSound(id),
            other => PlayerError::Load(other.to_string()),
        }
    }
}
