use crate::catalog::SoundCatalog;
use crate::player::PlayerSnapshot;
use std::time::{Duration, Instant};

/// How long a warning stays on screen.
pub const BANNER_DISPLAY: Duration = Duration::from_secs(5);

/// Holds the latest warning until it expires.
#[derive(Debug, Default)]
pub struct Banner {
    current: Option<(String, Instant)>,
}

impl Banner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `message`, replacing any earlier one and restarting the display window.
    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.current = Some((message.into(), now + BANNER_DISPLAY));
    }

    pub fn message(&self, now: Instant) -> Option<&str> {
        match &self.current {
            Some((message, hide_at)) if now < *hide_at => Some(message),
            _ => None,
        }
    }
}

/// One-line summary of the player.
pub fn render_status(snapshot: &PlayerSnapshot, catalog: &SoundCatalog) -> String {
    let sound = snapshot
        .selected_sound
        .as_deref()
        .map(|id| catalog.resolve(id).map_or(id, |s| s.label.as_str()))
        .unwrap_or("no sound");
    let icon = if snapshot.is_playing { '▶' } else { '■' };
    let volume = if snapshot.muted {
        "muted".to_string()
    } else {
        format!("{}%", snapshot.volume_percent())
    };
    let timer = match snapshot.timer_remaining {
        Some(remaining) => {
            let secs = remaining.as_secs();
            format!("stop in {}:{:02}", secs / 60, secs % 60)
        }
        None => "timer off".to_string(),
    };
    format!(
        "{} {} [{}] vol {} | {}",
        icon,
        sound,
        snapshot.state.label(),
        volume,
        timer
    )
}

pub const KEY_HELP: &str = "space play/pause  m mute  +/- volume  n/b sound  t timer  q quit";
