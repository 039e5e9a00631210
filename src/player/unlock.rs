use crate::audio::AudioChannel;
use tracing::{debug, warn};

const LOG_TARGET: &str = "r_ambient::player::unlock";

/// Runs the output primer once before the first real playback attempt.
#[derive(Debug)]
pub struct UnlockGate {
    enabled: bool,
    done: bool,
}

impl UnlockGate {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, done: false }
    }

    /// Primes `channel` on the first call only. Failures are logged and not retried.
    pub async fn ensure_unlocked(&mut self, channel: &mut dyn AudioChannel) {
        if self.done {
            return;
        }
        self.done = true;
        if !self.enabled {
            return;
        }
        match channel.prime().await {
            Ok(()) => debug!(target: LOG_TARGET, "Audio output primed."),
            Err(e) => warn!(target: LOG_TARGET, "Priming audio output failed: {}", e),
        }
    }
}
