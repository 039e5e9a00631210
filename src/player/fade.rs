//! Time-driven linear volume fades.
//!
//! A [`FadeJob`] is a pure function of the clock: the update loop samples it
//! once per frame and writes the result to the channel. Progress is measured
//! in wall-clock time, so the fade length does not depend on how often it is
//! sampled.

use super::state::FadeOutcome;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Length of every fade.
pub const FADE_DURATION: Duration = Duration::from_millis(1000);

/// Interval at which the update loop samples the active fade.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

#[derive(Debug)]
pub struct FadeJob {
    direction: FadeDirection,
    start_value: f32,
    target_value: f32,
    started_at: Instant,
    duration: Duration,
    waiters: Vec<oneshot::Sender<FadeOutcome>>,
}

impl FadeJob {
    pub fn new(direction: FadeDirection, start_value: f32, target_value: f32, started_at: Instant, duration: Duration) -> Self {
        Self {
            direction,
            start_value,
            target_value,
            started_at,
            duration,
            waiters: Vec::new(),
        }
    }

    pub fn direction(&self) -> FadeDirection {
        self.direction
    }

    pub fn start_value(&self) -> f32 {
        self.start_value
    }

    /// Fraction of the fade elapsed at `now`, clamped to `0.0..=1.0`.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn sample(&self, now: Instant) -> f32 {
        let progress = self.progress(now);
        if progress >= 1.0 {
            return self.target_value;
        }
        self.start_value + (self.target_value - self.start_value) * progress
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Registers a caller that wants to know how this fade ends.
    pub fn subscribe(&mut self) -> PendingFade {
        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);
        PendingFade::waiting(rx)
    }

    /// Resolves every waiter. Consuming `self` makes resolution happen once.
    pub fn resolve(self, outcome: FadeOutcome) {
        for waiter in self.waiters {
            let _ = waiter.send(outcome);
        }
    }
}

/// Completion of a fade started by a command.
///
/// A fade that is dropped without being resolved reads as
/// [`FadeOutcome::Superseded`], so waiting never hangs.
#[derive(Debug)]
pub struct PendingFade {
    inner: PendingInner,
}

#[derive(Debug)]
enum PendingInner {
    Waiting(oneshot::Receiver<FadeOutcome>),
    Ready(FadeOutcome),
}

impl PendingFade {
    fn waiting(rx: oneshot::Receiver<FadeOutcome>) -> Self {
        Self {
            inner: PendingInner::Waiting(rx),
        }
    }

    pub fn ready(outcome: FadeOutcome) -> Self {
        Self {
            inner: PendingInner::Ready(outcome),
        }
    }

    pub async fn wait(self) -> FadeOutcome {
        match self.inner {
            PendingInner::Ready(outcome) => outcome,
            PendingInner::Waiting(rx) => rx.await.unwrap_or(FadeOutcome::Superseded),
        }
    }
}
