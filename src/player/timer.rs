use std::time::Duration;
use tokio::time::Instant;

/// Single-shot auto-stop timer. Arming it replaces any pending deadline.
#[derive(Debug, Default)]
pub struct SleepTimer {
    armed: Option<Armed>,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    minutes: u32,
    deadline: Instant,
}

impl SleepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer `minutes` from `now`; `0` disarms it.
    pub fn set(&mut self, minutes: u32, now: Instant) {
        self.armed = (minutes > 0).then(|| Armed {
            minutes,
            deadline: now + Duration::from_secs(u64::from(minutes) * 60),
        });
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn minutes(&self) -> u32 {
        self.armed.map_or(0, |a| a.minutes)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|a| a.deadline)
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.armed.map(|a| a.deadline.saturating_duration_since(now))
    }

    /// Disarms and reports whether the deadline had passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.armed {
            Some(a) if now >= a.deadline => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }
}
