//! In-memory audio channel.
//!
//! Produces no sound. Every operation is recorded so the controller can be
//! driven headless and inspected from tests through a [`MemoryChannelProbe`].

use crate::audio::channel::{AudioChannel, ChannelEvent, Preload};
use crate::audio::error::AudioError;
use crate::catalog::SoundResource;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;

const LOG_TARGET: &str = "r_ambient::audio::memory";

/// Operations recorded by [`MemoryChannel`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelOp {
    SetSource(String),
    Play,
    Pause,
    SetMuted(bool),
    SetLooping(bool),
    SetPreload(Preload),
    Prime,
    Shutdown,
}

#[derive(Debug, Default)]
struct MemoryState {
    source_id: Option<String>,
    playing: bool,
    volume: f32,
    muted: bool,
    looping: bool,
    preload: Preload,
    block_play: bool,
    fail_load: bool,
    ops: Vec<ChannelOp>,
}

/// Audio channel that keeps all state in memory.
pub struct MemoryChannel {
    state: Arc<Mutex<MemoryState>>,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<ChannelEvent>>,
}

/// Inspection and scripting handle for a [`MemoryChannel`].
#[derive(Clone)]
pub struct MemoryChannelProbe {
    state: Arc<Mutex<MemoryState>>,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl MemoryChannel {
    pub fn new() -> (Self, MemoryChannelProbe) {
        let state = Arc::new(Mutex::new(MemoryState::default()));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let probe = MemoryChannelProbe {
            state: state.clone(),
            events_tx: events_tx.clone(),
        };
        (
            Self {
                state,
                events_tx,
                events_rx: Some(events_rx),
            },
            probe,
        )
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

#[async_trait]
impl AudioChannel for MemoryChannel {
    async fn set_source(&mut self, source: &SoundResource) -> Result<(), AudioError> {
        debug!(target: LOG_TARGET, source = %source.id, "Setting source.");
        let fail_load = self.with_state(|s| {
            s.ops.push(ChannelOp::SetSource(source.id.clone()));
            s.source_id = Some(source.id.clone());
            s.playing = false;
            s.fail_load
        });
        let event = if fail_load {
            ChannelEvent::Error {
                source_id: source.id.clone(),
                message: format!("could not load {}", source.locator),
            }
        } else {
            ChannelEvent::Loaded {
                source_id: source.id.clone(),
            }
        };
        // Receiver may already be gone during shutdown.
        let _ = self.events_tx.send(event);
        Ok(())
    }

    async fn play(&mut self) -> Result<(), AudioError> {
        self.with_state(|s| {
            s.ops.push(ChannelOp::Play);
            if s.source_id.is_none() {
                return Err(AudioError::InvalidState("No source set".to_string()));
            }
            if s.fail_load {
                return Err(AudioError::StreamError("source unavailable".to_string()));
            }
            if s.block_play {
                return Err(AudioError::InitializationError("output device refused to start".to_string()));
            }
            s.playing = true;
            Ok(())
        })
    }

    async fn pause(&mut self) -> Result<(), AudioError> {
        self.with_state(|s| {
            s.ops.push(ChannelOp::Pause);
            s.playing = false;
        });
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.with_state(|s| s.volume)
    }

    fn set_volume(&mut self, volume: f32) {
        self.with_state(|s| s.volume = volume.clamp(0.0, 1.0));
    }

    fn muted(&self) -> bool {
        self.with_state(|s| s.muted)
    }

    fn set_muted(&mut self, muted: bool) {
        self.with_state(|s| {
            s.ops.push(ChannelOp::SetMuted(muted));
            s.muted = muted;
        });
    }

    fn set_looping(&mut self, looping: bool) {
        self.with_state(|s| {
            s.ops.push(ChannelOp::SetLooping(looping));
            s.looping = looping;
        });
    }

    fn set_preload(&mut self, preload: Preload) {
        self.with_state(|s| {
            s.ops.push(ChannelOp::SetPreload(preload));
            s.preload = preload;
        });
    }

    async fn prime(&mut self) -> Result<(), AudioError> {
        self.with_state(|s| s.ops.push(ChannelOp::Prime));
        Ok(())
    }

    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ChannelEvent>> {
        self.events_rx.take()
    }

    async fn shutdown(&mut self) -> Result<(), AudioError> {
        self.with_state(|s| {
            s.ops.push(ChannelOp::Shutdown);
            s.playing = false;
        });
        Ok(())
    }
}

impl MemoryChannelProbe {
    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn volume(&self) -> f32 {
        self.with_state(|s| s.volume)
    }

    /// Gain actually reaching the output: zero while muted or paused.
    pub fn audible_volume(&self) -> f32 {
        self.with_state(|s| if s.muted || !s.playing { 0.0 } else { s.volume })
    }

    pub fn is_muted(&self) -> bool {
        self.with_state(|s| s.muted)
    }

    pub fn is_playing(&self) -> bool {
        self.with_state(|s| s.playing)
    }

    pub fn is_looping(&self) -> bool {
        self.with_state(|s| s.looping)
    }

    pub fn source_id(&self) -> Option<String> {
        self.with_state(|s| s.source_id.clone())
    }

    pub fn ops(&self) -> Vec<ChannelOp> {
        self.with_state(|s| s.ops.clone())
    }

    pub fn clear_ops(&self) {
        self.with_state(|s| s.ops.clear());
    }

    /// Makes subsequent `play` calls fail as if the device refused to start.
    pub fn set_play_blocked(&self, blocked: bool) {
        self.with_state(|s| s.block_play = blocked);
    }

    /// Makes subsequent `set_source` calls report a load error.
    pub fn set_load_failure(&self, fail: bool) {
        self.with_state(|s| s.fail_load = fail);
    }

    /// Injects a load error for the current source.
    pub fn emit_load_error(&self, message: &str) {
        if let Some(source_id) = self.source_id() {
            let _ = self.events_tx.send(ChannelEvent::Error {
                source_id,
                message: message.to_string(),
            });
        }
    }

    /// Injects a failure of the running stream for the current source.
    pub fn emit_stream_failure(&self, message: &str) {
        if let Some(source_id) = self.source_id() {
            let _ = self.events_tx.send(ChannelEvent::StreamFailed {
                source_id,
                message: message.to_string(),
            });
        }
    }

    /// Injects an `Ended` notification for the current source.
    pub fn emit_ended(&self) {
        if let Some(source_id) = self.source_id() {
            let _ = self.events_tx.send(ChannelEvent::Ended { source_id });
        }
    }
}
