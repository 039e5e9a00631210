//! Audio output: the channel abstraction and its ALSA and in-memory backends.

mod alsa_channel;
mod alsa_handler;
mod alsa_writer;
mod channel;
mod decoder;
mod error;
mod loop_runner;
mod media;
mod memory;
mod processor;
mod sample_converter;
mod stream_task;

pub use alsa_channel::AlsaChannel;
pub use channel::{AudioChannel, ChannelEvent, Preload};
pub use error::AudioError;
pub use memory::{ChannelOp, MemoryChannel, MemoryChannelProbe};
