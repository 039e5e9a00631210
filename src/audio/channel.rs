use crate::audio::error::AudioError;
use crate::catalog::SoundResource;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Lifecycle notifications emitted by an audio channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The resource was fetched and probed successfully.
    Loaded { source_id: String },
    /// The resource could not be fetched or probed. Reported once per source.
    Error { source_id: String, message: String },
    /// A running stream failed while decoding or writing to the output.
    StreamFailed { source_id: String, message: String },
    /// Playback reached the end of a non-looping resource.
    Ended { source_id: String },
}

/// How eagerly a channel should fetch its source after `set_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preload {
    /// Defer fetching until the first `play`.
    None,
    /// Fetch and probe immediately in the background.
    #[default]
    Auto,
}

/// Controls for a single streaming output channel.
///
/// `volume` is the channel's own gain in `0.0..=1.0`; `muted` silences output
/// without altering it. The effective output gain is `volume` when unmuted and
/// zero otherwise.
#[async_trait]
pub trait AudioChannel: Send {
    /// Replaces the current source. Any running playback is stopped first.
    async fn set_source(&mut self, source: &SoundResource) -> Result<(), AudioError>;

    /// Starts or resumes playback of the current source.
    async fn play(&mut self) -> Result<(), AudioError>;

    /// Pauses playback, keeping the stream position.
    async fn pause(&mut self) -> Result<(), AudioError>;

    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);

    fn muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    fn set_looping(&mut self, looping: bool);

    fn set_preload(&mut self, preload: Preload);

    /// One-time warm-up of the output path before the first real playback.
    async fn prime(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    /// Takes the receiver for lifecycle notifications. Returns `None` once taken.
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ChannelEvent>>;

    /// Stops playback and releases the output device.
    async fn shutdown(&mut self) -> Result<(), AudioError>;
}
