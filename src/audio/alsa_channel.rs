//! ALSA-backed [`AudioChannel`].
//!
//! Resources are fetched whole into memory, probed with symphonia when the
//! source is set, and streamed to the PCM device by a [`StreamTask`] once
//! playback starts. Volume and mute are read by the stream loop on every
//! buffer, so changes take effect without restarting the stream.

use crate::audio::{
    alsa_handler::OutputSpec,
    alsa_writer::AlsaWriter,
    channel::{AudioChannel, ChannelEvent, Preload},
    decoder::SymphoniaDecoder,
    error::AudioError,
    loop_runner::{ChannelShared, PlaybackLoopRunner},
    media,
    processor::AudioProcessor,
    stream_task::StreamTask,
};
use crate::catalog::SoundResource;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

const LOG_TARGET: &str = "r_ambient::audio::alsa_channel";

/// Silence written by [`AudioChannel::prime`]: 100 ms of 44.1 kHz stereo.
const PRIME_SPEC: OutputSpec = OutputSpec { rate: 44100, channels: 2 };
const PRIME_FRAMES: usize = 4410;

pub struct AlsaChannel {
    writer: AlsaWriter,
    client: reqwest::Client,
    shared: Arc<ChannelShared>,
    pause_state: Arc<TokioMutex<bool>>,
    preload: Preload,
    source: Option<SoundResource>,
    /// Outcome of the last fetch for `source`; a failure is kept and reported again, not retried.
    loaded: Arc<TokioMutex<Option<Result<Bytes, String>>>>,
    load_task: Option<JoinHandle<()>>,
    stream: Option<StreamTask>,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<ChannelEvent>>,
}

impl AlsaChannel {
    pub fn new(device_name: &str) -> Self {
        info!(target: LOG_TARGET, "Creating ALSA channel for device: {}", device_name);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            writer: AlsaWriter::new(device_name),
            client: reqwest::Client::new(),
            shared: Arc::new(ChannelShared::new()),
            pause_state: Arc::new(TokioMutex::new(false)),
            preload: Preload::default(),
            source: None,
            loaded: Arc::new(TokioMutex::new(None)),
            load_task: None,
            stream: None,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Fetches and probes `source` in the background, reporting the result as an event.
    fn spawn_load(&mut self, source: SoundResource) {
        let client = self.client.clone();
        let loaded = self.loaded.clone();
        let events_tx = self.events_tx.clone();
        self.load_task = Some(tokio::spawn(async move {
            let event = match load_and_probe(&client, &source).await {
                Ok(data) => {
                    *loaded.lock().await = Some(Ok(data));
                    ChannelEvent::Loaded { source_id: source.id }
                }
                Err(e) => {
                    warn!(target: LOG_TARGET, source = %source.id, "Failed to load {}: {}", source.locator, e);
                    let message = e.to_string();
                    *loaded.lock().await = Some(Err(message.clone()));
                    ChannelEvent::Error {
                        source_id: source.id,
                        message,
                    }
                }
            };
            let _ = events_tx.send(event);
        }));
    }

    /// Stops the stream task and releases the device, keeping the loaded source.
    async fn stop_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!(target: LOG_TARGET, source = %stream.source_id(), "Stopping stream task.");
            stream.stop().await;
        }
        *self.pause_state.lock().await = false;
        if let Err(e) = self.writer.close_async().await {
            warn!(target: LOG_TARGET, "Failed to close ALSA device: {}", e);
        }
    }

    /// Returns the cached media, waiting on a pending preload or fetching on demand.
    ///
    /// A failed preload is returned as is; the resource is only fetched again
    /// after a new `set_source`.
    async fn media_for(&mut self, source: &SoundResource) -> Result<Bytes, AudioError> {
        if let Some(task) = self.load_task.take() {
            if let Err(e) = task.await {
                warn!(target: LOG_TARGET, "Preload task did not complete: {}", e);
            }
        }
        match self.loaded.lock().await.clone() {
            Some(Ok(data)) => return Ok(data),
            Some(Err(message)) => return Err(AudioError::StreamError(message)),
            None => {}
        }
        let result = load_and_probe(&self.client, source).await;
        *self.loaded.lock().await = Some(result.as_ref().map(Bytes::clone).map_err(|e| e.to_string()));
        result
    }

    /// Aborts a pending preload and waits until it can no longer touch the cache.
    async fn cancel_load(&mut self) {
        if let Some(task) = self.load_task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

async fn load_and_probe(client: &reqwest::Client, source: &SoundResource) -> Result<Bytes, AudioError> {
    let data = media::fetch_media(client, &source.locator).await?;
    let extension = source.locator.extension();
    let probe_data = data.clone();
    tokio::task::spawn_blocking(move || SymphoniaDecoder::open(probe_data, extension.as_deref()).map(|_| ())).await??;
    Ok(data)
}

#[async_trait]
impl AudioChannel for AlsaChannel {
    #[instrument(skip(self, source), fields(source = %source.id))]
    async fn set_source(&mut self, source: &SoundResource) -> Result<(), AudioError> {
        self.stop_stream().await;
        self.cancel_load().await;
        *self.loaded.lock().await = None;
        self.source = Some(source.clone());

        if self.preload == Preload::Auto {
            self.spawn_load(source.clone());
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn play(&mut self) -> Result<(), AudioError> {
        if let Some(stream) = self.stream.as_ref() {
            if !stream.is_finished() {
                debug!(target: LOG_TARGET, "Resuming running stream.");
                *self.pause_state.lock().await = false;
                return Ok(());
            }
        }
        if self.stream.is_some() {
            self.stop_stream().await;
        }

        let source = self
            .source
            .clone()
            .ok_or_else(|| AudioError::InvalidState("No source set".to_string()))?;
        let data = self.media_for(&source).await?;
        let extension = source.locator.extension();

        let decoder_data = data.clone();
        let decoder_ext = extension.clone();
        let decoder =
            tokio::task::spawn_blocking(move || SymphoniaDecoder::open(decoder_data, decoder_ext.as_deref())).await??;
        let spec = decoder.spec();

        let device_rate = self.writer.open_async(spec).await?;
        let processor = AudioProcessor::new(spec.rate, device_rate, spec.channels)?;
        let processor_resampling = processor.is_resampling();
        *self.pause_state.lock().await = false;

        let runner = PlaybackLoopRunner {
            source_id: source.id.clone(),
            media: data,
            extension,
            decoder,
            processor,
            sink: self.writer.clone(),
            shared: self.shared.clone(),
            pause_state: self.pause_state.clone(),
            events_tx: self.events_tx.clone(),
        };
        self.stream = Some(StreamTask::spawn(&source.id, |shutdown_rx| runner.run_reporting(shutdown_rx)));
        info!(
            target: LOG_TARGET,
            source = %source.id,
            "Playback started at {} Hz (resampling: {}).",
            device_rate,
            processor_resampling
        );
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), AudioError> {
        if self.stream.is_some() {
            *self.pause_state.lock().await = true;
        }
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.shared.volume()
    }

    fn set_volume(&mut self, volume: f32) {
        self.shared.set_volume(volume);
    }

    fn muted(&self) -> bool {
        self.shared.muted()
    }

    fn set_muted(&mut self, muted: bool) {
        self.shared.set_muted(muted);
    }

    fn set_looping(&mut self, looping: bool) {
        self.shared.set_looping(looping);
    }

    fn set_preload(&mut self, preload: Preload) {
        self.preload = preload;
    }

    async fn prime(&mut self) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Ok(());
        }
        debug!(target: LOG_TARGET, "Priming output with {} silent frames.", PRIME_FRAMES);
        self.writer.prime_async(PRIME_SPEC, PRIME_FRAMES).await
    }

    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ChannelEvent>> {
        self.events_rx.take()
    }

    async fn shutdown(&mut self) -> Result<(), AudioError> {
        info!(target: LOG_TARGET, "Shutting down ALSA channel.");
        self.cancel_load().await;
        if let Some(stream) = self.stream.take() {
            stream.stop().await;
        }
        self.writer.close_async().await.map_err(|e| {
            error!(target: LOG_TARGET, "Failed to close ALSA device during shutdown: {}", e);
            e
        })
    }
}
