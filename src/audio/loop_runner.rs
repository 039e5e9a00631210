use crate::audio::{
    channel::ChannelEvent,
    decoder::{DecodeResult, SymphoniaDecoder},
    error::AudioError,
    processor::AudioProcessor,
    sample_converter,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex as TokioMutex};
use tracing::{debug, error, info, instrument, trace, warn};

const LOG_TARGET: &str = "r_ambient::audio::loop_runner";

const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Channel properties shared between the channel handle and its stream task.
#[derive(Debug)]
pub struct ChannelShared {
    volume_bits: AtomicU32,
    muted: AtomicBool,
    looping: AtomicBool,
}

impl ChannelShared {
    pub fn new() -> Self {
        Self {
            volume_bits: AtomicU32::new(0f32.to_bits()),
            muted: AtomicBool::new(false),
            looping: AtomicBool::new(false),
        }
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Relaxed))
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume_bits.store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    pub fn muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub fn looping(&self) -> bool {
        self.looping.load(Ordering::Relaxed)
    }

    pub fn set_looping(&self, looping: bool) {
        self.looping.store(looping, Ordering::Relaxed);
    }

    /// Gain applied to outgoing samples.
    pub fn effective_gain(&self) -> f32 {
        if self.muted() {
            0.0
        } else {
            self.volume()
        }
    }
}

impl Default for ChannelShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Destination for the interleaved S16 output of the stream loop.
#[async_trait]
pub trait PcmSink: Send {
    /// Writes `samples`, returning [`AudioError::ShutdownRequested`] if shutdown arrives mid-write.
    async fn write(
        &mut self,
        samples: Vec<i16>,
        channels: usize,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> Result<(), AudioError>;

    async fn pause(&mut self) -> Result<(), AudioError>;

    async fn resume(&mut self) -> Result<(), AudioError>;

    /// Blocks until queued output has played.
    async fn drain(&mut self) -> Result<(), AudioError>;
}

/// Why the stream loop returned without error.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StreamExit {
    EndOfStream,
    ShutdownSignal,
}

/// Decodes one source and feeds it to the device until shutdown or end of stream.
pub struct PlaybackLoopRunner<S> {
    pub source_id: String,
    pub media: Bytes,
    pub extension: Option<String>,
    pub decoder: SymphoniaDecoder,
    pub processor: AudioProcessor,
    pub sink: S,
    pub shared: Arc<ChannelShared>,
    pub pause_state: Arc<TokioMutex<bool>>,
    pub events_tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl<S: PcmSink> PlaybackLoopRunner<S> {
    /// Runs the loop and reports failures as channel events.
    pub async fn run_reporting(self, shutdown_rx: broadcast::Receiver<()>) {
        let source_id = self.source_id.clone();
        let events_tx = self.events_tx.clone();
        match self.run(shutdown_rx).await {
            Ok(exit) => debug!(target: LOG_TARGET, source = %source_id, "Stream loop exited: {:?}", exit),
            Err(e) => {
                error!(target: LOG_TARGET, source = %source_id, "Stream loop failed: {}", e);
                let _ = events_tx.send(ChannelEvent::StreamFailed {
                    source_id,
                    message: e.to_string(),
                });
            }
        }
    }

    #[instrument(skip(self, shutdown_rx), fields(source = %self.source_id), name = "stream_loop")]
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<StreamExit, AudioError> {
        info!(target: LOG_TARGET, "Starting stream loop.");
        let channels = self.decoder.spec().channels;
        let mut last_gain = self.shared.effective_gain();
        let mut was_paused = false;
        let mut produced_any = false;

        loop {
            let is_paused = *self.pause_state.lock().await;
            if is_paused && !was_paused {
                if let Err(e) = self.sink.pause().await {
                    warn!(target: LOG_TARGET, "Failed to pause ALSA device: {}. Continuing.", e);
                }
                was_paused = true;
            } else if !is_paused && was_paused {
                if let Err(e) = self.sink.resume().await {
                    warn!(target: LOG_TARGET, "Failed to resume ALSA device: {}. Continuing.", e);
                }
                was_paused = false;
            }

            if is_paused {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => return Ok(StreamExit::ShutdownSignal),
                    _ = tokio::time::sleep(PAUSE_POLL_INTERVAL) => continue,
                }
            }

            match self.decoder.decode_next()? {
                DecodeResult::Decoded(planes) => {
                    produced_any = true;
                    let resampled = self.processor.process(planes)?;
                    let gain = self.shared.effective_gain();
                    let samples = sample_converter::interleave_to_s16(&resampled, last_gain, gain);
                    last_gain = gain;
                    match self.sink.write(samples, channels, &mut shutdown_rx).await {
                        Err(AudioError::ShutdownRequested) => return Ok(StreamExit::ShutdownSignal),
                        Err(e) => return Err(e),
                        Ok(()) => {}
                    }
                }
                DecodeResult::Skipped(reason) => {
                    warn!(target: LOG_TARGET, "Decoder skipped packet: {}", reason);
                }
                DecodeResult::EndOfStream => {
                    if !produced_any {
                        return Err(AudioError::EmptyStream);
                    }
                    if self.shared.looping() {
                        // Resampler state carries over so the loop point stays seamless.
                        trace!(target: LOG_TARGET, "End of stream, looping.");
                        self.decoder = SymphoniaDecoder::open(self.media.clone(), self.extension.as_deref())?;
                        produced_any = false;
                        continue;
                    }

                    let tail = self.processor.flush()?;
                    let gain = self.shared.effective_gain();
                    let samples = sample_converter::interleave_to_s16(&tail, last_gain, gain);
                    match self.sink.write(samples, channels, &mut shutdown_rx).await {
                        Err(AudioError::ShutdownRequested) => return Ok(StreamExit::ShutdownSignal),
                        Err(e) => return Err(e),
                        Ok(()) => {}
                    }
                    if let Err(e) = self.sink.drain().await {
                        warn!(target: LOG_TARGET, "Drain after end of stream failed: {}", e);
                    }
                    let _ = self.events_tx.send(ChannelEvent::Ended {
                        source_id: self.source_id.clone(),
                    });
                    return Ok(StreamExit::EndOfStream);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tests::sine_wav;
    use std::sync::atomic::AtomicUsize;

    /// Counts written frames and can stop the loop once enough have arrived.
    #[derive(Clone, Default)]
    struct CountingSink {
        frames: Arc<AtomicUsize>,
        drained: Arc<AtomicBool>,
        stop_after: Option<usize>,
    }

    #[async_trait]
    impl PcmSink for CountingSink {
        async fn write(
            &mut self,
            samples: Vec<i16>,
            channels: usize,
            _shutdown_rx: &mut broadcast::Receiver<()>,
        ) -> Result<(), AudioError> {
            let total = self.frames.fetch_add(samples.len() / channels, Ordering::SeqCst) + samples.len() / channels;
            match self.stop_after {
                Some(limit) if total >= limit => Err(AudioError::ShutdownRequested),
                _ => Ok(()),
            }
        }

        async fn pause(&mut self) -> Result<(), AudioError> {
            Ok(())
        }

        async fn resume(&mut self) -> Result<(), AudioError> {
            Ok(())
        }

        async fn drain(&mut self) -> Result<(), AudioError> {
            self.drained.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn runner(
        wav: Vec<u8>,
        looping: bool,
        sink: CountingSink,
    ) -> (PlaybackLoopRunner<CountingSink>, mpsc::UnboundedReceiver<ChannelEvent>) {
        let media = Bytes::from(wav);
        let decoder = SymphoniaDecoder::open(media.clone(), Some("wav")).unwrap();
        let spec = decoder.spec();
        let shared = Arc::new(ChannelShared::new());
        shared.set_volume(1.0);
        shared.set_looping(looping);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let runner = PlaybackLoopRunner {
            source_id: "wave_noise".to_string(),
            media,
            extension: Some("wav".to_string()),
            decoder,
            processor: AudioProcessor::new(spec.rate, spec.rate, spec.channels).unwrap(),
            sink,
            shared,
            pause_state: Arc::new(TokioMutex::new(false)),
            events_tx,
        };
        (runner, events_rx)
    }

    #[tokio::test]
    async fn test_looping_stream_restarts_past_the_end() {
        let sink = CountingSink {
            stop_after: Some(2000),
            ..CountingSink::default()
        };
        let (runner, mut events) = runner(sine_wav(8000, 1, 800), true, sink.clone());
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let exit = runner.run(shutdown_rx).await.unwrap();
        assert_eq!(exit, StreamExit::ShutdownSignal);
        assert!(sink.frames.load(Ordering::SeqCst) >= 2000);
        assert!(!sink.drained.load(Ordering::SeqCst));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_non_looping_stream_ends_and_reports() {
        let sink = CountingSink::default();
        let (runner, mut events) = runner(sine_wav(8000, 2, 800), false, sink.clone());
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let exit = runner.run(shutdown_rx).await.unwrap();
        assert_eq!(exit, StreamExit::EndOfStream);
        assert_eq!(sink.frames.load(Ordering::SeqCst), 800);
        assert!(sink.drained.load(Ordering::SeqCst));
        assert_eq!(
            events.try_recv().unwrap(),
            ChannelEvent::Ended {
                source_id: "wave_noise".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_resource_is_an_error() {
        let (runner, _events) = runner(sine_wav(8000, 1, 0), true, CountingSink::default());
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        assert!(matches!(runner.run(shutdown_rx).await, Err(AudioError::EmptyStream)));
    }

    #[tokio::test]
    async fn test_failure_is_reported_as_stream_failure() {
        let (runner, mut events) = runner(sine_wav(8000, 1, 0), false, CountingSink::default());
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        runner.run_reporting(shutdown_rx).await;
        match events.try_recv() {
            Ok(ChannelEvent::StreamFailed { source_id, .. }) => assert_eq!(source_id, "wave_noise"),
            other => panic!("expected stream failure, got {:?}", other),
        }
    }

    #[test]
    fn test_shared_gain_respects_mute() {
        let shared = ChannelShared::new();
        assert_eq!(shared.effective_gain(), 0.0);
        shared.set_volume(0.7);
        assert!((shared.effective_gain() - 0.7).abs() < f32::EPSILON);
        shared.set_muted(true);
        assert_eq!(shared.effective_gain(), 0.0);
        assert!((shared.volume() - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_shared_volume_is_clamped() {
        let shared = ChannelShared::new();
        shared.set_volume(1.8);
        assert_eq!(shared.volume(), 1.0);
        shared.set_volume(-0.2);
        assert_eq!(shared.volume(), 0.0);
    }
}
