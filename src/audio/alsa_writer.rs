use crate::audio::alsa_handler::{AlsaPcmHandler, OutputSpec};
use crate::audio::error::AudioError;
use crate::audio::loop_runner::PcmSink;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task;
use tracing::{debug, error, instrument, trace, warn};

const LOG_TARGET: &str = "r_ambient::audio::alsa_writer";

/// Frames handed to one blocking write call.
const WRITE_CHUNK_FRAMES: usize = 4096;

/// Async facade over [`AlsaPcmHandler`]; every device call runs on the blocking pool.
#[derive(Clone)]
pub struct AlsaWriter {
    alsa_handler: Arc<Mutex<AlsaPcmHandler>>,
}

impl AlsaWriter {
    pub fn new(device_name: &str) -> Self {
        Self {
            alsa_handler: Arc::new(Mutex::new(AlsaPcmHandler::new(device_name))),
        }
    }

    async fn with_handler<R, F>(&self, op: &'static str, f: F) -> Result<R, AudioError>
    where
        R: Send + 'static,
        F: FnOnce(&mut AlsaPcmHandler) -> Result<R, AudioError> + Send + 'static,
    {
        let handler = Arc::clone(&self.alsa_handler);
        task::spawn_blocking(move || match handler.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => {
                error!(target: LOG_TARGET, "ALSA handler mutex poisoned during {}: {}", op, poisoned);
                Err(AudioError::InvalidState("ALSA handler mutex poisoned".to_string()))
            }
        })
        .await?
    }

    /// Opens the device and returns the rate it actually runs at.
    #[instrument(skip(self))]
    pub async fn open_async(&self, spec: OutputSpec) -> Result<u32, AudioError> {
        self.with_handler("open", move |h| {
            h.initialize(spec)?;
            Ok(h.actual_rate().unwrap_or(spec.rate))
        })
        .await
    }

    /// Writes interleaved samples in chunks, checking for shutdown between chunks.
    #[instrument(skip(self, s16_buffer, shutdown_rx), fields(frames = s16_buffer.len() / num_channels.max(1)))]
    pub async fn write_s16_buffer_async(
        &self,
        s16_buffer: Vec<i16>,
        num_channels: usize,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> Result<(), AudioError> {
        if s16_buffer.is_empty() || num_channels == 0 {
            return Ok(());
        }

        let total_frames = s16_buffer.len() / num_channels;
        let mut offset = 0;

        while offset < total_frames {
            if shutdown_rx.try_recv().is_ok() {
                debug!(target: LOG_TARGET, "Shutdown signal received during write.");
                return Err(AudioError::ShutdownRequested);
            }

            let chunk_frames = (total_frames - offset).min(WRITE_CHUNK_FRAMES);
            let chunk = s16_buffer[offset * num_channels..(offset + chunk_frames) * num_channels].to_vec();

            match self.with_handler("write", move |h| h.write_s16_buffer(&chunk)).await {
                Ok(0) => {
                    warn!(target: LOG_TARGET, "ALSA underrun recovered, retrying chunk.");
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                }
                Ok(frames_written) => {
                    offset += frames_written.min(chunk_frames);
                    trace!(target: LOG_TARGET, "Wrote {} frames ({}/{})", frames_written, offset, total_frames);
                }
                Err(e) => {
                    error!(target: LOG_TARGET, "ALSA write failed: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    pub async fn pause_async(&self) -> Result<(), AudioError> {
        self.with_handler("pause", |h| h.pause()).await
    }

    pub async fn resume_async(&self) -> Result<(), AudioError> {
        self.with_handler("resume", |h| h.resume()).await
    }

    pub async fn drain_async(&self) -> Result<(), AudioError> {
        self.with_handler("drain", |h| h.drain()).await
    }

    pub async fn prime_async(&self, spec: OutputSpec, frames: usize) -> Result<(), AudioError> {
        self.with_handler("prime", move |h| h.write_silence(spec, frames)).await
    }

    pub async fn close_async(&self) -> Result<(), AudioError> {
        self.with_handler("close", |h| {
            h.close();
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl PcmSink for AlsaWriter {
    async fn write(
        &mut self,
        samples: Vec<i16>,
        channels: usize,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> Result<(), AudioError> {
        self.write_s16_buffer_async(samples, channels, shutdown_rx).await
    }

    async fn pause(&mut self) -> Result<(), AudioError> {
        self.pause_async().await
    }

    async fn resume(&mut self) -> Result<(), AudioError> {
        self.resume_async().await
    }

    async fn drain(&mut self) -> Result<(), AudioError> {
        self.drain_async().await
    }
}
