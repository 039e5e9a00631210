use crate::audio::error::AudioError;
use alsa::nix::errno::Errno;
use alsa::pcm::{Access, Format, HwParams, State as PcmState, PCM};
use alsa::{Direction, ValueOr};
use std::ffi::CString;
use tracing::{debug, error, info, instrument, warn};

const LOG_TARGET: &str = "r_ambient::audio::alsa_handler";

/// Sample rate and channel count of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    pub rate: u32,
    pub channels: usize,
}

/// Owns the ALSA PCM device for one output channel.
pub struct AlsaPcmHandler {
    device_name: String,
    pcm: Option<PCM>,
    actual_rate: Option<u32>,
}

impl AlsaPcmHandler {
    pub fn new(device_name: &str) -> Self {
        debug!(target: LOG_TARGET, "Creating AlsaPcmHandler for device: {}", device_name);
        AlsaPcmHandler {
            device_name: device_name.to_string(),
            pcm: None,
            actual_rate: None,
        }
    }

    /// Opens the PCM device for interleaved S16 output with `spec`.
    /// Closes any existing PCM device first.
    #[instrument(skip(self), fields(device = %self.device_name))]
    pub fn initialize(&mut self, spec: OutputSpec) -> Result<(), AudioError> {
        info!(
            target: LOG_TARGET,
            "Initializing ALSA PCM device '{}': rate={}, channels={}",
            self.device_name, spec.rate, spec.channels
        );

        self.close();

        let device = CString::new(self.device_name.clone())
            .map_err(|e| AudioError::InitializationError(format!("Invalid device name: {}", e)))?;

        let pcm = PCM::open(&device, Direction::Playback, false).map_err(|e| {
            AudioError::InitializationError(format!("Cannot open '{}': {}", self.device_name, e))
        })?;

        {
            let hwp = HwParams::any(&pcm)?;
            hwp.set_access(Access::RWInterleaved)?;
            hwp.set_format(Format::s16())?;
            hwp.set_channels(spec.channels as u32)?;
            hwp.set_rate_near(spec.rate, ValueOr::Nearest).map_err(|e| {
                error!(target: LOG_TARGET, "Failed to set ALSA rate near {}: {}", spec.rate, e);
                AudioError::AlsaError(format!("Failed to set sample rate {}: {}", spec.rate, e))
            })?;
            let actual_rate = hwp.get_rate()?;
            if actual_rate != spec.rate {
                warn!(target: LOG_TARGET, "ALSA rate negotiation: requested={}, actual={}", spec.rate, actual_rate);
            }
            self.actual_rate = Some(actual_rate);
            pcm.hw_params(&hwp)?;

            let swp = pcm.sw_params_current()?;
            let buffer_size = hwp.get_buffer_size()?;
            let period_size = hwp.get_period_size()?;
            swp.set_start_threshold(buffer_size - period_size)?;
            pcm.sw_params(&swp)?;
            debug!(target: LOG_TARGET, "ALSA parameters applied (buffer={}, period={}).", buffer_size, period_size);
        }

        self.pcm = Some(pcm);
        Ok(())
    }

    /// Writes interleaved S16 samples, recovering from underruns.
    /// Returns `Ok(0)` when an underrun was recovered and nothing was written.
    pub fn write_s16_buffer(&self, buffer: &[i16]) -> Result<usize, AudioError> {
        let pcm = self
            .pcm
            .as_ref()
            .ok_or_else(|| AudioError::InvalidState("PCM not initialized for writing".to_string()))?;
        let io = pcm.io_i16()?;

        match io.writei(buffer) {
            Ok(frames_written) => Ok(frames_written),
            Err(e) if e.errno() == Errno::EPIPE => {
                warn!(target: LOG_TARGET, "ALSA buffer underrun (EPIPE), recovering.");
                match pcm.recover(libc::EPIPE, false) {
                    Ok(()) => Ok(0),
                    Err(recover_err) => {
                        error!(target: LOG_TARGET, "ALSA recovery failed: {}", recover_err);
                        Err(AudioError::AlsaError(format!("ALSA recovery failed: {}", recover_err)))
                    }
                }
            }
            Err(e) => {
                error!(target: LOG_TARGET, "ALSA write error: {}", e);
                Err(AudioError::AlsaError(e.to_string()))
            }
        }
    }

    /// Opens the device briefly and pushes `frames` of silence through it.
    pub fn write_silence(&mut self, spec: OutputSpec, frames: usize) -> Result<(), AudioError> {
        self.initialize(spec)?;
        let silence = vec![0i16; frames * spec.channels];
        let written = self.write_s16_buffer(&silence)?;
        debug!(target: LOG_TARGET, "Primed device with {} silent frames.", written);
        self.drain()?;
        self.close();
        Ok(())
    }

    pub fn drain(&self) -> Result<(), AudioError> {
        if let Some(pcm) = &self.pcm {
            if matches!(pcm.state(), PcmState::Running | PcmState::Prepared) {
                pcm.drain()?;
            }
        }
        Ok(())
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        let pcm = self
            .pcm
            .as_ref()
            .ok_or_else(|| AudioError::InvalidState("PCM not initialized for pausing".to_string()))?;
        match pcm.state() {
            PcmState::Running => {
                if pcm.hw_params_current()?.can_pause() {
                    pcm.pause(true)?;
                } else {
                    // Hardware without pause support: drop queued frames instead.
                    pcm.drop()?;
                }
                Ok(())
            }
            other_state => {
                debug!(target: LOG_TARGET, "Not pausing ALSA in state {:?}.", other_state);
                Ok(())
            }
        }
    }

    pub fn resume(&self) -> Result<(), AudioError> {
        let pcm = self
            .pcm
            .as_ref()
            .ok_or_else(|| AudioError::InvalidState("PCM not initialized for resuming".to_string()))?;
        match pcm.state() {
            PcmState::Paused => {
                pcm.pause(false)?;
                Ok(())
            }
            PcmState::Setup => {
                pcm.prepare()?;
                Ok(())
            }
            other_state => {
                debug!(target: LOG_TARGET, "Not resuming ALSA in state {:?}.", other_state);
                Ok(())
            }
        }
    }

    /// Closes the PCM device, discarding queued frames.
    pub fn close(&mut self) {
        if let Some(pcm) = self.pcm.take() {
            debug!(target: LOG_TARGET, "Closing ALSA PCM device (state: {:?}).", pcm.state());
            if matches!(pcm.state(), PcmState::Running | PcmState::Prepared | PcmState::Paused) {
                if let Err(e) = pcm.drop() {
                    warn!(target: LOG_TARGET, "Error dropping ALSA buffer during close (ignored): {}", e);
                }
            }
        }
        self.actual_rate = None;
    }

    pub fn actual_rate(&self) -> Option<u32> {
        self.actual_rate
    }
}

impl Drop for AlsaPcmHandler {
    fn drop(&mut self) {
        self.close();
    }
}
