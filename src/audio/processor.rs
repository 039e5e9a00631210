use crate::audio::error::AudioError;
use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};
use tracing::{debug, trace};

const LOG_TARGET: &str = "r_ambient::audio::processor";

const RESAMPLER_CHUNK_FRAMES: usize = 512;

/// Converts decoded planar audio to the device rate.
///
/// Input that does not fill a whole resampler chunk is held back until the
/// next call or until [`AudioProcessor::flush`].
pub struct AudioProcessor {
    resampler: Option<SincFixedIn<f32>>,
    pending: Vec<Vec<f32>>,
    num_channels: usize,
}

impl AudioProcessor {
    /// Builds a processor; resampling is enabled only when the rates differ.
    pub fn new(source_rate: u32, device_rate: u32, num_channels: usize) -> Result<Self, AudioError> {
        let resampler = if source_rate != device_rate {
            debug!(target: LOG_TARGET, "Resampling {} Hz -> {} Hz", source_rate, device_rate);
            let params = SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            };
            Some(
                SincFixedIn::<f32>::new(
                    device_rate as f64 / source_rate as f64,
                    2.0,
                    params,
                    RESAMPLER_CHUNK_FRAMES,
                    num_channels,
                )
                .map_err(|e| AudioError::InitializationError(format!("Failed to create resampler: {}", e)))?,
            )
        } else {
            None
        };

        Ok(Self {
            resampler,
            pending: vec![Vec::new(); num_channels],
            num_channels,
        })
    }

    pub fn is_resampling(&self) -> bool {
        self.resampler.is_some()
    }

    /// Returns planar output at the device rate; may be empty while input is buffered.
    pub fn process(&mut self, planes: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>, AudioError> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(planes);
        };
        if planes.len() != self.num_channels {
            return Err(AudioError::ResamplingError(format!(
                "Expected {} channels, got {}",
                self.num_channels,
                planes.len()
            )));
        }

        for (pending, plane) in self.pending.iter_mut().zip(planes) {
            pending.extend(plane);
        }

        let mut output = vec![Vec::new(); self.num_channels];
        loop {
            let needed = resampler.input_frames_next();
            if self.pending[0].len() < needed {
                break;
            }
            let chunk: Vec<Vec<f32>> = self.pending.iter_mut().map(|p| p.drain(..needed).collect()).collect();
            let resampled = resampler
                .process(&chunk, None)
                .map_err(|e| AudioError::ResamplingError(e.to_string()))?;
            for (out, plane) in output.iter_mut().zip(resampled) {
                out.extend(plane);
            }
        }
        trace!(target: LOG_TARGET, "Resampled into {} frames", output[0].len());
        Ok(output)
    }

    /// Pushes any held-back input through the resampler.
    pub fn flush(&mut self) -> Result<Vec<Vec<f32>>, AudioError> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(vec![Vec::new(); self.num_channels]);
        };
        if self.pending[0].is_empty() {
            return Ok(vec![Vec::new(); self.num_channels]);
        }
        let remaining: Vec<Vec<f32>> = self.pending.iter_mut().map(std::mem::take).collect();
        resampler
            .process_partial(Some(remaining.as_slice()), None)
            .map_err(|e| AudioError::ResamplingError(format!("Resampler flush failed: {}", e)))
    }
}
