use crate::audio::alsa_handler::OutputSpec;
use crate::audio::error::AudioError;
use bytes::Bytes;
use std::io::{self, Cursor};
use symphonia::core::audio::AudioBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, trace, warn};

const LOG_TARGET: &str = "r_ambient::audio::decoder";

/// Outcome of one decode step.
#[derive(Debug)]
pub enum DecodeResult {
    /// Planar `f32` samples, one vector per channel.
    Decoded(Vec<Vec<f32>>),
    Skipped(String),
    EndOfStream,
}

/// Symphonia format reader and decoder over an in-memory resource.
pub struct SymphoniaDecoder {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    spec: OutputSpec,
}

impl SymphoniaDecoder {
    /// Probes `data` and prepares a decoder for its first playable track.
    pub fn open(data: Bytes, extension: Option<&str>) -> Result<Self, AudioError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::UnsupportedFormat("No suitable audio track found".to_string()))?
            .clone();

        let decoder = symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let spec = OutputSpec {
            rate: track
                .codec_params
                .sample_rate
                .ok_or(AudioError::MissingCodecParams("sample rate"))?,
            channels: track
                .codec_params
                .channels
                .ok_or(AudioError::MissingCodecParams("channels map"))?
                .count(),
        };
        debug!(target: LOG_TARGET, "Opened track {} ({:?}), spec {:?}", track.id, track.codec_params.codec, spec);

        Ok(Self {
            format_reader,
            decoder,
            track_id: track.id,
            spec,
        })
    }

    pub fn spec(&self) -> OutputSpec {
        self.spec
    }

    /// Decodes the next packet of the selected track.
    pub fn decode_next(&mut self) -> Result<DecodeResult, AudioError> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    trace!(target: LOG_TARGET, "End of stream.");
                    return Ok(DecodeResult::EndOfStream);
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    return Ok(DecodeResult::Skipped("Stream discontinuity (ResetRequired)".to_string()));
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    if spec.channels.count() != self.spec.channels {
                        return Err(AudioError::UnsupportedFormat(format!(
                            "Channel count changed mid-stream: {} -> {}",
                            self.spec.channels,
                            spec.channels.count()
                        )));
                    }
                    let mut buffer = AudioBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    decoded.convert(&mut buffer);
                    let planes = buffer.planes().planes().iter().map(|p| p.to_vec()).collect();
                    return Ok(DecodeResult::Decoded(planes));
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    warn!(target: LOG_TARGET, "Decode error (skipping packet): {}", err);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
