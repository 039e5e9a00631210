use std::error::Error;
use std::io;
use symphonia::core::errors::Error as SymphoniaError;

/// Error types specific to the audio channel.
#[derive(Debug)]
pub enum AudioError {
    AlsaError(String),
    StreamError(String),
    DecodingError(String),
    SymphoniaError(SymphoniaError),
    IoError(io::Error),
    NetworkError(reqwest::Error),
    InvalidState(String),
    UnsupportedFormat(String),
    MissingCodecParams(&'static str),
    TaskJoinError(String),
    InitializationError(String),
    ResamplingError(String),
    /// Decoder hit end of stream before producing a single frame.
    EmptyStream,
    /// Internal signal used by the stream task to unwind on shutdown.
    ShutdownRequested,
}

impl AudioError {
    /// True when the failure happened while fetching or probing the resource,
    /// as opposed to starting the output device.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            AudioError::StreamError(_)
                | AudioError::DecodingError(_)
                | AudioError::SymphoniaError(_)
                | AudioError::IoError(_)
                | AudioError::NetworkError(_)
                | AudioError::UnsupportedFormat(_)
                | AudioError::MissingCodecParams(_)
                | AudioError::EmptyStream
        )
    }
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::AlsaError(e) => write!(f, "ALSA error: {}", e),
            AudioError::StreamError(e) => write!(f, "Streaming error: {}", e),
            AudioError::DecodingError(e) => write!(f, "Decoding error: {}", e),
            AudioError::SymphoniaError(e) => write!(f, "Symphonia error: {}", e),
            AudioError::IoError(e) => write!(f, "I/O error: {}", e),
            AudioError::NetworkError(e) => write!(f, "Network error: {}", e),
            AudioError::InvalidState(s) => write!(f, "Invalid state: {}", s),
            AudioError::UnsupportedFormat(s) => write!(f, "Unsupported format: {}", s),
            AudioError::MissingCodecParams(s) => write!(f, "Missing codec parameters: {}", s),
            AudioError::TaskJoinError(e) => write!(f, "Async task join error: {}", e),
            AudioError::InitializationError(e) => write!(f, "Initialization error: {}", e),
            AudioError::ResamplingError(e) => write!(f, "Resampling error: {}", e),
            AudioError::EmptyStream => write!(f, "Stream contained no audio"),
            AudioError::ShutdownRequested => write!(f, "Shutdown requested"),
        }
    }
}

impl Error for AudioError {}

// --- From Implementations for AudioError ---

impl From<alsa::Error> for AudioError {
    fn from(e: alsa::Error) -> Self {
        AudioError::AlsaError(e.to_string())
    }
}

impl From<SymphoniaError> for AudioError {
    fn from(e: SymphoniaError) -> Self {
        AudioError::SymphoniaError(e)
    }
}

impl From<io::Error> for AudioError {
    fn from(e: io::Error) -> Self {
        AudioError::IoError(e)
    }
}

impl From<reqwest::Error> for AudioError {
    fn from(e: reqwest::Error) -> Self {
        AudioError::NetworkError(e)
    }
}

impl From<tokio::task::JoinError> for AudioError {
    fn from(e: tokio::task::JoinError) -> Self {
        AudioError::TaskJoinError(e.to_string())
    }
}
