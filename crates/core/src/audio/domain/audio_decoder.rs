use std::path::PathBuf;

use thiserror::Error;

use super::audio_source::AudioSource;
use super::waveform::{Waveform, WaveformError};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unrecognized audio format for {origin}: {reason}")]
    UnsupportedFormat { origin: String, reason: String },
    #[error("no audio track found in {origin}")]
    NoAudioTrack { origin: String },
    #[error("corrupt audio stream in {origin}: {reason}")]
    Corrupt { origin: String, reason: String },
    #[error("truncated audio stream in {origin}: expected {expected} frames, decoded {decoded}")]
    Truncated {
        origin: String,
        expected: u64,
        decoded: u64,
    },
    #[error("decoded audio from {origin} is invalid: {source}")]
    InvalidWaveform {
        origin: String,
        #[source]
        source: WaveformError,
    },
    #[error("failed to resample {origin} to {target_rate} Hz: {reason}")]
    Resample {
        origin: String,
        target_rate: u32,
        reason: String,
    },
    #[error("unknown sample '{name}' (available: {available})")]
    UnknownSample { name: String, available: String },
}

/// Domain interface for turning encoded audio into a mono [`Waveform`].
pub trait AudioDecoder: Send {
    /// Decode to mono at the source's native rate, or at
    /// `target_sample_rate` when one is given.
    fn decode(
        &self,
        source: &AudioSource,
        target_sample_rate: Option<u32>,
    ) -> Result<Waveform, DecodeError>;
}
