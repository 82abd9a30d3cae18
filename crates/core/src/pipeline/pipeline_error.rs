use thiserror::Error;

use crate::audio::domain::audio_decoder::DecodeError;
use crate::audio::domain::transformation::BoxError;
use crate::audio::domain::waveform::WaveformError;

#[derive(Error, Debug)]
pub enum TransformationFailure {
    #[error("{0}")]
    Apply(#[source] BoxError),
    #[error("produced an invalid waveform: {0}")]
    InvalidOutput(#[source] WaveformError),
    #[error("returned audio at {reported} Hz but declared {expected} Hz")]
    RateMismatch { expected: u32, reported: u32 },
}

impl TransformationFailure {
    /// Classifies an error returned by `Transformation::apply`.
    pub fn from_apply(error: BoxError) -> Self {
        match error.downcast::<WaveformError>() {
            Ok(invalid) => Self::InvalidOutput(*invalid),
            Err(other) => Self::Apply(other),
        }
    }
}

/// A transformation that aborted the run.
///
/// `index` is the 0-based pipeline position; the stage it would have
/// produced is `index + 1`.
#[derive(Error, Debug)]
#[error("stage {} ({name}) failed: {kind}", .index + 1)]
pub struct TransformationError {
    pub index: usize,
    pub name: String,
    #[source]
    pub kind: TransformationFailure,
}

impl TransformationError {
    pub fn stage_index(&self) -> usize {
        self.index + 1
    }
}

/// Run-level failure reported to the sink.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("could not decode input: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Transformation(#[from] TransformationError),
}

impl PipelineError {
    /// Stage the failure belongs to; decode failures precede stage 0.
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            PipelineError::Decode(_) => None,
            PipelineError::Transformation(e) => Some(e.stage_index()),
        }
    }
}
