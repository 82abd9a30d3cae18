use thiserror::Error;

use super::stage_artifacts::StageArtifacts;
use crate::audio::domain::waveform::Waveform;
use crate::shared::render_settings::SettingsError;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot render an empty waveform")]
    EmptyWaveform,
    #[error("invalid render settings: {0}")]
    InvalidSettings(#[from] SettingsError),
    #[error("failed to encode WAV audio: {0}")]
    Encode(#[from] hound::Error),
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Domain interface for turning one stage's waveform into viewable artifacts.
///
/// Implementations must not mutate the waveform and should be deterministic:
/// rendering the same samples twice gives the same pixels and bytes.
pub trait StageRenderer: Send + Sync {
    fn render(&self, waveform: &Waveform, stage_name: &str)
        -> Result<StageArtifacts, RenderError>;
}
