use crate::audio::domain::waveform::Waveform;
use crate::rendering::domain::stage_artifacts::StageArtifacts;
use crate::rendering::domain::stage_renderer::RenderError;

/// One emitted pipeline stage: index 0 is the decoded input, index `i + 1`
/// is the output of the transformation at pipeline position `i`.
///
/// A render failure is kept here rather than ending the run, so later stages
/// still render.
#[derive(Debug)]
pub struct StageResult {
    pub index: usize,
    pub name: String,
    pub waveform: Waveform,
    pub artifacts: Result<StageArtifacts, RenderError>,
}

impl StageResult {
    pub fn is_original(&self) -> bool {
        self.index == 0
    }

    pub fn render_error(&self) -> Option<&RenderError> {
        self.artifacts.as_ref().err()
    }
}
