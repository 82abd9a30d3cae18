use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::stage_result::StageResult;

/// Receives rendered stages for display or persistence.
///
/// Stages arrive in pipeline order. A run-level failure (decode or
/// transformation) arrives through `present_error` after any stages that
/// completed before it.
pub trait RenderSink {
    fn present_stage(&mut self, stage: &StageResult) -> Result<(), Box<dyn std::error::Error>>;

    fn present_error(&mut self, error: &PipelineError) -> Result<(), Box<dyn std::error::Error>>;

    /// Called once after the last stage or error. Default: no-op.
    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
