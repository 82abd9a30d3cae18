use std::time::Instant;

use super::pipeline_error::PipelineError;
use super::pipeline_logger::PipelineLogger;
use super::pipeline_runner::PipelineRunner;
use super::stage_pipeline::Pipeline;
use crate::audio::domain::audio_decoder::AudioDecoder;
use crate::audio::domain::audio_source::AudioSource;
use crate::rendering::domain::render_sink::RenderSink;
use crate::rendering::domain::stage_renderer::StageRenderer;

/// What a run produced, stage by stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub index: usize,
    pub name: String,
    pub sample_rate: u32,
    pub samples: usize,
    pub render_error: Option<String>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub stages: Vec<StageSummary>,
    /// Decode or transformation failure that ended the run early.
    pub failure: Option<PipelineError>,
}

impl RunReport {
    pub fn render_failures(&self) -> impl Iterator<Item = &StageSummary> {
        self.stages.iter().filter(|s| s.render_error.is_some())
    }

    /// True when every stage was produced and rendered.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.render_failures().next().is_none()
    }

    pub fn aborted_by_transformation(&self) -> bool {
        matches!(self.failure, Some(PipelineError::Transformation(_)))
    }
}

/// Decodes one input, runs it through a pipeline and hands every stage to a
/// sink.
pub struct RenderPipelineUseCase {
    decoder: Box<dyn AudioDecoder>,
    renderer: Box<dyn StageRenderer>,
    logger: Box<dyn PipelineLogger>,
    target_sample_rate: Option<u32>,
}

impl RenderPipelineUseCase {
    pub fn new(
        decoder: Box<dyn AudioDecoder>,
        renderer: Box<dyn StageRenderer>,
        logger: Box<dyn PipelineLogger>,
        target_sample_rate: Option<u32>,
    ) -> Self {
        Self {
            decoder,
            renderer,
            logger,
            target_sample_rate,
        }
    }

    /// Runs the whole pass.
    ///
    /// Decode and transformation failures are reported to the sink and
    /// recorded in the returned report; only sink errors come back as `Err`.
    pub fn execute(
        &mut self,
        source: &AudioSource,
        pipeline: &Pipeline,
        sink: &mut dyn RenderSink,
    ) -> Result<RunReport, Box<dyn std::error::Error>> {
        let mut report = RunReport::default();

        // 1. Decode
        let started = Instant::now();
        let waveform = match self.decoder.decode(source, self.target_sample_rate) {
            Ok(waveform) => waveform,
            Err(e) => {
                let error = PipelineError::Decode(e);
                sink.present_error(&error)?;
                sink.finish()?;
                report.failure = Some(error);
                return Ok(report);
            }
        };
        self.logger
            .timing("decode", started.elapsed().as_secs_f64() * 1000.0);
        self.logger.info(&format!(
            "Decoded {} ({:.2}s at {} Hz), running {} transformation(s)",
            source.origin(),
            waveform.duration(),
            waveform.sample_rate(),
            pipeline.len()
        ));

        // 2. Run and present each stage as it is produced
        let runner = PipelineRunner::new(self.renderer.as_ref());
        for outcome in runner.run_with_logger(pipeline, waveform, self.logger.as_mut()) {
            match outcome {
                Ok(stage) => {
                    sink.present_stage(&stage)?;
                    report.stages.push(StageSummary {
                        index: stage.index,
                        name: stage.name.clone(),
                        sample_rate: stage.waveform.sample_rate(),
                        samples: stage.waveform.len(),
                        render_error: stage.render_error().map(|e| e.to_string()),
                    });
                }
                Err(e) => {
                    let error = PipelineError::Transformation(e);
                    sink.present_error(&error)?;
                    report.failure = Some(error);
                }
            }
        }

        // 3. Finish
        sink.finish()?;
        self.logger.summary();
        Ok(report)
    }
}
