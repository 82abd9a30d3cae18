use std::iter::{Enumerate, FusedIterator};
use std::slice::Iter;
use std::time::Instant;

use super::pipeline_error::{TransformationError, TransformationFailure};
use super::pipeline_logger::PipelineLogger;
use super::stage_pipeline::Pipeline;
use super::stage_result::StageResult;
use crate::audio::domain::transformation::Transformation;
use crate::audio::domain::waveform::Waveform;
use crate::rendering::domain::stage_renderer::StageRenderer;
use crate::shared::constants::ORIGINAL_STAGE_NAME;

/// Applies a pipeline stage by stage and renders every intermediate result.
pub struct PipelineRunner<'r> {
    renderer: &'r dyn StageRenderer,
}

impl<'r> PipelineRunner<'r> {
    pub fn new(renderer: &'r dyn StageRenderer) -> Self {
        Self { renderer }
    }

    /// Lazily runs `pipeline` over `waveform`.
    ///
    /// Yields the original first, then one result per transformation. The
    /// first transformation failure is yielded as an error and ends the
    /// iteration. Dropping the iterator abandons the remaining stages.
    pub fn run<'a>(&'a self, pipeline: &'a Pipeline, waveform: Waveform) -> StageRun<'a> {
        StageRun::new(self.renderer, pipeline, waveform, None)
    }

    /// Like [`run`](Self::run), reporting progress and timings to `logger`.
    pub fn run_with_logger<'a>(
        &'a self,
        pipeline: &'a Pipeline,
        waveform: Waveform,
        logger: &'a mut dyn PipelineLogger,
    ) -> StageRun<'a> {
        StageRun::new(self.renderer, pipeline, waveform, Some(logger))
    }
}

enum RunState {
    Original(Waveform),
    Running(Waveform),
    Done,
}

/// Iterator over the stages of one pipeline run. Not restartable: running
/// again re-executes every transformation.
pub struct StageRun<'a> {
    renderer: &'a dyn StageRenderer,
    transformations: Enumerate<Iter<'a, Box<dyn Transformation>>>,
    total: usize,
    state: RunState,
    logger: Option<&'a mut dyn PipelineLogger>,
}

impl<'a> StageRun<'a> {
    fn new(
        renderer: &'a dyn StageRenderer,
        pipeline: &'a Pipeline,
        waveform: Waveform,
        logger: Option<&'a mut dyn PipelineLogger>,
    ) -> Self {
        Self {
            renderer,
            transformations: pipeline.iter().enumerate(),
            total: pipeline.len() + 1,
            state: RunState::Original(waveform),
            logger,
        }
    }

    fn log_timing(&mut self, step: &str, started: Instant) {
        if let Some(logger) = self.logger.as_deref_mut() {
            logger.timing(step, started.elapsed().as_secs_f64() * 1000.0);
        }
    }

    fn emit(&mut self, index: usize, name: String, waveform: Waveform) -> StageResult {
        let started = Instant::now();
        let artifacts = self.renderer.render(&waveform, &name);
        self.log_timing("render", started);

        if let Some(logger) = self.logger.as_deref_mut() {
            let rms = waveform.rms().max(f32::MIN_POSITIVE);
            logger.metric("rms_db", 20.0 * (rms as f64).log10());
            if let Err(e) = &artifacts {
                logger.info(&format!("Stage {index} ({name}) failed to render: {e}"));
            }
            logger.progress(index + 1, self.total);
        }

        StageResult {
            index,
            name,
            waveform,
            artifacts,
        }
    }
}

/// Applies `transformation`, classifying failures and checking the rate the
/// transformation declared against the one it returned.
fn apply_checked(
    transformation: &dyn Transformation,
    input: &Waveform,
) -> Result<Waveform, TransformationFailure> {
    let expected = transformation.output_rate(input.sample_rate());
    let output = transformation
        .apply(input)
        .map_err(TransformationFailure::from_apply)?;
    if output.sample_rate() != expected {
        return Err(TransformationFailure::RateMismatch {
            expected,
            reported: output.sample_rate(),
        });
    }
    Ok(output)
}

impl Iterator for StageRun<'_> {
    type Item = Result<StageResult, TransformationError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = match std::mem::replace(&mut self.state, RunState::Done) {
            RunState::Done => return None,
            RunState::Original(waveform) => {
                self.state = RunState::Running(waveform.clone());
                let result = self.emit(0, ORIGINAL_STAGE_NAME.to_string(), waveform);
                return Some(Ok(result));
            }
            RunState::Running(waveform) => waveform,
        };

        let (index, transformation) = self.transformations.next()?;
        let name = transformation.name();

        let started = Instant::now();
        let outcome = apply_checked(&**transformation, &current);
        self.log_timing("apply", started);

        match outcome {
            Ok(output) => {
                self.state = RunState::Running(output.clone());
                Some(Ok(self.emit(index + 1, name, output)))
            }
            Err(kind) => {
                let error = TransformationError { index, name, kind };
                log::warn!("Pipeline aborted: {error}");
                Some(Err(error))
            }
        }
    }
}

impl FusedIterator for StageRun<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::transformation::BoxError;
    use crate::audio::infrastructure::gain::Gain;
    use crate::audio::infrastructure::noise_injection::NoiseInjection;
    use crate::audio::infrastructure::resample::Resample;
    use crate::pipeline::pipeline_logger::LogPipelineLogger;
    use crate::rendering::domain::stage_artifacts::StageArtifacts;
    use crate::rendering::domain::stage_renderer::RenderError;
    use approx::assert_relative_eq;
    use image::RgbImage;
    use std::sync::{Arc, Mutex};

    /// Renders nothing; fails for stages whose name is in `fail_on`.
    struct StubRenderer {
        fail_on: Vec<&'static str>,
    }

    impl StubRenderer {
        fn ok() -> Self {
            Self { fail_on: vec![] }
        }
    }

    impl StageRenderer for StubRenderer {
        fn render(&self, waveform: &Waveform, name: &str) -> Result<StageArtifacts, RenderError> {
            if self.fail_on.contains(&name) {
                return Err(RenderError::EmptyWaveform);
            }
            Ok(StageArtifacts {
                spectrogram: RgbImage::new(1, 1),
                waveform: RgbImage::new(1, 1),
                audio: vec![0; waveform.len().min(4)],
            })
        }
    }

    /// Adds `offset` to every sample and records each input it sees.
    struct Recording {
        offset: f32,
        seen: Arc<Mutex<Vec<Waveform>>>,
    }

    impl Transformation for Recording {
        fn apply(&self, waveform: &Waveform) -> Result<Waveform, BoxError> {
            self.seen.lock().unwrap().push(waveform.clone());
            let samples = waveform.samples().iter().map(|s| s + self.offset).collect();
            Ok(waveform.with_samples(samples)?)
        }
    }

    struct Failing;

    impl Transformation for Failing {
        fn apply(&self, _: &Waveform) -> Result<Waveform, BoxError> {
            Err("unsupported input".into())
        }
    }

    struct ProducesNan;

    impl Transformation for ProducesNan {
        fn apply(&self, waveform: &Waveform) -> Result<Waveform, BoxError> {
            Ok(waveform.with_samples(vec![f32::NAN; waveform.len()])?)
        }
    }

    /// Resamples but forgets to declare it.
    struct SilentResample;

    impl Transformation for SilentResample {
        fn apply(&self, waveform: &Waveform) -> Result<Waveform, BoxError> {
            Ok(Waveform::new(waveform.samples().to_vec(), waveform.sample_rate() * 2)?)
        }
    }

    fn sine(seconds: f32, sample_rate: u32, amplitude: f32) -> Waveform {
        let len = (seconds * sample_rate as f32) as usize;
        let samples = (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / sample_rate as f32).sin() * amplitude)
            .collect();
        Waveform::new(samples, sample_rate).unwrap()
    }

    #[test]
    fn test_empty_pipeline_yields_only_original() {
        let renderer = StubRenderer::ok();
        let runner = PipelineRunner::new(&renderer);
        let pipeline = Pipeline::new();
        let input = sine(0.1, 8000, 0.5);

        let results: Vec<_> = runner.run(&pipeline, input.clone()).collect();
        assert_eq!(results.len(), 1);
        let original = results.into_iter().next().unwrap().unwrap();
        assert_eq!(original.index, 0);
        assert_eq!(original.name, "Original");
        assert!(original.is_original());
        assert_eq!(original.waveform, input);
    }

    #[test]
    fn test_each_stage_sees_previous_output() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        for offset in [0.1, 0.2, 0.3] {
            pipeline.push(Box::new(Recording {
                offset,
                seen: seen.clone(),
            }));
        }
        let renderer = StubRenderer::ok();
        let runner = PipelineRunner::new(&renderer);

        let results: Vec<StageResult> = runner
            .run(&pipeline, Waveform::new(vec![0.0; 16], 8000).unwrap())
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(results.len(), 4);
        let seen = seen.lock().unwrap();
        for n in 1..results.len() {
            assert_eq!(seen[n - 1], results[n - 1].waveform);
            assert_eq!(results[n].index, n);
            assert_eq!(results[n].name, "Recording");
        }
        assert_relative_eq!(results[3].waveform.samples()[0], 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_failure_at_index_one_of_three() {
        let pipeline = Pipeline::new()
            .with(Gain::new(3.0))
            .with(Failing)
            .with(Gain::new(3.0));
        let renderer = StubRenderer::ok();
        let runner = PipelineRunner::new(&renderer);

        let results: Vec<_> = runner.run(&pipeline, sine(0.1, 8000, 0.5)).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        let error = results[2].as_ref().unwrap_err();
        assert_eq!(error.index, 1);
        assert_eq!(error.stage_index(), 2);
        assert_eq!(error.name, "Failing");
        assert!(matches!(error.kind, TransformationFailure::Apply(_)));
    }

    #[test]
    fn test_iterator_is_fused_after_failure() {
        let pipeline = Pipeline::new().with(Failing).with(Gain::new(1.0));
        let renderer = StubRenderer::ok();
        let runner = PipelineRunner::new(&renderer);
        let mut run = runner.run(&pipeline, sine(0.1, 8000, 0.5));
        assert!(run.next().unwrap().is_ok());
        assert!(run.next().unwrap().is_err());
        assert!(run.next().is_none());
        assert!(run.next().is_none());
    }

    #[test]
    fn test_invalid_output_is_reported() {
        let pipeline = Pipeline::new().with(ProducesNan);
        let renderer = StubRenderer::ok();
        let runner = PipelineRunner::new(&renderer);
        let error = runner
            .run(&pipeline, sine(0.1, 8000, 0.5))
            .find_map(|r| r.err())
            .unwrap();
        assert!(matches!(error.kind, TransformationFailure::InvalidOutput(_)));
    }

    #[test]
    fn test_undeclared_rate_change_is_rejected() {
        let pipeline = Pipeline::new().with(SilentResample);
        let renderer = StubRenderer::ok();
        let runner = PipelineRunner::new(&renderer);
        let error = runner
            .run(&pipeline, sine(0.1, 8000, 0.5))
            .find_map(|r| r.err())
            .unwrap();
        assert!(matches!(
            error.kind,
            TransformationFailure::RateMismatch {
                expected: 8000,
                reported: 16000
            }
        ));
    }

    #[test]
    fn test_declared_rate_change_is_carried_forward() {
        let pipeline = Pipeline::new().with(Resample::new(4000)).with(Gain::new(0.0));
        let renderer = StubRenderer::ok();
        let runner = PipelineRunner::new(&renderer);
        let rates: Vec<u32> = runner
            .run(&pipeline, sine(0.5, 8000, 0.5))
            .map(|r| r.unwrap().waveform.sample_rate())
            .collect();
        assert_eq!(rates, vec![8000, 4000, 4000]);
    }

    #[test]
    fn test_render_failure_is_isolated_to_its_stage() {
        let pipeline = Pipeline::new().with(Gain::new(1.0)).with(NoiseInjection::default());
        let renderer = StubRenderer {
            fail_on: vec!["Gain"],
        };
        let runner = PipelineRunner::new(&renderer);
        let results: Vec<StageResult> = runner
            .run(&pipeline, sine(0.1, 8000, 0.5))
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].artifacts.is_ok());
        assert!(results[1].render_error().is_some());
        assert!(results[2].artifacts.is_ok());
    }

    #[test]
    fn test_gain_then_noise_scenario() {
        let input = sine(5.0, 22050, 0.02);
        let pipeline = Pipeline::new()
            .with(Gain::new(6.0))
            .with(NoiseInjection::new(0.5, 0.5, 42));
        let renderer = StubRenderer::ok();
        let runner = PipelineRunner::new(&renderer);

        let results: Vec<StageResult> = runner
            .run(&pipeline, input.clone())
            .map(|r| r.unwrap())
            .collect();
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Original", "Gain", "NoiseInjection"]);

        let gained = &results[1].waveform;
        let db = 20.0 * (gained.rms() / input.rms()).log10();
        assert_relative_eq!(db, 6.0, epsilon = 1e-3);

        let noisy = &results[2].waveform;
        assert_eq!(noisy.len(), gained.len());
        assert_eq!(noisy.sample_rate(), 22050);
        assert!(noisy
            .samples()
            .iter()
            .zip(gained.samples())
            .all(|(a, b)| a != b));
    }

    #[test]
    fn test_rerun_reexecutes_and_reproduces() {
        let pipeline = Pipeline::new().with(NoiseInjection::new(0.1, 0.2, 9));
        let renderer = StubRenderer::ok();
        let runner = PipelineRunner::new(&renderer);
        let input = sine(0.2, 8000, 0.5);
        let first: Vec<Waveform> = runner.run(&pipeline, input.clone()).map(|r| r.unwrap().waveform).collect();
        let second: Vec<Waveform> = runner.run(&pipeline, input).map(|r| r.unwrap().waveform).collect();
        assert_eq!(first, second);
        assert!(!first[1].shares_buffer_with(&second[1]));
    }

    #[test]
    fn test_logger_receives_progress_and_timings() {
        let pipeline = Pipeline::new().with(Gain::new(2.0));
        let renderer = StubRenderer::ok();
        let runner = PipelineRunner::new(&renderer);
        let mut logger = LogPipelineLogger::new();
        let count = runner
            .run_with_logger(&pipeline, sine(0.1, 8000, 0.5), &mut logger)
            .count();
        assert_eq!(count, 2);
        assert_eq!(logger.timings_for("render").map(|t| t.len()), Some(2));
        assert_eq!(logger.timings_for("apply").map(|t| t.len()), Some(1));
        assert_eq!(logger.metrics_for("rms_db").map(|m| m.len()), Some(2));
    }
}
