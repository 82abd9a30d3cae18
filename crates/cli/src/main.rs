use std::path::PathBuf;
use std::process;

use clap::Parser;

use augscope_core::audio::domain::audio_source::AudioSource;
use augscope_core::audio::infrastructure::cached_decoder::CachedDecoder;
use augscope_core::audio::infrastructure::sample_library::SampleLibrary;
use augscope_core::audio::infrastructure::symphonia_decoder::SymphoniaDecoder;
use augscope_core::audio::infrastructure::transformation_factory::{
    available_kinds, parse_transformation,
};
use augscope_core::pipeline::pipeline_error::PipelineError;
use augscope_core::pipeline::pipeline_logger::LogPipelineLogger;
use augscope_core::pipeline::render_pipeline_use_case::RenderPipelineUseCase;
use augscope_core::pipeline::stage_pipeline::Pipeline;
use augscope_core::rendering::infrastructure::cached_stage_renderer::CachedStageRenderer;
use augscope_core::rendering::infrastructure::directory_sink::DirectorySink;
use augscope_core::rendering::infrastructure::plot_stage_renderer::PlotStageRenderer;
use augscope_core::rendering::infrastructure::wav_encoder::WavFormat;
use augscope_core::shared::constants::AUDIO_EXTENSIONS;
use augscope_core::shared::render_settings::RenderSettings;

/// Exit code when a transformation aborted the pipeline.
const EXIT_ABORTED: i32 = 2;

/// Renders a spectrogram, waveform plot and WAV file for every stage of an
/// audio augmentation pipeline.
#[derive(Parser)]
#[command(name = "augscope", version)]
struct Cli {
    /// Input audio file (wav, flac, mp3, ogg, m4a).
    #[arg(required_unless_present_any = ["sample", "list_samples"])]
    input: Option<PathBuf>,

    /// Use a bundled sample instead of an input file (e.g. Dog, Cow, Thunder).
    #[arg(long, conflicts_with = "input")]
    sample: Option<String>,

    /// Directory holding the bundled samples.
    #[arg(long, default_value = "samples")]
    samples_dir: PathBuf,

    /// List the bundled sample names and exit.
    #[arg(long)]
    list_samples: bool,

    /// Transformation spec, repeatable, applied in order
    /// (e.g. `gain:6`, `noise:seed=42`, `pitch:-2`, `stretch:1.25`, `resample:16000`).
    #[arg(long = "stage", value_name = "SPEC")]
    stages: Vec<String>,

    /// Output directory for rendered stages.
    #[arg(long, default_value = "augscope-out")]
    out: PathBuf,

    /// Settings file (JSON). Defaults to the user config location.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Resample the decoded input to this rate (Hz).
    #[arg(long)]
    sample_rate: Option<u32>,

    /// WAV encoding for stage audio: pcm16, pcm24 or float32.
    #[arg(long)]
    wav_format: Option<WavFormat>,
}

enum Outcome {
    Complete,
    Aborted,
}

fn main() {
    env_logger::init();

    match run() {
        Ok(Outcome::Complete) => {}
        Ok(Outcome::Aborted) => process::exit(EXIT_ABORTED),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<Outcome, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let library = SampleLibrary::new(&cli.samples_dir);

    if cli.list_samples {
        for name in library.names() {
            println!("{name}");
        }
        return Ok(Outcome::Complete);
    }

    let settings = load_settings(&cli)?;
    let pipeline = build_pipeline(&cli.stages)?;

    let (source, target_rate) = match (&cli.sample, &cli.input) {
        (Some(name), _) => (
            library.open(name)?,
            Some(settings.target_sample_rate.unwrap_or(library.preferred_sample_rate())),
        ),
        (None, Some(path)) => (AudioSource::open(path)?, settings.target_sample_rate),
        (None, None) => return Err("provide an input file or --sample NAME".into()),
    };

    if !source
        .extension()
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext))
    {
        log::warn!(
            "{} has no known audio extension; detecting format from content",
            source.origin()
        );
    }
    log::info!(
        "Rendering {} through [{}]",
        source.origin(),
        pipeline.names().join(" -> ")
    );

    let decoder = CachedDecoder::new(SymphoniaDecoder::new(), settings.decode_cache_capacity);
    let renderer = CachedStageRenderer::new(
        PlotStageRenderer::new(settings.clone()),
        settings.render_cache_capacity,
    );
    let mut use_case = RenderPipelineUseCase::new(
        Box::new(decoder),
        Box::new(renderer),
        Box::new(LogPipelineLogger::new()),
        target_rate,
    );
    let mut sink = DirectorySink::new(&cli.out);
    let report = use_case.execute(&source, &pipeline, &mut sink)?;

    for stage in report.render_failures() {
        log::warn!(
            "Stage {} ({}) could not be rendered: {}",
            stage.index,
            stage.name,
            stage.render_error.as_deref().unwrap_or("unknown error")
        );
    }

    match report.failure {
        Some(PipelineError::Decode(e)) => Err(e.into()),
        Some(PipelineError::Transformation(e)) => {
            eprintln!("Error: {e}");
            eprintln!(
                "Kept {} rendered stage(s) in {}",
                report.stages.len(),
                cli.out.display()
            );
            Ok(Outcome::Aborted)
        }
        None => {
            log::info!(
                "Output written to {} ({} stages)",
                cli.out.display(),
                report.stages.len()
            );
            Ok(Outcome::Complete)
        }
    }
}

fn load_settings(cli: &Cli) -> Result<RenderSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.settings {
        Some(path) => RenderSettings::load_from(path)?,
        None => RenderSettings::load(),
    };
    if let Some(rate) = cli.sample_rate {
        settings.target_sample_rate = Some(rate);
    }
    if let Some(format) = cli.wav_format {
        settings.wav_format = format;
    }
    settings.validate()?;
    Ok(settings)
}

fn build_pipeline(specs: &[String]) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let mut pipeline = Pipeline::new();
    for spec in specs {
        let transformation = parse_transformation(spec).map_err(|e| {
            format!(
                "--stage {spec}: {e} (kinds: {})",
                available_kinds().join(", ")
            )
        })?;
        pipeline.push(transformation);
    }
    Ok(pipeline)
}
