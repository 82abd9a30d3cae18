use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::stage_result::StageResult;
use crate::rendering::domain::render_sink::RenderSink;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Serialize)]
struct ManifestStage {
    index: usize,
    name: String,
    sample_rate: u32,
    samples: usize,
    duration_seconds: f64,
    files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    render_error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ManifestFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    stage_index: Option<usize>,
    message: String,
}

#[derive(Debug, Default, Serialize)]
struct Manifest {
    stages: Vec<ManifestStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<ManifestFailure>,
}

/// Writes each stage's artifacts into a directory.
///
/// Files are named `NN_<slug>_spectrogram.png`, `NN_<slug>_waveform.png`
/// and `NN_<slug>.wav`; a stage that failed to render gets
/// `NN_<slug>_error.txt` instead. `finish` writes `manifest.json`.
pub struct DirectorySink {
    dir: PathBuf,
    manifest: Manifest,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            manifest: Manifest::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, file: &str, contents: &[u8]) -> std::io::Result<()> {
        fs::write(self.dir.join(file), contents)
    }
}

impl RenderSink for DirectorySink {
    fn present_stage(&mut self, stage: &StageResult) -> Result<(), Box<dyn std::error::Error>> {
        fs::create_dir_all(&self.dir)?;
        let prefix = format!("{:02}_{}", stage.index, stage_slug(&stage.name));

        let (files, render_error) = match &stage.artifacts {
            Ok(artifacts) => {
                let spectrogram = format!("{prefix}_spectrogram.png");
                let waveform = format!("{prefix}_waveform.png");
                let audio = format!("{prefix}.wav");
                artifacts.spectrogram.save(self.dir.join(&spectrogram))?;
                artifacts.waveform.save(self.dir.join(&waveform))?;
                self.write(&audio, &artifacts.audio)?;
                (vec![spectrogram, waveform, audio], None)
            }
            Err(e) => {
                let file = format!("{prefix}_error.txt");
                self.write(&file, format!("{e}\n").as_bytes())?;
                log::warn!("Stage {} ({}) not rendered: {e}", stage.index, stage.name);
                (vec![file], Some(e.to_string()))
            }
        };

        self.manifest.stages.push(ManifestStage {
            index: stage.index,
            name: stage.name.clone(),
            sample_rate: stage.waveform.sample_rate(),
            samples: stage.waveform.len(),
            duration_seconds: stage.waveform.duration(),
            files,
            render_error,
        });
        Ok(())
    }

    fn present_error(&mut self, error: &PipelineError) -> Result<(), Box<dyn std::error::Error>> {
        log::error!("{error}");
        self.manifest.failure = Some(ManifestFailure {
            stage_index: error.stage_index(),
            message: error.to_string(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(&self.manifest)?;
        self.write(MANIFEST_FILE, json.as_bytes())?;
        log::info!(
            "Wrote {} stage(s) to {}",
            self.manifest.stages.len(),
            self.dir.display()
        );
        Ok(())
    }
}

/// File-name form of a stage name: `NoiseInjection` becomes
/// `noise_injection`, anything other than ASCII letters and digits becomes
/// `_`.
pub fn stage_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            let boundary = c.is_ascii_uppercase()
                && previous.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit());
            if boundary {
                slug.push('_');
            }
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
        previous = Some(c);
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "stage".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::audio_decoder::DecodeError;
    use crate::audio::domain::waveform::Waveform;
    use crate::pipeline::pipeline_error::{TransformationError, TransformationFailure};
    use crate::rendering::domain::stage_artifacts::StageArtifacts;
    use crate::rendering::domain::stage_renderer::RenderError;
    use image::RgbImage;
    use rstest::rstest;

    fn stage(index: usize, name: &str, ok: bool) -> StageResult {
        let artifacts = if ok {
            Ok(StageArtifacts {
                spectrogram: RgbImage::from_pixel(4, 3, image::Rgb([1, 2, 3])),
                waveform: RgbImage::from_pixel(4, 3, image::Rgb([4, 5, 6])),
                audio: b"RIFFdata".to_vec(),
            })
        } else {
            Err(RenderError::EmptyWaveform)
        };
        StageResult {
            index,
            name: name.to_string(),
            waveform: Waveform::new(vec![0.0; 8000], 8000).unwrap(),
            artifacts,
        }
    }

    #[rstest]
    #[case("Original", "original")]
    #[case("NoiseInjection", "noise_injection")]
    #[case("PitchShift2", "pitch_shift2")]
    #[case("my stage/v2", "my_stage_v2")]
    #[case("???", "stage")]
    fn test_stage_slug(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(stage_slug(name), expected);
    }

    #[test]
    fn test_writes_stage_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("out"));
        sink.present_stage(&stage(1, "Gain", true)).unwrap();

        let out = dir.path().join("out");
        let image = image::open(out.join("01_gain_spectrogram.png")).unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);
        assert!(out.join("01_gain_waveform.png").exists());
        assert_eq!(fs::read(out.join("01_gain.wav")).unwrap(), b"RIFFdata");
    }

    #[test]
    fn test_render_failure_writes_error_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        sink.present_stage(&stage(2, "NoiseInjection", false)).unwrap();

        let text = fs::read_to_string(dir.path().join("02_noise_injection_error.txt")).unwrap();
        assert!(text.contains("empty waveform"));
        assert!(!dir.path().join("02_noise_injection.wav").exists());
    }

    #[test]
    fn test_manifest_lists_stages_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        sink.present_stage(&stage(0, "Original", true)).unwrap();
        sink.present_stage(&stage(1, "Gain", false)).unwrap();
        let error = PipelineError::Transformation(TransformationError {
            index: 1,
            name: "Failing".to_string(),
            kind: TransformationFailure::Apply("bad".into()),
        });
        sink.present_error(&error).unwrap();
        sink.finish().unwrap();

        let json = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let manifest: serde_json::Value = serde_json::from_str(&json).unwrap();
        let stages = manifest["stages"].as_array().unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0]["name"], "Original");
        assert_eq!(stages[0]["files"].as_array().unwrap().len(), 3);
        assert_eq!(stages[0]["duration_seconds"], 1.0);
        assert!(stages[0].get("render_error").is_none());
        assert!(stages[1]["render_error"].is_string());
        assert_eq!(manifest["failure"]["stage_index"], 2);
    }

    #[test]
    fn test_decode_failure_has_no_stage_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        let error = PipelineError::Decode(DecodeError::NoAudioTrack {
            origin: "clip.mp4".to_string(),
        });
        sink.present_error(&error).unwrap();
        sink.finish().unwrap();

        let json = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let manifest: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(manifest["stages"].as_array().unwrap().is_empty());
        assert!(manifest["failure"].get("stage_index").is_none());
        assert!(manifest["failure"]["message"].as_str().unwrap().contains("clip.mp4"));
    }

    #[test]
    fn test_unwritable_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let mut sink = DirectorySink::new(blocker.join("sub"));
        assert!(sink.present_stage(&stage(0, "Original", true)).is_err());
    }
}
