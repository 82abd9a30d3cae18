use std::time::Instant;

use super::spectrogram::Spectrogram;
use super::spectrogram_plotter::plot_spectrogram;
use super::waveform_plotter::plot_waveform;
use super::wav_encoder::encode_wav;
use crate::audio::domain::waveform::Waveform;
use crate::rendering::domain::stage_artifacts::StageArtifacts;
use crate::rendering::domain::stage_renderer::{RenderError, StageRenderer};
use crate::shared::render_settings::RenderSettings;

/// Renders a stage into a spectrogram plot, a waveform plot and WAV bytes,
/// all sized and encoded according to [`RenderSettings`].
pub struct PlotStageRenderer {
    settings: RenderSettings,
}

impl PlotStageRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }
}

impl Default for PlotStageRenderer {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

impl StageRenderer for PlotStageRenderer {
    fn render(&self, waveform: &Waveform, stage_name: &str) -> Result<StageArtifacts, RenderError> {
        if waveform.is_empty() {
            return Err(RenderError::EmptyWaveform);
        }
        let s = &self.settings;
        s.validate()?;

        let started = Instant::now();
        let spectrogram = Spectrogram::compute(waveform, s.n_fft, s.hop_length, s.top_db)?;
        let spectrogram = plot_spectrogram(
            &spectrogram,
            waveform.duration(),
            stage_name,
            s.figure_width,
            s.figure_height,
        );
        let waveform_image = plot_waveform(waveform, stage_name, s.figure_width, s.figure_height);
        let audio = encode_wav(waveform, s.wav_format)?;

        log::debug!(
            "Rendered stage '{stage_name}' ({} samples) in {:.1}ms",
            waveform.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(StageArtifacts {
            spectrogram,
            waveform: waveform_image,
            audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::infrastructure::wav_encoder::WavFormat;

    fn settings() -> RenderSettings {
        RenderSettings {
            n_fft: 512,
            hop_length: 128,
            figure_width: 400,
            figure_height: 300,
            ..RenderSettings::default()
        }
    }

    fn tone() -> Waveform {
        let samples = (0..8000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 8000.0).sin() * 0.5)
            .collect();
        Waveform::new(samples, 8000).unwrap()
    }

    #[test]
    fn test_renders_all_artifacts() {
        let artifacts = PlotStageRenderer::new(settings()).render(&tone(), "Original").unwrap();
        assert_eq!(artifacts.spectrogram.dimensions(), (400, 300));
        assert_eq!(artifacts.waveform.dimensions(), (400, 300));
        assert_eq!(&artifacts.audio[..4], b"RIFF");
        // 44-byte header plus 2 bytes per 16-bit sample.
        assert_eq!(artifacts.audio.len(), 44 + 8000 * 2);
    }

    #[test]
    fn test_wav_format_follows_settings() {
        let renderer = PlotStageRenderer::new(RenderSettings {
            wav_format: WavFormat::Float32,
            ..settings()
        });
        let artifacts = renderer.render(&tone(), "Original").unwrap();
        let reader = hound::WavReader::new(std::io::Cursor::new(artifacts.audio)).unwrap();
        assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
    }

    #[test]
    fn test_invalid_settings_fail_render() {
        let renderer = PlotStageRenderer::new(RenderSettings {
            hop_length: 0,
            ..settings()
        });
        assert!(matches!(
            renderer.render(&tone(), "Original"),
            Err(RenderError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_out_of_range_top_db_fails_render() {
        let renderer = PlotStageRenderer::new(RenderSettings {
            top_db: 1e9,
            ..settings()
        });
        assert!(matches!(
            renderer.render(&tone(), "Original"),
            Err(RenderError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_does_not_mutate_input() {
        let wave = tone();
        let copy = wave.clone();
        PlotStageRenderer::new(settings()).render(&wave, "Original").unwrap();
        assert_eq!(wave, copy);
    }

    #[test]
    fn test_same_input_same_output() {
        let renderer = PlotStageRenderer::new(settings());
        let a = renderer.render(&tone(), "Gain").unwrap();
        let b = renderer.render(&tone(), "Gain").unwrap();
        assert_eq!(a.spectrogram, b.spectrogram);
        assert_eq!(a.waveform, b.waveform);
        assert_eq!(a.audio, b.audio);
    }
}
