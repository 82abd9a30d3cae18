use ndarray::Array2;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::audio::domain::waveform::Waveform;
use crate::audio::infrastructure::phase_vocoder::hann_window;
use crate::shared::constants::AMPLITUDE_FLOOR;
use crate::shared::render_settings::{validate_stft, SettingsError};

/// Log-magnitude STFT of one stage, in dB relative to its own peak.
///
/// Rows are frequency bins (0 Hz first), columns are frames. Every value
/// lies in `[-top_db, 0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    db: Array2<f32>,
    sample_rate: u32,
    hop_length: usize,
    n_fft: usize,
    top_db: f32,
}

impl Spectrogram {
    /// Computes a centred STFT with a periodic Hann window.
    ///
    /// The signal is zero-padded by `n_fft / 2` on both sides so frame `t`
    /// is centred on sample `t * hop_length`, giving `1 + len / hop_length`
    /// frames. Parameters outside the ranges [`validate_stft`] accepts are
    /// rejected.
    pub fn compute(
        waveform: &Waveform,
        n_fft: usize,
        hop_length: usize,
        top_db: f32,
    ) -> Result<Self, SettingsError> {
        validate_stft(n_fft, hop_length, top_db)?;
        let samples = waveform.samples();
        let pad = n_fft / 2;
        let bins = n_fft / 2 + 1;
        let frames = 1 + samples.len() / hop_length;

        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let window: Vec<f32> = hann_window(n_fft).into_iter().map(|w| w as f32).collect();
        let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);

        let mut magnitudes = Array2::<f32>::zeros((bins, frames));
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        for frame in 0..frames {
            let start = frame * hop_length;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let sample = padded.get(start + i).copied().unwrap_or(0.0);
                *slot = Complex::new(sample * window[i], 0.0);
            }
            fft.process(&mut buffer);
            for (bin, value) in buffer[..bins].iter().enumerate() {
                magnitudes[[bin, frame]] = value.norm();
            }
        }

        let peak = magnitudes.iter().fold(0.0f32, |acc, m| acc.max(*m));
        let reference = peak.max(AMPLITUDE_FLOOR);
        let db = magnitudes.mapv(|m| (20.0 * (m.max(AMPLITUDE_FLOOR) / reference).log10()).max(-top_db));

        Ok(Self {
            db,
            sample_rate: waveform.sample_rate(),
            hop_length,
            n_fft,
            top_db,
        })
    }

    /// dB matrix with shape `(bins, frames)`.
    pub fn db(&self) -> &Array2<f32> {
        &self.db
    }

    pub fn bins(&self) -> usize {
        self.db.nrows()
    }

    pub fn frames(&self) -> usize {
        self.db.ncols()
    }

    pub fn top_db(&self) -> f32 {
        self.top_db
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Highest displayed frequency (Nyquist).
    pub fn max_frequency(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.n_fft as f32
    }

    /// Centre time of a frame, in seconds.
    pub fn frame_time(&self, frame: usize) -> f64 {
        (frame * self.hop_length) as f64 / self.sample_rate as f64
    }
}
