use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::phase_vocoder::{expected_advance, hann_window, mirror_spectrum, wrap_phase, OverlapAdd};
use crate::audio::domain::transformation::{BoxError, Transformation};
use crate::audio::domain::waveform::Waveform;

pub const DEFAULT_SEMITONES: f32 = 4.0;

const WINDOW_SIZE: usize = 2048;
const HOP_SIZE: usize = 512;

/// Phase-vocoder pitch shifter.
///
/// Shifts pitch by `semitones` using STFT -> frequency bin shifting -> ISTFT
/// with overlap-add. Length and rate are preserved. Inputs shorter than one
/// analysis window are returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchShift {
    semitones: f32,
}

impl PitchShift {
    pub fn new(semitones: f32) -> Self {
        Self { semitones }
    }

    pub fn semitones(&self) -> f32 {
        self.semitones
    }
}

impl Default for PitchShift {
    fn default() -> Self {
        Self::new(DEFAULT_SEMITONES)
    }
}

impl Transformation for PitchShift {
    fn apply(&self, waveform: &Waveform) -> Result<Waveform, BoxError> {
        if !self.semitones.is_finite() {
            return Err(format!("semitones must be finite, got {}", self.semitones).into());
        }
        let samples = waveform.samples();
        if self.semitones.abs() < 1e-6 || samples.len() < WINDOW_SIZE {
            return Ok(waveform.clone());
        }

        let shifted = shift(samples, 2f64.powf(self.semitones as f64 / 12.0));
        Ok(waveform.with_samples(shifted)?)
    }
}

fn shift(samples: &[f32], ratio: f64) -> Vec<f32> {
    let n = samples.len();
    let bins = WINDOW_SIZE / 2 + 1;
    let window = hann_window(WINDOW_SIZE);
    let advance = expected_advance(WINDOW_SIZE, HOP_SIZE);

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(WINDOW_SIZE);
    let inverse = planner.plan_fft_inverse(WINDOW_SIZE);

    let mut prev_phase = vec![0.0f64; bins];
    let mut synth_phase = vec![0.0f64; bins];
    let mut ola = OverlapAdd::new(n);

    let frames = (n - WINDOW_SIZE) / HOP_SIZE + 1;
    for frame in 0..frames {
        let start = frame * HOP_SIZE;
        let mut buf: Vec<Complex<f64>> = samples[start..start + WINDOW_SIZE]
            .iter()
            .zip(&window)
            .map(|(s, w)| Complex::new(*s as f64 * w, 0.0))
            .collect();
        forward.process(&mut buf);

        // When several source bins land on one target, the loudest wins.
        let mut magnitudes = vec![0.0f64; bins];
        let mut frequencies = vec![0.0f64; bins];
        for k in 0..bins {
            let phase = buf[k].arg();
            let deviation = wrap_phase(phase - prev_phase[k] - advance[k]);
            prev_phase[k] = phase;

            let target = (k as f64 * ratio).round() as usize;
            let magnitude = buf[k].norm();
            if target < bins && magnitude > magnitudes[target] {
                magnitudes[target] = magnitude;
                frequencies[target] = (advance[k] + deviation) * ratio;
            }
        }

        let half: Vec<Complex<f64>> = (0..bins)
            .map(|k| {
                synth_phase[k] += frequencies[k];
                Complex::from_polar(magnitudes[k], synth_phase[k])
            })
            .collect();
        let mut full = mirror_spectrum(&half, WINDOW_SIZE);
        inverse.process(&mut full);
        ola.add(start, &full, &window);
    }

    let output = ola.finish(0.1);

    // Keep the output peak at or below the input peak.
    let input_peak = samples.iter().fold(0.0f64, |acc, s| acc.max(s.abs() as f64));
    let output_peak = output.iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
    let gain = if output_peak > 1e-10 && output_peak > input_peak {
        input_peak / output_peak
    } else {
        1.0
    };
    output.into_iter().map(|s| (s * gain) as f32).collect()
}
