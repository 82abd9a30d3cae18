use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::phase_vocoder::{expected_advance, hann_window, mirror_spectrum, wrap_phase, OverlapAdd};
use crate::audio::domain::transformation::{BoxError, Transformation};
use crate::audio::domain::waveform::Waveform;

const N_FFT: usize = 2048;
const HOP: usize = 512;

/// Changes duration without changing pitch.
///
/// `rate > 1` speeds up, `rate < 1` slows down. Frames are centred with
/// `N_FFT / 2` zeros each side, magnitudes are interpolated between
/// neighbouring frames and phases are accumulated. Output length is
/// `round(len / rate)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeStretch {
    rate: f32,
}

impl TimeStretch {
    pub fn new(rate: f32) -> Self {
        Self { rate }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl Transformation for TimeStretch {
    fn apply(&self, waveform: &Waveform) -> Result<Waveform, BoxError> {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(format!("stretch rate must be positive, got {}", self.rate).into());
        }
        if (self.rate - 1.0).abs() < 1e-6 {
            return Ok(waveform.clone());
        }
        let stretched = stretch(waveform.samples(), self.rate as f64);
        Ok(waveform.with_samples(stretched)?)
    }
}

fn stretch(samples: &[f32], rate: f64) -> Vec<f32> {
    let target_len = ((samples.len() as f64 / rate).round() as usize).max(1);
    let pad = N_FFT / 2;
    let bins = N_FFT / 2 + 1;

    let mut padded = vec![0.0f64; samples.len() + 2 * pad];
    for (slot, s) in padded[pad..].iter_mut().zip(samples) {
        *slot = *s as f64;
    }

    let window = hann_window(N_FFT);
    let advance = expected_advance(N_FFT, HOP);
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(N_FFT);
    let inverse = planner.plan_fft_inverse(N_FFT);

    let frame_count = (padded.len() - N_FFT) / HOP + 1;
    let mut frames: Vec<Vec<Complex<f64>>> = (0..frame_count)
        .map(|f| {
            let mut buf: Vec<Complex<f64>> = padded[f * HOP..f * HOP + N_FFT]
                .iter()
                .zip(&window)
                .map(|(s, w)| Complex::new(s * w, 0.0))
                .collect();
            forward.process(&mut buf);
            buf.truncate(bins);
            buf
        })
        .collect();
    // Silent frame so the last interpolation step has a right neighbour.
    frames.push(vec![Complex::new(0.0, 0.0); bins]);

    let mut phase: Vec<f64> = frames[0].iter().map(|c| c.arg()).collect();
    let steps: Vec<f64> = (0..)
        .map(|i| i as f64 * rate)
        .take_while(|t| *t < frame_count as f64)
        .collect();

    let out_len = N_FFT + HOP * steps.len().saturating_sub(1);
    let mut ola = OverlapAdd::new(out_len);
    for (i, t) in steps.iter().enumerate() {
        let left = &frames[*t as usize];
        let right = &frames[*t as usize + 1];
        let alpha = t.fract();

        let half: Vec<Complex<f64>> = (0..bins)
            .map(|k| {
                let magnitude = (1.0 - alpha) * left[k].norm() + alpha * right[k].norm();
                let bin = Complex::from_polar(magnitude, phase[k]);
                let deviation = wrap_phase(right[k].arg() - left[k].arg() - advance[k]);
                phase[k] += advance[k] + deviation;
                bin
            })
            .collect();

        let mut full = mirror_spectrum(&half, N_FFT);
        inverse.process(&mut full);
        ola.add(i * HOP, &full, &window);
    }

    let mut output: Vec<f32> = ola
        .finish(1e-3)
        .into_iter()
        .skip(pad)
        .take(target_len)
        .map(|s| s as f32)
        .collect();
    output.resize(target_len, 0.0);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sine(len: usize) -> Waveform {
        let samples = (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16000.0).sin() * 0.5)
            .collect();
        Waveform::new(samples, 16000).unwrap()
    }

    #[rstest]
    #[case(2.0, 8000)]
    #[case(0.5, 32000)]
    #[case(1.25, 12800)]
    #[case(0.8, 20000)]
    fn test_output_length(#[case] rate: f32, #[case] expected: usize) {
        let out = TimeStretch::new(rate).apply(&sine(16000)).unwrap();
        assert_eq!(out.len(), expected);
        assert_eq!(out.sample_rate(), 16000);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f32::NAN)]
    fn test_non_positive_rate_fails(#[case] rate: f32) {
        assert!(TimeStretch::new(rate).apply(&sine(4096)).is_err());
    }

    #[test]
    fn test_unit_rate_is_identity() {
        let wave = sine(4096);
        assert!(TimeStretch::new(1.0).apply(&wave).unwrap().shares_buffer_with(&wave));
    }

    #[test]
    fn test_stretch_keeps_energy_in_steady_state() {
        let wave = sine(32000);
        let out = TimeStretch::new(0.5).apply(&wave).unwrap();
        let middle = Waveform::new(out.samples()[16000..48000].to_vec(), 16000).unwrap();
        let ratio = middle.rms() / wave.rms();
        assert!((0.7..1.3).contains(&ratio), "rms ratio {ratio}");
    }

    #[test]
    fn test_very_short_input() {
        let tiny = Waveform::new(vec![0.2; 10], 8000).unwrap();
        let out = TimeStretch::new(2.0).apply(&tiny).unwrap();
        assert_eq!(out.len(), 5);
    }
}
