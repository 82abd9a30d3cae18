use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::domain::transformation::{BoxError, Transformation};
use crate::audio::domain::waveform::Waveform;

pub const DEFAULT_MIN_AMPLITUDE: f32 = 0.001;
pub const DEFAULT_MAX_AMPLITUDE: f32 = 0.015;

/// Adds Gaussian noise whose standard deviation is drawn uniformly from
/// `[min_amplitude, max_amplitude]`.
///
/// The RNG is reseeded from `seed` on every call to `apply`, so the same
/// input always yields the same output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseInjection {
    min_amplitude: f32,
    max_amplitude: f32,
    seed: u64,
}

impl NoiseInjection {
    pub fn new(min_amplitude: f32, max_amplitude: f32, seed: u64) -> Self {
        Self {
            min_amplitude,
            max_amplitude,
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn check_range(&self) -> Result<(), BoxError> {
        let valid = self.min_amplitude.is_finite()
            && self.max_amplitude.is_finite()
            && self.min_amplitude >= 0.0
            && self.min_amplitude <= self.max_amplitude;
        if valid {
            Ok(())
        } else {
            Err(format!(
                "invalid noise amplitude range [{}, {}]",
                self.min_amplitude, self.max_amplitude
            )
            .into())
        }
    }
}

impl Default for NoiseInjection {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_AMPLITUDE, DEFAULT_MAX_AMPLITUDE, 0)
    }
}

impl Transformation for NoiseInjection {
    fn apply(&self, waveform: &Waveform) -> Result<Waveform, BoxError> {
        self.check_range()?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let amplitude = rng.gen_range(self.min_amplitude..=self.max_amplitude) as f64;

        let samples = waveform
            .samples()
            .iter()
            .map(|&s| (s as f64 + amplitude * standard_normal(&mut rng)) as f32)
            .collect();
        Ok(waveform.with_samples(samples)?)
    }
}

/// Box-Muller transform over two uniform draws.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn silence(len: usize) -> Waveform {
        Waveform::new(vec![0.0; len], 16000).unwrap()
    }

    #[test]
    fn test_same_seed_reproduces_output() {
        let wave = silence(4096);
        let noise = NoiseInjection::new(0.01, 0.02, 42);
        assert_eq!(noise.apply(&wave).unwrap(), noise.apply(&wave).unwrap());
    }

    #[test]
    fn test_different_seeds_differ() {
        let wave = silence(4096);
        let a = NoiseInjection::new(0.01, 0.02, 1).apply(&wave).unwrap();
        let b = NoiseInjection::new(0.01, 0.02, 2).apply(&wave).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_noise_std_matches_fixed_amplitude() {
        let out = NoiseInjection::new(0.1, 0.1, 7)
            .apply(&silence(200_000))
            .unwrap();
        assert_relative_eq!(out.rms(), 0.1, epsilon = 0.002);
        let mean: f64 = out.samples().iter().map(|s| *s as f64).sum::<f64>() / out.len() as f64;
        assert!(mean.abs() < 0.001, "mean {mean}");
    }

    #[test]
    fn test_preserves_length_and_rate() {
        let wave = Waveform::new(vec![0.25; 1000], 44100).unwrap();
        let out = NoiseInjection::default().apply(&wave).unwrap();
        assert_eq!(out.len(), 1000);
        assert_eq!(out.sample_rate(), 44100);
    }

    #[test]
    fn test_inverted_range_fails() {
        assert!(NoiseInjection::new(0.5, 0.1, 0).apply(&silence(8)).is_err());
        assert!(NoiseInjection::new(-0.1, 0.1, 0).apply(&silence(8)).is_err());
    }

    #[test]
    fn test_name() {
        assert_eq!(NoiseInjection::default().name(), "NoiseInjection");
    }
}
