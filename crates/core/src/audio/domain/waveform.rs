use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaveformError {
    #[error("waveform has no samples")]
    Empty,
    #[error("sample rate must be positive")]
    ZeroSampleRate,
    #[error("sample {position} is not finite ({value})")]
    NonFinite { position: usize, value: f32 },
}

/// Decoded mono audio: samples normalized to [-1.0, 1.0] plus their rate.
///
/// The buffer is shared and never mutated. Transformations build a new
/// `Waveform` instead, so every earlier stage stays valid for redisplay and
/// clones are cheap.
#[derive(Clone, Debug, PartialEq)]
pub struct Waveform {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, WaveformError> {
        if samples.is_empty() {
            return Err(WaveformError::Empty);
        }
        if sample_rate == 0 {
            return Err(WaveformError::ZeroSampleRate);
        }
        if let Some((position, &value)) = samples.iter().enumerate().find(|(_, s)| !s.is_finite())
        {
            return Err(WaveformError::NonFinite { position, value });
        }
        Ok(Self {
            samples: samples.into(),
            sample_rate,
        })
    }

    /// Builds a sibling waveform at the same rate.
    pub fn with_samples(&self, samples: Vec<f32>) -> Result<Self, WaveformError> {
        Self::new(samples, self.sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn rms(&self) -> f32 {
        let sum: f64 = self.samples.iter().map(|s| (*s as f64).powi(2)).sum();
        (sum / self.samples.len() as f64).sqrt() as f32
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// True when both waveforms share the same underlying buffer.
    pub fn shares_buffer_with(&self, other: &Waveform) -> bool {
        Arc::ptr_eq(&self.samples, &other.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_creates_waveform_with_correct_fields() {
        let samples = vec![0.25f32; 22050];
        let wave = Waveform::new(samples.clone(), 22050).unwrap();
        assert_eq!(wave.samples(), &samples[..]);
        assert_eq!(wave.sample_rate(), 22050);
        assert_eq!(wave.len(), 22050);
        assert!(!wave.is_empty());
    }

    #[test]
    fn test_rejects_empty_samples() {
        assert_eq!(Waveform::new(vec![], 16000), Err(WaveformError::Empty));
    }

    #[test]
    fn test_rejects_zero_sample_rate() {
        assert_eq!(
            Waveform::new(vec![0.0; 4], 0),
            Err(WaveformError::ZeroSampleRate)
        );
    }

    #[test]
    fn test_rejects_nan_with_position() {
        let err = Waveform::new(vec![0.0, 0.1, f32::NAN], 16000).unwrap_err();
        assert!(matches!(err, WaveformError::NonFinite { position: 2, .. }));
    }

    #[test]
    fn test_rejects_infinity() {
        assert!(Waveform::new(vec![f32::INFINITY], 16000).is_err());
    }

    #[test]
    fn test_duration() {
        let wave = Waveform::new(vec![0.0; 48000], 16000).unwrap();
        assert_eq!(wave.duration(), 3.0);
    }

    #[test]
    fn test_rms_of_constant_signal() {
        let wave = Waveform::new(vec![-0.5; 100], 8000).unwrap();
        assert_relative_eq!(wave.rms(), 0.5, epsilon = 1e-6);
        assert_relative_eq!(wave.peak(), 0.5);
    }

    #[test]
    fn test_with_samples_keeps_rate() {
        let wave = Waveform::new(vec![0.0; 10], 44100).unwrap();
        let other = wave.with_samples(vec![0.5; 5]).unwrap();
        assert_eq!(other.sample_rate(), 44100);
        assert_eq!(other.len(), 5);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let wave = Waveform::new(vec![0.1; 10], 8000).unwrap();
        let copy = wave.clone();
        assert!(copy.shares_buffer_with(&wave));
        let rebuilt = Waveform::new(wave.samples().to_vec(), 8000).unwrap();
        assert!(!rebuilt.shares_buffer_with(&wave));
        assert_eq!(rebuilt, wave);
    }
}
