use super::resampler::resample;
use crate::audio::domain::transformation::{BoxError, Transformation};
use crate::audio::domain::waveform::Waveform;

/// Converts the stage to `target_rate` with the windowed-sinc resampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resample {
    target_rate: u32,
}

impl Resample {
    pub fn new(target_rate: u32) -> Self {
        Self { target_rate }
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }
}

impl Transformation for Resample {
    fn apply(&self, waveform: &Waveform) -> Result<Waveform, BoxError> {
        let samples = resample(waveform.samples(), waveform.sample_rate(), self.target_rate)?;
        Ok(Waveform::new(samples, self.target_rate)?)
    }

    fn output_rate(&self, _input_rate: u32) -> u32 {
        self.target_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_rate_and_length() {
        let wave = Waveform::new(vec![0.1; 44100], 44100).unwrap();
        let out = Resample::new(22050).apply(&wave).unwrap();
        assert_eq!(out.sample_rate(), 22050);
        assert_eq!(out.len(), 22050);
    }

    #[test]
    fn test_declares_output_rate() {
        assert_eq!(Resample::new(8000).output_rate(44100), 8000);
    }

    #[test]
    fn test_zero_target_fails() {
        let wave = Waveform::new(vec![0.1; 100], 8000).unwrap();
        assert!(Resample::new(0).apply(&wave).is_err());
    }

    #[test]
    fn test_same_rate_copies() {
        let wave = Waveform::new(vec![0.3; 100], 8000).unwrap();
        assert_eq!(Resample::new(8000).apply(&wave).unwrap(), wave);
    }
}
