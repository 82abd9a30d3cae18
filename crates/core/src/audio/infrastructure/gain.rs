use crate::audio::domain::transformation::{BoxError, Transformation};
use crate::audio::domain::waveform::Waveform;

/// Multiplies every sample by `10^(gain_db / 20)`. No clipping is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain {
    gain_db: f32,
}

impl Gain {
    pub fn new(gain_db: f32) -> Self {
        Self { gain_db }
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn factor(&self) -> f32 {
        10f32.powf(self.gain_db / 20.0)
    }
}

impl Transformation for Gain {
    fn apply(&self, waveform: &Waveform) -> Result<Waveform, BoxError> {
        if !self.gain_db.is_finite() {
            return Err(format!("gain must be finite, got {} dB", self.gain_db).into());
        }
        let factor = self.factor();
        let samples = waveform.samples().iter().map(|s| s * factor).collect();
        Ok(waveform.with_samples(samples)?)
    }
}
