use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use hound::{SampleFormat, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};

use crate::audio::domain::waveform::Waveform;

/// Sample encoding used for per-stage WAV output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavFormat {
    #[default]
    Pcm16,
    Pcm24,
    Float32,
}

const PCM24_MAX: f32 = 8_388_607.0;

impl WavFormat {
    pub fn bits_per_sample(self) -> u16 {
        match self {
            WavFormat::Pcm16 => 16,
            WavFormat::Pcm24 => 24,
            WavFormat::Float32 => 32,
        }
    }

    /// Largest error a sample in [-1, 1] picks up through this format.
    pub fn max_error(self) -> f32 {
        match self {
            WavFormat::Pcm16 => 0.5 / i16::MAX as f32,
            WavFormat::Pcm24 => 0.5 / PCM24_MAX,
            WavFormat::Float32 => 0.0,
        }
    }

    fn spec(self, sample_rate: u32) -> WavSpec {
        WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: self.bits_per_sample(),
            sample_format: match self {
                WavFormat::Float32 => SampleFormat::Float,
                _ => SampleFormat::Int,
            },
        }
    }
}

impl fmt::Display for WavFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WavFormat::Pcm16 => "pcm16",
            WavFormat::Pcm24 => "pcm24",
            WavFormat::Float32 => "float32",
        })
    }
}

impl FromStr for WavFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pcm16" | "16" => Ok(WavFormat::Pcm16),
            "pcm24" | "24" => Ok(WavFormat::Pcm24),
            "float32" | "f32" | "float" => Ok(WavFormat::Float32),
            other => Err(format!(
                "unknown WAV format `{other}` (expected pcm16, pcm24 or float32)"
            )),
        }
    }
}

/// Encodes a mono waveform as a complete in-memory WAV file.
///
/// PCM formats clamp to [-1, 1] before quantising; float output is written
/// as-is.
pub fn encode_wav(waveform: &Waveform, format: WavFormat) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, format.spec(waveform.sample_rate()))?;
        let samples = waveform.samples().iter().copied();
        match format {
            WavFormat::Pcm16 => {
                for s in samples {
                    writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)?;
                }
            }
            WavFormat::Pcm24 => {
                for s in samples {
                    writer.write_sample((s.clamp(-1.0, 1.0) * PCM24_MAX).round() as i32)?;
                }
            }
            WavFormat::Float32 => {
                for s in samples {
                    writer.write_sample(s)?;
                }
            }
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
