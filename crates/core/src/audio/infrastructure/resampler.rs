use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use thiserror::Error;

/// Upper bound on flush calls when draining the resampler's delay line.
const MAX_FLUSHES: usize = 64;
const SINC_LEN: usize = 256;

#[derive(Error, Debug)]
pub enum ResampleError {
    #[error("sample rates must be positive (from {from_rate} Hz to {to_rate} Hz)")]
    ZeroRate { from_rate: u32, to_rate: u32 },
    #[error("failed to build resampler: {0}")]
    Construction(#[from] rubato::ResamplerConstructionError),
    #[error("resampling failed: {0}")]
    Process(#[from] rubato::ResampleError),
    #[error("resampler produced {produced} of {expected} samples")]
    Incomplete { expected: usize, produced: usize },
}

/// Resamples mono audio with a windowed-sinc filter.
///
/// The whole signal is processed as one chunk with `2 * SINC_LEN` zeros
/// appended, so even a few samples fill the filter. The filter delay is
/// trimmed off and the result is cut to `round(len * to_rate / from_rate)`,
/// so the output is deterministic for a given input and is time-aligned
/// with it.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, ResampleError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(ResampleError::ZeroRate { from_rate, to_rate });
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let expected = ((samples.len() as f64 * ratio).round() as usize).max(1);

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut padded = Vec::with_capacity(samples.len() + 2 * SINC_LEN);
    padded.extend_from_slice(samples);
    padded.resize(samples.len() + 2 * SINC_LEN, 0.0);

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, padded.len(), 1)?;
    let delay = resampler.output_delay();

    let mut output = resampler
        .process(&[padded], None)?
        .into_iter()
        .next()
        .unwrap_or_default();

    let mut flushes = 0;
    while output.len() < delay + expected && flushes < MAX_FLUSHES {
        let tail = resampler.process_partial::<Vec<f32>>(None, None)?;
        match tail.into_iter().next() {
            Some(channel) if !channel.is_empty() => output.extend_from_slice(&channel),
            _ => break,
        }
        flushes += 1;
    }

    if output.len() < delay + expected {
        return Err(ResampleError::Incomplete {
            expected,
            produced: output.len().saturating_sub(delay),
        });
    }
    let result: Vec<f32> = output.into_iter().skip(delay).take(expected).collect();
    log::debug!(
        "Resampled {} samples ({from_rate} Hz) to {} samples ({to_rate} Hz)",
        samples.len(),
        result.len()
    );
    Ok(result)
}
