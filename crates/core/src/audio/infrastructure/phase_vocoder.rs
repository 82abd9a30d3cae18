use std::f64::consts::PI;

use rustfft::num_complex::Complex;

/// Periodic Hann window of length `size`.
pub fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / size as f64).cos()))
        .collect()
}

/// Wraps a phase difference into [-pi, pi].
pub(crate) fn wrap_phase(phase: f64) -> f64 {
    phase - 2.0 * PI * (phase / (2.0 * PI)).round()
}

/// Expected phase advance per hop for each of the `n_fft / 2 + 1` bins.
pub(crate) fn expected_advance(n_fft: usize, hop: usize) -> Vec<f64> {
    (0..n_fft / 2 + 1)
        .map(|k| 2.0 * PI * k as f64 * hop as f64 / n_fft as f64)
        .collect()
}

/// Rebuilds a full conjugate-symmetric spectrum from its positive half.
pub(crate) fn mirror_spectrum(half: &[Complex<f64>], n_fft: usize) -> Vec<Complex<f64>> {
    let mut full = vec![Complex::new(0.0, 0.0); n_fft];
    full[..half.len()].copy_from_slice(half);
    for k in 1..half.len().saturating_sub(1) {
        full[n_fft - k] = half[k].conj();
    }
    full
}

/// Windowed overlap-add accumulator for inverse STFT frames.
pub(crate) struct OverlapAdd {
    output: Vec<f64>,
    window_sum: Vec<f64>,
}

impl OverlapAdd {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            output: vec![0.0; len],
            window_sum: vec![0.0; len],
        }
    }

    /// Adds an unnormalized inverse-FFT frame at `start`.
    pub(crate) fn add(&mut self, start: usize, frame: &[Complex<f64>], window: &[f64]) {
        let norm = 1.0 / frame.len() as f64;
        for (i, (value, w)) in frame.iter().zip(window).enumerate() {
            let Some(slot) = self.output.get_mut(start + i) else {
                break;
            };
            *slot += value.re * norm * w;
            self.window_sum[start + i] += w * w;
        }
    }

    /// Divides out the window overlap; samples whose overlap is below
    /// `relative_floor` of the maximum are zeroed.
    pub(crate) fn finish(self, relative_floor: f64) -> Vec<f64> {
        let max = self.window_sum.iter().cloned().fold(0.0f64, f64::max);
        let threshold = (max * relative_floor).max(1e-12);
        self.output
            .into_iter()
            .zip(self.window_sum)
            .map(|(v, w)| if w >= threshold { v / w } else { 0.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hann_is_periodic() {
        let w = hann_window(8);
        assert_relative_eq!(w[0], 0.0);
        assert_relative_eq!(w[4], 1.0, epsilon = 1e-12);
        assert_relative_eq!(w[1], w[7], epsilon = 1e-12);
    }

    #[test]
    fn test_wrap_phase_range() {
        for raw in [-10.0, -PI - 0.1, 0.0, 3.0, 7.5, 100.0] {
            let wrapped = wrap_phase(raw);
            assert!((-PI..=PI).contains(&wrapped), "{raw} -> {wrapped}");
            assert_relative_eq!(raw.cos(), wrapped.cos(), epsilon = 1e-9);
            assert_relative_eq!(raw.sin(), wrapped.sin(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_mirror_spectrum_is_conjugate_symmetric() {
        let half = vec![
            Complex::new(1.0, 0.0),
            Complex::new(0.5, 0.25),
            Complex::new(0.0, 0.0),
        ];
        let full = mirror_spectrum(&half, 4);
        assert_eq!(full[3], Complex::new(0.5, -0.25));
    }

    #[test]
    fn test_overlap_add_normalizes_by_window() {
        let window = vec![1.0; 4];
        let frame = vec![Complex::new(8.0, 0.0); 4];
        let mut ola = OverlapAdd::new(6);
        ola.add(0, &frame, &window);
        ola.add(2, &frame, &window);
        let out = ola.finish(0.0);
        for v in out {
            assert_relative_eq!(v, 2.0, epsilon = 1e-12);
        }
    }
}
