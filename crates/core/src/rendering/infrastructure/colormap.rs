use image::Rgb;

/// Anchor colours of the magma palette at evenly spaced positions.
const MAGMA: [[u8; 3]; 9] = [
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
];

/// Maps `t` in [0, 1] onto the magma palette (dark purple to pale yellow).
/// Values outside the range are clamped; NaN maps to the lowest colour.
pub fn magma(t: f32) -> Rgb<u8> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (MAGMA.len() - 1) as f32;
    let lower = (scaled.floor() as usize).min(MAGMA.len() - 2);
    let frac = scaled - lower as f32;

    let a = MAGMA[lower];
    let b = MAGMA[lower + 1];
    let mix = |i: usize| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * frac).round() as u8;
    Rgb([mix(0), mix(1), mix(2)])
}
