use image::{Rgb, RgbImage};

use super::plot_canvas::{format_tick, text_height, PlotArea, PlotCanvas, AXIS, GRID, TICK_LENGTH};
use super::spectrogram_plotter::draw_time_axis;
use crate::audio::domain::waveform::Waveform;

const MARGIN_LEFT: u32 = 70;
const MARGIN_TOP: u32 = 40;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_BOTTOM: u32 = 50;

pub const ENVELOPE: Rgb<u8> = Rgb([31, 119, 180]);

/// Draws amplitude over time as a per-column min/max envelope.
///
/// The vertical range is `[-1, 1]`, widened symmetrically when a stage
/// exceeds it so boosted audio is never cut off.
pub fn plot_waveform(waveform: &Waveform, title: &str, width: u32, height: u32) -> RgbImage {
    let mut canvas = PlotCanvas::new(width, height);
    let area = PlotArea::inset(width, height, MARGIN_LEFT, MARGIN_TOP, MARGIN_RIGHT, MARGIN_BOTTOM);
    let limit = amplitude_limit(waveform);

    let zero = area.y_for(0.0, -limit, limit);
    canvas.hline(area.left, area.right(), zero, GRID);

    for (column, (low, high)) in column_envelope(waveform.samples(), area.width as usize)
        .into_iter()
        .enumerate()
    {
        let x = area.left + column as i64;
        let y_high = area.y_for(high as f64, -limit, limit);
        let y_low = area.y_for(low as f64, -limit, limit);
        canvas.vline(x, y_high, y_low, ENVELOPE);
    }

    canvas.frame(&area, AXIS);
    canvas.draw_text_centered(width as i64 / 2, 12, title, 2);
    draw_time_axis(&mut canvas, &area, waveform.duration());
    draw_amplitude_axis(&mut canvas, &area, limit);

    canvas.into_image()
}

/// Half-height of the vertical axis: 1.0, or the peak if it is larger.
fn amplitude_limit(waveform: &Waveform) -> f64 {
    (waveform.peak() as f64).max(1.0)
}

/// Min and max sample per output column. Every column covers at least one
/// sample, so short waveforms are stretched rather than left blank.
pub(crate) fn column_envelope(samples: &[f32], columns: usize) -> Vec<(f32, f32)> {
    let n = samples.len();
    if n == 0 || columns == 0 {
        return Vec::new();
    }
    (0..columns)
        .map(|c| {
            let start = (c * n / columns).min(n - 1);
            let end = ((c + 1) * n / columns).clamp(start + 1, n);
            samples[start..end]
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), s| (lo.min(*s), hi.max(*s)))
        })
        .collect()
}

fn draw_amplitude_axis(canvas: &mut PlotCanvas, area: &PlotArea, limit: f64) {
    let step = limit / 2.0;
    let half_text = text_height(1) as i64 / 2;
    for i in -2..=2 {
        let value = i as f64 * step;
        let y = area.y_for(value, -limit, limit);
        canvas.hline(area.left - 1 - TICK_LENGTH, area.left - 2, y, AXIS);
        let label = format_tick(value, step.min(0.5));
        canvas.draw_text_right(area.left - TICK_LENGTH - 4, y - half_text, &label, 1);
    }
}
