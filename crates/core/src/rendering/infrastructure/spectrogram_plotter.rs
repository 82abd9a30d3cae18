use image::RgbImage;

use super::colormap::magma;
use super::plot_canvas::{
    format_tick, nice_ticks, text_height, PlotArea, PlotCanvas, AXIS, TEXT, TICK_LENGTH,
};
use super::spectrogram::Spectrogram;

const MARGIN_LEFT: u32 = 70;
const MARGIN_TOP: u32 = 40;
const MARGIN_RIGHT: u32 = 120;
const MARGIN_BOTTOM: u32 = 50;
const COLOUR_BAR_GAP: i64 = 20;
const COLOUR_BAR_WIDTH: u32 = 16;

/// Draws a spectrogram as a time/frequency heat map with a linear frequency
/// axis, time ticks and a dB colour bar.
pub fn plot_spectrogram(
    spectrogram: &Spectrogram,
    duration: f64,
    title: &str,
    width: u32,
    height: u32,
) -> RgbImage {
    let mut canvas = PlotCanvas::new(width, height);
    let area = PlotArea::inset(width, height, MARGIN_LEFT, MARGIN_TOP, MARGIN_RIGHT, MARGIN_BOTTOM);
    let top_db = spectrogram.top_db();

    draw_heat_map(&mut canvas, &area, spectrogram);
    canvas.frame(&area, AXIS);

    canvas.draw_text_centered(width as i64 / 2, 12, title, 2);
    draw_time_axis(&mut canvas, &area, duration);
    draw_frequency_axis(&mut canvas, &area, spectrogram.max_frequency() as f64);
    draw_colour_bar(&mut canvas, &area, top_db);

    canvas.into_image()
}

fn draw_heat_map(canvas: &mut PlotCanvas, area: &PlotArea, spectrogram: &Spectrogram) {
    let db = spectrogram.db();
    let (bins, frames) = (spectrogram.bins(), spectrogram.frames());
    let top_db = spectrogram.top_db();

    for px in 0..area.width as usize {
        let frame = (px * frames / area.width as usize).min(frames - 1);
        for py in 0..area.height as usize {
            let from_bottom = area.height as usize - 1 - py;
            let bin = (from_bottom * bins / area.height as usize).min(bins - 1);
            let level = (db[[bin, frame]] + top_db) / top_db;
            canvas.put(area.left + px as i64, area.top + py as i64, magma(level));
        }
    }
}

pub(crate) fn draw_time_axis(canvas: &mut PlotCanvas, area: &PlotArea, duration: f64) {
    let (ticks, step) = nice_ticks(duration, 8);
    let label_y = area.bottom() + TICK_LENGTH + 6;
    for t in ticks {
        let x = area.x_for(t, duration);
        canvas.vline(x, area.bottom() + 1, area.bottom() + TICK_LENGTH, AXIS);
        canvas.draw_text_centered(x, label_y, &format_tick(t, step), 1);
    }
    let title_y = label_y + text_height(1) as i64 + 8;
    canvas.draw_text_centered(area.left + area.width as i64 / 2, title_y, "Time (s)", 1);
}

fn draw_frequency_axis(canvas: &mut PlotCanvas, area: &PlotArea, nyquist: f64) {
    let (ticks, step) = nice_ticks(nyquist, 5);
    let half_text = text_height(1) as i64 / 2;
    for f in ticks {
        let y = area.y_for(f, 0.0, nyquist);
        canvas.hline(area.left - 1 - TICK_LENGTH, area.left - 2, y, AXIS);
        canvas.draw_text_right(area.left - TICK_LENGTH - 4, y - half_text, &format_tick(f, step), 1);
    }
    canvas.draw_text(8, area.top - 14, "Hz", 1, AXIS);
}

fn draw_colour_bar(canvas: &mut PlotCanvas, area: &PlotArea, top_db: f32) {
    let left = area.right() + COLOUR_BAR_GAP;
    let bar = PlotArea {
        left,
        top: area.top,
        width: COLOUR_BAR_WIDTH,
        height: area.height,
    };
    for row in 0..bar.height {
        let level = if bar.height > 1 {
            1.0 - row as f32 / (bar.height - 1) as f32
        } else {
            1.0
        };
        canvas.hline(bar.left, bar.right(), bar.top + row as i64, magma(level));
    }
    canvas.frame(&bar, AXIS);

    let step = colour_bar_step(top_db);
    let half_text = text_height(1) as i64 / 2;
    for tick in 0..=(top_db / step) as usize {
        let level = -(tick as f32) * step;
        let y = bar.y_for(level as f64, -top_db as f64, 0.0);
        canvas.hline(bar.right() + 2, bar.right() + 1 + TICK_LENGTH, y, AXIS);
        canvas.draw_text(
            bar.right() + TICK_LENGTH + 4,
            y - half_text,
            &db_label(level),
            1,
            TEXT,
        );
    }
}

fn colour_bar_step(top_db: f32) -> f32 {
    if top_db <= 100.0 {
        10.0
    } else {
        20.0
    }
}

/// Colour bar label in signed whole decibels, e.g. `+0 dB`, `-80 dB`.
pub fn db_label(level: f32) -> String {
    format!("{level:+.0} dB")
}
