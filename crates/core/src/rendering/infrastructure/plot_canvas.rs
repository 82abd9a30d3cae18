use image::{Rgb, RgbImage};

use super::bitmap_font::{self, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const AXIS: Rgb<u8> = Rgb([51, 51, 51]);
pub const TEXT: Rgb<u8> = Rgb([17, 17, 17]);
pub const GRID: Rgb<u8> = Rgb([220, 220, 220]);

/// Length of axis tick marks in pixels.
pub const TICK_LENGTH: i64 = 5;

/// Pixel rectangle occupied by the data part of a plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotArea {
    pub left: i64,
    pub top: i64,
    pub width: u32,
    pub height: u32,
}

impl PlotArea {
    /// Inset of `(width, height)` by the given margins; never narrower than
    /// one pixel.
    pub fn inset(width: u32, height: u32, left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left: left as i64,
            top: top as i64,
            width: width.saturating_sub(left + right).max(1),
            height: height.saturating_sub(top + bottom).max(1),
        }
    }

    pub fn right(&self) -> i64 {
        self.left + self.width as i64 - 1
    }

    pub fn bottom(&self) -> i64 {
        self.top + self.height as i64 - 1
    }

    /// Pixel column for `value` on a linear axis spanning `[0, max]`.
    pub fn x_for(&self, value: f64, max: f64) -> i64 {
        if max <= 0.0 {
            return self.left;
        }
        self.left + ((value / max) * (self.width - 1) as f64).round() as i64
    }

    /// Pixel row for `value` on a linear axis spanning `[min, max]`, with
    /// `max` at the top.
    pub fn y_for(&self, value: f64, min: f64, max: f64) -> i64 {
        if max <= min {
            return self.bottom();
        }
        let frac = (value - min) / (max - min);
        self.bottom() - (frac * (self.height - 1) as f64).round() as i64
    }
}

/// RGB drawing surface with clipped primitives and bitmap text.
pub struct PlotCanvas {
    image: RgbImage,
}

impl PlotCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, BACKGROUND),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        self.image.put_pixel(x as u32, y as u32, color);
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
        for dy in 0..height as i64 {
            for dx in 0..width as i64 {
                self.put(x + dx, y + dy, color);
            }
        }
    }

    pub fn hline(&mut self, x0: i64, x1: i64, y: i64, color: Rgb<u8>) {
        for x in x0.min(x1)..=x0.max(x1) {
            self.put(x, y, color);
        }
    }

    pub fn vline(&mut self, x: i64, y0: i64, y1: i64, color: Rgb<u8>) {
        for y in y0.min(y1)..=y0.max(y1) {
            self.put(x, y, color);
        }
    }

    /// Outline one pixel outside `area`.
    pub fn frame(&mut self, area: &PlotArea, color: Rgb<u8>) {
        let (l, t, r, b) = (area.left - 1, area.top - 1, area.right() + 1, area.bottom() + 1);
        self.hline(l, r, t, color);
        self.hline(l, r, b, color);
        self.vline(l, t, b, color);
        self.vline(r, t, b, color);
    }

    /// Draws `text` with its top-left corner at `(x, y)`.
    pub fn draw_text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let scale = scale.max(1);
        for (i, c) in text.chars().enumerate() {
            let origin_x = x + (i as u32 * GLYPH_ADVANCE * scale) as i64;
            for gy in 0..GLYPH_HEIGHT {
                for gx in 0..GLYPH_WIDTH {
                    if bitmap_font::pixel(c, gx, gy) {
                        self.fill_rect(
                            origin_x + (gx * scale) as i64,
                            y + (gy * scale) as i64,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
        }
    }

    pub fn draw_text_centered(&mut self, center_x: i64, y: i64, text: &str, scale: u32) {
        let x = center_x - text_width(text, scale) as i64 / 2;
        self.draw_text(x, y, text, scale, TEXT);
    }

    pub fn draw_text_right(&mut self, right_x: i64, y: i64, text: &str, scale: u32) {
        let x = right_x - text_width(text, scale) as i64;
        self.draw_text(x, y, text, scale, TEXT);
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Rendered width of `text` in pixels.
pub fn text_width(text: &str, scale: u32) -> u32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0;
    }
    (count * GLYPH_ADVANCE - 1) * scale.max(1)
}

pub fn text_height(scale: u32) -> u32 {
    GLYPH_HEIGHT * scale.max(1)
}

/// Evenly spaced "round" tick values from 0 up to `max`, aiming for about
/// `target` intervals. Returns the ticks and their spacing.
pub fn nice_ticks(max: f64, target: usize) -> (Vec<f64>, f64) {
    if !(max.is_finite() && max > 0.0) || target == 0 {
        return (vec![0.0], 1.0);
    }
    let raw = max / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = magnitude
        * match raw / magnitude {
            n if n < 1.5 => 1.0,
            n if n < 3.0 => 2.0,
            n if n < 7.0 => 5.0,
            _ => 10.0,
        };
    let ticks = (0..)
        .map(|i| i as f64 * step)
        .take_while(|v| *v <= max + step * 1e-9)
        .collect();
    (ticks, step)
}

/// Formats a tick value with just enough decimals for its spacing.
pub fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step > 0.0 {
        (-step.log10().floor()).max(0.0) as usize
    } else {
        0
    };
    format!("{value:.decimals$}")
}
