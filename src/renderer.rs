//! Full-frame wallpaper rendering.
//!
//! Frame layout (defaults, 1920×1080):
//!
//! ```text
//!  (100,30) title ..................... timestamp (W-300,30)
//!  ┌──────────────── plot box, inset by margin_x/margin_y ───────────────┐
//!  │ grid at 0, 0.2 … 1.0 of each axis; one bar (or glyph stack) per bin │
//!  └──────────────────────────────────────────────────────────────────────┘
//!   88.0        92.0        96.0       100.0       104.0       108.0
//! ```

use crate::config::Config;
use crate::spectrum::{glyph_count, glyph_coverage, glyph_for, gradient, normalize, shade_pixel};
use crate::text::TextPainter;
use crate::types::{RenderStyle, Rgb, Sweep};
use image::{Rgb as Pixel, RgbImage};
use log::warn;

pub const WAITING_MESSAGE: &str = "Waiting for RTL-SDR data...";

/// Grid divisions per axis (lines at 0/5 … 5/5).
const GRID_DIVISIONS: u32 = 5;
/// Frequency labels along the bottom edge.
const AXIS_TICKS: u32 = 5;
/// Height of one glyph cell in glyph style.
const GLYPH_CELL_PX: u32 = 20;

const TITLE_PX: f32 = 24.0;
const LABEL_PX: f32 = 18.0;
const WAITING_PX: f32 = 40.0;

pub struct Renderer {
    text: Option<TextPainter>,
}

impl Renderer {
    /// Load the configured font. A missing font is not fatal: frames are
    /// drawn without text.
    pub fn new(cfg: &Config) -> Self {
        let text = match TextPainter::load(&cfg.font_path) {
            Ok(painter) => Some(painter),
            Err(e) => {
                warn!("{}; frames will have no text", e);
                None
            }
        };
        Self { text }
    }

    /// Renderer that draws no text at all.
    pub fn without_text() -> Self {
        Self { text: None }
    }

    pub fn with_text(painter: TextPainter) -> Self {
        Self { text: Some(painter) }
    }

    /// Render one frame. `sweep = None` produces the placeholder frame.
    /// `timestamp` is drawn verbatim in the top-right corner.
    pub fn render(&self, cfg: &Config, sweep: Option<&Sweep>, timestamp: &str) -> RgbImage {
        let mut img = RgbImage::from_pixel(cfg.width, cfg.height, px(cfg.background));

        let Some(sweep) = sweep else {
            self.text(
                &mut img,
                cfg.width as i32 / 2 - 200,
                cfg.height as i32 / 2,
                WAITING_PX,
                cfg.text_color,
                WAITING_MESSAGE,
            );
            return img;
        };

        if sweep.power_readings.is_empty() {
            return img;
        }

        let normalized = normalize(&sweep.power_readings);

        draw_grid(&mut img, cfg);
        match cfg.style {
            RenderStyle::Bars => draw_bars(&mut img, cfg, &normalized),
            RenderStyle::Glyphs => draw_glyphs(&mut img, cfg, &normalized),
        }
        self.draw_labels(&mut img, cfg, sweep, timestamp);
        img
    }

    fn draw_labels(&self, img: &mut RgbImage, cfg: &Config, sweep: &Sweep, timestamp: &str) {
        if self.text.is_none() {
            return;
        }
        let (mx, my) = (cfg.margin_x as i32, cfg.margin_y as i32);

        let title = format!(
            "RTL-SDR SPECTRUM: {:.1} - {:.1} MHz",
            sweep.freq_low_mhz(),
            sweep.freq_high_mhz()
        );
        self.text(img, mx, 30, TITLE_PX, cfg.text_color, &title);

        let span_mhz = sweep.freq_high_mhz() - sweep.freq_low_mhz();
        for i in 0..=AXIS_TICKS {
            let mhz = sweep.freq_low_mhz() + span_mhz * i as f64 / AXIS_TICKS as f64;
            let x = mx + (cfg.plot_width() * i / AXIS_TICKS) as i32;
            let y = cfg.height as i32 - my + 10;
            self.text(img, x - 30, y, LABEL_PX, cfg.text_color, &format!("{:.1}", mhz));
        }

        let x = cfg.width as i32 - mx - 200;
        self.text(img, x, 30, LABEL_PX, cfg.text_color, timestamp);
    }

    fn text(&self, img: &mut RgbImage, x: i32, y: i32, size: f32, color: Rgb, s: &str) {
        if let Some(painter) = &self.text {
            painter.draw(img, x, y, size, color, s);
        }
    }
}

fn px(c: Rgb) -> Pixel<u8> {
    Pixel([c.0, c.1, c.2])
}

/// Grid line offsets along an axis of `len` pixels starting at `origin`.
pub fn grid_positions(origin: u32, len: u32) -> Vec<u32> {
    (0..=GRID_DIVISIONS)
        .map(|i| origin + len * i / GRID_DIVISIONS)
        .collect()
}

fn draw_grid(img: &mut RgbImage, cfg: &Config) {
    let color = px(cfg.grid_color);
    let (left, right) = (cfg.margin_x, cfg.width - cfg.margin_x);
    let (top, bottom) = (cfg.margin_y, cfg.height - cfg.margin_y);

    for y in grid_positions(top, cfg.plot_height()) {
        fill_rect(img, left, y, right, y, color);
    }
    for x in grid_positions(left, cfg.plot_width()) {
        fill_rect(img, x, top, x, bottom, color);
    }
}

/// Inclusive horizontal pixel span of bin `i` of `n`.
pub fn bin_span(cfg: &Config, i: usize, n: usize) -> (u32, u32) {
    let edge = |k: usize| {
        let offset = k as f64 * cfg.plot_width() as f64 / n as f64;
        (cfg.margin_x as f64 + offset).floor() as u32
    };
    let (x0, x1) = (edge(i), edge(i + 1));
    (x0, x1.saturating_sub(1).max(x0))
}

/// Top row of a bar of normalized height `value`.
pub fn bar_top(cfg: &Config, value: f64) -> u32 {
    let baseline = (cfg.height - cfg.margin_y) as f64;
    let top = baseline - value.clamp(0.0, 1.0) * cfg.plot_height() as f64;
    top.round() as u32
}

fn draw_bars(img: &mut RgbImage, cfg: &Config, normalized: &[f64]) {
    let baseline = cfg.height - cfg.margin_y;
    for (i, &value) in normalized.iter().enumerate() {
        let (x0, x1) = bin_span(cfg, i, normalized.len());
        fill_rect(img, x0, bar_top(cfg, value), x1, baseline, px(gradient(value)));
    }
}

fn draw_glyphs(img: &mut RgbImage, cfg: &Config, normalized: &[f64]) {
    let color = px(cfg.spectrum_color);
    let baseline = cfg.height - cfg.margin_y;
    for (i, &value) in normalized.iter().enumerate() {
        let coverage = glyph_coverage(glyph_for(value));
        if coverage == 0.0 {
            continue;
        }
        let (x0, x1) = bin_span(cfg, i, normalized.len());
        for j in 0..glyph_count(value) as u32 {
            let bottom = baseline - j * GLYPH_CELL_PX;
            let Some(top) = bottom.checked_sub(GLYPH_CELL_PX) else {
                break;
            };
            if top < cfg.margin_y {
                break;
            }
            for y in top..bottom {
                for x in x0..=x1 {
                    if shade_pixel(coverage, x, y) {
                        put(img, x, y, color);
                    }
                }
            }
        }
    }
}

/// Fill the inclusive rectangle (x0, y0)–(x1, y1), clipped to the frame.
fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Pixel<u8>) {
    for y in y0..=y1.min(img.height().saturating_sub(1)) {
        for x in x0..=x1.min(img.width().saturating_sub(1)) {
            img.put_pixel(x, y, color);
        }
    }
}

fn put(img: &mut RgbImage, x: u32, y: u32, color: Pixel<u8>) {
    if x < img.width() && y < img.height() {
        img.put_pixel(x, y, color);
    }
}
