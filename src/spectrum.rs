//! Pure intensity mapping: min-max normalization, the four-stage color
//! gradient, and the shade-glyph ramp.

use crate::types::Rgb;

/// Intensity glyphs, faintest to solid.
pub const GLYPH_RAMP: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// Glyphs stacked for a full-scale reading.
pub const MAX_GLYPH_STACK: usize = 30;

/// Rescale readings linearly to 0.0–1.0. A flat spectrum (all readings
/// equal) maps every bin to 0.5.
pub fn normalize(readings: &[f64]) -> Vec<f64> {
    if readings.is_empty() {
        return Vec::new();
    }
    let min = readings.iter().copied().fold(f64::INFINITY, f64::min);
    let max = readings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == min {
        return vec![0.5; readings.len()];
    }
    let span = max - min;
    readings.iter().map(|&r| (r - min) / span).collect()
}

/// Map a normalized intensity to a color.
///
/// | Range     | Stage           |
/// |-----------|-----------------|
/// | 0.0–0.3   | black → blue    |
/// | 0.3–0.6   | blue → green    |
/// | 0.6–0.8   | green → yellow  |
/// | 0.8–1.0   | yellow → red    |
///
/// Inputs outside 0.0–1.0 are clamped.
pub fn gradient(value: f64) -> Rgb {
    let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    if v < 0.3 {
        let t = v / 0.3;
        (0, 0, channel(t))
    } else if v < 0.6 {
        let t = (v - 0.3) / 0.3;
        (0, channel(t), channel(1.0 - t))
    } else if v < 0.8 {
        let t = (v - 0.6) / 0.2;
        (channel(t), 255, 0)
    } else {
        let t = (v - 0.8) / 0.2;
        (255, channel(1.0 - t), 0)
    }
}

/// Scale 0.0–1.0 to a channel value, truncating.
fn channel(t: f64) -> u8 {
    (t.clamp(0.0, 1.0) * 255.0) as u8
}

/// Ramp glyph for a normalized intensity.
pub fn glyph_for(value: f64) -> char {
    let v = value.clamp(0.0, 1.0);
    let idx = (v * (GLYPH_RAMP.len() - 1) as f64) as usize;
    GLYPH_RAMP[idx.min(GLYPH_RAMP.len() - 1)]
}

/// How many glyphs to stack for a normalized intensity.
pub fn glyph_count(value: f64) -> usize {
    (value.clamp(0.0, 1.0) * MAX_GLYPH_STACK as f64) as usize
}

/// Ink coverage of a ramp glyph, 0.0 (blank) to 1.0 (solid).
pub fn glyph_coverage(glyph: char) -> f64 {
    match glyph {
        '░' => 0.25,
        '▒' => 0.5,
        '▓' => 0.75,
        '█' => 1.0,
        _ => 0.0,
    }
}

/// 2×2 ordered dither: whether pixel (x, y) is inked at the given coverage.
pub fn shade_pixel(coverage: f64, x: u32, y: u32) -> bool {
    const BAYER: [[f64; 2]; 2] = [[0.0, 2.0], [3.0, 1.0]];
    let threshold = (BAYER[(y % 2) as usize][(x % 2) as usize] + 0.5) / 4.0;
    coverage > threshold
}
