use crate::types::Rgb;
use image::{Rgb as Pixel, RgbImage};
use rusttype::{point, Font, Scale};
use std::fs;
use std::path::Path;

/// Rasterizes text onto frames with one TrueType font.
pub struct TextPainter {
    font: Font<'static>,
}

impl TextPainter {
    pub fn load(path: &Path) -> Result<Self, String> {
        let data = fs::read(path).map_err(|e| format!("read font {}: {}", path.display(), e))?;
        Self::from_bytes(data).ok_or_else(|| format!("{} is not a usable font", path.display()))
    }

    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(data).map(|font| Self { font })
    }

    /// Draw `text` with its top-left corner at (x, y), `size` px tall.
    /// Glyph pixels outside the frame are clipped.
    pub fn draw(&self, img: &mut RgbImage, x: i32, y: i32, size: f32, color: Rgb, text: &str) {
        let scale = Scale::uniform(size);
        let ascent = self.font.v_metrics(scale).ascent;
        let (w, h) = (img.width() as i32, img.height() as i32);

        for glyph in self.font.layout(text, scale, point(x as f32, y as f32 + ascent)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue; // whitespace
            };
            glyph.draw(|gx, gy, coverage| {
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px < 0 || py < 0 || px >= w || py >= h {
                    return;
                }
                let dst = img.get_pixel_mut(px as u32, py as u32);
                *dst = blend(*dst, color, coverage);
            });
        }
    }
}

fn blend(dst: Pixel<u8>, color: Rgb, alpha: f32) -> Pixel<u8> {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |d: u8, c: u8| (d as f32 * (1.0 - a) + c as f32 * a).round() as u8;
    Pixel([mix(dst[0], color.0), mix(dst[1], color.1), mix(dst[2], color.2)])
}
