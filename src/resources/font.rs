use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use crate::{error::LoadError, resources::load_binary};

const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

/// Finds `{assets}/{name}.ttf` or `{assets}/{name}.otf`.
pub fn find_font(assets: &Path, name: &str) -> Option<PathBuf> {
    FONT_EXTENSIONS
        .iter()
        .map(|ext| assets.join(format!("{name}.{ext}")))
        .find(|path| path.is_file())
}

pub fn load_font(path: &Path) -> Result<fontdue::Font, LoadError> {
    let bytes = load_binary(path)?;
    fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()).map_err(|e| {
        LoadError::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })
}

/// Rasterizes one line of white text, centred on a transparent
/// `width`×`height` canvas. Glyphs that do not fit are clipped.
pub fn rasterize_line(
    font: &fontdue::Font,
    text: &str,
    px: f32,
    width: u32,
    height: u32,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 0]));

    let glyphs: Vec<_> = text.chars().map(|c| font.rasterize(c, px)).collect();
    let line_width: f32 = glyphs.iter().map(|(m, _)| m.advance_width).sum();
    let ascent = font
        .horizontal_line_metrics(px)
        .map_or(px * 0.8, |line| line.ascent);

    let top = (height as f32 - px) / 2.0;
    let baseline = top + ascent;
    let mut pen = (width as f32 - line_width) / 2.0;

    for (metrics, coverage) in glyphs {
        let x0 = (pen + metrics.xmin as f32).round() as i64;
        let y0 = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i64;
        for row in 0..metrics.height {
            for col in 0..metrics.width {
                let (x, y) = (x0 + col as i64, y0 + row as i64);
                if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                    continue;
                }
                let alpha = coverage[row * metrics.width + col];
                let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                pixel.0[3] = pixel.0[3].max(alpha);
            }
        }
        pen += metrics.advance_width;
    }
    canvas
}
