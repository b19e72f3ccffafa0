use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use rusttype::{point, Font, Scale};
use std::path::Path;

pub(super) fn load(path: &Path) -> Result<Font<'static>> {
    let bytes = fs_err::read(path)?;
    Font::try_from_vec(bytes)
        .with_context(|| format!("{} is not a usable TrueType font", path.display()))
}

/// Draw `text` with its top-left corner at (x, y)
pub(super) fn draw(
    canvas: &mut RgbImage,
    font: &Font<'static>,
    size: f32,
    text: &str,
    x: i32,
    y: i32,
    color: Rgb<u8>,
) {
    let scale = Scale::uniform(size);
    let ascent = font.v_metrics(scale).ascent;

    for glyph in font.layout(text, scale, point(x as f32, y as f32 + ascent)) {
        let Some(bounds) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let (px, py) = (bounds.min.x + gx as i32, bounds.min.y + gy as i32);
            super::blend(canvas, px, py, color, coverage);
        });
    }
}
