use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};

/// Each bitmap pixel becomes a SCALE x SCALE block
const SCALE: i32 = 6;
const GLYPH_SIZE: i32 = 8;

/// Draw `text` with the 8x8 fallback font, top-left corner at (x, y)
pub(super) fn draw(canvas: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
    let mut pen_x = x;
    for c in text.chars() {
        // Characters outside the basic set leave a blank cell
        if let Some(rows) = BASIC_FONTS.get(c) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if *bits & (1u8 << col) != 0 {
                        fill_block(canvas, pen_x + col * SCALE, y + row as i32 * SCALE, color);
                    }
                }
            }
        }
        pen_x += GLYPH_SIZE * SCALE;
    }
}

fn fill_block(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    for dy in 0..SCALE {
        for dx in 0..SCALE {
            super::blend(canvas, x + dx, y + dy, color, 1.0);
        }
    }
}
