//! Thumbnail rendering.
//!
//! Titles are drawn with a TrueType font when one can be loaded and with a scaled 8x8
//! bitmap font otherwise; a missing font never fails a render.

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

mod bitmap;
mod truetype;

pub const WIDTH: u32 = 1280;
pub const HEIGHT: u32 = 720;

const BACKGROUND: Rgb<u8> = Rgb([20, 20, 30]);
const TITLE_COLOR: Rgb<u8> = Rgb([255, 230, 0]);
const FOOTER_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const FONT_SIZE: f32 = 72.0;
const WRAP_WIDTH: usize = 18;
const MAX_TITLE_LINES: usize = 3;
const MARGIN_X: i32 = 60;
const TITLE_TOP: i32 = 120;
const LINE_STEP: i32 = 90;
const FOOTER_OFFSET: i32 = 80;

pub const FOOTER: &str = "Money Mind • Subscribe";

/// Fonts tried after the configured one
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Which font a render ended up using
#[derive(Debug, Clone, PartialEq)]
pub enum FontSource {
    TrueType(PathBuf),
    Bitmap,
}

/// What a render produced
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailReport {
    pub path: PathBuf,
    pub lines_rendered: usize,
    pub font: FontSource,
}

enum TitleFont {
    TrueType(rusttype::Font<'static>),
    Bitmap,
}

/// Renders 1280x720 title cards
pub struct ThumbnailRenderer {
    font: TitleFont,
    source: FontSource,
}

impl ThumbnailRenderer {
    /// Load the preferred font, falling back to system fonts and then the bitmap font
    pub fn new(preferred_font: &Path) -> Self {
        let candidates = std::iter::once(preferred_font.to_path_buf())
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

        for candidate in candidates {
            match truetype::load(&candidate) {
                Ok(font) => {
                    tracing::debug!("Using thumbnail font {}", candidate.display());
                    return Self {
                        font: TitleFont::TrueType(font),
                        source: FontSource::TrueType(candidate),
                    };
                }
                Err(e) => tracing::debug!("Font {} unavailable: {:#}", candidate.display(), e),
            }
        }

        tracing::warn!("No TrueType font found, thumbnails will use the bitmap font");
        Self::bitmap()
    }

    /// Renderer that always uses the built-in bitmap font
    pub fn bitmap() -> Self {
        Self {
            font: TitleFont::Bitmap,
            source: FontSource::Bitmap,
        }
    }

    /// Render a title thumbnail to `out_path`
    pub fn render(&self, title: &str, out_path: &Path) -> Result<ThumbnailReport> {
        let lines = wrap_title(title, WRAP_WIDTH);
        let drawn = self.render_card(&lines[..lines.len().min(MAX_TITLE_LINES)], out_path)?;

        Ok(ThumbnailReport {
            path: out_path.to_path_buf(),
            lines_rendered: drawn,
            font: self.source.clone(),
        })
    }

    /// Render the untitled card used as a still when a video has no clips
    pub fn render_fallback(&self, out_path: &Path) -> Result<()> {
        self.render_card(&["Money Mind".to_string()], out_path).map(|_| ())
    }

    fn render_card(&self, lines: &[String], out_path: &Path) -> Result<usize> {
        let mut canvas = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

        let mut y = TITLE_TOP;
        for line in lines {
            self.draw_text(&mut canvas, line, MARGIN_X, y, TITLE_COLOR);
            y += LINE_STEP;
        }
        self.draw_text(&mut canvas, FOOTER, MARGIN_X, HEIGHT as i32 - FOOTER_OFFSET, FOOTER_COLOR);

        if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }
        canvas
            .save(out_path)
            .with_context(|| format!("Failed to save thumbnail to {}", out_path.display()))?;

        Ok(lines.len())
    }

    fn draw_text(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
        match &self.font {
            TitleFont::TrueType(font) => truetype::draw(canvas, font, FONT_SIZE, text, x, y, color),
            TitleFont::Bitmap => bitmap::draw(canvas, text, x, y, color),
        }
    }
}

/// Greedy word wrap at `width` characters; words longer than a line are split
pub fn wrap_title(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let current_len = current.chars().count();
        if current.is_empty() {
            current.extend(word);
        } else if current_len + 1 + word.len() <= width {
            current.push(' ');
            current.extend(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.extend(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Blend `color` over the pixel at (x, y) with the given coverage, ignoring off-canvas points
fn blend(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }
    let coverage = coverage.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for (channel, target) in pixel.0.iter_mut().zip(color.0) {
        *channel = (*channel as f32 * (1.0 - coverage) + target as f32 * coverage).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_title_at_eighteen() {
        let lines = wrap_title("How to save and invest your first $100", 18);
        assert_eq!(lines, vec!["How to save and", "invest your first", "$100"]);
        assert!(lines.iter().all(|line| line.chars().count() <= 18));
    }

    #[test]
    fn test_wrap_title_splits_long_words() {
        let lines = wrap_title("supercalifragilisticexpialidocious", 18);
        assert_eq!(lines, vec!["supercalifragilist", "icexpialidocious"]);
    }

    #[test]
    fn test_wrap_title_empty() {
        assert!(wrap_title("   ", 18).is_empty());
    }

    #[test]
    fn test_long_title_truncated_to_three_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thumb.jpg");
        let title = "The brutal truth about working a 9-5 job that nobody ever tells you about money";
        assert!(wrap_title(title, WRAP_WIDTH).len() > 3);

        let report = ThumbnailRenderer::bitmap().render(title, &path).unwrap();
        assert_eq!(report.lines_rendered, 3);
        assert_eq!(report.font, FontSource::Bitmap);

        let image = image::open(&path).unwrap();
        assert_eq!((image.width(), image.height()), (WIDTH, HEIGHT));
    }

    #[test]
    fn test_short_title_renders_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thumb.jpg");
        let report = ThumbnailRenderer::bitmap().render("Money Mind", &path).unwrap();
        assert_eq!(report.lines_rendered, 1);
    }

    #[test]
    fn test_missing_font_falls_back_to_bitmap() {
        let renderer = ThumbnailRenderer::new(Path::new("/nonexistent/definitely-missing.ttf"));
        // Either a system font was found or the bitmap font took over; never an error
        let dir = tempfile::tempdir().unwrap();
        assert!(renderer.render("Title", &dir.path().join("t.jpg")).is_ok());
    }

    #[test]
    fn test_bitmap_text_changes_pixels() {
        let mut canvas = RgbImage::from_pixel(200, 100, BACKGROUND);
        bitmap::draw(&mut canvas, "MM", 10, 10, TITLE_COLOR);
        assert!(canvas.pixels().any(|p| *p == TITLE_COLOR));
    }

    #[test]
    fn test_blend_ignores_out_of_bounds() {
        let mut canvas = RgbImage::from_pixel(4, 4, BACKGROUND);
        blend(&mut canvas, -1, 2, TITLE_COLOR, 1.0);
        blend(&mut canvas, 4, 0, TITLE_COLOR, 1.0);
        assert!(canvas.pixels().all(|p| *p == BACKGROUND));

        blend(&mut canvas, 1, 1, TITLE_COLOR, 1.0);
        assert_eq!(*canvas.get_pixel(1, 1), TITLE_COLOR);
    }
}
