//! Outline fonts and painter selection
//!
//! A TrueType/OpenType font is rasterized with `fontdue` when one can be
//! loaded. Otherwise the overlay falls back to the built-in bitmap font.

use crate::canvas::{fill_rect, Canvas};
use crate::font::{BitmapFont, TextPainter};
use crate::{Error, Result};
use clockstamp_core::{PlacementResult, TextMetrics};
use fontdue::{Font, FontSettings};
use image::Rgba;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Em size in pixels at scale 1.0
const EM_PIXELS: f64 = 28.0;

/// Largest em size ever rasterized
const MAX_EM_PIXELS: f64 = 4096.0;

/// Coverage at or above which a glyph pixel is painted; canvases are opaque
const COVERAGE_THRESHOLD: u8 = 128;

/// A scalable font rasterized with `fontdue`
#[derive(Clone)]
pub struct TrueTypeFont {
    font: Font,
}

impl TrueTypeFont {
    /// Parses a TrueType or OpenType font
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| Error::Font(e.to_string()))?;
        Ok(Self { font })
    }

    /// Reads and parses a font file
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    fn em_size(scale: f64) -> Option<f32> {
        let size = scale * EM_PIXELS;
        (size > 0.0).then(|| size.min(MAX_EM_PIXELS) as f32)
    }

    /// Ascent and descent in whole pixels, both positive
    fn line_extent(&self, size: f32) -> (i32, i32) {
        match self.font.horizontal_line_metrics(size) {
            Some(m) => (m.ascent.ceil() as i32, (-m.descent).ceil() as i32),
            None => ((size * 0.8).ceil() as i32, (size * 0.2).ceil() as i32),
        }
    }
}

impl TextPainter for TrueTypeFont {
    fn measure(&self, text: &str, scale: f64, thickness: i32) -> TextMetrics {
        let Some(size) = Self::em_size(scale) else {
            return TextMetrics::default();
        };

        let advance: f32 = text
            .chars()
            .map(|ch| self.font.metrics(ch, size).advance_width)
            .sum();
        let (ascent, descent) = self.line_extent(size);

        TextMetrics {
            width: (advance.round() as i32).saturating_add(thickness),
            height: ascent.saturating_add(thickness.saturating_add(1) / 2),
            baseline: descent,
        }
    }

    fn draw(
        &self,
        canvas: &mut dyn Canvas,
        text: &str,
        origin: PlacementResult,
        scale: f64,
        color: Rgba<u8>,
        thickness: i32,
    ) {
        let Some(size) = Self::em_size(scale) else {
            return;
        };

        let grow = i64::from(thickness.max(0) / 2);
        let baseline = i64::from(origin.y);
        let mut pen = f64::from(origin.x);

        for ch in text.chars() {
            let (metrics, coverage) = self.font.rasterize(ch, size);

            if metrics.width > 0 {
                let left = pen.round() as i64 + i64::from(metrics.xmin);
                // The bitmap's bottom row sits `ymin` rows above the baseline row
                let bottom = baseline - i64::from(metrics.ymin);
                let top = bottom - metrics.height as i64 + 1;

                for (row, line) in coverage.chunks(metrics.width).enumerate() {
                    for (col, &alpha) in line.iter().enumerate() {
                        if alpha < COVERAGE_THRESHOLD {
                            continue;
                        }
                        let x = left + col as i64;
                        let y = top + row as i64;
                        fill_rect(
                            &mut *canvas,
                            x - grow,
                            y - grow,
                            x + 1 + grow,
                            y + 1 + grow,
                            color,
                        );
                    }
                }
            }

            pen += f64::from(metrics.advance_width);
        }
    }
}

/// The painter the overlay draws with
#[derive(Clone)]
pub enum Typeface {
    TrueType(TrueTypeFont),
    Bitmap(BitmapFont),
}

impl Default for Typeface {
    fn default() -> Self {
        Self::Bitmap(BitmapFont)
    }
}

impl Typeface {
    /// Loads the font at `path`, falling back to the built-in bitmap font
    /// when there is no path or the file cannot be used
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match TrueTypeFont::load(path) {
            Ok(font) => {
                debug!(path = %path.display(), "outline font loaded");
                Self::TrueType(font)
            }
            Err(e) => {
                warn!(path = %path.display(), "using the built-in font: {e}");
                Self::default()
            }
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Bitmap(_))
    }
}

impl TextPainter for Typeface {
    fn measure(&self, text: &str, scale: f64, thickness: i32) -> TextMetrics {
        match self {
            Self::TrueType(font) => font.measure(text, scale, thickness),
            Self::Bitmap(font) => font.measure(text, scale, thickness),
        }
    }

    fn draw(
        &self,
        canvas: &mut dyn Canvas,
        text: &str,
        origin: PlacementResult,
        scale: f64,
        color: Rgba<u8>,
        thickness: i32,
    ) {
        match self {
            Self::TrueType(font) => font.draw(canvas, text, origin, scale, color, thickness),
            Self::Bitmap(font) => font.draw(canvas, text, origin, scale, color, thickness),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::path::PathBuf;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// A font that ships with the OS, if any
    fn system_font() -> Option<PathBuf> {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            TrueTypeFont::from_bytes(b"not a font"),
            Err(Error::Font(_))
        ));
        assert!(matches!(
            TrueTypeFont::load(Path::new("/nonexistent/clockstamp.ttf")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_falls_back_to_builtin() {
        assert!(Typeface::load_or_builtin(None).is_builtin());
        let missing = Path::new("/nonexistent/clockstamp.ttf");
        assert!(Typeface::load_or_builtin(Some(missing)).is_builtin());

        let bitmap = BitmapFont.measure("12:00", 1.0, 2);
        assert_eq!(Typeface::default().measure("12:00", 1.0, 2), bitmap);
    }

    #[test]
    fn test_outline_font_measure_and_draw() {
        let Some(path) = system_font() else {
            return;
        };
        let typeface = Typeface::load_or_builtin(Some(path.as_path()));
        assert!(!typeface.is_builtin());

        let short = typeface.measure("12", 1.0, 0);
        let long = typeface.measure("12:00:05", 1.0, 0);
        assert!(long.width > short.width);
        assert!(short.height > 0);
        assert_eq!(typeface.measure("12", 1.0, 6).width - short.width, 6);
        assert_eq!(typeface.measure("12", 0.0, 6), TextMetrics::default());

        let mut img = RgbaImage::new(400, 100);
        let origin = PlacementResult { x: 10, y: 60 };
        typeface.draw(&mut img, "12:00:05", origin, 1.0, WHITE, 0);

        let painted: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p[3] != 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!painted.is_empty());
        assert!(painted.iter().all(|&(x, _)| x as i32 >= origin.x - 2));
        assert!(painted.iter().all(|&(_, y)| y as i32 <= origin.y + long.baseline));
        assert!(painted.iter().all(|&(_, y)| y as i32 > origin.y - long.height));
    }

    #[test]
    fn test_outline_font_huge_scale_is_capped() {
        let Some(path) = system_font() else {
            return;
        };
        let typeface = Typeface::load_or_builtin(Some(path.as_path()));
        let capped = typeface.measure("8", 1e300, 0);
        assert_eq!(capped, typeface.measure("8", MAX_EM_PIXELS / EM_PIXELS, 0));
    }
}
