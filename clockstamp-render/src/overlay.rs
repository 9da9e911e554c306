//! Two-pass caption overlay
//!
//! Every frame is stamped twice at independently placed origins: first a
//! thick dark pass, then a thin light pass on top of it. Together they stay
//! readable on any background.

use crate::canvas::Canvas;
use crate::font::TextPainter;
use crate::typeface::Typeface;
use clockstamp_core::{
    effective_scale, format_caption, place, LayoutConfig, LocalClock, PlacementResult, TimeSource,
};
use image::Rgba;
use tracing::debug;

/// Stroke thickness and color of one drawing pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass {
    pub thickness: i32,
    pub color: Rgba<u8>,
}

/// Thick black outline, drawn first
pub const OUTLINE_PASS: Pass = Pass {
    thickness: 6,
    color: Rgba([0, 0, 0, 255]),
};

/// Thin white fill, drawn over the outline
pub const FILL_PASS: Pass = Pass {
    thickness: 2,
    color: Rgba([255, 255, 255, 255]),
};

/// Stamps the current time onto canvases
#[derive(Debug, Clone)]
pub struct OverlayRenderer<P = Typeface, T = LocalClock> {
    painter: P,
    clock: T,
    passes: [Pass; 2],
}

impl OverlayRenderer {
    /// Built-in font, local wall clock, standard outline and fill passes
    pub fn new() -> Self {
        Self::with_parts(Typeface::default(), LocalClock)
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: TextPainter, T: TimeSource> OverlayRenderer<P, T> {
    /// Creates a renderer from a custom painter and time source
    pub fn with_parts(painter: P, clock: T) -> Self {
        Self {
            painter,
            clock,
            passes: [OUTLINE_PASS, FILL_PASS],
        }
    }

    /// Replaces the outline and fill passes
    pub fn with_passes(mut self, outline: Pass, fill: Pass) -> Self {
        self.passes = [outline, fill];
        self
    }

    /// Samples the clock once, formats the caption and paints it.
    ///
    /// Returns the caption that was drawn.
    pub fn render(&self, canvas: &mut dyn Canvas, layout: &LayoutConfig) -> String {
        let now = self.clock.now();
        let caption = format_caption(&layout.template, &now);
        debug!(caption = %caption, "stamping frame");

        for pass in self.passes {
            self.draw_pass(canvas, &caption, layout, pass);
        }

        caption
    }

    /// Measures, places and draws `text` for a single pass
    pub fn draw_pass(
        &self,
        canvas: &mut dyn Canvas,
        text: &str,
        layout: &LayoutConfig,
        pass: Pass,
    ) -> PlacementResult {
        let width = i32::try_from(canvas.width()).unwrap_or(i32::MAX);
        let height = i32::try_from(canvas.height()).unwrap_or(i32::MAX);

        // Measuring needs the effective scale, placing needs the measurement.
        let scale = effective_scale(layout.scale, height);
        let metrics = self.painter.measure(text, scale, pass.thickness);
        let (origin, _) = place((width, height), &metrics, pass.thickness, layout.scale, layout);

        self.painter
            .draw(canvas, text, origin, scale, pass.color, pass.thickness);
        origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BitmapFont;
    use clockstamp_core::{FixedClock, HorizontalAlign, TextMetrics, TimeValue, VerticalAlign};
    use image::RgbaImage;
    use std::cell::RefCell;

    #[derive(Debug, PartialEq)]
    enum Call {
        Measure { scale: f64, thickness: i32 },
        Draw {
            text: String,
            origin: PlacementResult,
            color: Rgba<u8>,
            thickness: i32,
        },
    }

    /// Reports a fixed size and records every call
    #[derive(Default)]
    struct RecordingPainter {
        calls: RefCell<Vec<Call>>,
    }

    impl TextPainter for RecordingPainter {
        fn measure(&self, _text: &str, scale: f64, thickness: i32) -> TextMetrics {
            self.calls.borrow_mut().push(Call::Measure { scale, thickness });
            TextMetrics {
                width: 100 + thickness,
                height: 20,
                baseline: 4,
            }
        }

        fn draw(
            &self,
            _canvas: &mut dyn Canvas,
            text: &str,
            origin: PlacementResult,
            _scale: f64,
            color: Rgba<u8>,
            thickness: i32,
        ) {
            self.calls.borrow_mut().push(Call::Draw {
                text: text.to_string(),
                origin,
                color,
                thickness,
            });
        }
    }

    fn noon() -> FixedClock {
        FixedClock(TimeValue::new(2024, 7, 9, 12, 0, 5, 42))
    }

    #[test]
    fn test_outline_then_fill() {
        let renderer = OverlayRenderer::with_parts(RecordingPainter::default(), noon());
        let mut canvas = RgbaImage::new(1000, 500);

        let caption = renderer.render(&mut canvas, &LayoutConfig::default());
        assert_eq!(caption, "12:00:05.042");

        let calls = renderer.painter.calls.borrow();
        assert_eq!(calls.len(), 4);
        assert!(matches!(
            calls[0],
            Call::Measure { scale, thickness: 6 } if (scale - 1.0).abs() < 1e-9
        ));
        assert_eq!(
            calls[1],
            Call::Draw {
                text: caption.clone(),
                origin: PlacementResult {
                    x: 1000 - 106 - 15 + 6,
                    y: 15 + 19,
                },
                color: OUTLINE_PASS.color,
                thickness: 6,
            }
        );
        assert!(matches!(
            calls[2],
            Call::Measure { scale, thickness: 2 } if (scale - 1.0).abs() < 1e-9
        ));
        assert_eq!(
            calls[3],
            Call::Draw {
                text: caption,
                origin: PlacementResult {
                    x: 1000 - 102 - 15 + 2,
                    y: 15 + 19,
                },
                color: FILL_PASS.color,
                thickness: 2,
            }
        );
    }

    #[test]
    fn test_custom_passes() {
        let outline = Pass {
            thickness: 4,
            color: Rgba([0, 0, 255, 255]),
        };
        let fill = Pass {
            thickness: 1,
            color: Rgba([255, 255, 0, 255]),
        };
        let renderer = OverlayRenderer::with_parts(RecordingPainter::default(), noon())
            .with_passes(outline, fill);

        renderer.render(&mut RgbaImage::new(100, 100), &LayoutConfig::default());

        let calls = renderer.painter.calls.borrow();
        assert!(matches!(calls[1], Call::Draw { thickness: 4, .. }));
        assert!(matches!(calls[3], Call::Draw { thickness: 1, .. }));
    }

    #[test]
    fn test_bitmap_overlay_paints_top_right() {
        let renderer = OverlayRenderer::with_parts(BitmapFont, noon());
        let mut canvas = RgbaImage::new(640, 360);

        renderer.render(&mut canvas, &LayoutConfig::default());

        let white = Rgba([255, 255, 255, 255]);
        let black = Rgba([0, 0, 0, 255]);
        let mut saw_white = false;
        let mut saw_black = false;

        for (x, y, p) in canvas.enumerate_pixels() {
            if *p == white {
                saw_white = true;
            }
            if *p == black {
                saw_black = true;
            }
            if p[3] != 0 {
                assert!(x >= 320, "pixel painted at x={x} on the left half");
                assert!(y < 120, "pixel painted at y={y} below the top third");
            }
        }

        assert!(saw_white && saw_black);
    }

    #[test]
    fn test_bottom_left_on_tiny_canvas() {
        let renderer = OverlayRenderer::with_parts(BitmapFont, noon());
        let layout = LayoutConfig {
            align: HorizontalAlign::Left,
            valign: VerticalAlign::Bottom,
            ..LayoutConfig::default()
        };

        // Degenerate canvases must not panic.
        renderer.render(&mut RgbaImage::new(0, 0), &layout);
        renderer.render(&mut RgbaImage::new(3, 2), &layout);
    }

    #[test]
    fn test_extreme_layouts_do_not_panic() {
        let renderer = OverlayRenderer::with_parts(BitmapFont, noon());
        let mut canvas = RgbaImage::new(64, 48);

        for margin_percent in [3_000_000, i32::MAX, i32::MIN] {
            for scale in [0.2, 1e300, -1.0] {
                let layout = LayoutConfig {
                    margin_percent,
                    scale,
                    valign: VerticalAlign::Bottom,
                    ..LayoutConfig::default()
                };
                renderer.render(&mut canvas, &layout);
            }
        }
    }
}
