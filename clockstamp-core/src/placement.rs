//! Caption placement on a canvas
//!
//! Placement works in three steps that must happen in this order:
//!
//! 1. [`effective_scale`] turns the user-facing scale into the multiplier handed
//!    to the text measuring primitive.
//! 2. The caller measures the caption with that multiplier and the stroke
//!    thickness, yielding [`TextMetrics`].
//! 3. [`place`] turns the measurements into the origin to draw at.
//!
//! The returned origin is the bottom-left corner of the text (the point a
//! baseline-anchored draw primitive expects), not its top-left corner.

use crate::{HorizontalAlign, LayoutConfig, VerticalAlign};

/// Size of a measured caption as reported by the text primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextMetrics {
    pub width: i32,
    pub height: i32,
    /// Distance from the baseline to the lowest pixel of the text
    pub baseline: i32,
}

/// Origin in canvas pixels; may lie outside the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlacementResult {
    pub x: i32,
    pub y: i32,
}

/// Scales text relative to the canvas height so the overlay keeps its
/// proportions across resolutions
pub fn effective_scale(scale: f64, canvas_height: i32) -> f64 {
    scale * f64::from(canvas_height) * 0.01
}

/// Margin in pixels. Always derived from the height, even for the horizontal axis.
///
/// Saturates at the `i32` range instead of overflowing.
pub fn margin_pixels(margin_percent: i32, canvas_height: i32) -> i32 {
    saturate(wide_margin(margin_percent, canvas_height))
}

fn wide_margin(margin_percent: i32, canvas_height: i32) -> i64 {
    i64::from(margin_percent) * i64::from(canvas_height) / 100
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Computes where to draw a caption of size `text` on a `canvas` of
/// `(width, height)` pixels.
///
/// Returns the origin together with the effective scale for `scale`, which
/// is what `text` must have been measured with. Nothing is validated: a
/// caption larger than the canvas simply yields an off-canvas origin, and
/// coordinates beyond the `i32` range are clamped to it.
pub fn place(
    canvas: (i32, i32),
    text: &TextMetrics,
    thickness: i32,
    scale: f64,
    layout: &LayoutConfig,
) -> (PlacementResult, f64) {
    let (canvas_width, canvas_height) = canvas;
    let (w, h) = (i64::from(canvas_width), i64::from(canvas_height));
    let (text_w, text_h) = (i64::from(text.width), i64::from(text.height));
    let baseline = i64::from(text.baseline);
    let thickness = i64::from(thickness);
    let margin = wide_margin(layout.margin_percent, canvas_height);

    // Every term is within i32, so none of these sums can overflow i64.
    let x = match layout.align {
        HorizontalAlign::Left => margin,
        HorizontalAlign::Center => (w - text_w + thickness) / 2,
        HorizontalAlign::Right => w - text_w - margin + thickness,
    };

    let y = match layout.valign {
        VerticalAlign::Top => margin,
        VerticalAlign::Middle => (h - text_h - thickness) / 2,
        // Only the bottom case accounts for the baseline and adds the thickness
        // back; existing overlays depend on this exact offset.
        VerticalAlign::Bottom => h - text_h - thickness / 2 - margin - baseline + thickness,
    };

    let origin = PlacementResult {
        x: saturate(x),
        y: saturate(y + text_h - 1),
    };

    (origin, effective_scale(scale, canvas_height))
}
