//! Clockstamp Render Library
//!
//! Turns a caption and a layout into pixels: a canvas abstraction over image
//! buffers and raw host frames, an outline-font painter with an embedded
//! bitmap fallback, and the two-pass (outline, then fill) overlay renderer.

pub mod canvas;
pub mod font;
pub mod overlay;
pub mod typeface;

pub use canvas::{required_len, Canvas, FrameView};
pub use font::{BitmapFont, TextPainter};
pub use overlay::{OverlayRenderer, Pass, FILL_PASS, OUTLINE_PASS};
pub use typeface::{TrueTypeFont, Typeface};

/// Result type for clockstamp-render operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for clockstamp-render operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Clockstamp core error: {0}")]
    Core(#[from] clockstamp_core::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}
