//! Clockstamp Core Library
//!
//! This library provides the caption formatter and text placement engine used
//! to overlay a wall-clock timestamp onto video frames.

pub mod caption;
pub mod layout;
pub mod placement;
pub mod time;

pub use caption::{format_caption, DEFAULT_TEMPLATE};
pub use layout::{HorizontalAlign, LayoutConfig, VerticalAlign};
pub use placement::{effective_scale, margin_pixels, place, PlacementResult, TextMetrics};
pub use time::{FixedClock, LocalClock, TimeSource, TimeValue};

/// Result type for clockstamp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for clockstamp-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid horizontal alignment: {0}")]
    InvalidAlign(u32),

    #[error("Invalid vertical alignment: {0}")]
    InvalidVAlign(u32),

    #[error("Invalid time value: {0}")]
    InvalidTimeValue(String),
}
