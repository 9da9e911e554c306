//! Clockstamp Config Library
//!
//! Settings storage for the clockstamp overlay: a flat key/value store
//! abstraction plus the configuration state that is loaded from it at startup
//! and written back at shutdown.

pub mod state;
pub mod store;

pub use state::{keys, ConfigState, WindowPosition, MAX_CAPTION_CHARS};
pub use store::{ConfigStore, JsonFileStore, MemoryStore, StoreValue};

/// Result type for clockstamp-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for clockstamp-config operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Clockstamp core error: {0}")]
    Core(#[from] clockstamp_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Setting {key} is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("No configuration directory available on this system")]
    NoConfigDir,
}
