//! Overlay configuration state
//!
//! The state is created with built-in defaults, overlaid field by field with
//! whatever the store holds, and handed to the renderer as immutable
//! snapshots. Writers publish a complete new [`LayoutConfig`] in one swap, so
//! a frame being rendered on another thread sees either the old settings or
//! the new ones, never a mix.

use crate::{ConfigStore, Result, StoreValue};
use clockstamp_core::{HorizontalAlign, LayoutConfig, VerticalAlign};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// The host settings dialog holds 64 characters including the terminator
pub const MAX_CAPTION_CHARS: usize = 63;

/// Store keys
pub mod keys {
    pub const MARGIN: &str = "Margin";
    pub const ALIGN: &str = "Align";
    pub const VALIGN: &str = "VAlign";
    /// Stored as thousandths
    pub const SCALE: &str = "Scale";
    pub const CAPTION: &str = "Caption";
    pub const WINDOW_X: &str = "WindowX";
    pub const WINDOW_Y: &str = "WindowY";
}

/// Last position of the settings window, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowPosition {
    pub x: i32,
    pub y: i32,
}

/// Current overlay settings of one plugin instance
#[derive(Debug, Default)]
pub struct ConfigState {
    layout: RwLock<Arc<LayoutConfig>>,
    window: RwLock<Option<WindowPosition>>,
}

impl ConfigState {
    /// Creates a state holding the built-in defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state from defaults overlaid with the values found in `store`.
    ///
    /// Each key is applied on its own: a missing, unreadable or out-of-range
    /// value leaves that field at its default and does not affect the others.
    pub fn load<S: ConfigStore + ?Sized>(store: &S) -> Self {
        let mut layout = LayoutConfig::default();
        let mut window = WindowPosition::default();
        let mut has_window = false;

        if let Some(v) = read_dword(store, keys::MARGIN) {
            layout.margin_percent = v as i32;
        }
        if let Some(v) = read_dword(store, keys::ALIGN) {
            match HorizontalAlign::try_from(v) {
                Ok(align) => layout.align = align,
                Err(e) => warn!("ignoring stored {}: {e}", keys::ALIGN),
            }
        }
        if let Some(v) = read_dword(store, keys::VALIGN) {
            match VerticalAlign::try_from(v) {
                Ok(valign) => layout.valign = valign,
                Err(e) => warn!("ignoring stored {}: {e}", keys::VALIGN),
            }
        }
        if let Some(v) = read_dword(store, keys::SCALE) {
            layout.scale = f64::from(v) / 1000.0;
        }
        if let Some(caption) = read_text(store, keys::CAPTION) {
            layout.template = truncate_caption(&caption);
        }
        if let Some(v) = read_dword(store, keys::WINDOW_X) {
            window.x = v as i32;
            has_window = true;
        }
        if let Some(v) = read_dword(store, keys::WINDOW_Y) {
            window.y = v as i32;
            has_window = true;
        }

        info!(
            margin = layout.margin_percent,
            align = %layout.align,
            valign = %layout.valign,
            scale = layout.scale,
            template = %layout.template,
            "overlay settings loaded"
        );

        Self {
            layout: RwLock::new(Arc::new(layout)),
            window: RwLock::new(has_window.then_some(window)),
        }
    }

    /// Re-reads `store` into this state, as [`ConfigState::load`] would
    pub fn reload<S: ConfigStore + ?Sized>(&self, store: &S) {
        let loaded = Self::load(store);
        *self.window.write().unwrap_or_else(PoisonError::into_inner) = loaded.window_position();
        *self.layout.write().unwrap_or_else(PoisonError::into_inner) = loaded.snapshot();
    }

    /// The settings to render the next frame with
    pub fn snapshot(&self) -> Arc<LayoutConfig> {
        Arc::clone(&self.layout.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Publishes a complete new layout
    pub fn replace(&self, mut layout: LayoutConfig) {
        layout.template = truncate_caption(&layout.template);
        *self.layout.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(layout);
    }

    /// Read-copy-update: edits a private copy of the current layout and
    /// publishes it in one step. Concurrent updates are serialized.
    pub fn update<F>(&self, edit: F)
    where
        F: FnOnce(&mut LayoutConfig),
    {
        let mut guard = self.layout.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = LayoutConfig::clone(&guard);
        edit(&mut next);
        next.template = truncate_caption(&next.template);
        *guard = Arc::new(next);
    }

    /// Restores the built-in defaults (the window position is kept)
    pub fn reset(&self) {
        self.replace(LayoutConfig::default());
    }

    /// Window position, if one was ever stored or set
    pub fn window_position(&self) -> Option<WindowPosition> {
        *self.window.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_window_position(&self, position: WindowPosition) {
        *self.window.write().unwrap_or_else(PoisonError::into_inner) = Some(position);
    }

    /// Writes every setting to `store` and flushes it
    pub fn save<S: ConfigStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        let layout = self.snapshot();

        store.set(keys::MARGIN, StoreValue::Dword(layout.margin_percent as u32))?;
        store.set(keys::ALIGN, StoreValue::Dword(layout.align.code()))?;
        store.set(keys::VALIGN, StoreValue::Dword(layout.valign.code()))?;
        store.set(keys::SCALE, StoreValue::Dword((layout.scale * 1000.0) as u32))?;
        store.set(keys::CAPTION, StoreValue::Text(layout.template.clone()))?;

        if let Some(window) = self.window_position() {
            store.set(keys::WINDOW_X, StoreValue::Dword(window.x as u32))?;
            store.set(keys::WINDOW_Y, StoreValue::Dword(window.y as u32))?;
        }

        store.flush()?;
        info!("overlay settings saved");
        Ok(())
    }
}

fn read_dword<S: ConfigStore + ?Sized>(store: &S, key: &str) -> Option<u32> {
    store.get_dword(key).unwrap_or_else(|e| {
        warn!("cannot read setting {key}, keeping default: {e}");
        None
    })
}

fn read_text<S: ConfigStore + ?Sized>(store: &S, key: &str) -> Option<String> {
    store.get_text(key).unwrap_or_else(|e| {
        warn!("cannot read setting {key}, keeping default: {e}");
        None
    })
}

fn truncate_caption(caption: &str) -> String {
    caption.chars().take(MAX_CAPTION_CHARS).collect()
}
