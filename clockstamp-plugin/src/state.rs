//! Per-instance plugin state

use clockstamp_config::{ConfigState, ConfigStore, JsonFileStore, WindowPosition};
use clockstamp_core::{HorizontalAlign, LayoutConfig, VerticalAlign};
use clockstamp_core::LocalClock;
use clockstamp_render::{Canvas, OverlayRenderer, Typeface};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Environment variable that overrides the settings file location
pub const SETTINGS_ENV: &str = "CLOCKSTAMP_SETTINGS";

/// Environment variable naming a TrueType/OpenType font for the caption
pub const FONT_ENV: &str = "CLOCKSTAMP_FONT";

pub type BoxedStore = Box<dyn ConfigStore + Send>;

/// Opens the settings store; called on every init and uninit
pub type StoreOpener = Box<dyn Fn() -> clockstamp_config::Result<BoxedStore> + Send + Sync>;

/// Opens the JSON settings file named by `CLOCKSTAMP_SETTINGS`, or the
/// per-user default location
pub fn open_default_store() -> clockstamp_config::Result<BoxedStore> {
    let store = match std::env::var_os(SETTINGS_ENV) {
        Some(path) => JsonFileStore::open(PathBuf::from(path))?,
        None => JsonFileStore::open_default()?,
    };
    Ok(Box::new(store))
}

/// The font named by `CLOCKSTAMP_FONT`, or the built-in bitmap font
pub fn default_typeface() -> Typeface {
    let path = std::env::var_os(FONT_ENV).map(PathBuf::from);
    Typeface::load_or_builtin(path.as_deref())
}

/// Everything one loaded plugin instance owns
pub struct PluginState {
    config: ConfigState,
    renderer: OverlayRenderer,
    open_store: StoreOpener,
    store: Mutex<Option<BoxedStore>>,
}

impl PluginState {
    /// Creates a state with default settings; nothing is read until [`PluginState::init`]
    pub fn new(open_store: StoreOpener) -> Self {
        Self::with_typeface(open_store, default_typeface())
    }

    pub fn with_typeface(open_store: StoreOpener, typeface: Typeface) -> Self {
        Self {
            config: ConfigState::new(),
            renderer: OverlayRenderer::with_parts(typeface, LocalClock),
            open_store,
            store: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ConfigState {
        &self.config
    }

    /// Loads settings from the store. Returns `false` if the store could not
    /// be opened, in which case the defaults stay in effect.
    pub fn init(&self) -> bool {
        match (self.open_store)() {
            Ok(store) => {
                self.config.reload(&*store);
                *self.store.lock().unwrap_or_else(PoisonError::into_inner) = Some(store);
                true
            }
            Err(e) => {
                warn!("settings store unavailable, using defaults: {e}");
                false
            }
        }
    }

    /// Writes settings back. Returns `false` if they could not be persisted.
    pub fn uninit(&self) -> bool {
        let mut slot = self.store.lock().unwrap_or_else(PoisonError::into_inner);

        let mut store = match slot.take() {
            Some(store) => store,
            None => match (self.open_store)() {
                Ok(store) => store,
                Err(e) => {
                    warn!("settings store unavailable, settings not saved: {e}");
                    return false;
                }
            },
        };

        match self.config.save(&mut *store) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to save settings: {e}");
                false
            }
        }
    }

    /// Stamps the current time onto a frame
    pub fn write_picture(&self, canvas: &mut dyn Canvas) -> String {
        let layout = self.config.snapshot();
        self.renderer.render(canvas, &layout)
    }

    /// Publishes new settings from the host's settings dialog.
    ///
    /// Out-of-range alignment codes keep the current alignment; `caption`
    /// of `None` keeps the current template.
    pub fn apply_settings(
        &self,
        margin_percent: i32,
        align: u32,
        valign: u32,
        scale: f64,
        caption: Option<String>,
    ) {
        self.config.update(|layout: &mut LayoutConfig| {
            layout.margin_percent = margin_percent;
            match HorizontalAlign::try_from(align) {
                Ok(a) => layout.align = a,
                Err(e) => warn!("ignoring alignment from settings dialog: {e}"),
            }
            match VerticalAlign::try_from(valign) {
                Ok(v) => layout.valign = v,
                Err(e) => warn!("ignoring vertical alignment from settings dialog: {e}"),
            }
            if scale.is_finite() && scale > 0.0 {
                layout.scale = scale;
            } else {
                warn!("ignoring scale {scale} from settings dialog");
            }
            if let Some(caption) = caption {
                layout.template = caption;
            }
        });
        info!("settings updated from host");
    }

    pub fn set_window_position(&self, x: i32, y: i32) {
        self.config.set_window_position(WindowPosition { x, y });
    }
}
