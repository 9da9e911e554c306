//! Flat key/value settings stores

use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name under the platform config directory
const APP_DIR: &str = "clockstamp";

/// File name of the JSON settings file
const SETTINGS_FILE: &str = "settings.json";

/// A single stored setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StoreValue {
    Dword(u32),
    Text(String),
}

impl StoreValue {
    pub fn as_dword(&self) -> Option<u32> {
        match self {
            Self::Dword(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Dword(_) => None,
        }
    }

    /// Converts one JSON value. Negative numbers that fit an `i32` are kept
    /// as their two's-complement dword, the way they are written back.
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => match n.as_u64() {
                Some(v) => u32::try_from(v).ok().map(Self::Dword),
                None => n
                    .as_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .map(|v| Self::Dword(v as u32)),
            },
            _ => None,
        }
    }
}

/// A persisted key/value settings store.
///
/// A missing key is never an error: `get` returns `Ok(None)` and the caller
/// keeps its default. `Err` is reserved for a store that cannot be reached.
pub trait ConfigStore {
    fn get(&self, key: &str) -> Result<Option<StoreValue>>;

    fn set(&mut self, key: &str, value: StoreValue) -> Result<()>;

    /// Persists pending writes
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Reads a numeric setting
    fn get_dword(&self, key: &str) -> Result<Option<u32>> {
        match self.get(key)? {
            None => Ok(None),
            Some(StoreValue::Dword(v)) => Ok(Some(v)),
            Some(StoreValue::Text(_)) => Err(Error::TypeMismatch {
                key: key.to_string(),
                expected: "number",
            }),
        }
    }

    /// Reads a text setting
    fn get_text(&self, key: &str) -> Result<Option<String>> {
        match self.get(key)? {
            None => Ok(None),
            Some(StoreValue::Text(s)) => Ok(Some(s)),
            Some(StoreValue::Dword(_)) => Err(Error::TypeMismatch {
                key: key.to_string(),
                expected: "string",
            }),
        }
    }
}

/// In-memory store, for hosts without persistence and for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, StoreValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoreValue>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: StoreValue) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings persisted as a flat JSON object on disk
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, StoreValue>,
    dirty: bool,
}

impl JsonFileStore {
    /// Opens the store at `path`. A file that does not exist yet is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => parse_entries(&path, &text)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "settings file not found, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    /// Opens the store at [`JsonFileStore::default_path`]
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// `<config dir>/clockstamp/settings.json`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
            .ok_or(Error::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes every stored value; takes effect on the next flush
    pub fn clear(&mut self) {
        self.values.clear();
        self.dirty = true;
    }

    /// Iterates stored values in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoreValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Reads a flat JSON object, dropping entries that are neither a dword nor
/// a string so one bad value cannot take the others down with it
fn parse_entries(path: &Path, text: &str) -> Result<BTreeMap<String, StoreValue>> {
    let raw: BTreeMap<String, Value> = serde_json::from_str(text)?;
    let mut values = BTreeMap::new();

    for (key, value) in raw {
        match StoreValue::from_json(&value) {
            Some(v) => {
                values.insert(key, v);
            }
            None => warn!(
                path = %path.display(),
                "ignoring setting {key}: unsupported value {value}"
            ),
        }
    }

    Ok(values)
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<StoreValue>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: StoreValue) -> Result<()> {
        if self.values.get(key) != Some(&value) {
            self.values.insert(key.to_string(), value);
            self.dirty = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty && self.path.exists() {
            return Ok(());
        }

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text)?;
        self.dirty = false;

        debug!(path = %self.path.display(), "settings written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("clockstamp-store-{}-{}", std::process::id(), name))
            .join(SETTINGS_FILE)
    }

    #[test]
    fn test_memory_store_get_set() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("Margin").unwrap(), None);

        store.set("Margin", StoreValue::Dword(5)).unwrap();
        store.set("Caption", StoreValue::Text("&h".into())).unwrap();

        assert_eq!(store.get_dword("Margin").unwrap(), Some(5));
        assert_eq!(store.get_text("Caption").unwrap().as_deref(), Some("&h"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_type_mismatch() {
        let mut store = MemoryStore::new();
        store.set("Margin", StoreValue::Text("wide".into())).unwrap();
        assert!(matches!(
            store.get_dword("Margin"),
            Err(Error::TypeMismatch { expected: "number", .. })
        ));
    }

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let store = JsonFileStore::open(temp_path("missing")).unwrap();
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn test_json_store_persists() {
        let path = temp_path("persist");
        let _ = fs::remove_file(&path);

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("Scale", StoreValue::Dword(250)).unwrap();
        store.set("Caption", StoreValue::Text("&y-&M-&d".into())).unwrap();
        store.flush().unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get_dword("Scale").unwrap(), Some(250));
        assert_eq!(reopened.get_text("Caption").unwrap().as_deref(), Some("&y-&M-&d"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_json_store_skips_bad_entries() {
        let path = temp_path("bad-entry");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"Margin": 5, "Caption": "&y", "Scale": 0.25, "WindowX": -5, "Align": null, "VAlign": 9999999999}"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get_dword("Margin").unwrap(), Some(5));
        assert_eq!(store.get_text("Caption").unwrap().as_deref(), Some("&y"));
        assert_eq!(store.get("Scale").unwrap(), None);
        assert_eq!(store.get("Align").unwrap(), None);
        assert_eq!(store.get("VAlign").unwrap(), None);
        assert_eq!(store.get_dword("WindowX").unwrap(), Some(-5i32 as u32));

        let state = crate::ConfigState::load(&store);
        let layout = state.snapshot();
        assert_eq!(layout.margin_percent, 5);
        assert_eq!(layout.template, "&y");
        assert_eq!(layout.scale, 0.2);
        assert_eq!(state.window_position().map(|w| w.x), Some(-5));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_json_store_clear() {
        let path = temp_path("clear");
        let _ = fs::remove_file(&path);

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("Margin", StoreValue::Dword(9)).unwrap();
        store.flush().unwrap();

        let mut reopened = JsonFileStore::open(&path).unwrap();
        reopened.clear();
        reopened.flush().unwrap();
        assert_eq!(JsonFileStore::open(&path).unwrap().iter().count(), 0);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_json_store_rejects_malformed_file() {
        let path = temp_path("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(JsonFileStore::open(&path), Err(Error::Json(_))));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
