//! Key/value storage for visitor flags.
//!
//! Values are stored as JSON text. The typed helpers never fail: absence,
//! read errors and parse errors all fall back to the caller's default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{MuseumError, Result};

/// Session flag set once the entry password is accepted
pub const TICKET_KEY: &str = "ticket";
pub const TICKET_OK: &str = "ok";
/// Persistent mute preference
pub const MUTED_KEY: &str = "gallery-muted";

pub trait KeyValueStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>>;
    fn set_raw(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Read `key` as JSON, falling back to `default`
pub fn get<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, default: T) -> T {
    match store.get_raw(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Error reading from storage ({}): {}", key, e);
                default
            }
        },
        Ok(None) => default,
        Err(e) => {
            log::warn!("Error reading from storage ({}): {}", key, e);
            default
        }
    }
}

/// Write `value` as JSON; false if the store refused it
pub fn set<T: Serialize + ?Sized>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> bool {
    let result = serde_json::to_string(value)
        .map_err(MuseumError::from)
        .and_then(|raw| store.set_raw(key, raw));
    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Error writing to storage ({}): {}", key, e);
            false
        }
    }
}

pub fn remove(store: &mut dyn KeyValueStore, key: &str) -> bool {
    match store.remove(key) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Error removing from storage ({}): {}", key, e);
            false
        }
    }
}

/// In-memory store; lives as long as the visit (session scope)
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.values.clear();
        Ok(())
    }
}

/// JSON object on disk; survives restarts (local scope)
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value);
        self.write_all(&values)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.write_all(&HashMap::new())
    }
}

/// Browser `localStorage` / `sessionStorage`
#[cfg(feature = "web")]
pub struct WebStorage {
    storage: web_sys::Storage,
}

#[cfg(feature = "web")]
impl WebStorage {
    pub fn local() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| MuseumError::Storage("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|e| MuseumError::Storage(format!("{:?}", e)))?
            .ok_or_else(|| MuseumError::Storage("localStorage disabled".into()))?;
        Ok(Self { storage })
    }

    pub fn session() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| MuseumError::Storage("no window".into()))?;
        let storage = window
            .session_storage()
            .map_err(|e| MuseumError::Storage(format!("{:?}", e)))?
            .ok_or_else(|| MuseumError::Storage("sessionStorage disabled".into()))?;
        Ok(Self { storage })
    }
}

#[cfg(feature = "web")]
impl KeyValueStore for WebStorage {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| MuseumError::Storage(format!("{:?}", e)))
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<()> {
        self.storage
            .set_item(key, &value)
            .map_err(|e| MuseumError::Storage(format!("{:?}", e)))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| MuseumError::Storage(format!("{:?}", e)))
    }

    fn clear(&mut self) -> Result<()> {
        self.storage
            .clear()
            .map_err(|e| MuseumError::Storage(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_default() {
        let store = MemoryStore::new();
        assert!(!get(&store, MUTED_KEY, false));
    }

    #[test]
    fn values_round_trip_as_json() {
        let mut store = MemoryStore::new();
        assert!(set(&mut store, TICKET_KEY, TICKET_OK));
        assert_eq!(store.get_raw(TICKET_KEY).unwrap().as_deref(), Some("\"ok\""));
        assert_eq!(get::<String>(&store, TICKET_KEY, String::new()), "ok");

        assert!(remove(&mut store, TICKET_KEY));
        assert_eq!(get::<Option<String>>(&store, TICKET_KEY, None), None);
    }

    #[test]
    fn corrupt_values_fall_back() {
        let mut store = MemoryStore::new();
        store.set_raw(MUTED_KEY, "{not json".to_string()).unwrap();
        assert!(get(&store, MUTED_KEY, true));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = FileStore::new(&path);
        assert!(set(&mut store, MUTED_KEY, &true));

        let reopened = FileStore::new(&path);
        assert!(get(&reopened, MUTED_KEY, false));

        let mut reopened = reopened;
        reopened.clear().unwrap();
        assert!(!get(&reopened, MUTED_KEY, false));
    }

    #[test]
    fn unreadable_file_store_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = FileStore::new(&path);
        assert!(store.get_raw(MUTED_KEY).is_err());
        assert!(get(&store, MUTED_KEY, true));
    }
}
