//! Runtime configuration.
//!
//! Defaults are built in; a JSON file named by `MUSEUM_CONFIG` overrides
//! them field by field and `MUSEUM_STORE_DIR` overrides the store location.
//! Call `dotenv::dotenv()` first so a `.env` file can provide both.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{builtin_carousel, CarouselImage, Museum, QuoteTable};
use crate::entry::DEFAULT_PASSWORD;
use crate::error::Result;
use crate::layout_engine::DEFAULT_MARGIN;
use crate::storage::FileStore;

pub const CONFIG_ENV: &str = "MUSEUM_CONFIG";
pub const STORE_DIR_ENV: &str = "MUSEUM_STORE_DIR";

fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    800
}
fn default_margin() -> f32 {
    DEFAULT_MARGIN
}
fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}
fn default_store_dir() -> PathBuf {
    PathBuf::from(".museum")
}
fn default_base_url() -> String {
    "https://museum.local/rooms.html".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuseumConfig {
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Gap between collage items (px)
    #[serde(default = "default_margin")]
    pub margin: f32,
    #[serde(default = "default_password")]
    pub password: String,
    /// Catalog JSON; the built-in catalog is used when unset
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub carousel_path: Option<PathBuf>,
    /// Quotes CSV (`filename,quote`)
    #[serde(default)]
    pub quotes_path: Option<PathBuf>,
    /// Directory for persistent visitor preferences
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    /// Address the room browser starts from and keeps in sync
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for MuseumConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            margin: default_margin(),
            password: default_password(),
            catalog_path: None,
            carousel_path: None,
            quotes_path: None,
            store_dir: default_store_dir(),
            base_url: default_base_url(),
        }
    }
}

impl MuseumConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(CONFIG_ENV).filter(|path| !path.is_empty()) {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(dir) = lookup(STORE_DIR_ENV).filter(|dir| !dir.is_empty()) {
            config.store_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn museum(&self) -> Result<Museum> {
        match &self.catalog_path {
            Some(path) => Museum::load_validated(path),
            None => Museum::builtin(),
        }
    }

    pub fn carousel(&self) -> Result<Vec<CarouselImage>> {
        match &self.carousel_path {
            Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
            None => builtin_carousel(),
        }
    }

    /// Quote table; empty when no CSV is configured
    pub fn quotes(&self) -> Result<QuoteTable> {
        match &self.quotes_path {
            Some(path) => Ok(QuoteTable::parse_csv(&std::fs::read_to_string(path)?)),
            None => Ok(QuoteTable::default()),
        }
    }

    /// Persistent store for preferences such as the mute toggle
    pub fn local_store(&self) -> FileStore {
        FileStore::new(self.store_dir.join("local.json"))
    }
}
