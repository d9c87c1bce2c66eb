//! Museum catalog: rooms, photos, carousel images and quote tables.
//!
//! The catalog is read-only configuration. A built-in copy is embedded in
//! the crate and can be replaced by a JSON file at runtime.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MuseumError, Result};
use crate::layout_engine::Orientation;

const BUILTIN_MUSEUM: &str = include_str!("../data/museum.json");
const BUILTIN_CAROUSEL: &str = include_str!("../data/carousel.json");

/// Quote shown when an image has no entry in the quotes table
pub const FALLBACK_QUOTE: &str = "A moment captured in time.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub src: String,
    /// Low-quality placeholder shown while `src` decodes
    #[serde(default)]
    pub lqip: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub credit: String,
    #[serde(default)]
    pub aspect_ratio: Option<Orientation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Museum {
    pub default_room_id: String,
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselImage {
    pub src: String,
    pub alt: String,
    pub quote: String,
}

impl Museum {
    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_MUSEUM)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let museum = Self::from_json(&text)?;
        log::info!(
            "Loaded {} rooms with {} total photos from {}",
            museum.rooms.len(),
            museum.total_photos(),
            path.as_ref().display()
        );
        Ok(museum)
    }

    /// Load and reject catalogs with validation problems
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self> {
        let museum = Self::load(path)?;
        let errors = museum.validate();
        if errors.is_empty() {
            Ok(museum)
        } else {
            Err(MuseumError::InvalidCatalog(errors))
        }
    }

    pub fn room_by_id(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    pub fn room_index(&self, id: &str) -> Option<usize> {
        self.rooms.iter().position(|room| room.id == id)
    }

    pub fn total_photos(&self) -> usize {
        self.rooms.iter().map(|room| room.photos.len()).sum()
    }

    pub fn photo_count(&self, room_id: &str) -> usize {
        self.room_by_id(room_id).map_or(0, |room| room.photos.len())
    }

    /// Every problem found, in catalog order. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.default_room_id.is_empty() {
            errors.push("Default room ID is required".to_string());
        }

        for (room_index, room) in self.rooms.iter().enumerate() {
            if room.id.is_empty() {
                errors.push(format!("Room {}: ID is required", room_index));
            }
            if room.name.is_empty() {
                errors.push(format!("Room {}: Name is required", room_index));
            }

            for (photo_index, photo) in room.photos.iter().enumerate() {
                let photo_ref = format!("Room \"{}\" Photo {}", room.name, photo_index + 1);
                let required = [
                    ("src", &photo.src),
                    ("lqip", &photo.lqip),
                    ("title", &photo.title),
                    ("quote", &photo.quote),
                    ("alt text", &photo.alt),
                    ("credit", &photo.credit),
                ];
                for (field, value) in required {
                    if value.is_empty() {
                        errors.push(format!("{}: {} is required", photo_ref, field));
                    }
                }
            }
        }

        if !self.default_room_id.is_empty() && self.room_by_id(&self.default_room_id).is_none() {
            errors.push(format!(
                "Default room \"{}\" not found in rooms array",
                self.default_room_id
            ));
        }

        errors
    }
}

/// Carousel images shipped with the crate
pub fn builtin_carousel() -> Result<Vec<CarouselImage>> {
    Ok(serde_json::from_str(BUILTIN_CAROUSEL)?)
}

/// Quote lookup built from a `filename,quote` CSV.
///
/// Each entry is reachable through both its `.jpg` and `.png` names.
#[derive(Debug, Clone, Default)]
pub struct QuoteTable {
    quotes: HashMap<String, String>,
}

impl QuoteTable {
    pub fn parse_csv(text: &str) -> Self {
        let mut quotes = HashMap::new();

        // first line is the header
        for line in text.lines().skip(1) {
            let Some((filename, quote)) = parse_csv_line(line) else {
                continue;
            };
            let base = filename
                .strip_suffix(".jpg")
                .or_else(|| filename.strip_suffix(".png"))
                .unwrap_or(&filename);
            quotes.insert(format!("{}.jpg", base), quote.clone());
            quotes.insert(format!("{}.png", base), quote);
        }

        log::debug!("Loaded {} quotes", quotes.len());
        Self { quotes }
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.quotes.get(filename).map(String::as_str)
    }

    /// Quote for `filename`, or the fallback
    pub fn quote_for(&self, filename: &str) -> &str {
        self.get(filename).unwrap_or(FALLBACK_QUOTE)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

fn parse_csv_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    let (filename, quote) = line.split_once(',')?;
    let filename = filename.trim();
    let quote = quote
        .trim()
        .trim_start_matches('"')
        .trim_end_matches('"')
        .replace("\"\"", "\"");
    let quote = quote.trim();

    if filename.is_empty() || quote.is_empty() {
        return None;
    }
    Some((filename.to_string(), quote.to_string()))
}
