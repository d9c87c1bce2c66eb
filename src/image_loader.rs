//! Image measurement for layout. Only headers are decoded.

use std::collections::HashMap;
use std::path::Path;
use std::thread;

use crate::error::{MuseumError, Result};
use crate::layout_engine::ImageRecord;

/// Read natural size from the file header
pub fn measure(path: impl AsRef<Path>) -> Result<ImageRecord> {
    let path = path.as_ref();
    let (width, height) = image::image_dimensions(path).map_err(|source| MuseumError::Image {
        path: path.display().to_string(),
        source,
    })?;
    ImageRecord::new(path.display().to_string(), width, height)
}

/// Measure every path concurrently and wait for all of them. Failures are
/// logged and dropped; survivors keep their input order.
pub fn measure_all<P: AsRef<Path> + Sync>(paths: &[P]) -> Vec<ImageRecord> {
    let results: Vec<Result<ImageRecord>> = thread::scope(|scope| {
        let handles: Vec<_> = paths
            .iter()
            .map(|path| scope.spawn(move || measure(path)))
            .collect();
        handles
            .into_iter()
            .zip(paths)
            .map(|(handle, path)| {
                handle.join().unwrap_or_else(|_| {
                    Err(MuseumError::Io(std::io::Error::other(format!(
                        "measurement panicked for {}",
                        path.as_ref().display()
                    ))))
                })
            })
            .collect()
    });

    let total = results.len();
    let records: Vec<ImageRecord> = results
        .into_iter()
        .filter_map(|result| match result {
            Ok(record) => {
                log::debug!("Measured {} ({}x{})", record.src, record.width, record.height);
                Some(record)
            }
            Err(e) => {
                log::error!("Failed to load image: {}", e);
                None
            }
        })
        .collect();

    log::info!("Successfully loaded {} out of {} images", records.len(), total);
    records
}

/// Sizes of images that finished loading, keyed by source
#[derive(Debug, Default, Clone)]
pub struct PreloadCache {
    sizes: HashMap<String, (u32, u32)>,
}

impl PreloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, src: &str) -> bool {
        self.sizes.contains_key(src)
    }

    pub fn size(&self, src: &str) -> Option<(u32, u32)> {
        self.sizes.get(src).copied()
    }

    pub fn insert(&mut self, src: impl Into<String>, width: u32, height: u32) {
        self.sizes.insert(src.into(), (width, height));
    }

    /// Sources from `wanted` that still need fetching
    pub fn missing<'a>(&self, wanted: &'a [String]) -> Vec<&'a str> {
        wanted
            .iter()
            .map(String::as_str)
            .filter(|src| !self.contains(src))
            .collect()
    }

    /// Measure and remember local files; returns how many loaded
    pub fn load_files(&mut self, sources: &[String]) -> usize {
        let records = measure_all(sources);
        let loaded = records.len();
        for record in records {
            self.insert(record.src, record.width, record.height);
        }
        loaded
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> String {
        let path = dir.join(name);
        image::RgbImage::new(width, height).save(&path).unwrap();
        path.display().to_string()
    }

    #[test]
    fn measures_png_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 40, 30);

        let record = measure(&path).unwrap();
        assert_eq!((record.width, record.height), (40, 30));
        assert_eq!(record.src, path);
    }

    #[test]
    fn measure_all_skips_failures_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 10, 20);
        let missing = dir.path().join("missing.png").display().to_string();
        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        let b = write_png(dir.path(), "b.png", 30, 10);

        let paths = vec![a.clone(), missing, garbage.display().to_string(), b.clone()];
        let records = measure_all(&paths);
        let sources: Vec<&str> = records.iter().map(|r| r.src.as_str()).collect();
        assert_eq!(sources, vec![a.as_str(), b.as_str()]);
    }

    #[test]
    fn preload_cache_tracks_loaded_sources() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 8, 8);
        let wanted = vec![a.clone(), "remote/b.jpg".to_string()];

        let mut cache = PreloadCache::new();
        assert_eq!(cache.missing(&wanted).len(), 2);
        assert_eq!(cache.load_files(&wanted), 1);
        assert_eq!(cache.size(&a), Some((8, 8)));
        assert_eq!(cache.missing(&wanted), vec!["remote/b.jpg"]);
    }
}
