//! Error types for the museum crate.
//!
//! Nothing here is fatal to the gallery: callers at the edges log these and
//! continue with a default or skip the offending item.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MuseumError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("image {path} has invalid dimensions {width}x{height}")]
    InvalidImage { path: String, width: u32, height: u32 },

    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("invalid catalog: {}", .0.join("; "))]
    InvalidCatalog(Vec<String>),

    #[error("storage unavailable: {0}")]
    Storage(String),

    #[error("renderer: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, MuseumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_errors_are_joined() {
        let err = MuseumError::InvalidCatalog(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "invalid catalog: a; b");
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("nope");
        let err: MuseumError = parse.unwrap_err().into();
        assert!(matches!(err, MuseumError::Json(_)));
    }
}
