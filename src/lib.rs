// Library exports for the native viewer, WebAssembly and tests
pub mod carousel;
pub mod catalog;
pub mod config;
pub mod cues;
pub mod entry;
pub mod error;
pub mod gallery;
pub mod image_loader;
pub mod input;
pub mod layout_engine;
pub mod modal;
pub mod particle_system;
pub mod renderer;
pub mod slideshow;
pub mod storage;
pub mod timers;
pub mod transition;
pub mod url_state;
pub mod util;

#[cfg(feature = "web")]
pub mod web;

// Re-export main types
pub use catalog::{Museum, Photo, QuoteTable, Room};
pub use config::MuseumConfig;
pub use entry::EntryHall;
pub use error::{MuseumError, Result};
pub use gallery::RoomBrowser;
pub use layout_engine::{CollageLayout, ImageRecord, LayoutEngine};
pub use particle_system::{BurstConfig, ConfettiInstance, Particle, ParticleSystem};
pub use renderer::Renderer;
pub use timers::{TimerId, Timers};
