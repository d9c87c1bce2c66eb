//! Alternative campus views: a single-image slideshow and a card grid.

use crate::catalog::Photo;
use crate::input::Key;
use crate::modal::{ImageModal, ModalContent, OrientationRule};
use crate::timers::Timers;
use crate::util::truncate_preview;

pub const FADE_OUT_MS: u64 = 300;
pub const FADE_IN_DELAY_MS: u64 = 50;
pub const PREVIEW_CHARS: usize = 80;
pub const EMPTY_PREVIEW: &str = "Click to view this image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fade {
    Swap,
    Shown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeState {
    /// Old image fading out
    Hidden,
    /// New image in place, fading in
    Showing,
    Visible,
}

/// One photo at a time with wrap-around navigation
#[derive(Debug)]
pub struct SingleImageGallery {
    photos: Vec<Photo>,
    index: usize,
    /// Index on screen; lags `index` until the fade-out finishes
    displayed: usize,
    is_animating: bool,
    fade: FadeState,
    timers: Timers<Fade>,
}

impl SingleImageGallery {
    pub fn new(photos: Vec<Photo>, now_ms: u64) -> Self {
        log::info!("Gallery initialized with {} images", photos.len());
        let mut gallery = Self {
            photos,
            index: 0,
            displayed: 0,
            is_animating: false,
            fade: FadeState::Visible,
            timers: Timers::new(),
        };
        gallery.display_current(now_ms);
        gallery
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_animating(&self) -> bool {
        self.is_animating
    }

    pub fn fade(&self) -> FadeState {
        self.fade
    }

    /// Photo currently on screen
    pub fn displayed(&self) -> Option<&Photo> {
        self.photos.get(self.displayed)
    }

    pub fn next(&mut self, now_ms: u64) {
        if self.is_animating || self.photos.is_empty() {
            return;
        }
        self.index = if self.index + 1 >= self.photos.len() { 0 } else { self.index + 1 };
        self.display_current(now_ms);
    }

    pub fn previous(&mut self, now_ms: u64) {
        if self.is_animating || self.photos.is_empty() {
            return;
        }
        self.index = if self.index == 0 { self.photos.len() - 1 } else { self.index - 1 };
        self.display_current(now_ms);
    }

    pub fn handle_key(&mut self, key: Key, now_ms: u64) {
        match key {
            Key::ArrowLeft => self.previous(now_ms),
            Key::ArrowRight => self.next(now_ms),
            _ => {}
        }
    }

    fn display_current(&mut self, now_ms: u64) {
        let Some(photo) = self.photos.get(self.index) else {
            return;
        };
        log::debug!(
            "Displaying image {}/{}: {}",
            self.index + 1,
            self.photos.len(),
            photo.title
        );
        self.is_animating = true;
        self.fade = FadeState::Hidden;
        self.timers.schedule(now_ms + FADE_OUT_MS, Fade::Swap);
    }

    pub fn tick(&mut self, now_ms: u64) {
        for step in self.timers.pop_due(now_ms) {
            match step {
                Fade::Swap => {
                    self.displayed = self.index;
                    self.fade = FadeState::Showing;
                    self.timers.schedule(now_ms + FADE_IN_DELAY_MS, Fade::Shown);
                }
                Fade::Shown => {
                    self.fade = FadeState::Visible;
                    self.is_animating = false;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageCard {
    pub src: String,
    pub alt: String,
    pub title: String,
    pub preview: String,
}

/// Quote preview shown on a grid card
pub fn card_preview(quote: &str) -> String {
    if quote.is_empty() {
        EMPTY_PREVIEW.to_string()
    } else {
        truncate_preview(quote, PREVIEW_CHARS)
    }
}

/// Grid of photo cards that open in a modal
#[derive(Debug)]
pub struct GridGallery {
    photos: Vec<Photo>,
    modal: ImageModal,
}

impl GridGallery {
    pub fn new(photos: Vec<Photo>) -> Self {
        Self {
            photos,
            modal: ImageModal::new(OrientationRule::Layout),
        }
    }

    pub fn cards(&self) -> Vec<ImageCard> {
        let cards: Vec<ImageCard> = self
            .photos
            .iter()
            .map(|photo| ImageCard {
                src: photo.src.clone(),
                alt: alt_or_title(photo).to_string(),
                title: photo.title.clone(),
                preview: card_preview(&photo.quote),
            })
            .collect();
        log::debug!("Generated {} image cards", cards.len());
        cards
    }

    pub fn open(&mut self, index: usize) {
        let Some(photo) = self.photos.get(index) else {
            return;
        };
        self.modal.open(ModalContent {
            src: photo.src.clone(),
            alt: alt_or_title(photo).to_string(),
            quote: photo.quote.clone(),
        });
        log::info!("Opened modal for image: {}", photo.title);
    }

    pub fn handle_key(&mut self, key: Key) {
        self.modal.handle_key(key);
    }

    pub fn modal(&self) -> &ImageModal {
        &self.modal
    }

    pub fn modal_mut(&mut self) -> &mut ImageModal {
        &mut self.modal
    }
}

fn alt_or_title(photo: &Photo) -> &str {
    if photo.alt.is_empty() {
        &photo.title
    } else {
        &photo.alt
    }
}

/// Staggered entrance animations for tiled views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stagger {
    /// Masonry columns: three-step wave
    Masonry,
    /// Collage: each tile slightly after the last
    Collage,
}

impl Stagger {
    pub fn delay_ms(&self, index: usize) -> u64 {
        match self {
            Stagger::Masonry => (index % 3) as u64 * 150,
            Stagger::Collage => index as u64 * 50,
        }
    }
}
