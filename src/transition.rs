//! Timed page sequences: the cinematic montage after the entry gate and the
//! typed welcome card.
//!
//! Both sequences are fully determined once started, so every step is put on
//! the timer queue up front and `tick` replays whatever has come due.

use crate::cues::Page;
use crate::timers::Timers;

pub const OVERLAY_DELAY_MS: u64 = 50;
pub const IMAGE_ACTIVATE_MS: u64 = 50;
pub const IMAGE_FADE_IN_MS: u64 = 400;
pub const IMAGE_HOLD_MS: u64 = 1800;
pub const IMAGE_REMOVE_MS: u64 = 800;
pub const TEXT_OVERLAY_FADE_MS: u64 = 1000;
pub const FINAL_TEXT_TRIGGER_MS: u64 = 100;
pub const FINAL_TEXT_FADE_MS: u64 = 1500;
pub const FINAL_HOLD_MS: u64 = 2500;
pub const EXIT_MS: u64 = 800;

pub const FINAL_TITLE: &str = "THE 4-YEAR CANVAS";
pub const FINAL_SUBTITLE: &str = "EVERY FRAME TELLS A CAMPUS STORY";

#[derive(Debug, Clone, PartialEq)]
pub struct MontageImage {
    pub src: String,
    pub title: String,
    pub portrait: bool,
}

impl MontageImage {
    fn landscape(src: &str, title: &str) -> Self {
        Self {
            src: src.to_string(),
            title: title.to_string(),
            portrait: false,
        }
    }
}

/// The curated montage shown after the gate
pub fn default_montage() -> Vec<MontageImage> {
    vec![
        MontageImage::landscape("assets/images/campus-001.jpg", "Campus Walkways"),
        MontageImage::landscape("assets/images/campus-002.jpg", "Academic Block"),
        MontageImage::landscape("assets/images/campus-003.jpg", "Desert Sunset"),
        MontageImage::landscape("assets/images/class-001.jpg", "Interactive Learning"),
        MontageImage::landscape("assets/images/labs-002.jpg", "Innovation Labs"),
        MontageImage::landscape("assets/images/sports-001.jpg", "Sports Facilities"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MontageCue {
    OverlayActive,
    ShowImage(usize),
    ImageActive(usize),
    FadeOutImage(usize),
    RemoveImage(usize),
    FadeTextOverlay,
    ShowFinalText,
    FinalTextVisible,
    Complete,
    Navigate(Page),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Preloading,
    Playing,
    Done,
}

/// Montage state as the view should render it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MontageView {
    pub overlay_active: bool,
    /// Image layers bottom to top, with whether each has faded in
    pub layers: Vec<(usize, bool)>,
    pub text_overlay_visible: bool,
    pub final_text: bool,
    pub final_text_visible: bool,
    pub complete: bool,
}

#[derive(Debug)]
pub struct CinematicTransition {
    images: Vec<MontageImage>,
    with_text_overlay: bool,
    phase: Phase,
    view: MontageView,
    timers: Timers<MontageCue>,
}

impl CinematicTransition {
    /// `with_text_overlay` adds the caption that fades after the first image
    pub fn new(images: Vec<MontageImage>, with_text_overlay: bool) -> Self {
        log::info!("Selected {} images for cinematic transition", images.len());
        Self {
            images,
            with_text_overlay,
            phase: Phase::Idle,
            view: MontageView::default(),
            timers: Timers::new(),
        }
    }

    /// The clean montage played after the entry gate: default images, no
    /// caption
    pub fn after_gate() -> Self {
        Self::new(default_montage(), false)
    }

    pub fn images(&self) -> &[MontageImage] {
        &self.images
    }

    pub fn view(&self) -> &MontageView {
        &self.view
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::Preloading | Phase::Playing)
    }

    /// Show the overlay and ask the host to preload every image. Ignored
    /// while a run is in progress.
    pub fn start(&mut self, now_ms: u64) -> Vec<&str> {
        if self.is_animating() {
            return Vec::new();
        }
        self.phase = Phase::Preloading;
        self.view = MontageView {
            text_overlay_visible: self.with_text_overlay,
            ..MontageView::default()
        };
        self.timers.clear();
        self.timers.schedule(now_ms + OVERLAY_DELAY_MS, MontageCue::OverlayActive);
        self.images.iter().map(|image| image.src.as_str()).collect()
    }

    /// Preloading finished (successfully or not); lay out the whole sequence
    pub fn images_ready(&mut self, now_ms: u64) {
        if self.phase != Phase::Preloading {
            return;
        }
        self.phase = Phase::Playing;

        let step = IMAGE_FADE_IN_MS + IMAGE_HOLD_MS;
        let mut at = now_ms;
        for index in 0..self.images.len() {
            self.timers.schedule(at, MontageCue::ShowImage(index));
            self.timers.schedule(at + IMAGE_ACTIVATE_MS, MontageCue::ImageActive(index));
            if index > 0 {
                self.timers.schedule(at, MontageCue::FadeOutImage(index - 1));
                self.timers.schedule(at + IMAGE_REMOVE_MS, MontageCue::RemoveImage(index - 1));
            }
            if index == 0 && self.with_text_overlay {
                self.timers.schedule(
                    at + IMAGE_FADE_IN_MS + TEXT_OVERLAY_FADE_MS,
                    MontageCue::FadeTextOverlay,
                );
            }
            at += step;
        }

        self.timers.schedule(at, MontageCue::ShowFinalText);
        self.timers.schedule(at + FINAL_TEXT_TRIGGER_MS, MontageCue::FinalTextVisible);
        let complete_at = at + FINAL_TEXT_FADE_MS + FINAL_HOLD_MS;
        self.timers.schedule(complete_at, MontageCue::Complete);
        self.timers.schedule(complete_at + EXIT_MS, MontageCue::Navigate(Page::Rooms));
    }

    pub fn tick(&mut self, now_ms: u64) -> Vec<MontageCue> {
        let cues = self.timers.pop_due(now_ms);
        for cue in &cues {
            match *cue {
                MontageCue::OverlayActive => self.view.overlay_active = true,
                MontageCue::ShowImage(index) => self.view.layers.push((index, false)),
                MontageCue::ImageActive(index) => {
                    if let Some(layer) = self.view.layers.iter_mut().find(|(i, _)| *i == index) {
                        layer.1 = true;
                    }
                }
                MontageCue::FadeOutImage(index) => {
                    if let Some(layer) = self.view.layers.iter_mut().find(|(i, _)| *i == index) {
                        layer.1 = false;
                    }
                }
                MontageCue::RemoveImage(index) => self.view.layers.retain(|(i, _)| *i != index),
                MontageCue::FadeTextOverlay => self.view.text_overlay_visible = false,
                MontageCue::ShowFinalText => self.view.final_text = true,
                MontageCue::FinalTextVisible => self.view.final_text_visible = true,
                MontageCue::Complete => self.view.complete = true,
                MontageCue::Navigate(_) => {
                    self.phase = Phase::Done;
                    log::info!("Cinematic transition finished");
                }
            }
        }
        cues
    }
}

pub const WELCOME_TEXT: &str = "Welcome";
pub const WELCOME_SUBTITLE: &str = "To the Gallery of Campus Memories";
pub const WELCOME_ENTER_MS: u64 = 100;
pub const LETTER_MS: u64 = 150;
pub const UNDERLINE_MS: u64 = 300;
pub const SUBTITLE_MS: u64 = 500;
pub const WELCOME_HOLD_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WelcomeCue {
    Active,
    Letter(usize),
    Underline,
    Subtitle,
    FadeOut,
    Navigate(Page),
}

/// Welcome card that types its greeting letter by letter
#[derive(Debug)]
pub struct WelcomeSequence {
    is_animating: bool,
    active: bool,
    typed: usize,
    typing: bool,
    underline: bool,
    subtitle: bool,
    fading: bool,
    timers: Timers<WelcomeCue>,
}

impl Default for WelcomeSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl WelcomeSequence {
    pub fn new() -> Self {
        Self {
            is_animating: false,
            active: false,
            typed: 0,
            typing: false,
            underline: false,
            subtitle: false,
            fading: false,
            timers: Timers::new(),
        }
    }

    pub fn show(&mut self, now_ms: u64) {
        if self.is_animating {
            return;
        }
        self.is_animating = true;
        self.timers.schedule(now_ms + WELCOME_ENTER_MS, WelcomeCue::Active);

        let mut at = now_ms;
        for index in 0..WELCOME_TEXT.chars().count() {
            at += LETTER_MS;
            self.timers.schedule(at, WelcomeCue::Letter(index));
        }
        at += UNDERLINE_MS;
        self.timers.schedule(at, WelcomeCue::Underline);
        at += SUBTITLE_MS;
        self.timers.schedule(at, WelcomeCue::Subtitle);
        at += WELCOME_HOLD_MS;
        self.timers.schedule(at, WelcomeCue::FadeOut);
        self.timers.schedule(at + EXIT_MS, WelcomeCue::Navigate(Page::Rooms));
    }

    pub fn is_animating(&self) -> bool {
        self.is_animating
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Greeting typed so far
    pub fn typed_text(&self) -> String {
        WELCOME_TEXT.chars().take(self.typed).collect()
    }

    /// Cursor shows while letters are still arriving
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn underline_visible(&self) -> bool {
        self.underline
    }

    pub fn subtitle_visible(&self) -> bool {
        self.subtitle
    }

    pub fn is_fading(&self) -> bool {
        self.fading
    }

    pub fn tick(&mut self, now_ms: u64) -> Vec<WelcomeCue> {
        let cues = self.timers.pop_due(now_ms);
        for cue in &cues {
            match *cue {
                WelcomeCue::Active => self.active = true,
                WelcomeCue::Letter(index) => {
                    self.typed = index + 1;
                    self.typing = true;
                }
                WelcomeCue::Underline => {
                    self.typing = false;
                    self.underline = true;
                }
                WelcomeCue::Subtitle => self.subtitle = true,
                WelcomeCue::FadeOut => self.fading = true,
                WelcomeCue::Navigate(_) => self.is_animating = false,
            }
        }
        cues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn montage_runs_to_rooms() {
        let mut montage = CinematicTransition::new(default_montage(), false);
        let preload = montage.start(0);
        assert_eq!(preload.len(), 6);
        assert!(montage.start(10).is_empty());

        montage.tick(50);
        assert!(montage.view().overlay_active);

        montage.images_ready(1000);
        montage.tick(1050);
        assert_eq!(montage.view().layers, vec![(0, true)]);

        // second image arrives and the first fades out beneath it
        montage.tick(3250);
        assert_eq!(montage.view().layers, vec![(0, false), (1, true)]);
        montage.tick(4000);
        assert_eq!(montage.view().layers, vec![(1, true)]);

        let last_image_at = 1000 + 5 * 2200;
        let final_at = last_image_at + 2200;
        montage.tick(final_at + 100);
        assert!(montage.view().final_text_visible);
        assert_eq!(montage.view().layers, vec![(5, true)]);
        assert!(!montage.view().complete);

        montage.tick(final_at + 4000);
        assert!(montage.view().complete);
        assert!(montage.is_animating());

        let cues = montage.tick(final_at + 4800);
        assert_eq!(cues, vec![MontageCue::Navigate(Page::Rooms)]);
        assert!(!montage.is_animating());
    }

    #[test]
    fn caption_fades_after_first_image() {
        let mut montage = CinematicTransition::new(default_montage(), true);
        montage.start(0);
        montage.images_ready(0);
        montage.tick(1399);
        assert!(montage.view().text_overlay_visible);
        montage.tick(1400);
        assert!(!montage.view().text_overlay_visible);
    }

    #[test]
    fn gate_montage_has_no_caption() {
        let mut montage = CinematicTransition::after_gate();
        assert_eq!(montage.start(0).len(), default_montage().len());
        assert!(!montage.view().text_overlay_visible);
        montage.images_ready(0);

        let mut cues = Vec::new();
        let mut now = 0;
        while now <= 30_000 {
            cues.extend(montage.tick(now));
            now += 100;
        }
        assert!(!cues.contains(&MontageCue::FadeTextOverlay));
        assert_eq!(cues.last(), Some(&MontageCue::Navigate(Page::Rooms)));
    }

    #[test]
    fn images_ready_requires_start() {
        let mut montage = CinematicTransition::new(default_montage(), false);
        montage.images_ready(0);
        assert!(montage.tick(100_000).is_empty());
    }

    #[test]
    fn welcome_types_letter_by_letter() {
        let mut welcome = WelcomeSequence::new();
        welcome.show(0);
        welcome.show(5);

        welcome.tick(100);
        assert!(welcome.is_active());
        assert_eq!(welcome.typed_text(), "");

        welcome.tick(450);
        assert_eq!(welcome.typed_text(), "Wel");
        assert!(welcome.is_typing());

        welcome.tick(1050);
        assert_eq!(welcome.typed_text(), WELCOME_TEXT);

        welcome.tick(1350);
        assert!(welcome.underline_visible());
        assert!(!welcome.is_typing());
        assert!(!welcome.subtitle_visible());

        welcome.tick(1850);
        assert!(welcome.subtitle_visible());

        welcome.tick(3850);
        assert!(welcome.is_fading());

        assert_eq!(welcome.tick(4650), vec![WelcomeCue::Navigate(Page::Rooms)]);
        assert!(!welcome.is_animating());
    }
}
