//! Hero carousel on the entry page: autoplaying slides with drag support.

use crate::catalog::CarouselImage;
use crate::input::Key;
use crate::modal::{ImageModal, ModalContent, OrientationRule};
use crate::timers::{TimerId, Timers};

/// Slide reveal animation
pub const REVEAL_MS: u64 = 1200;
/// Linger after the reveal
pub const HOLD_MS: u64 = 3800;
pub const AUTO_MS: u64 = REVEAL_MS + HOLD_MS;
/// Fraction of the viewport width a drag must cover to change slides
pub const DRAG_THRESHOLD: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    start_x: f32,
    current_x: f32,
}

#[derive(Debug)]
pub struct HeroCarousel {
    slides: Vec<CarouselImage>,
    index: usize,
    viewport_width: f32,
    drag: Option<Drag>,
    auto_timer: Option<TimerId>,
    timers: Timers<()>,
    modal: ImageModal,
}

impl HeroCarousel {
    pub fn new(slides: Vec<CarouselImage>, viewport_width: f32, now_ms: u64) -> Self {
        log::info!("Carousel initialized with {} slides", slides.len());
        let mut carousel = Self {
            slides,
            index: 0,
            viewport_width,
            drag: None,
            auto_timer: None,
            timers: Timers::new(),
            modal: ImageModal::new(OrientationRule::Frame),
        };
        if !carousel.slides.is_empty() {
            carousel.restart_auto(now_ms);
        }
        carousel
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn current(&self) -> Option<&CarouselImage> {
        self.slides.get(self.index)
    }

    fn last(&self) -> usize {
        self.slides.len().saturating_sub(1)
    }

    pub fn prev_disabled(&self) -> bool {
        self.index == 0
    }

    pub fn next_disabled(&self) -> bool {
        self.index == self.last()
    }

    /// Neighbours to fetch ahead of time
    pub fn preload(&self) -> Vec<&str> {
        let mut sources = Vec::new();
        if self.index > 0 {
            sources.push(self.slides[self.index - 1].src.as_str());
        }
        if let Some(next) = self.slides.get(self.index + 1) {
            sources.push(next.src.as_str());
        }
        sources
    }

    /// Track offset in percent; follows the finger while dragging
    pub fn track_offset(&self) -> f32 {
        let base = -(self.index as f32 * 100.0);
        match self.drag {
            Some(drag) if self.viewport_width > 0.0 => {
                base + (drag.current_x - drag.start_x) / self.viewport_width * 100.0
            }
            _ => base,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn resize(&mut self, viewport_width: f32) {
        self.viewport_width = viewport_width;
    }

    /// Jump to `n`, clamped to the slide range
    pub fn go(&mut self, n: isize, now_ms: u64) {
        if self.slides.is_empty() {
            return;
        }
        self.index = n.clamp(0, self.last() as isize) as usize;
        self.restart_auto(now_ms);
    }

    pub fn next(&mut self, now_ms: u64) {
        self.cancel_auto();
        self.go(self.index as isize + 1, now_ms);
    }

    pub fn prev(&mut self, now_ms: u64) {
        self.cancel_auto();
        self.go(self.index as isize - 1, now_ms);
    }

    pub fn handle_key(&mut self, key: Key, now_ms: u64) {
        if self.modal.handle_key(key) {
            return;
        }
        match key {
            Key::ArrowRight => self.next(now_ms),
            Key::ArrowLeft => self.prev(now_ms),
            _ => {}
        }
    }

    pub fn pointer_down(&mut self, x: f32) {
        self.drag = Some(Drag {
            start_x: x,
            current_x: x,
        });
        self.cancel_auto();
    }

    pub fn pointer_move(&mut self, x: f32) {
        if let Some(drag) = &mut self.drag {
            drag.current_x = x;
        }
    }

    /// Release a drag: far enough right goes back, far enough left goes
    /// forward, anything else snaps back in place
    pub fn pointer_up(&mut self, now_ms: u64) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let dx = drag.current_x - drag.start_x;
        let threshold = self.viewport_width * DRAG_THRESHOLD;
        if dx > threshold {
            self.prev(now_ms);
        } else if dx < -threshold {
            self.next(now_ms);
        } else {
            self.go(self.index as isize, now_ms);
        }
    }

    /// Clicking a slide opens it full size
    pub fn open_slide(&mut self, index: usize) {
        if let Some(slide) = self.slides.get(index) {
            self.modal.open(ModalContent {
                src: slide.src.clone(),
                alt: slide.alt.clone(),
                quote: slide.quote.clone(),
            });
        }
    }

    pub fn modal(&self) -> &ImageModal {
        &self.modal
    }

    pub fn modal_mut(&mut self) -> &mut ImageModal {
        &mut self.modal
    }

    pub fn tick(&mut self, now_ms: u64) {
        if self.timers.pop_due(now_ms).is_empty() {
            return;
        }
        self.auto_timer = None;
        let target = if self.index < self.last() { self.index + 1 } else { 0 };
        self.go(target as isize, now_ms);
    }

    fn restart_auto(&mut self, now_ms: u64) {
        self.cancel_auto();
        self.auto_timer = Some(self.timers.schedule(now_ms + AUTO_MS, ()));
    }

    fn cancel_auto(&mut self) {
        if let Some(id) = self.auto_timer.take() {
            self.timers.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_carousel;

    fn carousel() -> HeroCarousel {
        HeroCarousel::new(builtin_carousel().unwrap(), 1000.0, 0)
    }

    #[test]
    fn go_clamps_to_range() {
        let mut c = carousel();
        c.go(-3, 0);
        assert_eq!(c.index(), 0);
        assert!(c.prev_disabled());

        c.go(99, 0);
        assert_eq!(c.index(), 14);
        assert!(c.next_disabled());
        assert_eq!(c.preload().len(), 1);
    }

    #[test]
    fn autoplay_advances_and_wraps() {
        let mut c = carousel();
        c.tick(AUTO_MS - 1);
        assert_eq!(c.index(), 0);
        c.tick(AUTO_MS);
        assert_eq!(c.index(), 1);

        c.go(14, AUTO_MS);
        c.tick(2 * AUTO_MS);
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn manual_navigation_restarts_autoplay() {
        let mut c = carousel();
        c.handle_key(Key::ArrowRight, 4000);
        assert_eq!(c.index(), 1);
        c.tick(AUTO_MS);
        assert_eq!(c.index(), 1);
        c.tick(4000 + AUTO_MS);
        assert_eq!(c.index(), 2);
    }

    #[test]
    fn drag_past_threshold_changes_slide() {
        let mut c = carousel();
        c.go(3, 0);

        c.pointer_down(500.0);
        c.pointer_move(300.0);
        assert!((c.track_offset() + 320.0).abs() < 1e-3);
        c.pointer_up(10);
        assert_eq!(c.index(), 4);

        c.pointer_down(500.0);
        c.pointer_move(600.0);
        c.pointer_up(20);
        assert_eq!(c.index(), 4);
        assert_eq!(c.track_offset(), -400.0);

        c.pointer_down(500.0);
        c.pointer_move(700.0);
        c.pointer_up(30);
        assert_eq!(c.index(), 3);
    }

    #[test]
    fn autoplay_paused_while_dragging() {
        let mut c = carousel();
        c.pointer_down(100.0);
        c.tick(AUTO_MS * 3);
        assert_eq!(c.index(), 0);
        assert!(c.is_dragging());
    }

    #[test]
    fn slides_open_in_modal() {
        let mut c = carousel();
        c.open_slide(2);
        assert!(c.modal().is_open());
        c.handle_key(Key::Escape, 0);
        assert!(!c.modal().is_open());
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn empty_carousel_is_inert() {
        let mut c = HeroCarousel::new(Vec::new(), 800.0, 0);
        c.go(2, 0);
        c.tick(AUTO_MS);
        assert!(c.current().is_none());
    }
}
