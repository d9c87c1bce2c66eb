//! Full-size image modal shared by the carousel and grid views.

use crate::input::Key;
use crate::layout_engine::{modal_layout, Orientation};

#[derive(Debug, Clone, PartialEq)]
pub struct ModalContent {
    pub src: String,
    pub alt: String,
    pub quote: String,
}

/// How the modal arranges image and quote once the image size is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationRule {
    /// Landscape when wider than tall (museum frame)
    Frame,
    /// Landscape from aspect 1.2 up (side-by-side quote otherwise)
    Layout,
}

#[derive(Debug)]
pub struct ImageModal {
    rule: OrientationRule,
    content: Option<ModalContent>,
    orientation: Option<Orientation>,
}

impl ImageModal {
    pub fn new(rule: OrientationRule) -> Self {
        Self {
            rule,
            content: None,
            orientation: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.content.is_some()
    }

    pub fn content(&self) -> Option<&ModalContent> {
        self.content.as_ref()
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    pub fn open(&mut self, content: ModalContent) {
        log::debug!("Opening modal for: {}", content.alt);
        self.content = Some(content);
        self.orientation = None;
    }

    pub fn close(&mut self) {
        if self.content.take().is_some() {
            log::debug!("Modal closed");
        }
        self.orientation = None;
    }

    /// Escape closes an open modal; returns whether the key was consumed
    pub fn handle_key(&mut self, key: Key) -> bool {
        if key == Key::Escape && self.is_open() {
            self.close();
            return true;
        }
        false
    }

    /// The host decoded the displayed image
    pub fn image_loaded(&mut self, src: &str, width: u32, height: u32) {
        let Some(content) = &self.content else {
            return;
        };
        if content.src != src {
            return;
        }
        self.orientation = Some(match self.rule {
            OrientationRule::Frame if width > height => Orientation::Landscape,
            OrientationRule::Frame => Orientation::Portrait,
            OrientationRule::Layout => modal_layout(width, height),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(src: &str) -> ModalContent {
        ModalContent {
            src: src.to_string(),
            alt: "alt".to_string(),
            quote: "quote".to_string(),
        }
    }

    #[test]
    fn escape_closes() {
        let mut modal = ImageModal::new(OrientationRule::Frame);
        assert!(!modal.handle_key(Key::Escape));

        modal.open(content("a.jpg"));
        assert!(!modal.handle_key(Key::Enter));
        assert!(modal.handle_key(Key::Escape));
        assert!(!modal.is_open());
    }

    #[test]
    fn orientation_rules() {
        let mut frame = ImageModal::new(OrientationRule::Frame);
        frame.open(content("a.jpg"));
        frame.image_loaded("a.jpg", 1100, 1000);
        assert_eq!(frame.orientation(), Some(Orientation::Landscape));

        let mut layout = ImageModal::new(OrientationRule::Layout);
        layout.open(content("a.jpg"));
        layout.image_loaded("a.jpg", 1100, 1000);
        assert_eq!(layout.orientation(), Some(Orientation::Portrait));
    }

    #[test]
    fn stale_loads_are_ignored() {
        let mut modal = ImageModal::new(OrientationRule::Frame);
        modal.open(content("b.jpg"));
        modal.image_loaded("a.jpg", 1600, 900);
        assert_eq!(modal.orientation(), None);
    }
}
