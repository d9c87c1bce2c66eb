//! Host-agnostic input events.

use serde::{Deserialize, Serialize};

/// Minimum horizontal travel for a touch swipe, in pixels
pub const MIN_SWIPE_DISTANCE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Space,
    Enter,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Swipe {
    /// Finger moved left: show the next item
    Left,
    Right,
}

impl Swipe {
    /// Classify a touch from start to end x; short moves are taps
    pub fn detect(start_x: f32, end_x: f32) -> Option<Swipe> {
        if (end_x - start_x).abs() <= MIN_SWIPE_DISTANCE {
            return None;
        }
        if end_x < start_x {
            Some(Swipe::Left)
        } else {
            Some(Swipe::Right)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swipe_needs_minimum_distance() {
        assert_eq!(Swipe::detect(200.0, 150.0), None);
        assert_eq!(Swipe::detect(200.0, 149.0), Some(Swipe::Left));
        assert_eq!(Swipe::detect(100.0, 170.0), Some(Swipe::Right));
    }
}
