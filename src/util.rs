//! Small helpers shared across the gallery views.

use rand::Rng;

/// Uniform sample in `[min, max)`; a degenerate range yields `min`
pub fn random_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

/// Uniform integer in `[min, max]`
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

/// `m:ss`
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u64;
    let remaining = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, remaining)
}

/// First `max_chars` characters followed by "..." when the text is longer
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

pub fn clamp_volume(volume: f32) -> f32 {
    volume.clamp(0.0, 1.0)
}

/// Trailing-edge debounce: only the last call in a quiet window fires.
#[derive(Debug, Clone)]
pub struct Debounce {
    wait_ms: u64,
    deadline: Option<u64>,
}

impl Debounce {
    pub fn new(wait_ms: u64) -> Self {
        Self {
            wait_ms,
            deadline: None,
        }
    }

    /// Record a call; restarts the quiet window
    pub fn call(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms + self.wait_ms);
    }

    /// True once the quiet window has passed since the last call
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Leading-edge throttle: at most one call per `limit_ms`.
#[derive(Debug, Clone)]
pub struct Throttle {
    limit_ms: u64,
    open_at: u64,
}

impl Throttle {
    pub fn new(limit_ms: u64) -> Self {
        Self {
            limit_ms,
            open_at: 0,
        }
    }

    pub fn try_call(&mut self, now_ms: u64) -> bool {
        if now_ms < self.open_at {
            return false;
        }
        self.open_at = now_ms + self.limit_ms;
        true
    }
}
