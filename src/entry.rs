//! Entry hall: the ticket modal and its password gate.
//!
//! The password is a narrative device, not access control.

use crate::cues::{AudioCue, Page, Sound};
use crate::storage::{self, KeyValueStore, TICKET_KEY, TICKET_OK};
use crate::timers::Timers;

pub const DEFAULT_PASSWORD: &str = "mediathon";
pub const INVALID_CODE_MESSAGE: &str = "Invalid access code. Please try again.";

/// Door click plays before the modal closes
pub const SUCCESS_DELAY_MS: u64 = 350;
/// Modal close animation before navigating away
pub const CLOSE_ANIMATION_MS: u64 = 300;
pub const SHAKE_MS: u64 = 500;

const DOOR_CLICK_VOLUME: f32 = 0.6;

/// True when the visitor already holds a ticket for this session
pub fn has_ticket(store: &dyn KeyValueStore) -> bool {
    storage::get::<Option<String>>(store, TICKET_KEY, None).as_deref() == Some(TICKET_OK)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryTimer {
    CloseModal,
    Navigate,
    StopShake,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryOutput {
    pub audio: Vec<AudioCue>,
    pub navigate: Option<Page>,
}

#[derive(Debug)]
pub struct EntryHall {
    password: String,
    modal_open: bool,
    error: Option<String>,
    shaking: bool,
    submitting: bool,
    timers: Timers<EntryTimer>,
}

impl EntryHall {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into().trim().to_lowercase(),
            modal_open: false,
            error: None,
            shaking: false,
            submitting: false,
            timers: Timers::new(),
        }
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Input is shaking after a wrong code
    pub fn is_shaking(&self) -> bool {
        self.shaking
    }

    /// Form is locked while the door opens
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn open_modal(&mut self) {
        self.modal_open = true;
        log::debug!("Modal opened");
    }

    pub fn close_modal(&mut self) {
        self.modal_open = false;
        self.clear_error();
        log::debug!("Modal closed");
    }

    /// Typing into the field clears the previous error
    pub fn clear_error(&mut self) {
        self.error = None;
        self.shaking = false;
    }

    pub fn escape(&mut self) {
        if self.modal_open {
            self.close_modal();
        }
    }

    pub fn is_valid_password(&self, input: &str) -> bool {
        input.trim().to_lowercase() == self.password
    }

    /// A returning visitor with a ticket skips the gate
    pub fn check_redirect(&mut self, store: &dyn KeyValueStore, now_ms: u64) -> bool {
        if has_ticket(store) {
            self.redirect(now_ms);
            return true;
        }
        false
    }

    /// Submit the form. Returns whether the code was accepted.
    pub fn submit(&mut self, input: &str, store: &mut dyn KeyValueStore, now_ms: u64) -> (bool, EntryOutput) {
        let mut output = EntryOutput::default();
        if self.submitting {
            return (false, output);
        }

        if self.is_valid_password(input) {
            log::info!("Password correct");
            self.clear_error();
            storage::set(store, TICKET_KEY, TICKET_OK);
            output.audio.push(AudioCue::play(Sound::DoorClick, DOOR_CLICK_VOLUME));
            self.submitting = true;
            self.timers.schedule(now_ms + SUCCESS_DELAY_MS, EntryTimer::CloseModal);
            (true, output)
        } else {
            log::info!("Password incorrect");
            self.error = Some(INVALID_CODE_MESSAGE.to_string());
            self.shaking = true;
            self.timers.schedule(now_ms + SHAKE_MS, EntryTimer::StopShake);
            (false, output)
        }
    }

    /// Drop the ticket so the gate shows again
    pub fn reset_authentication(&mut self, store: &mut dyn KeyValueStore) {
        storage::remove(store, TICKET_KEY);
        self.submitting = false;
        self.timers.clear();
        log::info!("Authentication reset");
    }

    pub fn tick(&mut self, now_ms: u64) -> EntryOutput {
        let mut output = EntryOutput::default();
        for timer in self.timers.pop_due(now_ms) {
            match timer {
                EntryTimer::CloseModal => self.redirect(now_ms),
                EntryTimer::Navigate => output.navigate = Some(Page::Transition),
                EntryTimer::StopShake => self.shaking = false,
            }
        }
        output
    }

    fn redirect(&mut self, now_ms: u64) {
        self.close_modal();
        self.timers.schedule(now_ms + CLOSE_ANIMATION_MS, EntryTimer::Navigate);
    }
}

impl Default for EntryHall {
    fn default() -> Self {
        Self::new(DEFAULT_PASSWORD)
    }
}
