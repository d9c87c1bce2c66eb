//! Room browser: one photo at a time, moving through rooms in order.

use std::collections::{HashMap, HashSet};

use url::Url;

use crate::catalog::{Museum, Photo, Room};
use crate::cues::{AudioCue, Page, Sound};
use crate::entry::has_ticket;
use crate::error::{MuseumError, Result};
use crate::input::{Key, Swipe};
use crate::layout_engine::{frame_orientation, Orientation};
use crate::particle_system::BurstConfig;
use crate::storage::{self, KeyValueStore, MUTED_KEY};
use crate::timers::Timers;
use crate::url_state::{self, ViewParams};

pub const SLIDE_MS: u64 = 300;
pub const CLAP_ANIMATION_MS: u64 = 300;
pub const APPLAUSE_MS: u64 = 3000;
const CLAP_VOLUME: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BrowserTimer {
    Slide { room: usize, photo: usize },
    ClapDone,
    StopApplause,
}

/// What the host should do after an input or a tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowserOutput {
    pub audio: Vec<AudioCue>,
    pub confetti: Option<BurstConfig>,
    /// Images worth fetching ahead of time
    pub preload: Vec<String>,
}

impl BrowserOutput {
    fn merge(&mut self, other: BrowserOutput) {
        self.audio.extend(other.audio);
        if other.confetti.is_some() {
            self.confetti = other.confetti;
        }
        self.preload.extend(other.preload);
    }
}

/// Everything needed to draw the current photo
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoView<'a> {
    pub room_name: &'a str,
    pub photo: &'a Photo,
    /// 1-based
    pub position: usize,
    pub total: usize,
    /// LQIP until the full image has loaded
    pub image_src: &'a str,
    pub is_placeholder: bool,
    pub orientation: Option<Orientation>,
    pub has_prev: bool,
    pub has_next: bool,
    pub claps: u32,
    pub is_clapping: bool,
    pub muted: bool,
    pub slide: Option<SlideDirection>,
}

/// Redirect target when the visitor has no ticket
pub fn check_auth(session: &dyn KeyValueStore) -> Option<Page> {
    if has_ticket(session) {
        None
    } else {
        log::info!("No valid ticket found, redirecting to entry");
        Some(Page::Entry)
    }
}

#[derive(Debug)]
pub struct RoomBrowser {
    museum: Museum,
    room_index: usize,
    photo_index: usize,
    url: Url,
    muted: bool,
    is_transitioning: bool,
    slide: Option<SlideDirection>,
    clapping: bool,
    /// Per session, keyed by (room, photo)
    clap_counts: HashMap<(usize, usize), u32>,
    loaded: HashSet<String>,
    orientation: Option<Orientation>,
    timers: Timers<BrowserTimer>,
}

impl RoomBrowser {
    /// Open the browser at the view named by `url`
    pub fn new(museum: Museum, url: Url, local: &dyn KeyValueStore) -> Result<(Self, BrowserOutput)> {
        if museum.rooms.is_empty() {
            return Err(MuseumError::RoomNotFound(museum.default_room_id.clone()));
        }

        let (room_index, photo_index) = ViewParams::from_url(&url).resolve(&museum);
        let muted = storage::get(local, MUTED_KEY, false);

        let mut browser = Self {
            museum,
            room_index,
            photo_index,
            url,
            muted,
            is_transitioning: false,
            slide: None,
            clapping: false,
            clap_counts: HashMap::new(),
            loaded: HashSet::new(),
            orientation: None,
            timers: Timers::new(),
        };
        let output = browser.load_room(room_index, photo_index);
        log::info!("Gallery initialized with {} rooms", browser.museum.rooms.len());
        Ok((browser, output))
    }

    pub fn museum(&self) -> &Museum {
        &self.museum
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn room_index(&self) -> usize {
        self.room_index
    }

    pub fn photo_index(&self) -> usize {
        self.photo_index
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_transitioning(&self) -> bool {
        self.is_transitioning
    }

    pub fn room_names(&self) -> Vec<&str> {
        self.museum.rooms.iter().map(|room| room.name.as_str()).collect()
    }

    pub fn current_room(&self) -> &Room {
        &self.museum.rooms[self.room_index]
    }

    pub fn current_photo(&self) -> Option<&Photo> {
        self.current_room().photos.get(self.photo_index)
    }

    pub fn clap_count(&self, room: usize, photo: usize) -> u32 {
        self.clap_counts.get(&(room, photo)).copied().unwrap_or(0)
    }

    pub fn has_prev(&self) -> bool {
        self.photo_index > 0 || self.room_index > 0
    }

    pub fn has_next(&self) -> bool {
        self.photo_index + 1 < self.current_room().photos.len()
            || self.room_index + 1 < self.museum.rooms.len()
    }

    pub fn view(&self) -> Option<PhotoView<'_>> {
        let room = self.current_room();
        let photo = room.photos.get(self.photo_index)?;
        let loaded = self.loaded.contains(&photo.src);
        let image_src = if loaded || photo.lqip.is_empty() {
            photo.src.as_str()
        } else {
            photo.lqip.as_str()
        };

        Some(PhotoView {
            room_name: &room.name,
            photo,
            position: self.photo_index + 1,
            total: room.photos.len(),
            image_src,
            is_placeholder: !loaded,
            orientation: self.orientation.or(photo.aspect_ratio),
            has_prev: self.has_prev(),
            has_next: self.has_next(),
            claps: self.clap_count(self.room_index, self.photo_index),
            is_clapping: self.clapping,
            muted: self.muted,
            slide: self.slide,
        })
    }

    /// Show a room at a photo. Rooms out of range or without photos are
    /// ignored; an out-of-range photo falls back to the first.
    pub fn load_room(&mut self, room_index: usize, photo_index: usize) -> BrowserOutput {
        let Some(room) = self.museum.rooms.get(room_index) else {
            return BrowserOutput::default();
        };
        if room.photos.is_empty() {
            return BrowserOutput::default();
        }
        let photo_index = if photo_index < room.photos.len() { photo_index } else { 0 };

        self.room_index = room_index;
        self.photo_index = photo_index;
        self.orientation = None;
        url_state::write_view(&mut self.url, &room.id, photo_index);

        log::info!(
            "Loaded room: {}, photo: {}/{}",
            room.name,
            photo_index + 1,
            room.photos.len()
        );

        let mut output = BrowserOutput::default();
        let current = &room.photos[photo_index];
        if !self.loaded.contains(&current.src) {
            output.preload.push(current.src.clone());
        }
        output.preload.extend(self.adjacent_to_preload());
        output
    }

    /// Neighbours in the same room that have not loaded yet
    fn adjacent_to_preload(&self) -> Vec<String> {
        let photos = &self.current_room().photos;
        let mut sources = Vec::new();
        if let Some(next) = photos.get(self.photo_index + 1) {
            sources.push(next.src.clone());
        }
        if self.photo_index > 0 {
            sources.push(photos[self.photo_index - 1].src.clone());
        }
        sources.retain(|src| !self.loaded.contains(src));
        sources
    }

    /// The host finished decoding `src`
    pub fn image_loaded(&mut self, src: &str, width: u32, height: u32) {
        self.loaded.insert(src.to_string());
        if self.current_photo().is_some_and(|photo| photo.src == src) {
            self.orientation = Some(frame_orientation(width, height));
        }
    }

    pub fn image_failed(&mut self, src: &str) {
        log::error!("Failed to load image: {}", src);
    }

    pub fn next_photo(&mut self, now_ms: u64) {
        if self.is_transitioning {
            return;
        }
        if self.photo_index + 1 < self.current_room().photos.len() {
            self.slide_to(self.room_index, self.photo_index + 1, SlideDirection::Left, now_ms);
        } else if self.room_index + 1 < self.museum.rooms.len() {
            self.slide_to(self.room_index + 1, 0, SlideDirection::Left, now_ms);
        }
    }

    pub fn previous_photo(&mut self, now_ms: u64) {
        if self.is_transitioning {
            return;
        }
        if self.photo_index > 0 {
            self.slide_to(self.room_index, self.photo_index - 1, SlideDirection::Right, now_ms);
        } else if self.room_index > 0 {
            let last = self.museum.rooms[self.room_index - 1].photos.len().saturating_sub(1);
            self.slide_to(self.room_index - 1, last, SlideDirection::Right, now_ms);
        }
    }

    pub fn change_room(&mut self, room_index: usize, now_ms: u64) {
        if room_index == self.room_index || self.is_transitioning {
            return;
        }
        self.slide_to(room_index, 0, SlideDirection::Left, now_ms);
    }

    fn slide_to(&mut self, room: usize, photo: usize, direction: SlideDirection, now_ms: u64) {
        self.is_transitioning = true;
        self.slide = Some(direction);
        self.timers.schedule(now_ms + SLIDE_MS, BrowserTimer::Slide { room, photo });
    }

    pub fn clap(&mut self, now_ms: u64) -> BrowserOutput {
        let mut output = BrowserOutput::default();
        let Some(title) = self.current_photo().map(|photo| photo.title.clone()) else {
            return output;
        };

        let count = self
            .clap_counts
            .entry((self.room_index, self.photo_index))
            .or_insert(0);
        *count += 1;
        let total = *count;

        self.clapping = true;
        self.timers.schedule(now_ms + CLAP_ANIMATION_MS, BrowserTimer::ClapDone);

        if !self.muted {
            output.audio.push(AudioCue::play(Sound::Clap, CLAP_VOLUME));
            output.audio.push(AudioCue::looped(Sound::Applause, CLAP_VOLUME));
            self.timers.schedule(now_ms + APPLAUSE_MS, BrowserTimer::StopApplause);
        }

        output.confetti = Some(BurstConfig::clap());
        log::info!("Clapped for photo: {}, total: {}", title, total);
        output
    }

    /// Flip and persist the mute preference
    pub fn toggle_mute(&mut self, local: &mut dyn KeyValueStore) -> BrowserOutput {
        self.muted = !self.muted;
        storage::set(local, MUTED_KEY, &self.muted);

        let mut output = BrowserOutput::default();
        if self.muted {
            output.audio.push(AudioCue::Stop(Sound::Applause));
        }
        log::info!("Audio {}", if self.muted { "muted" } else { "unmuted" });
        output
    }

    /// Keys are ignored while the visitor is typing in a text field
    pub fn handle_key(
        &mut self,
        key: Key,
        typing: bool,
        local: &mut dyn KeyValueStore,
        now_ms: u64,
    ) -> BrowserOutput {
        if typing {
            return BrowserOutput::default();
        }
        match key {
            Key::ArrowLeft | Key::ArrowUp => {
                self.previous_photo(now_ms);
                BrowserOutput::default()
            }
            Key::ArrowRight | Key::ArrowDown => {
                self.next_photo(now_ms);
                BrowserOutput::default()
            }
            Key::Space | Key::Enter => self.clap(now_ms),
            Key::Char('m') | Key::Char('M') => self.toggle_mute(local),
            _ => BrowserOutput::default(),
        }
    }

    pub fn swipe(&mut self, start_x: f32, end_x: f32, now_ms: u64) {
        match Swipe::detect(start_x, end_x) {
            Some(Swipe::Left) => self.next_photo(now_ms),
            Some(Swipe::Right) => self.previous_photo(now_ms),
            None => {}
        }
    }

    pub fn next_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    pub fn tick(&mut self, now_ms: u64) -> BrowserOutput {
        let mut output = BrowserOutput::default();
        for timer in self.timers.pop_due(now_ms) {
            match timer {
                BrowserTimer::Slide { room, photo } => {
                    output.merge(self.load_room(room, photo));
                    self.slide = None;
                    self.is_transitioning = false;
                }
                BrowserTimer::ClapDone => self.clapping = false,
                BrowserTimer::StopApplause => output.audio.push(AudioCue::Stop(Sound::Applause)),
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, TICKET_KEY, TICKET_OK};

    fn open(query: &str) -> (RoomBrowser, MemoryStore) {
        let store = MemoryStore::new();
        let url = Url::parse(&format!("https://museum.test/rooms.html{}", query)).unwrap();
        let (browser, _) = RoomBrowser::new(Museum::builtin().unwrap(), url, &store).unwrap();
        (browser, store)
    }

    fn step_next(browser: &mut RoomBrowser, now: &mut u64) {
        browser.next_photo(*now);
        *now += SLIDE_MS;
        browser.tick(*now);
    }

    #[test]
    fn auth_requires_ticket() {
        let mut session = MemoryStore::new();
        assert_eq!(check_auth(&session), Some(Page::Entry));
        storage::set(&mut session, TICKET_KEY, TICKET_OK);
        assert_eq!(check_auth(&session), None);
    }

    #[test]
    fn starts_from_url() {
        let (browser, _) = open("?room=labs&i=2");
        assert_eq!((browser.room_index(), browser.photo_index()), (2, 1));
        let view = browser.view().unwrap();
        assert_eq!(view.position, 2);
        assert_eq!(view.total, 2);
        assert!(view.is_placeholder);
    }

    #[test]
    fn next_crosses_into_following_room() {
        let (mut browser, _) = open("?room=labs&i=2");
        let mut now = 0;
        step_next(&mut browser, &mut now);
        assert_eq!((browser.room_index(), browser.photo_index()), (3, 0));
        assert_eq!(url_state::get_param(browser.url(), "room").as_deref(), Some("sports"));
        assert_eq!(url_state::get_param(browser.url(), "i").as_deref(), Some("1"));
    }

    #[test]
    fn previous_lands_on_last_photo_of_previous_room() {
        let (mut browser, _) = open("?room=class");
        browser.previous_photo(0);
        browser.tick(SLIDE_MS);
        assert_eq!((browser.room_index(), browser.photo_index()), (0, 6));
    }

    #[test]
    fn ends_of_the_museum_do_not_move() {
        let (mut browser, _) = open("");
        assert!(!browser.has_prev());
        browser.previous_photo(0);
        assert!(!browser.is_transitioning());

        let (mut browser, _) = open("?room=projects&i=2");
        assert!(!browser.has_next());
        browser.next_photo(0);
        assert!(!browser.is_transitioning());
    }

    #[test]
    fn navigation_is_ignored_mid_slide() {
        let (mut browser, _) = open("");
        browser.next_photo(0);
        browser.next_photo(100);
        browser.change_room(3, 150);
        assert_eq!(browser.view().unwrap().slide, Some(SlideDirection::Left));

        browser.tick(SLIDE_MS);
        assert_eq!((browser.room_index(), browser.photo_index()), (0, 1));
        assert!(!browser.is_transitioning());
        assert!(browser.tick(10_000).audio.is_empty());
    }

    #[test]
    fn change_room_ignores_current_room() {
        let (mut browser, _) = open("?room=labs");
        browser.change_room(2, 0);
        assert!(!browser.is_transitioning());
        browser.change_room(4, 0);
        browser.tick(SLIDE_MS);
        assert_eq!((browser.room_index(), browser.photo_index()), (4, 0));
    }

    #[test]
    fn claps_count_per_photo() {
        let (mut browser, _) = open("");
        let output = browser.clap(0);
        browser.clap(10);
        assert_eq!(browser.clap_count(0, 0), 2);
        assert_eq!(output.confetti, Some(BurstConfig::clap()));
        assert_eq!(
            output.audio,
            vec![
                AudioCue::play(Sound::Clap, 0.4),
                AudioCue::looped(Sound::Applause, 0.4)
            ]
        );
        assert!(browser.view().unwrap().is_clapping);

        let mut now = 20;
        step_next(&mut browser, &mut now);
        assert_eq!(browser.view().unwrap().claps, 0);
        assert!(!browser.view().unwrap().is_clapping);

        let stops = browser.tick(3010).audio;
        assert_eq!(stops, vec![AudioCue::Stop(Sound::Applause); 2]);
    }

    #[test]
    fn mute_persists_and_silences_claps() {
        let (mut browser, mut store) = open("");
        let output = browser.handle_key(Key::Char('M'), false, &mut store, 0);
        assert_eq!(output.audio, vec![AudioCue::Stop(Sound::Applause)]);
        assert!(storage::get(&store, MUTED_KEY, false));

        let output = browser.handle_key(Key::Space, false, &mut store, 0);
        assert!(output.audio.is_empty());
        assert!(output.confetti.is_some());

        let url = browser.url().clone();
        let (reopened, _) = RoomBrowser::new(Museum::builtin().unwrap(), url, &store).unwrap();
        assert!(reopened.is_muted());
    }

    #[test]
    fn keys_ignored_while_typing() {
        let (mut browser, mut store) = open("");
        browser.handle_key(Key::ArrowRight, true, &mut store, 0);
        assert!(!browser.is_transitioning());
        browser.handle_key(Key::ArrowDown, false, &mut store, 0);
        assert!(browser.is_transitioning());
    }

    #[test]
    fn swipe_left_goes_forward() {
        let (mut browser, _) = open("");
        browser.swipe(300.0, 260.0, 0);
        assert!(!browser.is_transitioning());
        browser.swipe(300.0, 200.0, 0);
        browser.tick(SLIDE_MS);
        assert_eq!(browser.photo_index(), 1);
    }

    #[test]
    fn loaded_images_replace_placeholder() {
        let (mut browser, _) = open("?room=labs");
        let src = browser.current_photo().unwrap().src.clone();
        browser.image_loaded(&src, 800, 1200);

        let view = browser.view().unwrap();
        assert!(!view.is_placeholder);
        assert_eq!(view.image_src, src);
        assert_eq!(view.orientation, Some(Orientation::Portrait));
    }

    #[test]
    fn preloads_neighbours_once() {
        let (mut browser, _) = open("?room=campus&i=2");
        let output = browser.load_room(0, 1);
        assert_eq!(output.preload.len(), 3);

        let next = browser.museum().rooms[0].photos[2].src.clone();
        browser.image_loaded(&next, 10, 10);
        let output = browser.load_room(0, 1);
        assert!(!output.preload.contains(&next));
    }

    #[test]
    fn empty_museum_is_rejected() {
        let museum = Museum::from_json(r#"{"default_room_id": "x", "rooms": []}"#).unwrap();
        let url = Url::parse("https://museum.test/").unwrap();
        let err = RoomBrowser::new(museum, url, &MemoryStore::new()).unwrap_err();
        assert!(matches!(err, MuseumError::RoomNotFound(_)));
    }
}
