use museum::cues::{AudioCue, Page, Sound};
use museum::entry::{self, EntryHall, CLOSE_ANIMATION_MS, SUCCESS_DELAY_MS};
use museum::gallery::{check_auth, RoomBrowser, SLIDE_MS};
use museum::input::Key;
use museum::storage::{FileStore, MemoryStore, MUTED_KEY};
use museum::transition::{CinematicTransition, MontageCue};
use museum::url_state::{get_param, INDEX_PARAM, ROOM_PARAM};
use museum::{storage, Museum, MuseumConfig, ParticleSystem};
use url::Url;

const BASE: &str = "https://museum.local/rooms.html";

fn run_until_navigate(montage: &mut CinematicTransition, start: u64) -> Option<(u64, Page)> {
    let mut now = start;
    while now < start + 60_000 {
        for cue in montage.tick(now) {
            if let MontageCue::Navigate(page) = cue {
                return Some((now, page));
            }
        }
        now += 50;
    }
    None
}

#[test]
fn visitor_walks_from_gate_to_rooms() {
    let mut session = MemoryStore::new();
    assert_eq!(check_auth(&session), Some(Page::Entry));

    let mut hall = EntryHall::default();
    hall.open_modal();
    let (accepted, _) = hall.submit("wrong", &mut session, 0);
    assert!(!accepted);
    assert!(hall.error().is_some());
    assert!(!entry::has_ticket(&session));

    let (accepted, output) = hall.submit("  MediaThon ", &mut session, 1000);
    assert!(accepted);
    assert_eq!(output.audio.len(), 1);
    assert!(entry::has_ticket(&session));

    let mut now = 1000 + SUCCESS_DELAY_MS;
    assert_eq!(hall.tick(now).navigate, None);
    assert!(!hall.is_modal_open());
    now += CLOSE_ANIMATION_MS;
    assert_eq!(hall.tick(now).navigate, Some(Page::Transition));

    let mut montage = CinematicTransition::after_gate();
    assert_eq!(montage.start(now).len(), 6);
    montage.images_ready(now);
    let (_, page) = run_until_navigate(&mut montage, now).expect("montage never finished");
    assert_eq!(page, Page::Rooms);

    assert_eq!(check_auth(&session), None);
    let local = MemoryStore::new();
    let (browser, output) = RoomBrowser::new(Museum::builtin().unwrap(), Url::parse(BASE).unwrap(), &local).unwrap();
    assert_eq!(browser.current_room().id, "campus");
    assert_eq!(browser.photo_index(), 0);
    assert!(!output.preload.is_empty());
}

#[test]
fn shared_link_opens_the_same_photo() {
    let local = MemoryStore::new();
    let url = Url::parse(&format!("{}?room=labs&i=2", BASE)).unwrap();
    let (mut browser, _) = RoomBrowser::new(Museum::builtin().unwrap(), url, &local).unwrap();
    assert_eq!(browser.current_room().id, "labs");
    assert_eq!(browser.photo_index(), 1);

    // last photo of labs, so next moves into sports
    browser.next_photo(0);
    browser.tick(SLIDE_MS);
    assert_eq!(browser.current_room().id, "sports");
    assert_eq!(get_param(browser.url(), ROOM_PARAM).as_deref(), Some("sports"));
    assert_eq!(get_param(browser.url(), INDEX_PARAM).as_deref(), Some("1"));

    let (reopened, _) = RoomBrowser::new(Museum::builtin().unwrap(), browser.url().clone(), &local).unwrap();
    assert_eq!(reopened.room_index(), browser.room_index());
    assert_eq!(reopened.photo_index(), browser.photo_index());
}

#[test]
fn clap_drives_sound_and_confetti() {
    let mut local = MemoryStore::new();
    let (mut browser, _) = RoomBrowser::new(Museum::builtin().unwrap(), Url::parse(BASE).unwrap(), &local).unwrap();
    let mut particles = ParticleSystem::with_seed(1280.0, 800.0, 7);

    let output = browser.handle_key(Key::Space, false, &mut local, 0);
    assert!(output.audio.contains(&AudioCue::looped(Sound::Applause, 0.4)));
    let burst = output.confetti.expect("clap launches confetti");
    particles.burst(&burst, 0);
    assert_eq!(particles.active_count(), burst.count);
    assert!(!particles.instances(100).is_empty());

    particles.tick(burst.duration + 2000);
    assert!(!particles.is_active());

    let later = browser.tick(3000);
    assert_eq!(later.audio, vec![AudioCue::Stop(Sound::Applause)]);
    assert_eq!(browser.clap_count(0, 0), 1);
}

#[test]
fn mute_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = MuseumConfig {
        store_dir: dir.path().to_path_buf(),
        ..MuseumConfig::default()
    };

    let mut local: FileStore = config.local_store();
    let (mut browser, _) = RoomBrowser::new(config.museum().unwrap(), Url::parse(BASE).unwrap(), &local).unwrap();
    let output = browser.handle_key(Key::Char('m'), false, &mut local, 0);
    assert_eq!(output.audio, vec![AudioCue::Stop(Sound::Applause)]);
    assert!(storage::get(&local, MUTED_KEY, false));

    let reopened_store = config.local_store();
    let (mut reopened, _) =
        RoomBrowser::new(config.museum().unwrap(), Url::parse(BASE).unwrap(), &reopened_store).unwrap();
    assert!(reopened.is_muted());
    let clap = reopened.clap(0);
    assert!(clap.audio.is_empty());
    assert!(clap.confetti.is_some());
}

#[test]
fn returning_visitor_skips_the_form() {
    let mut session = MemoryStore::new();
    let mut first = EntryHall::default();
    first.submit("mediathon", &mut session, 0);

    let mut hall = EntryHall::default();
    assert!(hall.check_redirect(&session, 0));
    assert_eq!(hall.tick(CLOSE_ANIMATION_MS).navigate, Some(Page::Transition));

    hall.reset_authentication(&mut session);
    assert_eq!(check_auth(&session), Some(Page::Entry));
}
