#[cfg(not(target_arch = "wasm32"))]
use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

#[cfg(not(target_arch = "wasm32"))]
use museum::{
    cues::{AudioCue, Page},
    entry::EntryHall,
    gallery::{check_auth, BrowserOutput, RoomBrowser},
    image_loader::{self, PreloadCache},
    input::Key,
    layout_engine::{CollageLayout, LayoutEngine, Orientation},
    particle_system::{ParticleSystem, ShowerConfig},
    renderer::Renderer,
    storage::{FileStore, MemoryStore},
    transition::{CinematicTransition, MontageCue},
    Museum, MuseumConfig,
};
#[cfg(not(target_arch = "wasm32"))]
use url::Url;
#[cfg(not(target_arch = "wasm32"))]
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Instance buffer capacity; bursts stay well below this
#[cfg(not(target_arch = "wasm32"))]
const MAX_CONFETTI: usize = 512;
/// Frame buffer capacity; rooms hold far fewer photos
#[cfg(not(target_arch = "wasm32"))]
const MAX_FRAMES: usize = 64;

#[cfg(not(target_arch = "wasm32"))]
enum Stage {
    Gate { hall: EntryHall, typed: String },
    Montage(CinematicTransition),
    Rooms(RoomBrowser),
}

#[cfg(not(target_arch = "wasm32"))]
struct App {
    config: MuseumConfig,
    museum: Museum,
    renderer: Option<Renderer>,
    window: Option<Arc<Window>>,
    stage: Stage,
    particles: ParticleSystem,
    layout_engine: LayoutEngine,
    /// Current room's collage, redrawn as frames behind the confetti
    collage: Option<CollageLayout>,
    session: MemoryStore,
    local: FileStore,
    preloaded: PreloadCache,
    start_time: Instant,
    title: String,
}

#[cfg(not(target_arch = "wasm32"))]
impl App {
    fn new(config: MuseumConfig, museum: Museum) -> Self {
        let width = config.window_width as f32;
        let height = config.window_height as f32;
        let local = config.local_store();
        let hall = EntryHall::new(config.password.clone());
        Self {
            particles: ParticleSystem::new(width, height),
            layout_engine: LayoutEngine::new(width, height).with_margin(config.margin),
            collage: None,
            config,
            museum,
            renderer: None,
            window: None,
            stage: Stage::Gate {
                hall,
                typed: String::new(),
            },
            session: MemoryStore::new(),
            local,
            preloaded: PreloadCache::new(),
            start_time: Instant::now(),
            title: String::new(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    fn navigate(&mut self, page: Page) {
        let now = self.now_ms();
        log::info!("Navigating to {}", page.file_name());
        self.collage = None;
        match page {
            Page::Entry => {
                let mut hall = EntryHall::new(self.config.password.clone());
                hall.open_modal();
                self.stage = Stage::Gate {
                    hall,
                    typed: String::new(),
                };
            }
            Page::Transition => {
                let mut montage = CinematicTransition::after_gate();
                let sources: Vec<String> = montage.start(now).into_iter().map(String::from).collect();
                self.preloaded.load_files(&sources);
                montage.images_ready(now);
                self.stage = Stage::Montage(montage);
            }
            Page::Welcome | Page::Rooms => {
                if let Some(redirect) = check_auth(&self.session) {
                    self.navigate(redirect);
                    return;
                }
                let url = match Url::parse(&self.config.base_url) {
                    Ok(url) => url,
                    Err(e) => {
                        log::error!("Invalid base URL {}: {}", self.config.base_url, e);
                        return;
                    }
                };
                match RoomBrowser::new(self.museum.clone(), url, &self.local) {
                    Ok((browser, output)) => {
                        self.stage = Stage::Rooms(browser);
                        self.apply(output, now);
                        self.relayout();
                    }
                    Err(e) => log::error!("Failed to open gallery: {}", e),
                }
            }
        }
    }

    /// Play cues, launch confetti and fetch images the browser asked for
    fn apply(&mut self, output: BrowserOutput, now: u64) {
        for cue in &output.audio {
            play(cue);
        }
        if let Some(burst) = &output.confetti {
            self.particles.burst(burst, now);
        }
        let missing: Vec<String> = self
            .preloaded
            .missing(&output.preload)
            .into_iter()
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            self.preloaded.load_files(&missing);
        }
        if let Stage::Rooms(browser) = &mut self.stage {
            for src in &output.preload {
                match self.preloaded.size(src) {
                    Some((width, height)) => browser.image_loaded(src, width, height),
                    None => browser.image_failed(src),
                }
            }
        }
    }

    /// Pack the current room's measured photos into the window
    fn relayout(&mut self) {
        let Stage::Rooms(browser) = &self.stage else {
            self.collage = None;
            return;
        };
        let images: Vec<_> = browser
            .current_room()
            .photos
            .iter()
            .filter_map(|photo| {
                let (width, height) = self
                    .preloaded
                    .size(&photo.src)
                    .unwrap_or_else(|| placeholder_size(photo.aspect_ratio));
                museum::ImageRecord::new(photo.src.clone(), width, height).ok()
            })
            .collect();
        let layout = self.layout_engine.arrange_collage(&images);
        log::debug!(
            "Room collage: {} placements in {} rows at scale {:.3}",
            layout.placements.len(),
            layout.rows,
            layout.scale
        );
        self.collage = Some(layout);
    }

    fn handle_key(&mut self, code: KeyCode, text: Option<&str>, event_loop: &ActiveEventLoop) {
        let now = self.now_ms();
        let key = match code {
            KeyCode::ArrowLeft => Some(Key::ArrowLeft),
            KeyCode::ArrowRight => Some(Key::ArrowRight),
            KeyCode::ArrowUp => Some(Key::ArrowUp),
            KeyCode::ArrowDown => Some(Key::ArrowDown),
            KeyCode::Space => Some(Key::Space),
            KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
            KeyCode::Escape => Some(Key::Escape),
            _ => text.and_then(|t| t.chars().next()).map(Key::Char),
        };

        let mut navigate_to = None;
        let mut browser_output = None;
        match &mut self.stage {
            Stage::Gate { hall, typed } => match key {
                Some(Key::Escape) if hall.is_modal_open() => hall.escape(),
                Some(Key::Escape) => event_loop.exit(),
                Some(Key::Enter) if !hall.is_modal_open() && !hall.is_submitting() => hall.open_modal(),
                Some(Key::Enter) => {
                    let (_, output) = hall.submit(typed, &mut self.session, now);
                    output.audio.iter().for_each(play);
                    typed.clear();
                }
                _ if code == KeyCode::Backspace => {
                    typed.pop();
                }
                Some(Key::Char(c)) if hall.is_modal_open() && !c.is_control() => {
                    hall.clear_error();
                    typed.push(c);
                }
                _ => {}
            },
            Stage::Montage(_) => {
                if key == Some(Key::Escape) {
                    event_loop.exit();
                }
            }
            Stage::Rooms(browser) => match (code, key) {
                (KeyCode::Escape, _) => event_loop.exit(),
                (KeyCode::KeyF, _) => self.particles.firework(now),
                (KeyCode::KeyS, _) => self.particles.shower(&ShowerConfig::default(), now),
                (KeyCode::KeyL, _) => {
                    let next_room = (browser.room_index() + 1) % browser.museum().rooms.len();
                    browser.change_room(next_room, now);
                }
                (KeyCode::KeyR, _) => navigate_to = Some(Page::Entry),
                (_, Some(key)) => {
                    browser_output = Some(browser.handle_key(key, false, &mut self.local, now));
                }
                _ => {}
            },
        }

        if let Some(output) = browser_output {
            self.apply(output, now);
        }
        if let Some(page) = navigate_to {
            if page == Page::Entry {
                EntryHall::default().reset_authentication(&mut self.session);
            }
            self.navigate(page);
        }
    }

    fn update(&mut self) {
        let now = self.now_ms();
        let mut navigate_to = None;
        let mut browser_output = None;
        let mut room_changed = false;
        match &mut self.stage {
            Stage::Gate { hall, .. } => navigate_to = hall.tick(now).navigate,
            Stage::Montage(montage) => {
                for cue in montage.tick(now) {
                    log::debug!("Montage: {:?}", cue);
                    if let MontageCue::Navigate(page) = cue {
                        navigate_to = Some(page);
                    }
                }
            }
            Stage::Rooms(browser) => {
                let room = browser.room_index();
                let output = browser.tick(now);
                if browser.room_index() != room {
                    room_changed = true;
                    log::info!("Entered {}", browser.current_room().name);
                }
                browser_output = Some(output);
            }
        }

        if let Some(output) = browser_output {
            let changed = room_changed || !output.preload.is_empty();
            self.apply(output, now);
            if changed {
                self.relayout();
            }
        }
        if let Some(page) = navigate_to {
            self.navigate(page);
        }

        self.particles.tick(now);
        self.update_title();
    }

    fn update_title(&mut self) {
        let title = match &self.stage {
            Stage::Gate { hall, typed } if hall.is_modal_open() => match hall.error() {
                Some(error) => format!("Museum | {}", error),
                None => format!("Museum | Access code: {}", "*".repeat(typed.chars().count())),
            },
            Stage::Gate { .. } => "Museum | Press Enter for a ticket".to_string(),
            Stage::Montage(_) => "Museum | THE 4-YEAR CANVAS".to_string(),
            Stage::Rooms(browser) => match browser.view() {
                Some(view) => format!(
                    "Museum | {} {}/{} | {} | claps {}{}",
                    view.room_name,
                    view.position,
                    view.total,
                    view.photo.title,
                    view.claps,
                    if view.muted { " | muted" } else { "" }
                ),
                None => format!("Museum | {}", browser.current_room().name),
            },
        };
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }
    }

    fn render(&mut self) {
        let now = self.now_ms();
        let instances = self.particles.instances(now);
        let active = match &self.stage {
            Stage::Rooms(browser) => browser.current_photo().map(|photo| photo.src.as_str()),
            _ => None,
        };
        let frames = self
            .collage
            .as_ref()
            .map(|layout| layout.frame_instances(active))
            .unwrap_or_default();
        if let Some(renderer) = &mut self.renderer {
            let elapsed = self.start_time.elapsed().as_secs_f32();

            match renderer.render(&frames, &instances, elapsed) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    let size = renderer.size();
                    renderer.resize(size);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("GPU out of memory");
                    self.renderer = None;
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }
    }
}

/// Stand-in dimensions for photos that could not be measured
#[cfg(not(target_arch = "wasm32"))]
fn placeholder_size(hint: Option<Orientation>) -> (u32, u32) {
    match hint {
        Some(Orientation::Portrait) => (1200, 1600),
        _ => (1600, 1200),
    }
}

/// No audio backend in the native viewer; cues are logged
#[cfg(not(target_arch = "wasm32"))]
fn play(cue: &AudioCue) {
    match cue {
        AudioCue::Play { sound, volume, looped } => log::info!(
            "Sound {} at volume {:.1}{}",
            sound.asset_path(),
            volume,
            if *looped { " (looped)" } else { "" }
        ),
        AudioCue::Stop(sound) => log::info!("Sound {} stopped", sound.asset_path()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attributes = Window::default_attributes()
            .with_title("Museum")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let size = window.inner_size();
        self.particles.resize(size.width as f32, size.height as f32);
        self.layout_engine =
            LayoutEngine::new(size.width as f32, size.height as f32).with_margin(self.config.margin);

        match pollster::block_on(Renderer::new(window, MAX_CONFETTI, MAX_FRAMES)) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => log::error!("{}; confetti will not be drawn", e),
        }

        let now = self.now_ms();
        if let Stage::Gate { hall, .. } = &mut self.stage {
            if !hall.check_redirect(&self.session, now) {
                hall.open_modal();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        text,
                        ..
                    },
                ..
            } => {
                self.handle_key(code, text.as_deref(), event_loop);
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                }
                let (width, height) = (physical_size.width as f32, physical_size.height as f32);
                self.particles.resize(width, height);
                self.layout_engine = LayoutEngine::new(width, height).with_margin(self.config.margin);
                self.relayout();
            }

            WindowEvent::RedrawRequested => {
                self.update();
                self.render();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Set up logging
    env_logger::init();

    let config = match MuseumConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "layout" {
        run_layout(&config, &args[2..]);
    } else if args.len() > 1 {
        eprintln!("Usage: museum [layout <image>...]");
        std::process::exit(2);
    } else {
        run_viewer(config);
    }
}

/// Measure images, pack them into the configured window and print JSON
#[cfg(not(target_arch = "wasm32"))]
fn run_layout(config: &MuseumConfig, paths: &[String]) {
    if paths.is_empty() {
        eprintln!("Usage: museum layout <image>...");
        std::process::exit(2);
    }

    let images = image_loader::measure_all(paths);
    let layout = LayoutEngine::new(config.window_width as f32, config.window_height as f32)
        .with_margin(config.margin)
        .arrange_collage(&images);

    match serde_json::to_string_pretty(&layout) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize layout: {}", e);
            std::process::exit(1);
        }
    }

    if let Ok(quotes) = config.quotes() {
        for placement in &layout.placements {
            let name = std::path::Path::new(&placement.src)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            log::info!("{}: {}", name, quotes.quote_for(&name));
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run_viewer(config: MuseumConfig) {
    let museum = match config.museum() {
        Ok(museum) => museum,
        Err(e) => {
            eprintln!("Failed to load catalog: {}", e);
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            eprintln!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, museum);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
}

// WebAssembly entry point; the pages drive the library through `museum::web`
#[cfg(target_arch = "wasm32")]
fn main() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if console_log::init_with_level(log::Level::Warn).is_ok() {
        log::info!("museum loaded");
    }
}
