use glam::{Vec2, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::timers::{TimerId, Timers};
use crate::util::random_range;

/// Downward acceleration (px/s²)
pub const GRAVITY: f32 = 980.0;
/// Horizontal velocity kept per integration step
pub const AIR_RESISTANCE: f32 = 0.98;
/// Integration steps per particle lifetime
pub const FRAME_COUNT: usize = 60;
/// Normalized progress where the fade-out begins
pub const FADE_START: f32 = 0.7;
/// Extra time a particle stays attached after its animation ends (ms)
pub const REMOVAL_GRACE_MS: u64 = 100;
/// Extra time before a whole burst is swept (ms)
pub const BURST_GRACE_MS: u64 = 1000;

pub const DEFAULT_COLORS: [&str; 10] = [
    "#c9a227", // Gold
    "#ff6b6b", // Red
    "#4ecdc4", // Teal
    "#45b7d1", // Blue
    "#f7b731", // Yellow
    "#5f27cd", // Purple
    "#00d2d3", // Cyan
    "#ff9ff3", // Pink
    "#54a0ff", // Light blue
    "#5f27cd", // Purple
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Square,
    Circle,
    Triangle,
}

impl Shape {
    fn id(self) -> u32 {
        match self {
            Shape::Square => 0,
            Shape::Circle => 1,
            Shape::Triangle => 2,
        }
    }
}

fn default_count() -> usize {
    120
}
fn default_duration() -> u64 {
    3000
}
fn default_start_velocity() -> f32 {
    45.0
}
fn default_spread() -> f32 {
    50.0
}
fn default_origin() -> Vec2 {
    Vec2::new(0.5, 0.5)
}
fn default_colors() -> Vec<String> {
    DEFAULT_COLORS.iter().map(|c| c.to_string()).collect()
}
fn default_shapes() -> Vec<Shape> {
    vec![Shape::Square, Shape::Circle, Shape::Triangle]
}

/// Launch configuration shared by every particle in a burst
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstConfig {
    #[serde(default = "default_count")]
    pub count: usize,
    /// Base particle lifetime (ms)
    #[serde(default = "default_duration")]
    pub duration: u64,
    #[serde(default = "default_start_velocity")]
    pub start_velocity: f32,
    /// Angular spread around straight up (degrees)
    #[serde(default = "default_spread")]
    pub spread: f32,
    /// Launch point as a fraction of the viewport
    #[serde(default = "default_origin")]
    pub origin: Vec2,
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,
    #[serde(default = "default_shapes")]
    pub shapes: Vec<Shape>,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            duration: default_duration(),
            start_velocity: default_start_velocity(),
            spread: default_spread(),
            origin: default_origin(),
            colors: default_colors(),
            shapes: default_shapes(),
        }
    }
}

impl BurstConfig {
    /// Burst used when a visitor claps for a photo
    pub fn clap() -> Self {
        Self {
            count: 60,
            duration: 3000,
            origin: Vec2::new(0.5, 0.6),
            ..Self::default()
        }
    }

    pub fn firework() -> Self {
        Self {
            count: 80,
            duration: 2000,
            start_velocity: 60.0,
            spread: 360.0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowerConfig {
    /// Total emission window (ms)
    pub duration: u64,
    pub particles_per_second: u32,
}

impl Default for ShowerConfig {
    fn default() -> Self {
        Self {
            duration: 5000,
            particles_per_second: 30,
        }
    }
}

/// One precomputed animation sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keyframe {
    /// Normalized time in [0, 1]
    pub progress: f32,
    /// Displacement from the start position (px)
    pub offset: Vec2,
    /// Velocity after this step (px/s)
    pub velocity: Vec2,
    /// Degrees
    pub rotation: f32,
    pub opacity: f32,
}

/// Fixed fade policy: opaque until 70% progress, then linear to zero
pub fn opacity_at(progress: f32) -> f32 {
    if progress > FADE_START {
        (1.0 - (progress - FADE_START) / (1.0 - FADE_START)).max(0.0)
    } else {
        1.0
    }
}

/// Euler-integrate a launch into `FRAME_COUNT + 1` keyframes
pub fn generate_keyframes(
    velocity: Vec2,
    rotation: f32,
    rotation_speed: f32,
    duration_ms: u64,
) -> Vec<Keyframe> {
    let dt = duration_ms as f32 / 1000.0 / FRAME_COUNT as f32;

    let mut position = Vec2::ZERO;
    let mut velocity = velocity;
    let mut rotation = rotation;

    (0..=FRAME_COUNT)
        .map(|i| {
            let progress = i as f32 / FRAME_COUNT as f32;

            velocity.y += GRAVITY * dt;
            velocity.x *= AIR_RESISTANCE;
            position += velocity * dt;
            rotation += rotation_speed;

            Keyframe {
                progress,
                offset: position,
                velocity,
                rotation,
                opacity: opacity_at(progress),
            }
        })
        .collect()
}

/// GPU-aligned confetti instance (16-byte aligned for GPU)
/// Copied straight into the instance buffer each frame
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ConfettiInstance {
    pub position: [f32; 2], // Current position (px)
    pub size: f32,          // Edge length (px)
    pub rotation: f32,      // Degrees
    pub color: [f32; 4],    // RGBA, alpha = opacity
    pub shape: u32,         // 0 square, 1 circle, 2 triangle
    pub _padding: [u32; 3], // Padding for 16-byte alignment
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub id: u64,
    pub start: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub color: Vec4,
    pub shape: Shape,
    pub size: f32,
    pub spawned_at: u64,
    pub duration: u64,
    pub keyframes: Vec<Keyframe>,
    removal: Option<TimerId>,
}

impl Particle {
    /// Keyframe sample at `now_ms`, linearly interpolated
    pub fn sample(&self, now_ms: u64) -> Keyframe {
        let elapsed = now_ms.saturating_sub(self.spawned_at) as f32;
        let progress = (elapsed / self.duration.max(1) as f32).clamp(0.0, 1.0);
        let scaled = progress * FRAME_COUNT as f32;
        let idx = (scaled.floor() as usize).min(FRAME_COUNT);
        let next = (idx + 1).min(FRAME_COUNT);
        let blend = scaled - idx as f32;

        let a = &self.keyframes[idx];
        let b = &self.keyframes[next];
        Keyframe {
            progress,
            offset: a.offset.lerp(b.offset, blend),
            velocity: a.velocity.lerp(b.velocity, blend),
            rotation: a.rotation + (b.rotation - a.rotation) * blend,
            opacity: opacity_at(progress),
        }
    }

    pub fn instance(&self, now_ms: u64) -> ConfettiInstance {
        let frame = self.sample(now_ms);
        let position = self.start + frame.offset;
        let mut color = self.color;
        color.w *= frame.opacity;

        ConfettiInstance {
            position: position.to_array(),
            size: self.size,
            rotation: frame.rotation,
            color: color.to_array(),
            shape: self.shape.id(),
            _padding: [0; 3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Event {
    RemoveParticle(u64),
    ClearAll,
    ShowerPiece { remaining: u32 },
}

/// Confetti scene: bursts, removal timers and the clear-all policy
pub struct ParticleSystem {
    particles: Vec<Particle>,
    timers: Timers<Event>,
    viewport: Vec2,
    rng: StdRng,
    next_particle_id: u64,
    sweep_timer: Option<TimerId>,
    shower_interval: u64,
    shower_timer: Option<TimerId>,
}

impl ParticleSystem {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self::with_rng(viewport_width, viewport_height, StdRng::from_entropy())
    }

    /// Deterministic system for replays and tests
    pub fn with_seed(viewport_width: f32, viewport_height: f32, seed: u64) -> Self {
        Self::with_rng(viewport_width, viewport_height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(viewport_width: f32, viewport_height: f32, rng: StdRng) -> Self {
        log::debug!("Confetti system initialized");
        Self {
            particles: Vec::new(),
            timers: Timers::new(),
            viewport: Vec2::new(viewport_width, viewport_height),
            rng,
            next_particle_id: 0,
            sweep_timer: None,
            shower_interval: 0,
            shower_timer: None,
        }
    }

    pub fn resize(&mut self, viewport_width: f32, viewport_height: f32) {
        self.viewport = Vec2::new(viewport_width, viewport_height);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn active_count(&self) -> usize {
        self.particles.len()
    }

    pub fn is_active(&self) -> bool {
        !self.particles.is_empty()
    }

    /// Launch a burst. Any in-flight particles are cleared first.
    pub fn burst(&mut self, config: &BurstConfig, now_ms: u64) {
        self.clear_particles();

        for _ in 0..config.count {
            let particle = self.create_piece(config, now_ms);
            self.particles.push(particle);
        }

        self.sweep_timer = Some(
            self.timers
                .schedule(
                    now_ms.saturating_add(config.duration).saturating_add(BURST_GRACE_MS),
                    Event::ClearAll,
                ),
        );

        log::debug!(
            "Confetti burst: {} pieces for {}ms",
            config.count,
            config.duration
        );
    }

    pub fn firework(&mut self, now_ms: u64) {
        self.burst(&BurstConfig::firework(), now_ms);
    }

    /// Stream single-particle bursts from above the viewport.
    ///
    /// Each piece is its own burst, so the clear-all policy applies to every
    /// emission.
    pub fn shower(&mut self, config: &ShowerConfig, now_ms: u64) {
        if let Some(id) = self.shower_timer.take() {
            self.timers.cancel(id);
        }
        let per_second = config.particles_per_second.max(1) as u64;
        self.shower_interval = (1000 / per_second).max(1);
        let pieces = config.duration.div_ceil(self.shower_interval) as u32;
        if pieces == 0 {
            return;
        }
        self.shower_timer = Some(
            self.timers
                .schedule(now_ms, Event::ShowerPiece { remaining: pieces }),
        );
    }

    /// Fire due timers: removals, burst sweeps and shower emissions
    pub fn tick(&mut self, now_ms: u64) {
        for event in self.timers.pop_due(now_ms) {
            match event {
                Event::RemoveParticle(id) => {
                    self.particles.retain(|p| p.id != id);
                }
                Event::ClearAll => {
                    self.sweep_timer = None;
                    self.clear_particles();
                }
                Event::ShowerPiece { remaining } => {
                    self.shower_timer = None;
                    let config = BurstConfig {
                        count: 1,
                        duration: 3000,
                        origin: Vec2::new(self.rng.gen::<f32>(), -0.1),
                        start_velocity: 20.0,
                        spread: 30.0,
                        ..BurstConfig::default()
                    };
                    self.burst(&config, now_ms);
                    if remaining > 1 {
                        self.shower_timer = Some(self.timers.schedule(
                            now_ms.saturating_add(self.shower_interval),
                            Event::ShowerPiece {
                                remaining: remaining - 1,
                            },
                        ));
                    }
                }
            }
        }
    }

    /// Remove every particle and cancel all pending work, shower included
    pub fn clear(&mut self) {
        self.timers.clear();
        self.sweep_timer = None;
        self.shower_timer = None;
        self.particles.clear();
    }

    fn clear_particles(&mut self) {
        if let Some(id) = self.sweep_timer.take() {
            self.timers.cancel(id);
        }
        for particle in self.particles.drain(..) {
            if let Some(id) = particle.removal {
                self.timers.cancel(id);
            }
        }
    }

    /// Current GPU instances
    pub fn instances(&self, now_ms: u64) -> Vec<ConfettiInstance> {
        self.particles.iter().map(|p| p.instance(now_ms)).collect()
    }

    fn create_piece(&mut self, config: &BurstConfig, now_ms: u64) -> Particle {
        let rng = &mut self.rng;

        let color = if config.colors.is_empty() {
            Vec4::ONE
        } else {
            parse_hex_color(&config.colors[rng.gen_range(0..config.colors.len())])
        };
        let shape = if config.shapes.is_empty() {
            Shape::Square
        } else {
            config.shapes[rng.gen_range(0..config.shapes.len())]
        };
        let size = random_range(rng, 4.0, 12.0);
        let rotation = random_range(rng, 0.0, 360.0);
        let speed = random_range(
            rng,
            config.start_velocity * 0.7,
            config.start_velocity * 1.3,
        );

        let start = Vec2::new(
            (config.origin.x + random_range(rng, -0.1, 0.1)) * self.viewport.x,
            (config.origin.y + random_range(rng, -0.05, 0.05)) * self.viewport.y,
        );

        // -90° points straight up
        let angle = random_range(rng, -config.spread / 2.0, config.spread / 2.0) - 90.0;
        let radians = angle.to_radians();
        let velocity = Vec2::new(radians.cos(), radians.sin()) * speed;

        let jitter = random_range(rng, -500.0, 500.0);
        let duration = (config.duration as f32 + jitter).max(1.0) as u64;
        let rotation_speed = random_range(rng, -5.0, 5.0);

        let keyframes = generate_keyframes(velocity, rotation, rotation_speed, duration);
        let id = self.next_particle_id;
        self.next_particle_id += 1;
        let mut particle = Particle {
            id,
            start,
            velocity,
            rotation,
            rotation_speed,
            color,
            shape,
            size,
            spawned_at: now_ms,
            duration,
            keyframes,
            removal: None,
        };

        // Remove piece after its animation plus grace
        let due = now_ms.saturating_add(duration).saturating_add(REMOVAL_GRACE_MS);
        particle.removal = Some(self.timers.schedule(due, Event::RemoveParticle(particle.id)));
        particle
    }
}

/// Parse `#rrggbb` into RGBA; malformed input falls back to white
pub fn parse_hex_color(hex: &str) -> Vec4 {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 {
        log::warn!("Invalid color '{}', using white", hex);
        return Vec4::ONE;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Vec4::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            1.0,
        ),
        _ => {
            log::warn!("Invalid color '{}', using white", hex);
            Vec4::ONE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_up(duration: u64) -> BurstConfig {
        BurstConfig {
            count: 1,
            start_velocity: 45.0,
            spread: 0.0,
            duration,
            ..BurstConfig::default()
        }
    }

    #[test]
    fn zero_spread_launches_straight_up() {
        let mut system = ParticleSystem::with_seed(800.0, 600.0, 7);
        system.burst(&single_up(3000), 0);

        assert_eq!(system.active_count(), 1);
        let particle = &system.particles()[0];
        assert!(particle.velocity.x.abs() < 1e-3);
        assert!(particle.velocity.y < 0.0);
        let speed = particle.velocity.length();
        assert!((45.0 * 0.7..=45.0 * 1.3).contains(&speed));
    }

    #[test]
    fn opacity_policy() {
        assert_eq!(opacity_at(0.0), 1.0);
        assert_eq!(opacity_at(0.7), 1.0);
        assert!((opacity_at(0.85) - 0.5).abs() < 1e-5);
        assert!(opacity_at(1.0).abs() < 1e-5);
    }

    #[test]
    fn keyframes_fade_and_fall() {
        let mut system = ParticleSystem::with_seed(1280.0, 720.0, 42);
        system.burst(&BurstConfig::default(), 0);
        assert_eq!(system.active_count(), 120);

        for particle in system.particles() {
            let frames = &particle.keyframes;
            assert_eq!(frames.len(), FRAME_COUNT + 1);
            assert_eq!(frames.first().map(|f| f.progress), Some(0.0));
            assert_eq!(frames.last().map(|f| f.progress), Some(1.0));

            for pair in frames.windows(2) {
                assert!(pair[1].velocity.y >= pair[0].velocity.y);
                assert!(pair[1].opacity <= pair[0].opacity);
            }
            for frame in frames {
                if frame.progress <= FADE_START {
                    assert_eq!(frame.opacity, 1.0);
                }
            }
            assert!(frames[FRAME_COUNT].opacity.abs() < 1e-5);
        }
    }

    #[test]
    fn air_resistance_damps_horizontal_velocity() {
        let frames = generate_keyframes(Vec2::new(100.0, 0.0), 0.0, 2.0, 1000);
        assert!((frames[0].velocity.x - 98.0).abs() < 1e-3);
        assert!(frames[FRAME_COUNT].velocity.x < frames[0].velocity.x);
        assert!((frames[FRAME_COUNT].rotation - 2.0 * 61.0).abs() < 1e-3);
    }

    #[test]
    fn sampled_particles_stay_bounded() {
        let mut system = ParticleSystem::with_seed(800.0, 600.0, 3);
        system.burst(&single_up(3000), 0);
        let particle = &system.particles()[0];

        assert_eq!(particle.sample(0).progress, 0.0);
        let end = particle.sample(particle.duration * 2);
        assert_eq!(end.progress, 1.0);
        assert!(end.opacity.abs() < 1e-5);
        assert_eq!(system.instances(10).len(), 1);
    }

    #[test]
    fn particles_are_removed_after_grace() {
        let mut system = ParticleSystem::with_seed(800.0, 600.0, 11);
        system.burst(&single_up(2000), 0);
        let duration = system.particles()[0].duration;

        system.tick(duration);
        assert!(system.is_active());
        system.tick(duration + REMOVAL_GRACE_MS);
        assert!(!system.is_active());
    }

    #[test]
    fn new_burst_clears_in_flight_particles() {
        let mut system = ParticleSystem::with_seed(800.0, 600.0, 5);
        system.burst(&BurstConfig::clap(), 0);
        assert_eq!(system.active_count(), 60);

        system.burst(&single_up(3000), 2500);
        assert_eq!(system.active_count(), 1);

        // The first burst's sweep must not cut the second one short
        system.tick(4000);
        assert_eq!(system.active_count(), 1);
        system.tick(2500 + 3000 + BURST_GRACE_MS);
        assert_eq!(system.active_count(), 0);
    }

    #[test]
    fn huge_duration_does_not_wrap_timers() {
        let config: BurstConfig =
            serde_json::from_str(r#"{"count": 1, "duration": 18446744073709551615}"#).unwrap();
        let mut system = ParticleSystem::with_seed(800.0, 600.0, 3);
        system.burst(&config, 5);
        assert_eq!(system.active_count(), 1);

        system.tick(10_000);
        assert_eq!(system.active_count(), 1);
        assert!(!system.instances(10_000).is_empty());
    }

    #[test]
    fn firework_preset() {
        let mut system = ParticleSystem::with_seed(800.0, 600.0, 9);
        system.firework(0);
        assert_eq!(system.active_count(), 80);
    }

    #[test]
    fn shower_emits_one_piece_at_a_time() {
        let mut system = ParticleSystem::with_seed(800.0, 600.0, 13);
        system.shower(
            &ShowerConfig {
                duration: 100,
                particles_per_second: 20,
            },
            0,
        );
        assert!(!system.is_active());

        system.tick(0);
        assert_eq!(system.active_count(), 1);
        let first = system.particles()[0].id;
        assert!(system.particles()[0].start.y < 0.0);

        system.tick(50);
        assert_eq!(system.active_count(), 1);
        assert_ne!(system.particles()[0].id, first);

        system.clear();
        assert!(!system.is_active());
        system.tick(10_000);
        assert!(!system.is_active());
    }

    #[test]
    fn config_defaults_from_json() {
        let config: BurstConfig = serde_json::from_str(r#"{"count": 5}"#).unwrap();
        assert_eq!(config.count, 5);
        assert_eq!(config.duration, 3000);
        assert_eq!(config.shapes.len(), 3);
        assert_eq!(config.colors.len(), 10);
    }

    #[test]
    fn hex_colors() {
        let gold = parse_hex_color("#c9a227");
        assert!((gold.x - 201.0 / 255.0).abs() < 1e-6);
        assert_eq!(parse_hex_color("nope"), Vec4::ONE);
    }
}
