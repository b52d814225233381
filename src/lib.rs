//! Flower Keeper - a scripted 2D flower-raising minigame
//!
//! Core modules:
//! - `sim`: Deterministic frame-stepped simulation (step sequencer, fades, weather, rounds)
//! - `renderer`: Draw-list composition and render sinks
//! - `audio`: Sound vocabulary and the event-to-sink director
//! - `assets`: Image/sound tables with placeholder fallback
//! - `platform`: Input sources (replay and the scripted autopilot)
//! - `settings`: JSON configuration

pub mod assets;
pub mod audio;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use assets::{AssetProvider, Assets};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Window dimensions
    pub const SCREEN_WIDTH: i32 = 1280;
    pub const SCREEN_HEIGHT: i32 = 720;
    /// Target frame rate; all per-frame motion (fades, drops, bird) assumes it
    pub const FPS: u32 = 60;
    /// Default frame duration for the headless driver
    pub const DEFAULT_FRAME_MS: u32 = 16;

    /// Opacity change per frame
    pub const FADE_SPEED: u8 = 5;
    pub const FADE_SPEED_FAST: u8 = FADE_SPEED * 2;
    /// Black fade layer decay while the rain lesson restarts
    pub const FADE_RESTART_SPEED: u8 = 10;
    /// Restart finalizes once the fade layer drops below this
    pub const FADE_RESTART_RESUME_BELOW: u8 = 100;

    /// Arm gesture
    pub const MAX_ARM_SPREAD: f32 = 200.0;
    pub const ARM_MOVEMENT_SPEED: f32 = 0.5;
    pub const ARM_CLOSED_THRESHOLD: f32 = 50.0;

    /// Tutorial mouse hint bob
    pub const MOUSE_MOVE_AMPLITUDE: f32 = 50.0;
    pub const MOUSE_MOVE_SPEED: f32 = 0.002;

    /// Tutorial lessons (seconds)
    pub const SUNLIGHT_REQUIRED: f32 = 3.0;
    pub const RAIN_PROTECTION_DURATION: f32 = 1.0;
    pub const RAIN_PHASE_DURATION: f32 = 5.0;

    /// Level 1
    pub const LEVEL1_SUNLIGHT_REQUIRED: f32 = 10.0;
    pub const LEVEL1_RAIN_TOLERANCE: f32 = 3.0;
    pub const LEVEL1_DURATION: f32 = 30.0;

    /// Level 2
    pub const LEVEL2_SUNLIGHT_REQUIRED: f32 = 5.0;
    pub const LEVEL2_RAIN_REQUIRED: f32 = 5.0;
    pub const LEVEL2_SOURRAIN_TOLERANCE: f32 = 2.0;
    pub const LEVEL2_DURATION: f32 = 25.0;

    /// Level 3
    pub const LEVEL3_SUNLIGHT_REQUIRED: f32 = 5.0;
    pub const LEVEL3_RAIN_REQUIRED: f32 = 5.0;
    pub const LEVEL3_SOURRAIN_TOLERANCE: f32 = 1.0;
    pub const LEVEL3_DURATION: f32 = 25.0;
    /// Level 3 keeps sunny spells fixed so the bird has room to play out
    pub const LEVEL3_SUNNY_DURATION: f32 = 5.0;

    /// Weather spell length range (seconds)
    pub const WEATHER_MIN_DURATION: f32 = 2.0;
    pub const WEATHER_MAX_DURATION: f32 = 5.0;

    /// Bird strike (pixels per frame / seconds)
    pub const BIRD_DROP_SPEED: f32 = 10.0;
    pub const BIRD_DRIFT_RATIO: f32 = 0.5;
    pub const BIRD_FADE_SPEED: u8 = 15;
    pub const BIRD_CHECK_HEIGHT_RATIO: f32 = 0.25;
    pub const BIRD_START_Y: f32 = -50.0;
    pub const BIRD_START_X_OFFSET: f32 = -200.0;
    pub const BIRD_TRIGGER_MIN: f32 = 2.0;
    pub const BIRD_TRIGGER_MAX: f32 = 3.0;
    pub const BIRD_WARNING_MIN: f32 = 1.0;
    pub const BIRD_WARNING_MAX: f32 = 1.5;

    /// Precipitation
    pub const RAINDROP_COUNT: usize = 15;
    pub const RAINDROP_SPAWN_CHANCE: f32 = 0.1;
    pub const RAINDROP_SPEED_MIN: f32 = 3.0;
    pub const RAINDROP_SPEED_MAX: f32 = 7.0;
    pub const RAINDROP_CULL_MARGIN: f32 = 20.0;

    /// Pre-round freeze (milliseconds)
    pub const COUNTDOWN_MS: u32 = 3000;

    /// Audio fades (milliseconds)
    pub const AMBIENT_FADE_MS: u32 = 1000;
    pub const MUSIC_FADE_MS: u32 = 2000;

    /// Assets are authored at twice the window resolution
    pub const GLOBAL_SCALE_FACTOR: f32 = 0.5;
}

/// Seconds from integer milliseconds
#[inline]
pub fn ms_to_secs(ms: u32) -> f32 {
    ms as f32 / 1000.0
}
