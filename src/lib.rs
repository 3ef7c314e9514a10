//! Piano Tiles - a falling-tile rhythm game engine
//!
//! Core modules:
//! - `sim`: Simulation building blocks (lanes, tiles, judgement, scoring, patterns, effects)
//! - `engine`: Thread-safe game engine owning the session state machine
//! - `renderer`: Frame snapshots and render surfaces
//! - `platform`: Fixed-cadence game loop, touch dispatch, clocks
//! - `persistence`: Best-score storage and atomic JSON files
//! - `stats`: Completed-run leaderboard and aggregates
//! - `config`: Session configuration and difficulty presets
//! - `feedback`: Audio and haptic feedback collaborator

pub mod config;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod sim;
pub mod stats;

pub use config::{Difficulty, SessionConfig};
pub use engine::GameEngine;
pub use error::{Error, Result};
pub use sim::{GameState, Judgement};

/// Game configuration constants
///
/// Distances are in density-independent units (dp), times in seconds.
pub mod consts {
    /// Target cadence of the update/draw loop
    pub const TARGET_FPS: u32 = 60;
    /// Longest step a single update may simulate
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Lane count bounds
    pub const MIN_LANES: usize = 3;
    pub const MAX_LANES: usize = 6;
    pub const DEFAULT_LANES: usize = 4;

    /// Tile geometry
    pub const TILE_HEIGHT: f32 = 120.0;
    /// Horizontal inset of a tile body inside its lane
    pub const TILE_INSET: f32 = 10.0;
    /// Slots reserved up front in the tile arena
    pub const TILE_POOL_CAPACITY: usize = 64;

    /// Hit windows (distance from tile center to the judgement line)
    pub const HIT_WINDOW_PERFECT: f32 = 20.0;
    pub const HIT_WINDOW_GREAT: f32 = 50.0;
    pub const HIT_WINDOW_GOOD: f32 = 90.0;

    /// Difficulty ramp
    pub const MAX_SPEED: f32 = 1600.0;
    pub const SPEED_INCREMENT_PER_SPAWN: f32 = 2.0;
    pub const SPAWN_DECREMENT_PER_SPAWN: f32 = 0.005;

    /// Beat mode bounds
    pub const DEFAULT_BPM: f32 = 120.0;
    pub const MIN_BEAT_INTERVAL: f32 = 0.2;
    pub const MAX_BEAT_INTERVAL: f32 = 2.0;

    /// Hit feedback timings
    pub const FLASH_DURATION: f32 = 0.08;
    pub const FLASH_BAND_HEIGHT: f32 = 44.0;
    pub const COMBO_PULSE_DURATION: f32 = 0.2;
    pub const COMBO_PULSE_SCALE: f32 = 0.12;
    pub const SHAKE_DURATION: f32 = 0.08;
    /// Maximum view offset while shaking
    pub const SHAKE_AMPLITUDE: f32 = 3.0;

    /// Floating judgement labels
    pub const FLOAT_TEXT_LIFE: f32 = 0.6;
    pub const FLOAT_TEXT_RISE_SPEED: f32 = 40.0;
    pub const FLOAT_TEXT_OFFSET: f32 = 8.0;

    /// Spark burst
    pub const SPARK_COUNT: usize = 10;
    pub const SPARK_SPEED: f32 = 200.0;
    pub const SPARK_SPEED_STEP: f32 = 6.0;
    pub const SPARK_GRAVITY: f32 = 400.0;
    pub const SPARK_LIFE: f32 = 0.25;
    pub const MAX_SPARKS: usize = 256;

    /// Ripple ring
    pub const RIPPLE_START_RADIUS: f32 = 8.0;
    pub const RIPPLE_GROWTH: f32 = 480.0;
    pub const RIPPLE_LIFE: f32 = 0.35;
}

/// Lane index for a horizontal position, clamped to `[0, lane_count)`
///
/// `lane_width` must be positive; positions left of the play area map to
/// lane 0 and positions right of it to the last lane.
#[inline]
pub fn lane_for_x(x: f32, lane_width: f32, lane_count: usize) -> usize {
    if lane_count == 0 {
        return 0;
    }
    let raw = (x / lane_width).floor();
    if raw.is_nan() || raw < 0.0 {
        0
    } else {
        (raw as usize).min(lane_count - 1)
    }
}
