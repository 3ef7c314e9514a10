//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module locks, sleeps, or
//! touches a platform service:
//! - Positions in dp, time in seconds
//! - Seeded RNG when a seed is supplied
//! - Stable iteration order (by arena slot)
//! - No rendering, audio or persistence beyond the best-score store

pub mod effects;
pub mod judge;
pub mod lane;
pub mod pattern;
pub mod score;
pub mod state;
pub mod tick;
pub mod tile;

pub use effects::{Effects, FloatText, Ripple, Spark};
pub use judge::{HitWindows, JudgeGeometry, Judgement, TapVerdict, judge_tap};
pub use lane::{Lane, LaneLayout, Viewport};
pub use pattern::PatternGenerator;
pub use score::{ScoreManager, ScoreSnapshot};
pub use state::{GameState, SessionResult, Simulation, TapOutcome};
pub use tick::{TickOutcome, tick};
pub use tile::{Tile, TileArena, TileHandle};
