//! Session state and the operations that mutate it
//!
//! `Simulation` is plain single-threaded state. The engine keeps it behind one
//! lock and adds collaborators (stats, feedback, clock) around it.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::Effects;
use super::judge::{JudgeGeometry, Judgement, judge_tap};
use super::lane::{LaneLayout, Viewport};
use super::pattern::PatternGenerator;
use super::score::ScoreManager;
use super::tile::{Tile, TileArena, TileHandle};
use crate::config::{Difficulty, SessionConfig};
use crate::consts::*;

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Running,
    Paused,
    /// Terminal until `reset`
    GameOver,
}

/// What a single tap did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapOutcome {
    pub judgement: Judgement,
    /// Lane the tap resolved to, `None` when nothing was evaluated
    pub lane: Option<usize>,
    /// Best score after this tap, when it set a record
    pub new_best: Option<u64>,
}

impl TapOutcome {
    fn none() -> Self {
        Self {
            judgement: Judgement::None,
            lane: None,
            new_best: None,
        }
    }
}

/// Record handed to the stats collaborator when a session ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub score: u64,
    pub max_combo: u32,
    pub lane_count: usize,
    pub difficulty: Difficulty,
    /// Tempo when the session ran in beat mode
    pub beat_bpm: Option<f32>,
    pub duration_secs: u64,
    pub ended_at_ms: u64,
}

#[derive(Debug)]
pub struct Simulation {
    pub state: GameState,
    pub viewport: Viewport,
    pub layout: LaneLayout,
    pub tiles: TileArena,
    pub score: ScoreManager,
    pub effects: Effects,
    /// Sanitized config of the current session
    pub config: SessionConfig,
    pub pattern: Option<PatternGenerator>,
    pub spawn_rng: Pcg32,
    pub spawn_timer: f32,
    pub speed: f32,
    pub spawn_interval: f32,
    pub session_start_ms: u64,
}

impl Simulation {
    pub fn new(best: u64, spawn_seed: Option<u64>, now_ms: u64) -> Self {
        let config = SessionConfig::default();
        let spawn_rng = match spawn_seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_os_rng(),
        };
        Self {
            state: GameState::Running,
            viewport: Viewport::default(),
            layout: LaneLayout::default(),
            tiles: TileArena::default(),
            score: ScoreManager::new(best),
            effects: Effects::default(),
            speed: config.base_speed,
            spawn_interval: config.base_spawn_interval,
            config,
            pattern: None,
            spawn_rng,
            spawn_timer: 0.0,
            session_start_ms: now_ms,
        }
    }

    pub fn lane_count(&self) -> usize {
        self.config.lane_count
    }

    pub fn geometry(&self) -> JudgeGeometry {
        JudgeGeometry::for_height(self.viewport.height())
    }

    /// Interval the spawn timer is currently measured against
    pub fn active_spawn_interval(&self) -> f32 {
        if self.config.beat_mode {
            self.config.beat_interval()
        } else {
            self.spawn_interval
        }
    }

    /// Record a new surface size and rebuild lane geometry
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.rebuild_lanes();
    }

    fn rebuild_lanes(&mut self) {
        self.layout = if self.viewport.is_valid() {
            LaneLayout::new(self.viewport.width(), self.lane_count())
        } else {
            LaneLayout::default()
        };
    }

    /// Install a new session config
    ///
    /// A lane count change drops every in-flight tile, since their lane
    /// indices may no longer exist.
    pub fn apply_config(&mut self, config: &SessionConfig, now_ms: u64) {
        let config = config.sanitized();
        let lanes_changed = config.lane_count != self.config.lane_count;

        self.speed = config.base_speed;
        self.spawn_interval = config.base_spawn_interval;
        self.pattern = config
            .pattern_mode
            .then(|| PatternGenerator::new(config.lane_count, config.pattern_seed));
        self.config = config;
        self.session_start_ms = now_ms;

        if lanes_changed {
            self.tiles.clear();
            self.effects.clear();
            self.rebuild_lanes();
        }
    }

    /// Back to a fresh running session with the current config
    pub fn reset(&mut self, now_ms: u64) {
        self.tiles.clear();
        self.effects.clear();
        self.spawn_timer = 0.0;
        self.speed = self.config.base_speed;
        self.spawn_interval = self.config.base_spawn_interval;
        if let Some(pattern) = &self.pattern {
            self.pattern = Some(PatternGenerator::new(pattern.lane_count(), pattern.seed()));
        }
        self.score.reset_all();
        self.state = GameState::Running;
        self.session_start_ms = now_ms;
    }

    pub fn pause(&mut self) -> bool {
        if self.state == GameState::Running {
            self.state = GameState::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.state == GameState::Paused {
            self.state = GameState::Running;
            true
        } else {
            false
        }
    }

    /// Spawn one tile above the visible area
    pub fn spawn_tile(&mut self) -> TileHandle {
        let lanes = self.lane_count();
        let lane = match self.pattern.as_mut() {
            Some(pattern) => pattern.next_lane(),
            None => self.spawn_rng.random_range(0..lanes),
        };
        self.tiles.insert(Tile::new(lane.min(lanes - 1), -TILE_HEIGHT))
    }

    /// Resolve a tap at a dp position
    pub fn tap(&mut self, x: f32, y: f32) -> TapOutcome {
        if self.state != GameState::Running || !self.viewport.is_valid() {
            return TapOutcome::none();
        }
        let Some(lane) = self.layout.lane_at(x) else {
            return TapOutcome::none();
        };

        let geometry = self.geometry();
        let verdict = judge_tap(&self.tiles, lane, y, &geometry);

        let mut new_best = None;
        if let Some(handle) = verdict.tile {
            self.tiles.remove(handle);
            new_best = self.score.hit(verdict.judgement);
            self.effects.flash(lane);
        } else {
            self.score.reset_combo_on_miss();
            self.effects.shake();
        }

        if let Some(lane_geom) = self.layout.get(lane) {
            let origin = glam::Vec2::new(lane_geom.center_x(), geometry.line_y);
            self.effects.spawn_hit(origin, verdict.judgement);
        }

        log::debug!(
            "Tap lane {} -> {} (distance {:?}, combo {})",
            lane,
            verdict.judgement.as_str(),
            verdict.distance,
            self.score.combo()
        );

        TapOutcome {
            judgement: verdict.judgement,
            lane: Some(lane),
            new_best,
        }
    }

    /// Move to GAME_OVER; `None` if the session already ended
    pub fn enter_game_over(&mut self, now_ms: u64) -> Option<SessionResult> {
        if self.state == GameState::GameOver {
            return None;
        }
        self.state = GameState::GameOver;
        self.score.reset_combo_on_miss();

        let duration_secs = now_ms.saturating_sub(self.session_start_ms) / 1000;
        Some(SessionResult {
            score: self.score.score(),
            max_combo: self.score.max_combo(),
            lane_count: self.lane_count(),
            difficulty: self.config.difficulty,
            beat_bpm: self.config.beat_mode.then_some(self.config.bpm),
            duration_secs,
            ended_at_ms: now_ms,
        })
    }
}
