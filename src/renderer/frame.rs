//! Frame snapshots
//!
//! `Frame::capture` packs everything a surface needs to draw one frame out of
//! the simulation. It reads state only; building a frame never advances an
//! effect or consumes randomness.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::consts::*;
use crate::sim::{FloatText, GameState, Lane, Ripple, Simulation, Spark};

/// Horizontal inset of the hit flash band inside its lane
const FLASH_INSET: f32 = 6.0;

/// A tile body ready to draw (dp)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileSprite {
    pub lane: usize,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub height: f32,
}

/// Lane-local highlight left by the last hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlashBand {
    pub lane: usize,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    /// 0-1
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub score: u64,
    pub best: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub lane_count: usize,
    pub difficulty: Difficulty,
    pub beat_bpm: Option<f32>,
    /// Scale applied to the combo label while it pulses
    pub combo_scale: f32,
}

/// Full-screen overlay shown outside RUNNING
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overlay {
    Paused,
    GameOver,
}

/// Everything a surface needs for one frame, in dp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    /// Physical pixels per dp
    pub scale: f32,
    pub lanes: Vec<Lane>,
    pub tiles: Vec<TileSprite>,
    pub judgement_line_y: f32,
    pub hud: Hud,
    pub flash: Option<FlashBand>,
    pub float_texts: Vec<FloatText>,
    pub sparks: Vec<Spark>,
    pub ripples: Vec<Ripple>,
    /// Maximum view jitter this frame; the surface picks the offset
    pub shake: f32,
    pub overlay: Option<Overlay>,
}

impl Frame {
    /// Snapshot the simulation, `None` while the viewport has no size
    pub fn capture(sim: &Simulation) -> Option<Self> {
        if !sim.viewport.is_valid() || sim.layout.is_empty() {
            return None;
        }
        let lanes = sim.layout.lanes();
        let geometry = sim.geometry();

        let tiles = sim
            .tiles
            .iter()
            .filter_map(|(_, tile)| {
                let lane = sim.layout.get(tile.lane)?;
                Some(TileSprite {
                    lane: tile.lane,
                    left: lane.left + TILE_INSET,
                    right: lane.right - TILE_INSET,
                    top: tile.y,
                    height: geometry.tile_height,
                })
            })
            .collect();

        let flash = sim.effects.flash_lane.and_then(|index| {
            let lane = sim.layout.get(index)?;
            let alpha = sim.effects.flash_alpha();
            (alpha > 0.0).then(|| FlashBand {
                lane: index,
                left: lane.left + FLASH_INSET,
                right: lane.right - FLASH_INSET,
                top: geometry.line_y - FLASH_BAND_HEIGHT / 2.0,
                bottom: geometry.line_y + FLASH_BAND_HEIGHT / 2.0,
                alpha,
            })
        });

        let snapshot = sim.score.snapshot();
        let hud = Hud {
            score: snapshot.score,
            best: snapshot.best,
            combo: snapshot.combo,
            max_combo: snapshot.max_combo,
            lane_count: sim.lane_count(),
            difficulty: sim.config.difficulty,
            beat_bpm: sim.config.beat_mode.then_some(sim.config.bpm),
            combo_scale: sim.effects.combo_scale(),
        };

        let overlay = match sim.state {
            GameState::Running => None,
            GameState::Paused => Some(Overlay::Paused),
            GameState::GameOver => Some(Overlay::GameOver),
        };

        Some(Self {
            width: sim.viewport.width(),
            height: sim.viewport.height(),
            scale: sim.viewport.density,
            lanes: lanes.to_vec(),
            tiles,
            judgement_line_y: geometry.line_y,
            hud,
            flash,
            float_texts: sim.effects.float_texts.clone(),
            sparks: sim.effects.sparks.clone(),
            ripples: sim.effects.ripples.clone(),
            shake: sim.effects.shake_amplitude(),
            overlay,
        })
    }

    /// Convert a dp position into surface pixels
    pub fn to_px(&self, p: Vec2) -> Vec2 {
        p * self.scale
    }
}

/// Anything that can display frames
pub trait RenderSurface: Send {
    fn present(&mut self, frame: &Frame);
}
