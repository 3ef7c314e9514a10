//! Hit judgement
//!
//! A tap is judged in two passes:
//! 1. Direct hit: the tap lands on a tile body. This always scores at least
//!    GOOD, however far the tile still is from the judgement line.
//! 2. Proximity: otherwise the tile whose center is nearest the line is judged
//!    by distance, and anything past the GOOD window is a MISS.
//!
//! All distances are dp, measured from tile center to the judgement line.

use serde::{Deserialize, Serialize};

use super::tile::{TileArena, TileHandle};
use crate::consts::*;

/// Outcome of a tap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Judgement {
    Perfect,
    Great,
    Good,
    Miss,
    /// No input was evaluated (paused, game over, no geometry)
    None,
}

impl Judgement {
    /// Whether this judgement consumes a tile and scores
    pub fn is_hit(&self) -> bool {
        matches!(self, Judgement::Perfect | Judgement::Great | Judgement::Good)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Judgement::Perfect => "PERFECT",
            Judgement::Great => "GREAT",
            Judgement::Good => "GOOD",
            Judgement::Miss => "MISS",
            Judgement::None => "NONE",
        }
    }
}

/// Judgement windows (dp)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitWindows {
    pub perfect: f32,
    pub great: f32,
    pub good: f32,
}

impl Default for HitWindows {
    fn default() -> Self {
        Self {
            perfect: HIT_WINDOW_PERFECT,
            great: HIT_WINDOW_GREAT,
            good: HIT_WINDOW_GOOD,
        }
    }
}

impl HitWindows {
    /// Judge a tap that landed on the tile body
    pub fn judge_direct(&self, distance: f32) -> Judgement {
        if distance <= self.perfect {
            Judgement::Perfect
        } else if distance <= self.great {
            Judgement::Great
        } else {
            Judgement::Good
        }
    }

    /// Judge the nearest tile when the tap missed every tile body
    pub fn judge_proximity(&self, distance: f32) -> Judgement {
        if distance <= self.perfect {
            Judgement::Perfect
        } else if distance <= self.great {
            Judgement::Great
        } else if distance <= self.good {
            Judgement::Good
        } else {
            Judgement::Miss
        }
    }
}

/// Where the tiles are judged against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeGeometry {
    pub tile_height: f32,
    pub line_y: f32,
    pub windows: HitWindows,
}

impl JudgeGeometry {
    /// Standard geometry for a play area `height` dp tall
    pub fn for_height(height: f32) -> Self {
        Self {
            tile_height: TILE_HEIGHT,
            line_y: height - TILE_HEIGHT / 2.0,
            windows: HitWindows::default(),
        }
    }
}

/// Result of judging a tap against one lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapVerdict {
    pub judgement: Judgement,
    /// Tile to consume; `Some` exactly when the judgement is a hit
    pub tile: Option<TileHandle>,
    /// Distance from the judged tile's center to the line
    pub distance: Option<f32>,
}

impl TapVerdict {
    fn miss() -> Self {
        Self {
            judgement: Judgement::Miss,
            tile: None,
            distance: None,
        }
    }
}

/// Judge a tap at height `y` in `lane`. Never mutates the tiles.
pub fn judge_tap(tiles: &TileArena, lane: usize, y: f32, geometry: &JudgeGeometry) -> TapVerdict {
    let h = geometry.tile_height;
    let distance_of = |tile_y: f32| (tile_y + h / 2.0 - geometry.line_y).abs();

    // Pass 1: on a tile body, prefer the one closest to resolution
    let direct = tiles
        .in_lane(lane)
        .filter(|(_, tile)| tile.contains_y(y, h))
        .max_by(|(_, a), (_, b)| a.y.total_cmp(&b.y));

    if let Some((handle, tile)) = direct {
        let distance = distance_of(tile.y);
        return TapVerdict {
            judgement: geometry.windows.judge_direct(distance),
            tile: Some(handle),
            distance: Some(distance),
        };
    }

    // Pass 2: nearest center to the judgement line
    let nearest = tiles
        .in_lane(lane)
        .map(|(handle, tile)| (handle, distance_of(tile.y)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b));

    match nearest {
        Some((handle, distance)) => {
            let judgement = geometry.windows.judge_proximity(distance);
            TapVerdict {
                judgement,
                tile: judgement.is_hit().then_some(handle),
                distance: Some(distance),
            }
        }
        None => TapVerdict::miss(),
    }
}
