//! Touch routing
//!
//! What the host view does with a touch-down before it reaches the engine.

use crate::engine::GameEngine;
use crate::sim::{GameState, Judgement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    /// The touch was judged as a tap
    Judged(Judgement),
    /// Game-over touch on the right half started a new session
    Restarted,
    /// Game-over touch on the left half; the host should offer sharing
    ShareRequested { score: u64, best: u64 },
}

impl TouchOutcome {
    /// Text to share for a `ShareRequested` outcome
    pub fn share_text(&self) -> Option<String> {
        match self {
            TouchOutcome::ShareRequested { score, best } => {
                Some(format!("Piano Tiles - Score: {score}, Best: {best}"))
            }
            _ => None,
        }
    }
}

/// Route a touch-down at pixel coordinates
pub fn dispatch_touch(engine: &GameEngine, x_px: f32, y_px: f32) -> TouchOutcome {
    let (over, half, snapshot) = engine.with_sim(|sim| {
        (
            sim.state == GameState::GameOver,
            sim.viewport.width_px as f32 * 0.5,
            sim.score.snapshot(),
        )
    });
    if over {
        if x_px < half {
            return TouchOutcome::ShareRequested {
                score: snapshot.score,
                best: snapshot.best,
            };
        }
        if engine.restart_if_game_over() {
            return TouchOutcome::Restarted;
        }
        // Another touch restarted first; this one lands in the new session
    }
    TouchOutcome::Judged(engine.on_tap(x_px, y_px))
}
