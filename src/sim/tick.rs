//! Per-frame simulation step
//!
//! Spawn scheduling, tile physics and effect decay. Game-over detection is
//! reported back to the caller, which owns the transition.

use super::state::{GameState, Simulation};
use super::tile::TileHandle;
use crate::consts::*;

/// What happened during one step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutcome {
    pub spawned: Option<TileHandle>,
    /// A tile left the screen unjudged; the session must end
    pub tile_escaped: bool,
}

/// Advance the simulation by `dt` seconds
///
/// No-op unless RUNNING with a valid viewport. `dt` is clamped to
/// `MAX_FRAME_DT`; non-finite or non-positive steps are ignored.
pub fn tick(sim: &mut Simulation, dt: f32) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    if !sim.viewport.is_valid() || sim.state != GameState::Running {
        return outcome;
    }
    if !dt.is_finite() || dt <= 0.0 {
        return outcome;
    }
    let dt = dt.min(MAX_FRAME_DT);

    // Spawn. The timer keeps its remainder so cadence does not drift.
    sim.spawn_timer += dt;
    let interval = sim.active_spawn_interval();
    if sim.spawn_timer >= interval {
        sim.spawn_timer -= interval;
        outcome.spawned = Some(sim.spawn_tile());

        if !sim.config.beat_mode {
            sim.speed = (sim.speed + sim.config.speed_increment_per_spawn).min(sim.config.max_speed);
            sim.spawn_interval = (sim.spawn_interval - sim.config.spawn_decrement_per_spawn)
                .max(sim.config.min_spawn_interval);
        }
        log::trace!(
            "Spawned tile (speed {:.1}, interval {:.3})",
            sim.speed,
            sim.active_spawn_interval()
        );
    }

    // Physics. The first tile to fall a full tile height past the bottom ends
    // the session.
    let bottom = sim.viewport.height();
    let step = sim.speed * dt;
    let mut escaped = None;
    for (handle, tile) in sim.tiles.iter_mut() {
        tile.y += step;
        if tile.y - TILE_HEIGHT > bottom {
            escaped = Some(handle);
            break;
        }
    }
    if let Some(handle) = escaped {
        sim.tiles.remove(handle);
        outcome.tile_escaped = true;
    }

    sim.effects.decay(dt);

    outcome
}
