//! Fixed-cadence update/draw thread
//!
//! The loop calls `update(dt)` then `draw()` once per frame and then waits out
//! the rest of the frame budget on its stop channel, so a stop request is
//! noticed immediately rather than after the next sleep.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};

use crate::engine::GameEngine;
use crate::error::{Error, Result};
use crate::renderer::RenderSurface;

/// Handle to a running game loop; dropping it stops the loop
pub struct GameLoop<S: RenderSurface + 'static> {
    stop: Sender<()>,
    handle: Option<JoinHandle<S>>,
}

impl<S: RenderSurface + 'static> GameLoop<S> {
    /// Start driving `engine` at `target_fps`, presenting to `surface`
    pub fn spawn(engine: Arc<GameEngine>, surface: S, target_fps: u32) -> Result<Self> {
        let (stop, stop_rx) = bounded(1);
        let frame_budget = Duration::from_secs_f64(1.0 / f64::from(target_fps.max(1)));

        let handle = std::thread::Builder::new()
            .name("game-loop".into())
            .spawn(move || run(&engine, surface, &stop_rx, frame_budget))
            .map_err(Error::Spawn)?;

        log::info!("Game loop started at {} fps", target_fps.max(1));
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop the loop and get the surface back
    ///
    /// Engine resources are untouched; call `GameEngine::release` afterwards.
    pub fn stop(mut self) -> Result<S> {
        self.shutdown().ok_or(Error::LoopPanicked)
    }

    fn shutdown(&mut self) -> Option<S> {
        let handle = self.handle.take()?;
        // Full or disconnected both mean the loop is already on its way out
        let _ = self.stop.try_send(());
        match handle.join() {
            Ok(surface) => {
                log::info!("Game loop stopped");
                Some(surface)
            }
            Err(_) => {
                log::error!("Game loop thread panicked");
                None
            }
        }
    }
}

impl<S: RenderSurface + 'static> Drop for GameLoop<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<S: RenderSurface>(
    engine: &GameEngine,
    mut surface: S,
    stop: &Receiver<()>,
    frame_budget: Duration,
) -> S {
    let mut last = Instant::now();
    let mut frames: u64 = 0;

    loop {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        engine.update(dt);
        if let Some(frame) = engine.draw() {
            surface.present(&frame);
        }
        frames += 1;

        let wait = frame_budget.saturating_sub(now.elapsed());
        match stop.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    log::debug!("Game loop ran {frames} frames");
    surface
}
