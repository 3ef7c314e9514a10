//! Visual effect bookkeeping
//!
//! Effects never influence gameplay. They exist so a render surface has
//! something to draw after a tap: a lane flash, a floating judgement label,
//! a spark burst, a ripple ring, a combo pulse and a short shake on misses.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::judge::Judgement;
use crate::consts::*;

/// Rising judgement label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatText {
    pub judgement: Judgement,
    pub pos: Vec2,
    /// Seconds left
    pub life: f32,
}

/// A spark particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spark {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
}

/// Expanding ring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ripple {
    pub center: Vec2,
    pub radius: f32,
    pub growth: f32,
    pub life: f32,
}

impl Ripple {
    /// Opacity 0-1, fading with remaining life
    pub fn alpha(&self) -> f32 {
        (self.life / RIPPLE_LIFE).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Effects {
    /// Lane flashed by the last hit
    pub flash_lane: Option<usize>,
    pub flash_timer: f32,
    pub float_texts: Vec<FloatText>,
    pub sparks: Vec<Spark>,
    pub ripples: Vec<Ripple>,
    pub combo_pulse: f32,
    pub shake_timer: f32,
}

impl Effects {
    /// Burst at `origin` for an evaluated tap
    pub fn spawn_hit(&mut self, origin: Vec2, judgement: Judgement) {
        self.float_texts.push(FloatText {
            judgement,
            pos: origin - Vec2::new(0.0, FLOAT_TEXT_OFFSET),
            life: FLOAT_TEXT_LIFE,
        });

        for i in 0..SPARK_COUNT {
            if self.sparks.len() >= MAX_SPARKS {
                break;
            }
            let angle = std::f32::consts::TAU * (i as f32 / SPARK_COUNT as f32);
            let speed = SPARK_SPEED + i as f32 * SPARK_SPEED_STEP;
            self.sparks.push(Spark {
                pos: origin,
                vel: Vec2::from_angle(angle) * speed,
                life: SPARK_LIFE,
            });
        }

        self.ripples.push(Ripple {
            center: origin,
            radius: RIPPLE_START_RADIUS,
            growth: RIPPLE_GROWTH,
            life: RIPPLE_LIFE,
        });
    }

    /// Lane flash and combo pulse for a scored hit
    pub fn flash(&mut self, lane: usize) {
        self.flash_lane = Some(lane);
        self.flash_timer = FLASH_DURATION;
        self.combo_pulse = COMBO_PULSE_DURATION;
    }

    pub fn shake(&mut self) {
        self.shake_timer = SHAKE_DURATION;
    }

    /// Flash opacity 0-1
    pub fn flash_alpha(&self) -> f32 {
        if self.flash_lane.is_none() {
            return 0.0;
        }
        (self.flash_timer / FLASH_DURATION).clamp(0.0, 1.0)
    }

    /// HUD combo scale factor (1.0 at rest)
    pub fn combo_scale(&self) -> f32 {
        1.0 + COMBO_PULSE_SCALE * (self.combo_pulse / COMBO_PULSE_DURATION).clamp(0.0, 1.0)
    }

    /// Current shake amplitude (dp)
    pub fn shake_amplitude(&self) -> f32 {
        if self.shake_timer > 0.0 {
            SHAKE_AMPLITUDE
        } else {
            0.0
        }
    }

    /// Advance all effects by `dt` seconds and drop expired ones
    pub fn decay(&mut self, dt: f32) {
        if self.flash_timer > 0.0 {
            self.flash_timer = (self.flash_timer - dt).max(0.0);
        }
        if self.flash_timer <= 0.0 {
            self.flash_lane = None;
        }

        for text in &mut self.float_texts {
            text.pos.y -= FLOAT_TEXT_RISE_SPEED * dt;
            text.life -= dt;
        }
        self.float_texts.retain(|t| t.life > 0.0);

        for spark in &mut self.sparks {
            spark.pos += spark.vel * dt;
            spark.vel.y += SPARK_GRAVITY * dt;
            spark.life -= dt;
        }
        self.sparks.retain(|s| s.life > 0.0);

        for ripple in &mut self.ripples {
            ripple.radius += ripple.growth * dt;
            ripple.life -= dt;
        }
        self.ripples.retain(|r| r.life > 0.0);

        self.combo_pulse = (self.combo_pulse - dt).max(0.0);
        self.shake_timer = (self.shake_timer - dt).max(0.0);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
