//! Session configuration and difficulty presets
//!
//! A `SessionConfig` is what the menu (or the CLI) hands the engine before a
//! run. Values are never rejected: `sanitized()` clamps everything to the
//! nearest valid bound.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::persistence;

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

/// Speed and spawn tuning derived from a difficulty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyPreset {
    /// Fall speed at session start (dp/s)
    pub base_speed: f32,
    /// Seconds between spawns at session start
    pub base_spawn_interval: f32,
    /// Floor the spawn interval ramps down to
    pub min_spawn_interval: f32,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn preset(&self) -> DifficultyPreset {
        match self {
            Difficulty::Easy => DifficultyPreset {
                base_speed: 500.0,
                base_spawn_interval: 0.9,
                min_spawn_interval: 0.35,
            },
            Difficulty::Normal => DifficultyPreset {
                base_speed: 600.0,
                base_spawn_interval: 0.8,
                min_spawn_interval: 0.30,
            },
            Difficulty::Hard => DifficultyPreset {
                base_speed: 700.0,
                base_spawn_interval: 0.7,
                min_spawn_interval: 0.28,
            },
        }
    }
}

/// Everything the engine needs to run one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of lanes (3-6)
    pub lane_count: usize,
    /// Label shown in stats; also selects the preset below
    pub difficulty: Difficulty,

    // === Speed / spawn tuning ===
    pub base_speed: f32,
    pub max_speed: f32,
    pub speed_increment_per_spawn: f32,
    pub base_spawn_interval: f32,
    pub spawn_decrement_per_spawn: f32,
    pub min_spawn_interval: f32,

    // === Feedback ===
    pub haptics_enabled: bool,
    pub sound_enabled: bool,

    // === Beat mode ===
    /// Lock spawn cadence to `bpm` instead of ramping difficulty
    pub beat_mode: bool,
    pub bpm: f32,

    // === Pattern mode ===
    /// Use the seeded pattern generator for lane selection
    pub pattern_mode: bool,
    /// 0 = fresh entropy every session
    pub pattern_seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::Normal)
    }
}

impl SessionConfig {
    /// Config with the given difficulty's preset and default everything else
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let preset = difficulty.preset();
        Self {
            lane_count: DEFAULT_LANES,
            difficulty,
            base_speed: preset.base_speed,
            max_speed: MAX_SPEED,
            speed_increment_per_spawn: SPEED_INCREMENT_PER_SPAWN,
            base_spawn_interval: preset.base_spawn_interval,
            spawn_decrement_per_spawn: SPAWN_DECREMENT_PER_SPAWN,
            min_spawn_interval: preset.min_spawn_interval,
            haptics_enabled: true,
            sound_enabled: false,
            beat_mode: false,
            bpm: DEFAULT_BPM,
            pattern_mode: false,
            pattern_seed: 0,
        }
    }

    /// Switch difficulty, replacing the preset-derived tuning
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        let preset = difficulty.preset();
        self.difficulty = difficulty;
        self.base_speed = preset.base_speed;
        self.base_spawn_interval = preset.base_spawn_interval;
        self.min_spawn_interval = preset.min_spawn_interval;
    }

    /// Copy with every value clamped to its valid range
    pub fn sanitized(&self) -> Self {
        let preset = self.difficulty.preset();
        let mut cfg = self.clone();

        cfg.lane_count = self.lane_count.clamp(MIN_LANES, MAX_LANES);

        cfg.base_speed = positive_or(self.base_speed, preset.base_speed);
        cfg.max_speed = positive_or(self.max_speed, MAX_SPEED).max(cfg.base_speed);
        cfg.speed_increment_per_spawn = non_negative_or(self.speed_increment_per_spawn, 0.0);

        cfg.base_spawn_interval = positive_or(self.base_spawn_interval, preset.base_spawn_interval);
        cfg.min_spawn_interval = positive_or(self.min_spawn_interval, preset.min_spawn_interval)
            .min(cfg.base_spawn_interval);
        cfg.spawn_decrement_per_spawn = non_negative_or(self.spawn_decrement_per_spawn, 0.0);

        cfg.bpm = if self.bpm.is_finite() {
            self.bpm.clamp(60.0 / MAX_BEAT_INTERVAL, 60.0 / MIN_BEAT_INTERVAL)
        } else {
            DEFAULT_BPM
        };

        cfg
    }

    /// Seconds between beats, clamped to the playable range
    pub fn beat_interval(&self) -> f32 {
        let bpm = if self.bpm.is_finite() && self.bpm > 0.0 {
            self.bpm
        } else {
            DEFAULT_BPM
        };
        (60.0 / bpm).clamp(MIN_BEAT_INTERVAL, MAX_BEAT_INTERVAL)
    }

    /// Load a config file; missing fields fall back to defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let cfg: Self = serde_json::from_str(&text).map_err(|e| Error::json(path, e))?;
        log::info!("Loaded session config from {}", path.display());
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        persistence::write_json_atomic(path, self)?;
        log::info!("Session config saved to {}", path.display());
        Ok(())
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

fn non_negative_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}
