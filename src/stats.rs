//! Completed-run leaderboard and lifetime aggregates
//!
//! The engine reports every finished session through `StatsSink`. The
//! reference store keeps the top 20 runs sorted by score, plus running totals,
//! in one JSON document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::error::Result;
use crate::persistence::{read_json, write_json_atomic};
use crate::sim::SessionResult;

/// Maximum number of runs kept on the leaderboard
pub const MAX_LEADERBOARD_ENTRIES: usize = 20;

/// A single finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsEntry {
    pub score: u64,
    pub max_combo: u32,
    pub lanes: usize,
    pub difficulty: Difficulty,
    /// Tempo when the run used beat mode
    #[serde(default)]
    pub beat_bpm: Option<f32>,
    /// Unix timestamp (ms) when the run ended
    pub timestamp_ms: u64,
}

impl From<&SessionResult> for StatsEntry {
    fn from(result: &SessionResult) -> Self {
        Self {
            score: result.score,
            max_combo: result.max_combo,
            lanes: result.lane_count,
            difficulty: result.difficulty,
            beat_bpm: result.beat_bpm,
            timestamp_ms: result.ended_at_ms,
        }
    }
}

/// Where finished sessions are reported
///
/// Called outside the simulation lock. Errors are logged by the caller and
/// never interrupt play.
pub trait StatsSink: Send {
    fn add_entry(&mut self, entry: &StatsEntry) -> Result<()>;

    /// Add the length of the session that just ended to the play-time total
    fn set_last_session_duration(&mut self, secs: u64) -> Result<()>;
}

/// Top runs, sorted by score descending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<StatsEntry>,
}

impl Leaderboard {
    /// Whether a score would make the board
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_LEADERBOARD_ENTRIES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Insert a run; returns its rank (1-indexed) if it made the board
    ///
    /// Ties keep the earlier run ahead.
    pub fn add(&mut self, entry: StatsEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }
        let pos = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_LEADERBOARD_ENTRIES);
        Some(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

/// Lifetime totals across every reported run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    pub total_runs: u64,
    pub total_play_time_secs: u64,
    pub total_score: u64,
    pub best_score: u64,
}

impl Aggregates {
    pub fn avg_score(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            self.total_score as f64 / self.total_runs as f64
        }
    }

    fn record(&mut self, score: u64) {
        self.total_runs += 1;
        self.total_score = self.total_score.saturating_add(score);
        self.best_score = self.best_score.max(score);
    }
}

/// Everything the stats stores persist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsDoc {
    pub leaderboard: Leaderboard,
    pub aggregates: Aggregates,
}

impl StatsDoc {
    fn add_entry(&mut self, entry: &StatsEntry) {
        if let Some(rank) = self.leaderboard.add(entry.clone()) {
            log::info!("Run scored {} (rank #{})", entry.score, rank);
        }
        self.aggregates.record(entry.score);
    }

    fn add_play_time(&mut self, secs: u64) {
        self.aggregates.total_play_time_secs =
            self.aggregates.total_play_time_secs.saturating_add(secs);
    }
}

/// Stats kept in a JSON file, rewritten atomically on every change
#[derive(Debug)]
pub struct JsonStatsStore {
    path: PathBuf,
    doc: StatsDoc,
}

impl JsonStatsStore {
    /// Open the store at `path`; a missing file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = read_json::<StatsDoc>(&path)?.unwrap_or_default();
        log::info!(
            "Loaded stats from {} ({} runs)",
            path.display(),
            doc.aggregates.total_runs
        );
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn leaderboard(&self) -> &[StatsEntry] {
        &self.doc.leaderboard.entries
    }

    pub fn aggregates(&self) -> Aggregates {
        self.doc.aggregates
    }

    /// Forget every run and total
    pub fn clear(&mut self) -> Result<()> {
        self.doc = StatsDoc::default();
        self.save()
    }

    fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.doc)
    }
}

impl StatsSink for JsonStatsStore {
    fn add_entry(&mut self, entry: &StatsEntry) -> Result<()> {
        self.doc.add_entry(entry);
        self.save()
    }

    fn set_last_session_duration(&mut self, secs: u64) -> Result<()> {
        self.doc.add_play_time(secs);
        self.save()
    }
}

/// In-memory stats; clones share the same document
#[derive(Debug, Clone, Default)]
pub struct MemoryStats {
    doc: Arc<Mutex<StatsDoc>>,
}

impl MemoryStats {
    pub fn snapshot(&self) -> StatsDoc {
        self.doc.lock().clone()
    }
}

impl StatsSink for MemoryStats {
    fn add_entry(&mut self, entry: &StatsEntry) -> Result<()> {
        self.doc.lock().add_entry(entry);
        Ok(())
    }

    fn set_last_session_duration(&mut self, secs: u64) -> Result<()> {
        self.doc.lock().add_play_time(secs);
        Ok(())
    }
}
