//! Score, combo and best-score bookkeeping

use serde::{Deserialize, Serialize};

use super::judge::Judgement;

/// Every `COMBO_STEP` combo adds `COMBO_BONUS` to each hit
pub const COMBO_STEP: u32 = 10;
pub const COMBO_BONUS: u64 = 2;

/// Points awarded for a judgement before combo bonus
pub fn base_points(judgement: Judgement) -> u64 {
    match judgement {
        Judgement::Perfect => 20,
        Judgement::Great => 15,
        Judgement::Good => 10,
        Judgement::Miss | Judgement::None => 0,
    }
}

/// Point-in-time copy of the score counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub best: u64,
}

/// Score counters for one session plus the all-time best
///
/// Purely in-memory. `hit` reports a new record so the owner can persist it
/// outside any lock.
#[derive(Debug, Clone, Default)]
pub struct ScoreManager {
    score: u64,
    combo: u32,
    max_combo: u32,
    best: u64,
}

impl ScoreManager {
    /// Start from a previously stored best
    pub fn new(best: u64) -> Self {
        Self {
            best,
            ..Self::default()
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            score: self.score,
            combo: self.combo,
            max_combo: self.max_combo,
            best: self.best,
        }
    }

    /// Register a scored judgement
    ///
    /// The combo bonus uses the combo *after* this hit is counted, so the
    /// tenth consecutive hit is the first to earn it. Returns the new best
    /// when this hit set a record.
    pub fn hit(&mut self, judgement: Judgement) -> Option<u64> {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);

        let bonus = u64::from(self.combo / COMBO_STEP) * COMBO_BONUS;
        self.score += base_points(judgement) + bonus;

        if self.score > self.best {
            self.best = self.score;
            Some(self.best)
        } else {
            None
        }
    }

    pub fn reset_combo_on_miss(&mut self) {
        self.combo = 0;
    }

    /// Start a fresh session; the all-time best is kept
    pub fn reset_all(&mut self) {
        self.score = 0;
        self.combo = 0;
        self.max_combo = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_points_and_combo_bonus() {
        let mut score = ScoreManager::default();

        score.hit(Judgement::Perfect);
        assert_eq!(score.score(), 20);
        score.hit(Judgement::Great);
        assert_eq!(score.score(), 35);
        score.hit(Judgement::Good);
        assert_eq!(score.score(), 45);
        assert_eq!(score.combo(), 3);

        // Hits 4..=9 add no bonus, hit 10 adds the first +2
        for _ in 4..10 {
            score.hit(Judgement::Good);
        }
        assert_eq!(score.score(), 45 + 6 * 10);
        score.hit(Judgement::Good);
        assert_eq!(score.combo(), 10);
        assert_eq!(score.score(), 45 + 6 * 10 + 12);
    }

    #[test]
    fn test_miss_resets_combo_only() {
        let mut score = ScoreManager::default();
        score.hit(Judgement::Perfect);
        score.hit(Judgement::Perfect);
        score.reset_combo_on_miss();

        assert_eq!(score.combo(), 0);
        assert_eq!(score.max_combo(), 2);
        assert_eq!(score.score(), 40);
    }

    #[test]
    fn test_hit_reports_records_only() {
        let mut score = ScoreManager::new(30);
        assert_eq!(score.hit(Judgement::Perfect), None);
        // Tying the best is not a record
        assert_eq!(score.hit(Judgement::Good), None);
        assert_eq!(score.best(), 30);
        assert_eq!(score.hit(Judgement::Good), Some(40));
        assert_eq!(score.best(), 40);
    }

    #[test]
    fn test_best_survives_reset() {
        let mut score = ScoreManager::default();
        assert_eq!(score.hit(Judgement::Perfect), Some(20));
        assert_eq!(score.hit(Judgement::Great), Some(35));

        score.reset_all();
        assert_eq!(score.snapshot(), ScoreSnapshot { score: 0, combo: 0, max_combo: 0, best: 35 });

        // A lower session never lowers the best
        assert_eq!(score.hit(Judgement::Good), None);
        assert_eq!(score.best(), 35);
    }
}
