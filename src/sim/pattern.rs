//! Seeded lane-selection patterns
//!
//! Four draws out of five avoid repeating the previous lane, which gives the
//! stream a "walking" feel. The remaining fifth is a free jump that may land
//! anywhere, including on the same lane again.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// One in `JUMP_ODDS` draws is a free jump
pub const JUMP_ODDS: u32 = 5;

#[derive(Debug, Clone)]
pub struct PatternGenerator {
    lane_count: usize,
    seed: u64,
    rng: Pcg32,
    last_lane: Option<usize>,
}

impl PatternGenerator {
    /// Create a generator over `[0, lane_count)`
    ///
    /// Seed 0 draws from OS entropy, so every session differs. Any other seed
    /// reproduces the same infinite sequence on every run.
    pub fn new(lane_count: usize, seed: u64) -> Self {
        let rng = if seed == 0 {
            Pcg32::from_os_rng()
        } else {
            Pcg32::seed_from_u64(seed)
        };
        Self {
            lane_count: lane_count.max(1),
            seed,
            rng,
            last_lane: None,
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Next lane in the sequence
    pub fn next_lane(&mut self) -> usize {
        let jump = self.rng.random_range(0..JUMP_ODDS) == 0;
        let lane = if jump || self.lane_count == 1 {
            self.rng.random_range(0..self.lane_count)
        } else {
            loop {
                let candidate = self.rng.random_range(0..self.lane_count);
                if Some(candidate) != self.last_lane {
                    break candidate;
                }
            }
        };
        self.last_lane = Some(lane);
        lane
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(generator: &mut PatternGenerator, n: usize) -> Vec<usize> {
        (0..n).map(|_| generator.next_lane()).collect()
    }

    #[test]
    fn test_seeded_sequences_repeat() {
        let mut a = PatternGenerator::new(4, 12345);
        let mut b = PatternGenerator::new(4, 12345);
        assert_eq!(take(&mut a, 500), take(&mut b, 500));
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = PatternGenerator::new(6, 1);
        let mut b = PatternGenerator::new(6, 2);
        assert_ne!(take(&mut a, 64), take(&mut b, 64));
    }

    #[test]
    fn test_lanes_stay_in_range() {
        for lanes in 3..=6 {
            let mut generator = PatternGenerator::new(lanes, 777);
            assert!(take(&mut generator, 1000).iter().all(|&l| l < lanes));
        }
    }

    #[test]
    fn test_repeats_only_come_from_jumps() {
        // Repeats only happen on a jump that lands on the previous lane:
        // P = 1/5 * 1/L. For L = 4 that is 5%, so 20_000 draws should sit
        // well under 10% and well above 1%.
        let mut generator = PatternGenerator::new(4, 99);
        let draws = take(&mut generator, 20_000);
        let repeats = draws.windows(2).filter(|w| w[0] == w[1]).count();
        let rate = repeats as f64 / (draws.len() - 1) as f64;
        assert!(rate > 0.01 && rate < 0.10, "repeat rate {rate}");
    }

    #[test]
    fn test_every_lane_gets_used() {
        let mut generator = PatternGenerator::new(5, 31337);
        let draws = take(&mut generator, 2000);
        for lane in 0..5 {
            assert!(draws.contains(&lane), "lane {lane} never drawn");
        }
    }

    #[test]
    fn test_unseeded_generator_works() {
        let mut generator = PatternGenerator::new(3, 0);
        assert_eq!(generator.seed(), 0);
        assert!(take(&mut generator, 100).iter().all(|&l| l < 3));
    }

    #[test]
    fn test_single_lane_does_not_spin() {
        let mut generator = PatternGenerator::new(1, 5);
        assert_eq!(take(&mut generator, 10), vec![0; 10]);
    }
}
