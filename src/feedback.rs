//! Audio and haptic feedback
//!
//! The engine reports what happened; a `Feedback` implementation decides what
//! it sounds or feels like. Every method is best-effort and defaults to a
//! no-op, so an implementation only overrides what its platform supports.

use std::time::Duration;

use crate::sim::Judgement;

/// Sound effect and vibration sink
pub trait Feedback: Send {
    /// Tone for a scored hit in `lane`
    fn play_note(&mut self, _lane: usize, _judgement: Judgement) {}

    /// Cue for a miss
    fn play_miss(&mut self) {}

    /// Start or stop the background loop
    fn set_background(&mut self, _playing: bool) {}

    fn vibrate(&mut self, _duration: Duration) {}

    /// Free any audio resources. Called once, after the game loop stopped.
    fn release(&mut self) {}
}

/// Silent feedback
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeedback;

impl Feedback for NullFeedback {}

/// Feedback that only logs what it would have played
#[derive(Debug, Clone, Default)]
pub struct LogFeedback {
    background: bool,
}

impl LogFeedback {
    pub fn background_playing(&self) -> bool {
        self.background
    }
}

impl Feedback for LogFeedback {
    fn play_note(&mut self, lane: usize, judgement: Judgement) {
        log::debug!("note: lane {} ({})", lane, judgement.as_str());
    }

    fn play_miss(&mut self) {
        log::debug!("note: miss");
    }

    fn set_background(&mut self, playing: bool) {
        if self.background != playing {
            log::debug!("background audio {}", if playing { "on" } else { "off" });
            self.background = playing;
        }
    }

    fn vibrate(&mut self, duration: Duration) {
        log::debug!("vibrate {}ms", duration.as_millis());
    }

    fn release(&mut self) {
        self.background = false;
        log::debug!("audio released");
    }
}

/// Vibration length for a judgement, `None` when nothing was evaluated
pub fn haptic_duration(judgement: Judgement) -> Option<Duration> {
    let ms = match judgement {
        Judgement::Perfect => 10,
        Judgement::Great => 16,
        Judgement::Good => 24,
        Judgement::Miss => 32,
        Judgement::None => return None,
    };
    Some(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haptic_durations_grow_with_error() {
        let ms = |j| haptic_duration(j).map(|d| d.as_millis());
        assert_eq!(ms(Judgement::Perfect), Some(10));
        assert_eq!(ms(Judgement::Great), Some(16));
        assert_eq!(ms(Judgement::Good), Some(24));
        assert_eq!(ms(Judgement::Miss), Some(32));
        assert_eq!(ms(Judgement::None), None);
    }

    #[test]
    fn test_log_feedback_tracks_background() {
        let mut fx = LogFeedback::default();
        fx.set_background(true);
        assert!(fx.background_playing());
        fx.release();
        assert!(!fx.background_playing());
    }
}
