//! Consecutive-collection streak tracking
//!
//! The combo advances on every mining attempt, whether or not the hash
//! search succeeds. Attempts closer together than the window extend the
//! streak; a longer gap resets it to 1.

/// Streak counter keyed on wall-clock gaps between attempts
#[derive(Debug, Clone)]
pub struct ComboTracker {
    window_ms: u64,
    combo: u32,
    last_mining_time_ms: u64,
}

impl ComboTracker {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            combo: 0,
            last_mining_time_ms: 0,
        }
    }

    /// Resume a streak from persisted stats
    pub fn resume(window_ms: u64, combo: u32, last_mining_time_ms: u64) -> Self {
        Self {
            window_ms,
            combo,
            last_mining_time_ms,
        }
    }

    /// Advance the streak for one attempt and return the new combo.
    /// `last_mining_time` updates regardless of whether the streak extended.
    pub fn record_attempt(&mut self, now_ms: u64) -> u32 {
        if now_ms.saturating_sub(self.last_mining_time_ms) < self.window_ms {
            self.combo += 1;
        } else {
            self.combo = 1;
        }
        self.last_mining_time_ms = now_ms;
        self.combo
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn last_mining_time_ms(&self) -> u64 {
        self.last_mining_time_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempts_inside_window_extend_streak() {
        let mut tracker = ComboTracker::new(10_000);
        assert_eq!(tracker.record_attempt(100_000), 1);
        assert_eq!(tracker.record_attempt(105_000), 2);
        assert_eq!(tracker.record_attempt(114_999), 3);
    }

    #[test]
    fn test_gap_at_or_past_window_resets_to_one() {
        let mut tracker = ComboTracker::new(10_000);
        tracker.record_attempt(100_000);
        tracker.record_attempt(105_000);
        // Exactly the window is already outside the streak
        assert_eq!(tracker.record_attempt(115_000), 1);
    }

    #[test]
    fn test_close_pair_beats_far_pair() {
        let mut close = ComboTracker::new(10_000);
        close.record_attempt(0);
        let close_combo = close.record_attempt(9_999);

        let mut far = ComboTracker::new(10_000);
        far.record_attempt(0);
        let far_combo = far.record_attempt(10_000);

        assert!(close_combo > far_combo);
    }

    #[test]
    fn test_last_time_updates_even_on_reset() {
        let mut tracker = ComboTracker::new(10_000);
        tracker.record_attempt(100_000);
        tracker.record_attempt(500_000);
        assert_eq!(tracker.last_mining_time_ms(), 500_000);
        // The reset attempt still anchors the next streak
        assert_eq!(tracker.record_attempt(505_000), 2);
    }

    #[test]
    fn test_resume_continues_persisted_streak() {
        let mut tracker = ComboTracker::resume(10_000, 4, 100_000);
        assert_eq!(tracker.combo(), 4);
        assert_eq!(tracker.record_attempt(105_000), 5);
    }
}
