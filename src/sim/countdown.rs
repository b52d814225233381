//! Three-second freeze before a round goes live

use serde::{Deserialize, Serialize};

use crate::consts::COUNTDOWN_MS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    running: bool,
    elapsed_ms: u32,
}

impl Countdown {
    /// A countdown that is already running
    pub fn started() -> Self {
        Self {
            running: true,
            elapsed_ms: 0,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    /// Whole seconds left to show; 0 means nothing is drawn
    pub fn remaining(&self) -> u32 {
        (COUNTDOWN_MS / 1000).saturating_sub(self.elapsed_ms / 1000)
    }

    /// Advance the clock; returns true on the frame the gate opens
    pub fn advance(&mut self, dt_ms: u32) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        if self.elapsed_ms > COUNTDOWN_MS {
            self.running = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_strictly_after_three_seconds() {
        let mut cd = Countdown::started();
        assert!(!cd.advance(3000));
        assert!(cd.is_running());
        assert!(cd.advance(1));
        assert!(!cd.is_running());
        assert!(!cd.advance(16));
    }

    #[test]
    fn test_remaining_counts_down_whole_seconds() {
        let mut cd = Countdown::started();
        assert_eq!(cd.remaining(), 3);
        cd.advance(999);
        assert_eq!(cd.remaining(), 3);
        cd.advance(1);
        assert_eq!(cd.remaining(), 2);
        cd.advance(1000);
        assert_eq!(cd.remaining(), 1);
        cd.advance(1000);
        assert_eq!(cd.remaining(), 0);
    }

    #[test]
    fn test_idle_countdown_never_fires() {
        let mut cd = Countdown::default();
        assert!(!cd.advance(5000));
    }
}
