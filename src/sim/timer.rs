//! Frame-advanced stopwatch used for step beats and sub-phase delays

use serde::{Deserialize, Serialize};

/// Milliseconds accumulated from frame deltas since the stopwatch was (re)started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stopwatch {
    elapsed_ms: u64,
}

impl Stopwatch {
    pub const fn new() -> Self {
        Self { elapsed_ms: 0 }
    }

    #[inline]
    pub fn advance(&mut self, dt_ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms as u64);
    }

    #[inline]
    pub fn restart(&mut self) {
        self.elapsed_ms = 0;
    }

    #[inline]
    pub fn elapsed(&self) -> u64 {
        self.elapsed_ms
    }

    /// Strictly more than `threshold_ms` has passed
    #[inline]
    pub fn expired(&self, threshold_ms: u64) -> bool {
        self.elapsed_ms > threshold_ms
    }
}
