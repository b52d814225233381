//! Mouse motion to arm-spread mapping

use serde::{Deserialize, Serialize};

use crate::consts::{ARM_CLOSED_THRESHOLD, ARM_MOVEMENT_SPEED, MAX_ARM_SPREAD};

/// Accumulated horizontal mouse motion, clamped to [0, MAX_ARM_SPREAD]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmInput {
    spread: f32,
    last_mouse_x: i32,
}

impl ArmInput {
    pub fn new(mouse_x: i32) -> Self {
        Self {
            spread: 0.0,
            last_mouse_x: mouse_x,
        }
    }

    #[inline]
    pub fn spread(&self) -> f32 {
        self.spread
    }

    /// Exactly at the threshold counts as closed
    #[inline]
    pub fn is_open(&self) -> bool {
        self.spread > ARM_CLOSED_THRESHOLD
    }

    /// Horizontal motion since the last sync
    #[inline]
    pub fn delta(&self, mouse_x: i32) -> i32 {
        mouse_x.saturating_sub(self.last_mouse_x)
    }

    pub fn accumulate(&mut self, dx: i32) {
        self.spread = (self.spread + dx as f32 * ARM_MOVEMENT_SPEED).clamp(0.0, MAX_ARM_SPREAD);
    }

    /// Adopt the current mouse position as the motion reference
    #[inline]
    pub fn sync(&mut self, mouse_x: i32) {
        self.last_mouse_x = mouse_x;
    }

    pub fn close(&mut self) {
        self.spread = 0.0;
    }

    #[cfg(test)]
    pub fn set_spread(&mut self, spread: f32) {
        self.spread = spread.clamp(0.0, MAX_ARM_SPREAD);
    }
}
