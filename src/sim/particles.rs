//! Falling precipitation drops (rain and sour rain)
//!
//! Each system keeps at most `RAINDROP_COUNT` drops. While its predicate holds,
//! every missing slot has a fixed chance per frame to spawn a drop above the
//! screen; when the predicate drops, the whole list is discarded at once.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// A single drop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drop {
    pub x: f32,
    pub y: f32,
    /// Pixels per frame
    pub speed: f32,
}

/// Which sprite a system draws with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrecipitationKind {
    Rain,
    SourRain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    pub kind: PrecipitationKind,
    drops: Vec<Drop>,
}

impl Precipitation {
    pub fn new(kind: PrecipitationKind) -> Self {
        Self {
            kind,
            drops: Vec::with_capacity(RAINDROP_COUNT),
        }
    }

    #[inline]
    pub fn drops(&self) -> &[Drop] {
        &self.drops
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.drops.is_empty()
    }

    pub fn clear(&mut self) {
        self.drops.clear();
    }

    /// Advance one frame; `active` is this frame's should-rain predicate
    pub fn update(&mut self, active: bool, rng: &mut impl Rng) {
        if !active {
            self.drops.clear();
            return;
        }

        let missing = RAINDROP_COUNT.saturating_sub(self.drops.len());
        for _ in 0..missing {
            if rng.random::<f32>() < RAINDROP_SPAWN_CHANCE {
                self.drops.push(spawn(rng));
            }
        }

        let floor = SCREEN_HEIGHT as f32 + RAINDROP_CULL_MARGIN;
        for drop in &mut self.drops {
            drop.y += drop.speed;
        }
        self.drops.retain(|d| d.y < floor);
    }
}

fn spawn(rng: &mut impl Rng) -> Drop {
    Drop {
        x: rng.random_range(0..=SCREEN_WIDTH) as f32,
        y: rng.random_range(-SCREEN_HEIGHT / 4..=0) as f32,
        speed: rng.random_range(RAINDROP_SPEED_MIN..=RAINDROP_SPEED_MAX),
    }
}
