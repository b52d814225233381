//! Level 3 bird strike: idle -> warning -> falling -> blocked / struck
//!
//! The block test runs exactly once per fall, on the frame the dropping
//! crosses the check height. Closing the arms after that frame changes nothing;
//! an unblocked dropping only ends the round when it reaches mid-screen.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BirdPhase {
    /// Waiting for the sunny spell to reach `trigger_at` seconds
    Idle { trigger_at: f32 },
    /// Cue on screen; the dropping has not left the bird yet
    Warning { elapsed: f32, duration: f32 },
    /// Dropping in flight
    Falling { pos: Vec2, checked: bool },
    /// Closed arms caught it at the check height
    Blocked,
    /// Reached the flower
    Struck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BirdEvent {
    WarningStarted,
    FallStarted,
    /// Check height passed with closed arms
    Blocked,
    /// Check height passed with open arms; still falling
    Missed,
    /// Dropping reached mid-screen
    Struck,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BirdStrike {
    phase: BirdPhase,
}

/// Height at which the single block test happens
pub fn check_height() -> f32 {
    SCREEN_HEIGHT as f32 * BIRD_CHECK_HEIGHT_RATIO
}

/// Height at which an unblocked dropping hits the flower
pub fn strike_height() -> f32 {
    (SCREEN_HEIGHT / 2) as f32
}

/// Intro demo dropping starts fading here
pub fn intro_fade_height() -> f32 {
    strike_height() - 100.0
}

/// Where every dropping starts
pub fn drop_origin() -> Vec2 {
    Vec2::new(
        (SCREEN_WIDTH / 2) as f32 + BIRD_START_X_OFFSET,
        BIRD_START_Y,
    )
}

/// One frame of fall: straight down with a proportional rightward drift
#[inline]
pub fn drop_step(pos: Vec2) -> Vec2 {
    pos + Vec2::new(BIRD_DROP_SPEED * BIRD_DRIFT_RATIO, BIRD_DROP_SPEED)
}

impl BirdStrike {
    /// Armed for a fresh sunny spell
    pub fn armed(rng: &mut impl Rng) -> Self {
        Self {
            phase: BirdPhase::Idle {
                trigger_at: rng.random_range(BIRD_TRIGGER_MIN..=BIRD_TRIGGER_MAX),
            },
        }
    }

    /// Re-arm on a new sunny spell; a dropping already in flight resolves first
    pub fn rearm(&mut self, rng: &mut impl Rng) {
        if !self.is_falling() {
            *self = Self::armed(rng);
        }
    }

    #[inline]
    pub fn phase(&self) -> BirdPhase {
        self.phase
    }

    pub fn is_started(&self) -> bool {
        !matches!(self.phase, BirdPhase::Idle { .. })
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.phase, BirdPhase::Warning { .. })
    }

    pub fn is_falling(&self) -> bool {
        matches!(self.phase, BirdPhase::Falling { .. })
    }

    pub fn is_checked(&self) -> bool {
        matches!(
            self.phase,
            BirdPhase::Falling { checked: true, .. } | BirdPhase::Blocked | BirdPhase::Struck
        )
    }

    /// True only after a successful block
    pub fn is_finished(&self) -> bool {
        self.phase == BirdPhase::Blocked
    }

    /// Dropping position while in flight
    pub fn position(&self) -> Option<Vec2> {
        match self.phase {
            BirdPhase::Falling { pos, .. } => Some(pos),
            _ => None,
        }
    }

    /// Advance one frame. `spell_elapsed` is seconds into the current sunny spell.
    ///
    /// Idle and warning only progress while sunny; a fall in flight always continues.
    pub fn update(
        &mut self,
        sunny: bool,
        spell_elapsed: f32,
        dt: f32,
        arms_open: bool,
        rng: &mut impl Rng,
    ) -> Vec<BirdEvent> {
        let mut events = Vec::new();

        if sunny {
            if let BirdPhase::Idle { trigger_at } = self.phase
                && spell_elapsed >= trigger_at
            {
                self.phase = BirdPhase::Warning {
                    elapsed: 0.0,
                    duration: rng.random_range(BIRD_WARNING_MIN..=BIRD_WARNING_MAX),
                };
                events.push(BirdEvent::WarningStarted);
            }

            if let BirdPhase::Warning { elapsed, duration } = &mut self.phase {
                *elapsed += dt;
                if *elapsed >= *duration {
                    self.phase = BirdPhase::Falling {
                        pos: drop_origin(),
                        checked: false,
                    };
                    events.push(BirdEvent::FallStarted);
                }
            }
        }

        if let BirdPhase::Falling { pos, checked } = &mut self.phase {
            *pos = drop_step(*pos);

            if pos.y >= check_height() && !*checked {
                *checked = true;
                if arms_open {
                    events.push(BirdEvent::Missed);
                } else {
                    self.phase = BirdPhase::Blocked;
                    events.push(BirdEvent::Blocked);
                    return events;
                }
            }

            if *checked && pos.y >= strike_height() {
                self.phase = BirdPhase::Struck;
                events.push(BirdEvent::Struck);
            }
        }

        events
    }

    /// Skip straight to the fall (tests and debug tooling)
    pub fn drop_now(&mut self) {
        self.phase = BirdPhase::Falling {
            pos: drop_origin(),
            checked: false,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DT: f32 = 0.016;

    fn falling() -> BirdStrike {
        let mut bird = BirdStrike::armed(&mut Pcg32::seed_from_u64(0));
        bird.drop_now();
        bird
    }

    #[test]
    fn test_warning_then_fall() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut bird = BirdStrike::armed(&mut rng);
        let mut spell = 0.0;
        let mut saw_warning = false;
        let mut saw_fall = false;
        for _ in 0..400 {
            spell += DT;
            for event in bird.update(true, spell, DT, false, &mut rng) {
                match event {
                    BirdEvent::WarningStarted => {
                        assert!(spell >= BIRD_TRIGGER_MIN);
                        saw_warning = true;
                    }
                    BirdEvent::FallStarted => {
                        assert!(saw_warning);
                        saw_fall = true;
                    }
                    _ => {}
                }
            }
            if saw_fall {
                break;
            }
        }
        assert!(saw_fall);
        assert!(bird.is_falling());
    }

    #[test]
    fn test_idle_waits_for_sunshine() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut bird = BirdStrike::armed(&mut rng);
        let events = bird.update(false, 10.0, DT, true, &mut rng);
        assert!(events.is_empty());
        assert!(!bird.is_started());
    }

    #[test]
    fn test_closed_arms_at_check_block_once() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut bird = falling();
        let mut frames = 0;
        loop {
            frames += 1;
            let events = bird.update(true, 0.0, DT, false, &mut rng);
            if events.contains(&BirdEvent::Blocked) {
                break;
            }
            assert!(frames < 100);
        }
        assert!(bird.is_finished());
        assert!(bird.position().is_none());
        // Open arms afterwards cannot undo the block
        for _ in 0..100 {
            assert!(bird.update(true, 0.0, DT, true, &mut rng).is_empty());
        }
        assert!(bird.is_finished());
    }

    #[test]
    fn test_open_arms_strike_exactly_at_midpoint() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut bird = falling();
        let mut checks = 0;
        loop {
            let before = bird.position().map(|p| p.y).unwrap_or_default();
            let events = bird.update(true, 0.0, DT, true, &mut rng);
            checks += events.iter().filter(|e| **e == BirdEvent::Missed).count();
            if events.contains(&BirdEvent::Struck) {
                assert!(before < strike_height());
                assert!(before + BIRD_DROP_SPEED >= strike_height());
                break;
            }
            assert!(bird.position().is_some_and(|p| p.y < strike_height()));
        }
        assert_eq!(checks, 1);
        assert_eq!(bird.phase(), BirdPhase::Struck);
    }

    #[test]
    fn test_closing_after_a_miss_does_not_save() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut bird = falling();
        while !bird.is_checked() {
            bird.update(true, 0.0, DT, true, &mut rng);
        }
        let mut struck = false;
        for _ in 0..100 {
            if bird.update(true, 0.0, DT, false, &mut rng).contains(&BirdEvent::Struck) {
                struck = true;
                break;
            }
        }
        assert!(struck);
    }

    #[test]
    fn test_fall_continues_when_weather_turns() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut bird = falling();
        let start = bird.position().unwrap();
        bird.update(false, 0.0, DT, true, &mut rng);
        assert_eq!(bird.position(), Some(drop_step(start)));
    }

    #[test]
    fn test_rearm_spares_a_fall_in_flight() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut bird = falling();
        bird.rearm(&mut rng);
        assert!(bird.is_falling());
        bird.update(true, 0.0, DT, false, &mut rng);
        let mut bird = BirdStrike { phase: BirdPhase::Blocked };
        bird.rearm(&mut rng);
        assert!(!bird.is_started());
    }
}
