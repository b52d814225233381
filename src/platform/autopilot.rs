//! Scripted player for headless runs
//!
//! Clicks on a fixed cadence, wiggles the mouse when the tutorial asks for
//! motion, and steers the arms open or closed from what the current step
//! rewards. It reads the state but never touches it.

use crate::consts::{ARM_CLOSED_THRESHOLD, MAX_ARM_SPREAD, SCREEN_WIDTH};
use crate::sim::{GameState, Resource, Step, SurvivalRound, TickInput, TutorialBeat};

use super::InputSource;

/// Mouse travel per frame while steering in the tutorial (spread moves half of this)
const STEER_PX: i32 = 40;
/// Enough travel to swing the arms fully in one frame
const SNAP_PX: i32 = 400;

#[derive(Debug, Clone)]
pub struct Autopilot {
    mouse_x: i32,
    frame: u64,
    /// Frames between clicks
    click_every: u64,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(20)
    }
}

impl Autopilot {
    pub fn new(click_every: u64) -> Self {
        Self {
            mouse_x: SCREEN_WIDTH / 2,
            frame: 0,
            click_every: click_every.max(1),
        }
    }

    pub fn mouse_x(&self) -> i32 {
        self.mouse_x
    }

    fn steer(&mut self, state: &GameState, open: bool, px: i32) {
        let spread = state.arms.spread();
        if open && spread < MAX_ARM_SPREAD {
            self.mouse_x += px;
        } else if !open && spread > 0.0 {
            self.mouse_x -= px;
        }
    }
}

/// Should the arms be open for this round frame?
fn round_wants_open(round: &SurvivalRound) -> bool {
    if !round.is_active() {
        return false;
    }
    if round
        .bird()
        .is_some_and(|b| b.is_warning() || (b.is_falling() && !b.is_checked()))
    {
        return false;
    }
    let weather = round.weather();
    let config = round.config();
    [Resource::Sunlight, Resource::Rain].into_iter().any(|r| {
        r.weather() == weather
            && config
                .required(r)
                .is_some_and(|need| round.collected(r) < need)
    })
}

impl InputSource for Autopilot {
    fn next_input(&mut self, state: &GameState, dt_ms: u32) -> TickInput {
        self.frame += 1;

        let wants_open = match &state.step {
            Step::Tutorial(TutorialBeat::ArmPractice { .. }) => {
                // Small wiggle around closed
                Some((state.arms.spread() < ARM_CLOSED_THRESHOLD / 2.0, STEER_PX))
            }
            Step::Tutorial(TutorialBeat::Sunlight { .. }) => Some((true, STEER_PX)),
            Step::Tutorial(_) => Some((false, STEER_PX)),
            Step::Round(round) => Some((round_wants_open(round), SNAP_PX)),
            _ => None,
        };
        if let Some((open, px)) = wants_open {
            self.steer(state, open, px);
        }

        let in_round = matches!(state.step, Step::Round(_));
        TickInput {
            dt_ms,
            mouse_x: self.mouse_x,
            click: !in_round && self.frame % self.click_every == 0,
            quit: false,
            debug_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Weather, tick};

    #[test]
    fn test_clicks_on_cadence() {
        let state = GameState::new(1, 0);
        let mut pilot = Autopilot::new(3);
        let clicks: Vec<bool> = (0..6).map(|_| pilot.next_input(&state, 16).click).collect();
        assert_eq!(clicks, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_opens_for_sunlight_lesson() {
        let mut state = GameState::new(1, 0);
        state.jump_to(12.0).unwrap();
        let mut pilot = Autopilot::default();
        state.arms.sync(pilot.mouse_x());
        for _ in 0..20 {
            let input = pilot.next_input(&state, 16);
            tick(&mut state, &input);
        }
        assert!(state.arms.is_open());
    }

    #[test]
    fn test_closes_in_damaging_weather() {
        let mut state = GameState::new(2, 0);
        state.jump_to(19.0).unwrap();
        let mut pilot = Autopilot::default();
        state.arms.sync(pilot.mouse_x());
        let idle = TickInput {
            dt_ms: 16,
            mouse_x: pilot.mouse_x(),
            ..TickInput::default()
        };
        while state.step.is_counting_down() {
            tick(&mut state, &idle);
        }
        if let Step::Round(round) = &mut state.step {
            round.force_weather(Weather::Rainy, f32::MAX);
        }
        state.arms.set_spread(MAX_ARM_SPREAD);
        for _ in 0..20 {
            let input = pilot.next_input(&state, 16);
            tick(&mut state, &input);
        }
        assert!(!state.arms.is_open());
    }

    #[test]
    fn test_no_clicks_during_round() {
        let mut state = GameState::new(3, 0);
        state.jump_to(25.0).unwrap();
        let mut pilot = Autopilot::new(1);
        assert!(!pilot.next_input(&state, 16).click);
    }
}
