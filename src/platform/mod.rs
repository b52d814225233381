//! Platform abstraction layer
//!
//! The simulation only sees one `TickInput` per frame. Anything that can
//! produce those (a window, a replay, the scripted autopilot) implements
//! `InputSource`.

pub mod autopilot;

pub use autopilot::Autopilot;

use crate::sim::{GameState, TickInput};

pub trait InputSource {
    /// Input for the next frame of `dt_ms`, given the state it will be applied to
    fn next_input(&mut self, state: &GameState, dt_ms: u32) -> TickInput;
}

/// Replays a fixed list of inputs, then idles
#[derive(Debug, Clone, Default)]
pub struct Replay {
    inputs: Vec<TickInput>,
    cursor: usize,
}

impl Replay {
    pub fn new(inputs: Vec<TickInput>) -> Self {
        Self { inputs, cursor: 0 }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.inputs.len()
    }
}

impl InputSource for Replay {
    fn next_input(&mut self, _state: &GameState, dt_ms: u32) -> TickInput {
        let input = self.inputs.get(self.cursor).copied().unwrap_or(TickInput {
            dt_ms,
            ..TickInput::default()
        });
        self.cursor += 1;
        input
    }
}
