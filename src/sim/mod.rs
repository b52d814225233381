//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame-stepped only; time arrives as integer milliseconds
//! - Seeded RNG only
//! - Side effects leave as `GameEvent`s, never direct calls
//! - No rendering or platform dependencies

pub mod alpha;
pub mod arms;
pub mod bird;
pub mod countdown;
pub mod particles;
pub mod state;
pub mod survival;
pub mod tick;
pub mod timer;
pub mod weather;

pub use alpha::{AlphaMap, Layer};
pub use arms::ArmInput;
pub use bird::{BirdEvent, BirdPhase, BirdStrike};
pub use countdown::Countdown;
pub use particles::{Drop, Precipitation, PrecipitationKind};
pub use state::{
    DebugKey, EndingBeat, GameEvent, GameState, IntroPage, OpeningBeat, Step, StepError,
    TutorialBeat,
};
pub use survival::{LevelConfig, LevelId, LossCause, Outcome, Resource, RoundTick, SurvivalRound};
pub use tick::{TickInput, tick};
pub use timer::Stopwatch;
pub use weather::{Weather, WeatherCycle, WeatherPlan, WeatherSelection};
