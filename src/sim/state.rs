//! Sequencer state: the step enum and everything the steps share
//!
//! Only the sequencer mutates this. Each `Step` variant carries the data its
//! phase needs; shared visuals (`alphas`), the arm gesture and precipitation
//! live on `GameState` and are torn down in bulk at phase boundaries.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::alpha::{AlphaMap, Layer};
use super::arms::ArmInput;
use super::particles::{Precipitation, PrecipitationKind};
use super::survival::{LevelId, Outcome, SurvivalRound};
use super::timer::Stopwatch;
use crate::audio::{AmbientTrack, SoundEffect};

/// Opening cutscene beats (steps 1-8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpeningBeat {
    Cover,
    PanelTwo,
    PanelThree,
    PanelFour,
    Planting,
    SeedDrop,
    Watering,
    Sprout,
}

impl OpeningBeat {
    pub const ALL: [OpeningBeat; 8] = [
        OpeningBeat::Cover,
        OpeningBeat::PanelTwo,
        OpeningBeat::PanelThree,
        OpeningBeat::PanelFour,
        OpeningBeat::Planting,
        OpeningBeat::SeedDrop,
        OpeningBeat::Watering,
        OpeningBeat::Sprout,
    ];

    fn id(self) -> f32 {
        (self as u8 + 1) as f32
    }
}

/// Tutorial beats (steps 9-15)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TutorialBeat {
    /// Ground, arms and seedling fade in
    FadeIn,
    /// Mouse hint appears after a second
    MouseHint,
    /// Waiting for the first arm motion; `slid_at` is the clock when it happened
    ArmPractice { slid_at: Option<u64> },
    /// Breath before the sunlight lesson
    Pause,
    Sunlight { collected: f32, prompt_shown: bool },
    RainPrompt,
    /// `restarting` while the black restart fade plays
    RainLesson {
        damage: f32,
        elapsed: f32,
        restarting: bool,
    },
    /// `text_clock` starts once the rain cover has faded out
    Complete { text_clock: Option<Stopwatch> },
}

impl TutorialBeat {
    pub fn rain_lesson() -> Self {
        TutorialBeat::RainLesson {
            damage: 0.0,
            elapsed: 0.0,
            restarting: false,
        }
    }

    fn id(&self) -> f32 {
        match self {
            TutorialBeat::FadeIn => 9.0,
            TutorialBeat::MouseHint => 10.0,
            TutorialBeat::ArmPractice { .. } => 11.0,
            TutorialBeat::Pause => 11.5,
            TutorialBeat::Sunlight { .. } => 12.0,
            TutorialBeat::RainPrompt => 13.0,
            TutorialBeat::RainLesson { .. } => 14.0,
            TutorialBeat::Complete { .. } => 15.0,
        }
    }
}

/// Pages of a level's introduction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IntroPage {
    Sunny,
    /// Level 3 only: a demo dropping falls once
    BirdDemo { x: f32, y: f32, falling: bool },
    Rainy,
    /// Levels 2 and 3
    SourRain,
    /// Everything fades before the round
    FadeOut,
}

impl IntroPage {
    /// Page following this one for `level`
    pub fn next(self, level: LevelId) -> IntroPage {
        match (self, level) {
            (IntroPage::Sunny, LevelId::Three) => IntroPage::bird_demo(),
            (IntroPage::Sunny, _) | (IntroPage::BirdDemo { .. }, _) => IntroPage::Rainy,
            (IntroPage::Rainy, LevelId::One) => IntroPage::FadeOut,
            (IntroPage::Rainy, _) => IntroPage::SourRain,
            (IntroPage::SourRain, _) | (IntroPage::FadeOut, _) => IntroPage::FadeOut,
        }
    }

    pub fn bird_demo() -> Self {
        let origin = super::bird::drop_origin();
        IntroPage::BirdDemo {
            x: origin.x,
            y: origin.y,
            falling: false,
        }
    }

    fn id(&self, level: LevelId) -> f32 {
        let base = level_base_id(level);
        let offset = match (self, level) {
            (IntroPage::Sunny, _) => 0.0,
            (IntroPage::BirdDemo { .. }, _) => 1.0,
            (IntroPage::Rainy, LevelId::Three) => 2.0,
            (IntroPage::Rainy, _) => 1.0,
            (IntroPage::SourRain, LevelId::Three) => 2.5,
            (IntroPage::SourRain, _) => 2.0,
            (IntroPage::FadeOut, LevelId::One) => 2.0,
            (IntroPage::FadeOut, _) => 3.0,
        };
        base + offset
    }
}

/// Closing beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndingBeat {
    Happy,
    Final,
}

/// First intro page id of each level
fn level_base_id(level: LevelId) -> f32 {
    match level {
        LevelId::One => 16.0,
        LevelId::Two => 21.0,
        LevelId::Three => 27.0,
    }
}

/// Round step id: the page after the fade-out
fn round_id(level: LevelId) -> f32 {
    IntroPage::FadeOut.id(level) + 1.0
}

/// Current phase of the sequencer
#[derive(Debug, Clone)]
pub enum Step {
    Opening(OpeningBeat),
    Tutorial(TutorialBeat),
    LevelIntro { level: LevelId, page: IntroPage },
    Round(SurvivalRound),
    Settlement { level: LevelId, outcome: Outcome },
    Ending(EndingBeat),
}

impl Step {
    /// Numeric id, stable for logs and debug jumps
    pub fn id(&self) -> f32 {
        match self {
            Step::Opening(beat) => beat.id(),
            Step::Tutorial(beat) => beat.id(),
            Step::LevelIntro { level, page } => page.id(*level),
            Step::Round(round) => round_id(round.level()),
            Step::Settlement { level, .. } => round_id(*level) + 1.0,
            Step::Ending(EndingBeat::Happy) => 33.0,
            Step::Ending(EndingBeat::Final) => 34.0,
        }
    }

    /// Arm motion is read from arm practice until the ending
    pub fn arms_enabled(&self) -> bool {
        let id = self.id();
        (11.0..33.0).contains(&id)
    }

    /// Short human label for info logs
    pub fn label(&self) -> String {
        match self {
            Step::Opening(_) => "opening".to_string(),
            Step::Tutorial(_) => "tutorial".to_string(),
            Step::LevelIntro { level, .. } => format!("level {} intro", level.number()),
            Step::Round(round) => format!("level {} round", round.level().number()),
            Step::Settlement { level, outcome } => {
                format!("level {} settlement ({:?})", level.number(), outcome)
            }
            Step::Ending(_) => "ending".to_string(),
        }
    }

    pub fn is_restarting(&self) -> bool {
        matches!(
            self,
            Step::Tutorial(TutorialBeat::RainLesson {
                restarting: true,
                ..
            })
        )
    }

    pub fn is_counting_down(&self) -> bool {
        matches!(self, Step::Round(round) if round.is_counting_down())
    }
}

/// Developer shortcuts (Q/W/E/R)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebugKey {
    Tutorial,
    LevelOne,
    LevelTwo,
    LevelThree,
}

impl DebugKey {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'q' => Some(DebugKey::Tutorial),
            'w' => Some(DebugKey::LevelOne),
            'e' => Some(DebugKey::LevelTwo),
            'r' => Some(DebugKey::LevelThree),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error("unknown step id {0}")]
    Unknown(f32),
    #[error("step {0} is only reachable through play")]
    NotEnterable(f32),
}

/// Side effects emitted by the simulation for the outer sinks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundEffect),
    SoundFadeIn { effect: SoundEffect, fade_ms: u32 },
    AmbientStart(AmbientTrack),
    AmbientStop(AmbientTrack),
    MusicStart,
    MusicFadeOut,
    StepChanged { from: f32, to: f32 },
    Quit,
}

/// Base scenery of the tutorial and rounds
pub const SCENERY: [Layer; 3] = [Layer::Ground, Layer::ArmLeft, Layer::ArmRight];

/// Everything an intro page may have on screen
pub const INTRO_LAYERS: [Layer; 8] = [
    Layer::SunnyScene,
    Layer::RainyScene,
    Layer::SourScene,
    Layer::LevelTitle,
    Layer::PromptSunny,
    Layer::PromptBird,
    Layer::PromptRainy,
    Layer::PromptSour,
];

/// Flower layers for each level's round and settlement
pub fn flower_layer(level: LevelId) -> Layer {
    match level {
        LevelId::One => Layer::Seedling,
        LevelId::Two => Layer::Bud,
        LevelId::Three => Layer::Bloom,
    }
}

/// The flower after a won round
pub fn grown_layer(level: LevelId) -> Layer {
    match level {
        LevelId::One => Layer::Bud,
        LevelId::Two | LevelId::Three => Layer::Bloom,
    }
}

pub fn lost_layer(level: LevelId) -> Layer {
    match level {
        LevelId::One => Layer::SeedlingLost,
        LevelId::Two => Layer::BudLost,
        LevelId::Three => Layer::BloomLost,
    }
}

/// Complete sequencer state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Simulated milliseconds since boot
    pub clock_ms: u64,
    pub frame: u64,
    pub step: Step,
    /// Time since the current step was entered
    pub step_timer: Stopwatch,
    pub alphas: AlphaMap,
    pub arms: ArmInput,
    pub rain: Precipitation,
    pub sour_rain: Precipitation,
    /// Looping ambience currently playing
    pub ambient: Option<AmbientTrack>,
    /// Tutorial mouse hint displacement
    pub mouse_hint_offset: f32,
    /// Opening seed drop displacement
    pub seed_drop_offset: f32,
    pub running: bool,
    /// Rounds started per level
    pub attempts: [u32; 3],
    /// Outbox drained by `tick`
    pub(crate) events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(seed: u64, mouse_x: i32) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            clock_ms: 0,
            frame: 0,
            step: Step::Opening(OpeningBeat::Cover),
            step_timer: Stopwatch::new(),
            alphas: AlphaMap::new(),
            arms: ArmInput::new(mouse_x),
            rain: Precipitation::new(PrecipitationKind::Rain),
            sour_rain: Precipitation::new(PrecipitationKind::SourRain),
            ambient: None,
            mouse_hint_offset: 0.0,
            seed_drop_offset: 0.0,
            running: true,
            attempts: [0; 3],
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn play(&mut self, effect: SoundEffect) {
        self.emit(GameEvent::Sound(effect));
    }

    /// Leave the current step for `next`, restarting the step clock
    pub fn enter(&mut self, next: Step) {
        let from = self.step.id();
        let to = next.id();
        if std::mem::discriminant(&self.step) != std::mem::discriminant(&next) {
            log::info!("{} -> {}", self.step.label(), next.label());
        }
        log::debug!("Step {} -> {}", from, to);
        self.step = next;
        self.step_timer.restart();
        self.emit(GameEvent::StepChanged { from, to });
    }

    /// Switch the ambient loop; at most one plays at a time
    pub fn set_ambient(&mut self, target: Option<AmbientTrack>) {
        if self.ambient == target {
            return;
        }
        if let Some(old) = self.ambient {
            self.emit(GameEvent::AmbientStop(old));
        }
        if let Some(new) = target {
            self.emit(GameEvent::AmbientStart(new));
        }
        log::debug!("Ambient {:?} -> {:?}", self.ambient, target);
        self.ambient = target;
    }

    /// Back to the first tutorial beat with a clean slate
    pub fn reset_tutorial(&mut self) {
        self.alphas.reset_all();
        self.arms.close();
        self.mouse_hint_offset = 0.0;
        self.rain.clear();
        self.sour_rain.clear();
        self.set_ambient(None);
        self.enter(Step::Tutorial(TutorialBeat::FadeIn));
    }

    /// Back to a level's first intro page with a clean slate
    pub fn reset_level(&mut self, level: LevelId) {
        self.alphas.reset_all();
        self.arms.close();
        self.rain.clear();
        self.sour_rain.clear();
        self.set_ambient(None);
        self.enter(Step::LevelIntro {
            level,
            page: IntroPage::Sunny,
        });
    }

    /// Fresh round behind its countdown
    pub fn start_round(&mut self, level: LevelId) {
        self.arms.close();
        self.rain.clear();
        self.sour_rain.clear();
        self.set_ambient(None);
        self.alphas.hide(&SCENERY);
        self.alphas.hide(&[
            flower_layer(level),
            Layer::LevelNumber,
            Layer::LevelTimer,
            Layer::Bird,
            Layer::BirdWarning,
        ]);
        self.attempts[level.number() as usize - 1] += 1;
        let round = SurvivalRound::new(level, &mut self.rng);
        self.enter(Step::Round(round));
        self.play(SoundEffect::CountBackward);
    }

    /// Developer shortcut jump
    pub fn debug_jump(&mut self, key: DebugKey) {
        log::debug!("Debug jump: {:?}", key);
        match key {
            DebugKey::Tutorial => self.reset_tutorial(),
            DebugKey::LevelOne => self.reset_level(LevelId::One),
            DebugKey::LevelTwo => self.reset_level(LevelId::Two),
            DebugKey::LevelThree => self.reset_level(LevelId::Three),
        }
    }

    /// Jump to a numeric step id (command line `--start`)
    pub fn jump_to(&mut self, id: f32) -> Result<(), StepError> {
        let doubled = id * 2.0;
        if doubled.fract() != 0.0 || !(2.0..=68.0).contains(&doubled) {
            return Err(StepError::Unknown(id));
        }
        match doubled as u32 {
            n @ 2..=16 if n % 2 == 0 => {
                self.alphas.reset_all();
                self.set_ambient(None);
                self.enter(Step::Opening(OpeningBeat::ALL[(n / 2 - 1) as usize]));
            }
            n @ 18..=30 if n % 2 == 0 || n == 23 => {
                self.reset_tutorial();
                if n > 18 {
                    self.alphas.show(&SCENERY);
                    self.alphas.show(&[Layer::Seedling]);
                }
                if n == 26 || n == 28 {
                    self.alphas.show(&[Layer::SunnyCover]);
                }
                let beat = match n {
                    18 => TutorialBeat::FadeIn,
                    20 => TutorialBeat::MouseHint,
                    22 => TutorialBeat::ArmPractice { slid_at: None },
                    23 => TutorialBeat::Pause,
                    24 => TutorialBeat::Sunlight {
                        collected: 0.0,
                        prompt_shown: false,
                    },
                    26 => TutorialBeat::RainPrompt,
                    28 => TutorialBeat::rain_lesson(),
                    _ => TutorialBeat::Complete { text_clock: None },
                };
                self.enter(Step::Tutorial(beat));
                if n == 28 {
                    self.set_ambient(Some(AmbientTrack::Rain));
                }
            }
            66 | 68 => {
                self.alphas.reset_all();
                self.set_ambient(None);
                let beat = if doubled as u32 == 66 {
                    EndingBeat::Happy
                } else {
                    EndingBeat::Final
                };
                self.enter(Step::Ending(beat));
            }
            _ => {
                for level in LevelId::ALL {
                    let mut page = IntroPage::Sunny;
                    loop {
                        if page.id(level) == id {
                            self.reset_level(level);
                            if page != IntroPage::Sunny {
                                self.enter(Step::LevelIntro { level, page });
                            }
                            return Ok(());
                        }
                        if page == IntroPage::FadeOut {
                            break;
                        }
                        page = page.next(level);
                    }
                    if round_id(level) == id {
                        self.reset_level(level);
                        self.start_round(level);
                        return Ok(());
                    }
                    if round_id(level) + 1.0 == id {
                        return Err(StepError::NotEnterable(id));
                    }
                }
                return Err(StepError::Unknown(id));
            }
        }
        Ok(())
    }

    /// Drain the events produced since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_ids_follow_the_catalogue() {
        assert_eq!(Step::Opening(OpeningBeat::Cover).id(), 1.0);
        assert_eq!(Step::Opening(OpeningBeat::Sprout).id(), 8.0);
        assert_eq!(Step::Tutorial(TutorialBeat::Pause).id(), 11.5);
        assert_eq!(Step::Tutorial(TutorialBeat::rain_lesson()).id(), 14.0);

        let intro = |level, page| Step::LevelIntro { level, page }.id();
        assert_eq!(intro(LevelId::One, IntroPage::Sunny), 16.0);
        assert_eq!(intro(LevelId::One, IntroPage::FadeOut), 18.0);
        assert_eq!(intro(LevelId::Two, IntroPage::SourRain), 23.0);
        assert_eq!(intro(LevelId::Two, IntroPage::FadeOut), 24.0);
        assert_eq!(intro(LevelId::Three, IntroPage::bird_demo()), 28.0);
        assert_eq!(intro(LevelId::Three, IntroPage::Rainy), 29.0);
        assert_eq!(intro(LevelId::Three, IntroPage::SourRain), 29.5);
        assert_eq!(intro(LevelId::Three, IntroPage::FadeOut), 30.0);

        assert_eq!(round_id(LevelId::One), 19.0);
        assert_eq!(round_id(LevelId::Two), 25.0);
        assert_eq!(round_id(LevelId::Three), 31.0);
        let settle = Step::Settlement {
            level: LevelId::Three,
            outcome: Outcome::Won,
        };
        assert_eq!(settle.id(), 32.0);
        assert_eq!(Step::Ending(EndingBeat::Final).id(), 34.0);
    }

    #[test]
    fn test_intro_page_order_per_level() {
        let pages = |level| {
            let mut page = IntroPage::Sunny;
            let mut ids = vec![page.id(level)];
            while page != IntroPage::FadeOut {
                page = page.next(level);
                ids.push(page.id(level));
            }
            ids
        };
        assert_eq!(pages(LevelId::One), vec![16.0, 17.0, 18.0]);
        assert_eq!(pages(LevelId::Two), vec![21.0, 22.0, 23.0, 24.0]);
        assert_eq!(pages(LevelId::Three), vec![27.0, 28.0, 29.0, 29.5, 30.0]);
    }

    #[test]
    fn test_arms_window() {
        assert!(!Step::Tutorial(TutorialBeat::MouseHint).arms_enabled());
        assert!(Step::Tutorial(TutorialBeat::ArmPractice { slid_at: None }).arms_enabled());
        assert!(!Step::Ending(EndingBeat::Happy).arms_enabled());
    }

    #[test]
    fn test_debug_jump_zeroes_alphas() {
        let mut state = GameState::new(1, 0);
        state.alphas.show(&[Layer::Cover, Layer::Bird, Layer::Bloom]);
        state.arms.accumulate(300);
        state.debug_jump(DebugKey::LevelThree);
        assert!(state.alphas.iter().all(|(_, a)| a == 0));
        assert_eq!(state.step.id(), 27.0);
        assert_eq!(state.arms.spread(), 0.0);
    }

    #[test]
    fn test_ambient_switch_stops_before_starting() {
        let mut state = GameState::new(1, 0);
        state.set_ambient(Some(AmbientTrack::Rain));
        state.set_ambient(Some(AmbientTrack::Rain));
        state.set_ambient(Some(AmbientTrack::SourRain));
        state.set_ambient(None);
        assert_eq!(
            state.take_events(),
            vec![
                GameEvent::AmbientStart(AmbientTrack::Rain),
                GameEvent::AmbientStop(AmbientTrack::Rain),
                GameEvent::AmbientStart(AmbientTrack::SourRain),
                GameEvent::AmbientStop(AmbientTrack::SourRain),
            ]
        );
    }

    #[test]
    fn test_jump_to_known_and_unknown_ids() {
        let mut state = GameState::new(3, 0);
        assert!(state.jump_to(11.5).is_ok());
        assert_eq!(state.step.id(), 11.5);
        assert!(state.jump_to(29.5).is_ok());
        assert_eq!(state.step.id(), 29.5);
        assert!(state.jump_to(25.0).is_ok());
        assert!(state.step.is_counting_down());
        assert_eq!(state.attempts, [0, 1, 0]);
        assert!(state.jump_to(34.0).is_ok());
        assert_eq!(state.jump_to(20.0), Err(StepError::NotEnterable(20.0)));
        assert_eq!(state.jump_to(12.5), Err(StepError::Unknown(12.5)));
        assert_eq!(state.jump_to(0.0), Err(StepError::Unknown(0.0)));
        assert_eq!(state.jump_to(35.0), Err(StepError::Unknown(35.0)));
    }
}
