//! Frame-stepped sequencer tick
//!
//! One call per rendered frame. Input is sampled once and used consistently:
//! arm mapper first, then the current step's update, then precipitation. A
//! step transition is applied after the branch returns, so no step can advance
//! twice on one event.

use super::alpha::Layer;
use super::bird::{self, BirdEvent};
use super::state::{
    DebugKey, EndingBeat, GameEvent, GameState, INTRO_LAYERS, IntroPage, OpeningBeat, SCENERY,
    Step, TutorialBeat, flower_layer, grown_layer, lost_layer,
};
use super::survival::{LevelId, Outcome, SurvivalRound};
use super::timer::Stopwatch;
use super::weather::Weather;
use crate::audio::{AmbientTrack, SoundEffect};
use crate::consts::*;
use crate::ms_to_secs;

/// Input for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Wall time covered by this frame
    pub dt_ms: u32,
    pub mouse_x: i32,
    /// Left button pressed this frame
    pub click: bool,
    pub quit: bool,
    pub debug_key: Option<DebugKey>,
}

/// What a step branch sees of the current frame
struct Frame {
    dt_ms: u32,
    dx: i32,
    click: bool,
    since_step: u64,
}

impl Frame {
    fn dt(&self) -> f32 {
        ms_to_secs(self.dt_ms)
    }
}

/// Advance the sequencer by one frame, returning the side effects to play
pub fn tick(state: &mut GameState, input: &TickInput) -> Vec<GameEvent> {
    if !state.running {
        return state.take_events();
    }
    if input.quit {
        state.running = false;
        state.emit(GameEvent::Quit);
        return state.take_events();
    }
    if state.frame == 0 {
        state.play(SoundEffect::Pic1);
    }
    state.frame += 1;
    state.clock_ms += input.dt_ms as u64;
    state.step_timer.advance(input.dt_ms);

    let dx = state.arms.delta(input.mouse_x);
    if state.step.arms_enabled() && !state.step.is_restarting() && !state.step.is_counting_down()
    {
        state.arms.accumulate(dx);
    }

    if let Some(key) = input.debug_key {
        state.debug_jump(key);
    }
    if input.click {
        state.play(SoundEffect::Click);
    }

    if state.step.is_restarting() && !restart_fade(state) {
        state.arms.sync(input.mouse_x);
        return state.take_events();
    }

    let frame = Frame {
        dt_ms: input.dt_ms,
        dx,
        click: input.click,
        since_step: state.step_timer.elapsed(),
    };

    let mut step = std::mem::replace(&mut state.step, Step::Opening(OpeningBeat::Cover));
    let next = match &mut step {
        Step::Opening(beat) => opening(state, *beat, &frame),
        Step::Tutorial(beat) => tutorial(state, beat, &frame),
        Step::LevelIntro { level, page } => intro(state, *level, page, &frame),
        Step::Round(round) => play_round(state, round, &frame),
        Step::Settlement { level, outcome } => settlement(state, *level, *outcome, &frame),
        Step::Ending(beat) => ending(state, *beat, &frame),
    };
    state.step = step;
    if let Some(next) = next {
        apply(state, next);
    }

    state.arms.sync(input.mouse_x);
    update_precipitation(state);

    state.take_events()
}

/// Where a branch wants to go next
enum Transition {
    To(Step),
    Tutorial,
    LevelIntro(LevelId),
    Round(LevelId),
    Quit,
}

fn apply(state: &mut GameState, next: Transition) {
    match next {
        Transition::To(step) => state.enter(step),
        Transition::Tutorial => state.reset_tutorial(),
        Transition::LevelIntro(level) => state.reset_level(level),
        Transition::Round(level) => state.start_round(level),
        Transition::Quit => {
            log::info!("Ending closed after {} frames", state.frame);
            state.running = false;
            state.emit(GameEvent::Quit);
        }
    }
}

/// Black fade after the rain lesson failed; true once play resumes this frame
fn restart_fade(state: &mut GameState) -> bool {
    state.alphas.fade_out(Layer::RestartFade, FADE_RESTART_SPEED);
    if state.alphas.get(Layer::RestartFade) >= FADE_RESTART_RESUME_BELOW {
        return false;
    }
    state.alphas.set(Layer::RestartFade, 0);
    state.alphas.show(&[
        Layer::RainyCover,
        Layer::ArmLeft,
        Layer::ArmRight,
        Layer::Seedling,
        Layer::PromptRain,
    ]);
    state.arms.close();
    state.enter(Step::Tutorial(TutorialBeat::rain_lesson()));
    state.set_ambient(Some(AmbientTrack::Rain));
    true
}

/// Tutorial hint bob
fn mouse_bob(clock_ms: u64) -> f32 {
    MOUSE_MOVE_AMPLITUDE * 0.5 * (1.0 + (clock_ms as f32 * MOUSE_MOVE_SPEED).sin())
}

fn opening(state: &mut GameState, beat: OpeningBeat, f: &Frame) -> Option<Transition> {
    let a = &mut state.alphas;
    match beat {
        OpeningBeat::Cover => {
            if !a.is_opaque(Layer::Cover) {
                a.fade_in(Layer::Cover, FADE_SPEED);
                return None;
            }
            a.fade_in(Layer::CoverHint, FADE_SPEED);
            if f.click {
                a.hide(&[Layer::PanelTwo, Layer::CoverHint]);
                state.play(SoundEffect::Pic2);
                state.emit(GameEvent::MusicStart);
                return Some(Transition::To(Step::Opening(OpeningBeat::PanelTwo)));
            }
        }
        OpeningBeat::PanelTwo => {
            a.fade_in(Layer::PanelTwo, FADE_SPEED);
            if f.since_step > 1000 {
                a.fade_in(Layer::PanelTwoInset, FADE_SPEED);
                if a.is_opaque(Layer::PanelTwoInset) && f.click {
                    a.hide(&[Layer::PanelThree, Layer::PanelThreeInset]);
                    return Some(Transition::To(Step::Opening(OpeningBeat::PanelThree)));
                }
            }
        }
        OpeningBeat::PanelThree => {
            a.fade_in(Layer::PanelThree, FADE_SPEED);
            a.fade_in(Layer::PanelThreeInset, FADE_SPEED);
            if a.is_opaque(Layer::PanelThree) && a.is_opaque(Layer::PanelThreeInset) && f.click {
                a.hide(&[Layer::PanelFour]);
                return Some(Transition::To(Step::Opening(OpeningBeat::PanelFour)));
            }
        }
        OpeningBeat::PanelFour => {
            a.fade_in(Layer::PanelFour, FADE_SPEED);
            if a.is_opaque(Layer::PanelFour) && f.click {
                a.hide(&[Layer::Planting]);
                return Some(Transition::To(Step::Opening(OpeningBeat::Planting)));
            }
        }
        OpeningBeat::Planting => {
            a.fade_in(Layer::Planting, FADE_SPEED);
            if f.since_step > 1000 {
                a.fade_in(Layer::Seed, FADE_SPEED);
                a.fade_in(Layer::WateringCan, FADE_SPEED);
                if a.is_opaque(Layer::Seed) && a.is_opaque(Layer::WateringCan) && f.click {
                    state.play(SoundEffect::Drop);
                    return Some(Transition::To(Step::Opening(OpeningBeat::SeedDrop)));
                }
            }
        }
        OpeningBeat::SeedDrop => {
            const DROP_MS: u64 = 1000;
            const DROP_DISTANCE: f32 = 200.0;
            if f.since_step <= DROP_MS {
                state.seed_drop_offset = DROP_DISTANCE * f.since_step as f32 / DROP_MS as f32;
            } else {
                state.seed_drop_offset = DROP_DISTANCE;
                let gone = a.fade_out_all(&[Layer::Seed, Layer::WateringCan], FADE_SPEED);
                if gone && f.click {
                    a.hide(&[Layer::Water]);
                    state.play(SoundEffect::Water);
                    return Some(Transition::To(Step::Opening(OpeningBeat::Watering)));
                }
            }
        }
        OpeningBeat::Watering => {
            if f.since_step < 500 {
                a.fade_in(Layer::Water, FADE_SPEED);
            }
            if f.since_step > 2500 {
                a.fade_out(Layer::Water, FADE_SPEED);
            }
            if f.since_step > 3000 && a.is_clear(Layer::Water) && f.click {
                a.hide(&[Layer::Sprout]);
                return Some(Transition::To(Step::Opening(OpeningBeat::Sprout)));
            }
        }
        OpeningBeat::Sprout => {
            a.fade_in(Layer::Sprout, FADE_SPEED);
            if a.is_opaque(Layer::Sprout) && f.click {
                return Some(Transition::Tutorial);
            }
        }
    }
    None
}

fn tutorial(state: &mut GameState, beat: &mut TutorialBeat, f: &Frame) -> Option<Transition> {
    match beat {
        TutorialBeat::FadeIn => {
            if !state.alphas.is_opaque(Layer::Ground) {
                for layer in SCENERY.into_iter().chain([Layer::Seedling]) {
                    state.alphas.fade_in(layer, FADE_SPEED);
                }
            } else {
                state.alphas.hide(&[Layer::Mouse, Layer::Arrow]);
                state.mouse_hint_offset = 0.0;
                return Some(Transition::To(Step::Tutorial(TutorialBeat::MouseHint)));
            }
        }
        TutorialBeat::MouseHint => {
            if f.since_step > 1000 {
                if !state.alphas.is_opaque(Layer::Mouse) {
                    state.alphas.fade_in(Layer::Mouse, FADE_SPEED);
                    state.alphas.fade_in(Layer::Arrow, FADE_SPEED);
                }
                state.mouse_hint_offset = mouse_bob(state.clock_ms);
                if state.alphas.is_opaque(Layer::Mouse) {
                    state.arms.close();
                    return Some(Transition::To(Step::Tutorial(TutorialBeat::ArmPractice {
                        slid_at: None,
                    })));
                }
            }
        }
        TutorialBeat::ArmPractice { slid_at } => {
            let slid = *slid_at;
            match slid {
                None if f.dx != 0 => {
                    *slid_at = Some(state.clock_ms);
                    state.mouse_hint_offset = 0.0;
                }
                None => state.mouse_hint_offset = mouse_bob(state.clock_ms),
                Some(at) if state.clock_ms - at > 2000 => {
                    state.alphas.fade_out(Layer::Mouse, FADE_SPEED_FAST);
                    state.alphas.fade_out(Layer::Arrow, FADE_SPEED_FAST);
                }
                Some(_) => {}
            }
            if state.alphas.is_clear(Layer::Mouse) && state.alphas.is_clear(Layer::Arrow) {
                return Some(Transition::To(Step::Tutorial(TutorialBeat::Pause)));
            }
        }
        TutorialBeat::Pause => {
            if f.since_step > 1000 {
                state.alphas.hide(&[Layer::SunnyCover, Layer::PromptSunlight]);
                return Some(Transition::To(Step::Tutorial(TutorialBeat::Sunlight {
                    collected: 0.0,
                    prompt_shown: false,
                })));
            }
        }
        TutorialBeat::Sunlight {
            collected,
            prompt_shown,
        } => {
            if !state.alphas.is_opaque(Layer::SunnyCover) {
                state.alphas.fade_in(Layer::SunnyCover, FADE_SPEED);
                return None;
            }
            if !*prompt_shown {
                state.alphas.fade_in(Layer::PromptSunlight, FADE_SPEED);
                *prompt_shown = state.alphas.is_opaque(Layer::PromptSunlight);
                return None;
            }
            if *collected < SUNLIGHT_REQUIRED {
                if state.arms.is_open() {
                    *collected = (*collected + f.dt()).min(SUNLIGHT_REQUIRED);
                    state.alphas.fade_out(Layer::PromptSunlight, FADE_SPEED_FAST);
                }
            } else {
                state.alphas.show(&[Layer::SunnyCover]);
                state.alphas.hide(&[Layer::PromptRain]);
                return Some(Transition::To(Step::Tutorial(TutorialBeat::RainPrompt)));
            }
        }
        TutorialBeat::RainPrompt => {
            if !state.alphas.is_opaque(Layer::PromptRain) {
                state.alphas.fade_in(Layer::PromptRain, FADE_SPEED);
            } else if f.since_step > 1000 {
                state.alphas.hide(&[Layer::RainyCover]);
                state.set_ambient(Some(AmbientTrack::Rain));
                return Some(Transition::To(Step::Tutorial(TutorialBeat::rain_lesson())));
            }
        }
        TutorialBeat::RainLesson {
            damage,
            elapsed,
            restarting,
        } => {
            *elapsed += f.dt();
            state.alphas.fade_out(Layer::SunnyCover, FADE_SPEED);
            if !state.alphas.is_opaque(Layer::RainyCover) {
                state.alphas.fade_in(Layer::RainyCover, FADE_SPEED);
                return None;
            }
            if state.arms.is_open() {
                *damage = (*damage + f.dt()).min(RAIN_PROTECTION_DURATION);
            }
            if *damage >= RAIN_PROTECTION_DURATION {
                log::info!("Rain lesson failed, restarting");
                *restarting = true;
                *damage = 0.0;
                *elapsed = 0.0;
                state.alphas.show(&[Layer::RestartFade]);
                state.set_ambient(None);
            } else if *elapsed >= RAIN_PHASE_DURATION {
                state.alphas.show(&[Layer::RainyCover]);
                state.alphas.hide(&[Layer::PromptSuccess]);
                state.set_ambient(None);
                state.play(SoundEffect::Pass);
                return Some(Transition::To(Step::Tutorial(TutorialBeat::Complete {
                    text_clock: None,
                })));
            }
        }
        TutorialBeat::Complete { text_clock } => {
            if !state.alphas.is_clear(Layer::RainyCover) {
                state.alphas.fade_out(Layer::RainyCover, FADE_SPEED);
                state.alphas.fade_out(Layer::PromptRain, FADE_SPEED_FAST);
                return None;
            }
            let clock = text_clock.get_or_insert_with(Stopwatch::new);
            clock.advance(f.dt_ms);
            let ready = clock.expired(4000);
            state.alphas.fade_in(Layer::PromptSuccess, FADE_SPEED);
            if ready && f.click {
                log::info!("Tutorial complete");
                return Some(Transition::LevelIntro(LevelId::One));
            }
        }
    }
    None
}

/// Ambient follows a scene once it is more than faintly visible
const SCENE_AUDIBLE_ABOVE: u8 = 50;

fn intro(
    state: &mut GameState,
    level: LevelId,
    page: &mut IntroPage,
    f: &Frame,
) -> Option<Transition> {
    let next_page = |page: IntroPage| {
        Some(Transition::To(Step::LevelIntro {
            level,
            page: page.next(level),
        }))
    };
    match page {
        IntroPage::Sunny => {
            let a = &mut state.alphas;
            if !a.is_opaque(Layer::SunnyScene) {
                a.fade_in(Layer::SunnyScene, FADE_SPEED);
                a.fade_in(Layer::LevelTitle, FADE_SPEED);
                return None;
            }
            a.fade_in(Layer::LevelTitle, FADE_SPEED);
            if a.is_opaque(Layer::LevelTitle) {
                a.fade_in(Layer::PromptSunny, FADE_SPEED);
                if a.is_opaque(Layer::PromptSunny) && f.click {
                    if level == LevelId::Three {
                        a.hide(&[Layer::Bird, Layer::PromptSunny]);
                    }
                    return next_page(*page);
                }
            }
        }
        IntroPage::BirdDemo { x, y, falling } => {
            let a = &mut state.alphas;
            if !a.is_opaque(Layer::PromptBird) {
                a.fade_in(Layer::PromptBird, FADE_SPEED);
                return None;
            }
            if !*falling {
                if f.since_step > 1000 {
                    *falling = true;
                    a.show(&[Layer::Bird]);
                }
                return None;
            }
            let pos = bird::drop_step(glam::Vec2::new(*x, *y));
            *x = pos.x;
            *y = pos.y;
            if *y > bird::intro_fade_height() {
                a.fade_out(Layer::Bird, BIRD_FADE_SPEED);
            }
            if (*y > SCREEN_HEIGHT as f32 || a.is_clear(Layer::Bird)) && f.click {
                a.hide(&[Layer::PromptBird]);
                return next_page(*page);
            }
        }
        IntroPage::Rainy => {
            state.alphas.fade_out(Layer::SunnyScene, FADE_SPEED);
            if !state.alphas.is_opaque(Layer::RainyScene) {
                state.alphas.fade_in(Layer::RainyScene, FADE_SPEED);
                if state.alphas.get(Layer::RainyScene) > SCENE_AUDIBLE_ABOVE {
                    state.set_ambient(Some(AmbientTrack::Rain));
                }
                return None;
            }
            let a = &mut state.alphas;
            a.fade_out(Layer::PromptSunny, FADE_SPEED);
            a.fade_out(Layer::PromptBird, FADE_SPEED);
            a.fade_in(Layer::PromptRainy, FADE_SPEED);
            if a.is_opaque(Layer::PromptRainy) && f.click {
                return next_page(*page);
            }
        }
        IntroPage::SourRain => {
            state.alphas.fade_out(Layer::RainyScene, FADE_SPEED);
            if !state.alphas.is_opaque(Layer::SourScene) {
                state.alphas.fade_in(Layer::SourScene, FADE_SPEED);
                if state.alphas.get(Layer::SourScene) > SCENE_AUDIBLE_ABOVE {
                    state.set_ambient(Some(AmbientTrack::SourRain));
                }
                return None;
            }
            let a = &mut state.alphas;
            a.fade_out(Layer::PromptRainy, FADE_SPEED);
            a.fade_in(Layer::PromptSour, FADE_SPEED);
            if a.is_opaque(Layer::PromptSour) && f.click {
                return next_page(*page);
            }
        }
        IntroPage::FadeOut => {
            state.set_ambient(None);
            if state.alphas.fade_out_all(&INTRO_LAYERS, FADE_SPEED) {
                return Some(Transition::Round(level));
            }
        }
    }
    None
}

fn play_round(state: &mut GameState, round: &mut SurvivalRound, f: &Frame) -> Option<Transition> {
    let level = round.level();
    let flower = flower_layer(level);
    if !state.alphas.is_opaque(Layer::Ground) {
        for layer in SCENERY.into_iter().chain([flower]) {
            state.alphas.fade_in(layer, FADE_SPEED);
        }
    }

    if !round.is_counting_down() {
        state.alphas.fade_in(Layer::LevelNumber, FADE_SPEED);
        state.alphas.fade_in(Layer::LevelTimer, FADE_SPEED);
        if round.is_active() {
            state.set_ambient(round.weather().ambient());
        }
    }

    let report = round.update(f.dt_ms, state.arms.is_open(), &mut state.rng);
    if report.went_live {
        log::info!("Level {} live", level.number());
    }
    if let Some(weather) = report.weather_changed
        && weather == Weather::Sunny
        && round.bird().is_some()
    {
        state.alphas.hide(&[Layer::BirdWarning]);
    }
    for event in &report.bird {
        match event {
            BirdEvent::WarningStarted => state.play(SoundEffect::Bird),
            BirdEvent::FallStarted => {
                state.alphas.show(&[Layer::Bird]);
                state.alphas.hide(&[Layer::BirdWarning]);
            }
            BirdEvent::Blocked => state.alphas.hide(&[Layer::Bird]),
            BirdEvent::Missed | BirdEvent::Struck => {}
        }
    }
    if round.bird().is_some_and(|b| b.is_warning()) {
        state.alphas.fade_in(Layer::BirdWarning, FADE_SPEED_FAST);
    }

    let outcome = report.outcome?;
    state.set_ambient(None);
    if outcome.is_win() {
        state.play(SoundEffect::Pass);
        if level.next().is_none() {
            state.alphas.reset_all();
            return Some(Transition::To(Step::Ending(EndingBeat::Happy)));
        }
        state.alphas.hide(&[grown_layer(level), Layer::PromptResult]);
    } else {
        state.play(SoundEffect::Fail);
        state.alphas.hide(&[Layer::GroundLost, lost_layer(level), Layer::PromptResult]);
    }
    Some(Transition::To(Step::Settlement { level, outcome }))
}

fn settlement(
    state: &mut GameState,
    level: LevelId,
    outcome: Outcome,
    f: &Frame,
) -> Option<Transition> {
    let a = &mut state.alphas;
    a.hide(&[
        Layer::ArmLeft,
        Layer::ArmRight,
        Layer::Bird,
        Layer::BirdWarning,
    ]);
    let ready = if outcome.is_win() {
        let grown = grown_layer(level);
        a.fade_in(grown, FADE_SPEED);
        a.is_opaque(grown)
    } else {
        a.hide(&[Layer::Ground, flower_layer(level)]);
        let lost = lost_layer(level);
        a.fade_in(Layer::GroundLost, FADE_SPEED);
        a.fade_in(lost, FADE_SPEED);
        a.is_opaque(Layer::GroundLost) && a.is_opaque(lost)
    };
    if ready {
        a.fade_in(Layer::PromptResult, FADE_SPEED);
    }
    if a.is_opaque(Layer::PromptResult) && f.click {
        let next = match (outcome, level.next()) {
            (Outcome::Won, Some(next)) => next,
            _ => level,
        };
        return Some(Transition::LevelIntro(next));
    }
    None
}

fn ending(state: &mut GameState, beat: EndingBeat, f: &Frame) -> Option<Transition> {
    let a = &mut state.alphas;
    match beat {
        EndingBeat::Happy => {
            a.fade_in(Layer::HappyEnd, FADE_SPEED);
            if a.is_opaque(Layer::HappyEnd) {
                a.fade_in(Layer::EndingText, FADE_SPEED);
            }
            if a.is_opaque(Layer::EndingText) && f.click {
                state.emit(GameEvent::MusicFadeOut);
                state.emit(GameEvent::SoundFadeIn {
                    effect: SoundEffect::Ending,
                    fade_ms: MUSIC_FADE_MS,
                });
                return Some(Transition::To(Step::Ending(EndingBeat::Final)));
            }
        }
        EndingBeat::Final => {
            a.fade_out(Layer::HappyEnd, FADE_SPEED);
            a.fade_out(Layer::EndingText, FADE_SPEED);
            a.fade_in(Layer::FinalEnd, FADE_SPEED);
            if a.is_opaque(Layer::FinalEnd) {
                a.fade_in(Layer::EndingTitle, FADE_SPEED);
            }
            if a.is_opaque(Layer::EndingTitle) && f.click {
                return Some(Transition::Quit);
            }
        }
    }
    None
}

/// Should-rain predicates, evaluated against the step after this frame's transition
fn update_precipitation(state: &mut GameState) {
    let a = &state.alphas;
    let (rain, sour) = match &state.step {
        Step::Tutorial(TutorialBeat::RainLesson { restarting, .. }) => {
            (!restarting && !a.is_clear(Layer::RainyCover), false)
        }
        Step::Tutorial(TutorialBeat::Complete { .. }) => (!a.is_clear(Layer::RainyCover), false),
        Step::LevelIntro { level, page } => {
            // Level 3 keeps the previous page's weather falling through its transitions
            let carry = *level == LevelId::Three;
            match page {
                IntroPage::Rainy => (!a.is_clear(Layer::RainyScene), false),
                IntroPage::SourRain => (
                    carry && !a.is_clear(Layer::RainyScene),
                    !a.is_clear(Layer::SourScene),
                ),
                IntroPage::FadeOut => (false, carry && !a.is_clear(Layer::SourScene)),
                _ => (false, false),
            }
        }
        Step::Round(round) if round.is_active() => (
            round.weather() == Weather::Rainy,
            round.weather() == Weather::SourRain,
        ),
        _ => (false, false),
    };
    state.rain.update(rain, &mut state.rng);
    state.sour_rain.update(sour, &mut state.rng);
}
