//! Frame composition: GameState -> draw list
//!
//! Layout mirrors the hand-placed art: backdrops at the origin,
//! flower and arms anchored to the bottom centre, prompts along the bottom.

use glam::Vec2;

use super::hud::{self, BarKind};
use super::{Anchor, Color, DrawCmd, TextSize};
use crate::assets::{Assets, ImageKey};
use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::sim::particles::Precipitation;
use crate::sim::state::{flower_layer, grown_layer, lost_layer};
use crate::sim::{
    AlphaMap, EndingBeat, GameState, IntroPage, Layer, LevelId, OpeningBeat, Outcome, Resource,
    Step, SurvivalRound, TutorialBeat, Weather,
};

const COVER_HINT: &str = "click anywhere to continue";
const ARM_HINT: &str = "Open and close the arms with mouse to raise and protect the flower!";
const SUNLIGHT_HINT: &str = "Open your arms to let the flower receive sunlight.";
const RAIN_HINT: &str =
    "The flower has enough sunlight. Now, close arms to prevent it from taking on rain.";
const SUCCESS_FIRST: &str = "Rainwater entry has been successfully stopped.";
const SUCCESS_SECOND: &str = "Now you can focus on truly caring for this flower.";
const INTRO_SUNNY: &str = "when it's sunny, you need to collect sunlight.";
const INTRO_BIRD: &str = "Be careful of falling bird droppings.";
const INTRO_RAIN_AVOID: &str = "But when the rain falls, you need to prevent the raindrop.";
const INTRO_RAIN_COLLECT: &str = "When the rain falls, you need to collect the raindrop this time.";
const INTRO_SOUR: &str = "But when the sourrain falls, you need to prevent the sourrain.";
const BIRD_PASSED: &str = "A bird passed by";
const ENDING_TEXT: &str = "Congratulations, your flower is already in full bloom!";
const ENDING_TITLE: &str = "- Ending -";

/// Intro flowers are shown smaller above the scene
const INTRO_FLOWER_SCALE: f32 = 2.0 / 3.0;

struct Scene<'a> {
    assets: &'a Assets,
    alphas: &'a AlphaMap,
    cmds: Vec<DrawCmd>,
}

impl<'a> Scene<'a> {
    fn size(&self, key: ImageKey) -> Vec2 {
        let (w, h) = self.assets.size(key);
        Vec2::new(w as f32, h as f32)
    }

    /// x that centres `width` on screen, integer-aligned
    fn centred_x(width: f32) -> f32 {
        ((SCREEN_WIDTH - width as i32) / 2) as f32
    }

    fn image(&mut self, key: ImageKey, pos: Vec2, alpha: u8, scale: f32) {
        if alpha == 0 {
            return;
        }
        self.cmds.push(DrawCmd::Image {
            key,
            pos,
            alpha,
            scale,
        });
        // Placeholder caption
        if let Some(label) = &self.assets.image(key).label {
            self.cmds.push(DrawCmd::Text {
                text: label.clone(),
                pos: pos + self.size(key) * scale / 2.0,
                anchor: Anchor::Center,
                size: TextSize::Body,
                color: Color::WHITE,
                alpha,
            });
        }
    }

    /// Layer sprite at its current opacity
    fn blit(&mut self, layer: Layer, pos: Vec2) {
        if let Some(key) = layer.image() {
            self.image(key, pos, self.alphas.get(layer), 1.0);
        }
    }

    fn push(&mut self, cmd: DrawCmd) {
        if let DrawCmd::Text { alpha: 0, .. } = cmd {
            return;
        }
        self.cmds.push(cmd);
    }

    fn prompt(&mut self, text: &str, layer: Layer) {
        self.push(hud::prompt_text(text, self.alphas.get(layer)));
    }

    fn title(&mut self, text: String, y: f32, alpha: u8) {
        self.push(DrawCmd::Text {
            text,
            pos: Vec2::new((SCREEN_WIDTH / 2) as f32, y),
            anchor: Anchor::Center,
            size: TextSize::Title,
            color: Color::WHITE,
            alpha,
        });
    }

    /// Flower sitting on the ground line, nudged by `dx`
    fn flower(&mut self, layer: Layer, dx: f32) {
        let Some(key) = layer.image() else { return };
        let size = self.size(key);
        let pos = Vec2::new(
            Self::centred_x(size.x) + dx,
            SCREEN_HEIGHT as f32 - size.y - 200.0,
        );
        self.blit(layer, pos);
    }

    fn arms(&mut self, spread: f32) {
        let size = self.size(ImageKey::ArmLeft);
        let center_x = (SCREEN_WIDTH / 2 + 10) as f32;
        let y = SCREEN_HEIGHT as f32 - size.y + 200.0;
        self.blit(
            Layer::ArmLeft,
            Vec2::new(center_x - size.x - spread - 30.0, y),
        );
        self.blit(Layer::ArmRight, Vec2::new(center_x + spread + 30.0, y));
    }

    fn drops(&mut self, rain: &Precipitation, key: ImageKey, alpha: u8) {
        for drop in rain.drops() {
            self.image(key, Vec2::new(drop.x, drop.y), alpha, 1.0);
        }
    }
}

/// Compose the draw list for the current frame
pub fn compose(state: &GameState, assets: &Assets) -> Vec<DrawCmd> {
    let mut s = Scene {
        assets,
        alphas: &state.alphas,
        cmds: Vec::with_capacity(64),
    };
    s.cmds.push(DrawCmd::Clear(Color::BLACK));

    if state.step.is_restarting() {
        s.push(hud::fade_overlay(state.alphas.get(Layer::RestartFade)));
        return s.cmds;
    }

    match &state.step {
        Step::Opening(beat) => opening(&mut s, state, *beat),
        Step::Tutorial(beat) => tutorial(&mut s, state, beat),
        Step::LevelIntro { level, page } => intro(&mut s, state, *level, page),
        Step::Round(round) => round_view(&mut s, state, round),
        Step::Settlement { level, outcome } => settlement(&mut s, *level, *outcome),
        Step::Ending(beat) => ending(&mut s, *beat),
    }
    s.cmds
}

fn opening(s: &mut Scene, state: &GameState, beat: OpeningBeat) {
    let w = SCREEN_WIDTH as f32;
    s.blit(Layer::Cover, Vec2::ZERO);
    if beat == OpeningBeat::Cover {
        s.prompt(COVER_HINT, Layer::CoverHint);
    }

    s.blit(Layer::PanelTwo, Vec2::ZERO);
    let inset = s.size(ImageKey::Op2b);
    s.blit(Layer::PanelTwoInset, Vec2::new(w - inset.x, 30.0));
    s.blit(Layer::PanelThree, Vec2::ZERO);
    let inset = s.size(ImageKey::Op3b);
    s.blit(Layer::PanelThreeInset, Vec2::new(w - inset.x, 30.0));
    s.blit(Layer::PanelFour, Vec2::ZERO);

    s.blit(Layer::Planting, Vec2::ZERO);
    let seed = s.size(ImageKey::Op5b);
    s.blit(
        Layer::Seed,
        Vec2::new(
            Scene::centred_x(seed.x) - 15.0,
            215.0 + state.seed_drop_offset,
        ),
    );
    let can = s.size(ImageKey::Op5c);
    s.blit(Layer::WateringCan, Vec2::new(Scene::centred_x(can.x) + 25.0, 0.0));

    let water = s.size(ImageKey::Op5d);
    s.blit(
        Layer::Water,
        Vec2::new(
            Scene::centred_x(water.x) + 110.0,
            ((SCREEN_HEIGHT - water.y as i32) / 2) as f32 - 140.0,
        ),
    );
    s.blit(Layer::Sprout, Vec2::ZERO);
}

fn tutorial(s: &mut Scene, state: &GameState, beat: &TutorialBeat) {
    s.blit(Layer::Ground, Vec2::ZERO);
    s.flower(Layer::Seedling, 20.0);
    s.arms(state.arms.spread());

    if matches!(
        beat,
        TutorialBeat::MouseHint | TutorialBeat::ArmPractice { .. }
    ) {
        let mouse = s.size(ImageKey::Mouse);
        let base = Vec2::new(
            SCREEN_WIDTH as f32 * 0.75 - (mouse.x as i32 / 2) as f32 - 100.0,
            SCREEN_HEIGHT as f32 * 0.7 - 200.0,
        );
        s.blit(
            Layer::Mouse,
            Vec2::new(base.x + state.mouse_hint_offset, base.y),
        );
        s.blit(
            Layer::Arrow,
            Vec2::new(
                base.x + (mouse.x as i32 / 2) as f32 - 150.0,
                base.y + (mouse.y as i32 / 2) as f32 + 50.0,
            ),
        );
        s.prompt(ARM_HINT, Layer::Mouse);
    }

    s.blit(Layer::SunnyCover, Vec2::ZERO);
    s.blit(Layer::RainyCover, Vec2::ZERO);

    match beat {
        TutorialBeat::Sunlight { collected, .. } => {
            s.prompt(SUNLIGHT_HINT, Layer::PromptSunlight);
            if *collected > 0.0 && *collected < crate::consts::SUNLIGHT_REQUIRED {
                s.cmds.extend(hud::progress_bar(
                    BarKind::Sun,
                    *collected,
                    crate::consts::SUNLIGHT_REQUIRED,
                    0,
                ));
            }
        }
        TutorialBeat::RainPrompt => s.prompt(RAIN_HINT, Layer::PromptRain),
        TutorialBeat::RainLesson { damage, .. } => {
            s.prompt(RAIN_HINT, Layer::PromptRain);
            if s.alphas.is_opaque(Layer::RainyCover) {
                s.cmds.extend(hud::progress_bar(
                    BarKind::Damage,
                    *damage,
                    crate::consts::RAIN_PROTECTION_DURATION,
                    0,
                ));
            }
        }
        TutorialBeat::Complete { text_clock } => {
            s.prompt(RAIN_HINT, Layer::PromptRain);
            let second = text_clock.as_ref().is_some_and(|c| c.expired(4000));
            let text = if second { SUCCESS_SECOND } else { SUCCESS_FIRST };
            s.prompt(text, Layer::PromptSuccess);
        }
        _ => {}
    }

    if !s.alphas.is_clear(Layer::RainyCover) {
        s.drops(&state.rain, ImageKey::Raindrop, 255);
    }
}

/// Per-level nudge of the small intro flower
fn intro_flower_dx(level: LevelId) -> f32 {
    match level {
        LevelId::One => 10.0,
        LevelId::Two => -3.0,
        LevelId::Three => 0.0,
    }
}

fn intro(s: &mut Scene, state: &GameState, level: LevelId, page: &IntroPage) {
    let sunny = s.alphas.get(Layer::SunnyScene);
    let rainy = s.alphas.get(Layer::RainyScene);
    let sour = s.alphas.get(Layer::SourScene);

    s.blit(Layer::SunnyScene, Vec2::ZERO);
    if rainy > 0 {
        s.blit(Layer::RainyScene, Vec2::ZERO);
        s.drops(&state.rain, ImageKey::Raindrop, rainy);
    }
    if sour > 0 {
        s.blit(Layer::SourScene, Vec2::ZERO);
        s.drops(&state.sour_rain, ImageKey::SourRaindrop, sour);
    }

    if let IntroPage::BirdDemo { x, y, .. } = page {
        let bird = s.size(ImageKey::Bird);
        s.blit(Layer::Bird, Vec2::new(x - (bird.x as i32 / 2) as f32, *y));
    }

    let flower_alpha = sunny.max(rainy).max(sour);
    if let Some(key) = flower_layer(level).image() {
        let size = s.size(key) * INTRO_FLOWER_SCALE;
        let pos = Vec2::new(
            Scene::centred_x(size.x.floor()) + intro_flower_dx(level),
            SCREEN_HEIGHT as f32 - size.y.floor() - 277.0,
        );
        s.image(key, pos, flower_alpha, INTRO_FLOWER_SCALE);
    }

    s.title(
        format!("Level {}", level.number()),
        (SCREEN_HEIGHT - 150) as f32,
        s.alphas.get(Layer::LevelTitle),
    );
    s.prompt(INTRO_SUNNY, Layer::PromptSunny);
    s.prompt(INTRO_BIRD, Layer::PromptBird);
    let rain_text = if level == LevelId::One {
        INTRO_RAIN_AVOID
    } else {
        INTRO_RAIN_COLLECT
    };
    s.prompt(rain_text, Layer::PromptRainy);
    s.prompt(INTRO_SOUR, Layer::PromptSour);
}

/// Per-level nudge of the round flower
fn round_flower_dx(level: LevelId) -> f32 {
    match level {
        LevelId::One => 20.0,
        LevelId::Two => 5.0,
        LevelId::Three => 15.0,
    }
}

fn round_view(s: &mut Scene, state: &GameState, round: &SurvivalRound) {
    let level = round.level();
    let counting = round.is_counting_down();
    s.blit(Layer::Ground, Vec2::ZERO);
    s.flower(flower_layer(level), round_flower_dx(level));
    s.arms(state.arms.spread());

    match round.weather() {
        _ if counting => s.image(ImageKey::SunnyCover, Vec2::ZERO, 255, 1.0),
        Weather::Sunny => s.image(ImageKey::SunnyCover, Vec2::ZERO, 255, 1.0),
        Weather::Rainy => s.image(ImageKey::RainyCover, Vec2::ZERO, 255, 1.0),
        Weather::SourRain => s.push(hud::sour_overlay()),
    }
    if counting {
        s.cmds
            .extend(hud::countdown_overlay(round.countdown().elapsed_ms()));
    }

    if let Some(pos) = round.bird().and_then(|b| b.position()) {
        let bird = s.size(ImageKey::Bird);
        s.blit(
            Layer::Bird,
            Vec2::new(pos.x - (bird.x as i32 / 2) as f32, pos.y),
        );
    }

    s.push(hud::level_number(
        level.number(),
        s.alphas.get(Layer::LevelNumber),
    ));
    s.push(hud::game_timer(
        round.time_left(),
        s.alphas.get(Layer::LevelTimer),
    ));
    s.push(hud::top_text(BIRD_PASSED, s.alphas.get(Layer::BirdWarning)));

    if round.is_active() {
        let config = round.config();
        let mut offset = 0;
        for (resource, kind) in [(Resource::Sunlight, BarKind::Sun), (Resource::Rain, BarKind::Rain)]
        {
            if let Some(required) = config.required(resource) {
                s.cmds.extend(hud::progress_bar(
                    kind,
                    round.collected(resource),
                    required,
                    offset,
                ));
                offset += 1;
            }
        }
        s.cmds.extend(hud::progress_bar(
            BarKind::Damage,
            round.damage(),
            config.tolerance,
            offset,
        ));
    }

    if !counting {
        match round.weather() {
            Weather::Rainy => s.drops(&state.rain, ImageKey::Raindrop, 255),
            Weather::SourRain => s.drops(&state.sour_rain, ImageKey::SourRaindrop, 255),
            Weather::Sunny => {}
        }
    }
}

fn settlement(s: &mut Scene, level: LevelId, outcome: Outcome) {
    if outcome.is_win() {
        let (dx, text) = match level {
            LevelId::One => (10.0, "The seed has turned into a bud."),
            LevelId::Two | LevelId::Three => (20.0, "The bud has turned into a flower."),
        };
        s.blit(Layer::Ground, Vec2::ZERO);
        s.flower(grown_layer(level), dx);
        s.prompt(text, Layer::PromptResult);
    } else {
        let text = match level {
            LevelId::One => "You lost. The seed dies. Click to try again.",
            LevelId::Two => "You lost. The bud dies. Click to try again.",
            LevelId::Three => "You lost. The flower dies. Click to try again.",
        };
        s.blit(Layer::GroundLost, Vec2::ZERO);
        s.flower(lost_layer(level), 20.0);
        s.prompt(text, Layer::PromptResult);
    }
}

fn ending(s: &mut Scene, beat: EndingBeat) {
    if !s.alphas.is_clear(Layer::HappyEnd) {
        s.blit(Layer::HappyEnd, Vec2::ZERO);
        s.prompt(ENDING_TEXT, Layer::EndingText);
    }
    if beat == EndingBeat::Final && !s.alphas.is_clear(Layer::FinalEnd) {
        s.blit(Layer::FinalEnd, Vec2::ZERO);
        s.title(
            ENDING_TITLE.to_string(),
            (SCREEN_HEIGHT - 100) as f32,
            s.alphas.get(Layer::EndingTitle),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetError, AssetProvider, Image, NoAssets, SoundHandle};
    use crate::audio::SoundKey;
    use crate::sim::{TickInput, tick};
    use image::{Rgba, RgbaImage};

    fn texts(cmds: &[DrawCmd]) -> Vec<String> {
        cmds.iter()
            .filter_map(|c| match c {
                DrawCmd::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn images(cmds: &[DrawCmd]) -> Vec<ImageKey> {
        cmds.iter()
            .filter_map(|c| match c {
                DrawCmd::Image { key, .. } => Some(*key),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_blank_boot_frame() {
        let assets = Assets::placeholders();
        let state = GameState::new(1, 0);
        assert_eq!(compose(&state, &assets), vec![DrawCmd::Clear(Color::BLACK)]);
    }

    #[test]
    fn test_cover_hint_after_fade() {
        let assets = Assets::placeholders();
        let mut state = GameState::new(1, 0);
        state.alphas.show(&[Layer::Cover, Layer::CoverHint]);
        let cmds = compose(&state, &assets);
        assert_eq!(images(&cmds), vec![ImageKey::Op1]);
        assert_eq!(texts(&cmds).last(), Some(&COVER_HINT.to_string()));
    }

    #[test]
    fn test_placeholder_block_is_labelled() {
        let assets = Assets::placeholders();
        let mut state = GameState::new(1, 0);
        state.alphas.show(&[Layer::Cover]);
        let cmds = compose(&state, &assets);
        let (w, h) = assets.size(ImageKey::Op1);
        let label = cmds.iter().find_map(|c| match c {
            DrawCmd::Text { text, pos, alpha, .. } if text.starts_with("IMG ") => {
                Some((text.clone(), *pos, *alpha))
            }
            _ => None,
        });
        assert_eq!(
            label,
            Some((
                format!("IMG {}", ImageKey::Op1.name()),
                Vec2::new(w as f32 / 2.0, h as f32 / 2.0),
                255
            ))
        );
    }

    /// Every image present as a small opaque block
    struct SolidArt;

    impl AssetProvider for SolidArt {
        fn image(&self, _key: ImageKey) -> Result<Image, AssetError> {
            Ok(Image::new(RgbaImage::from_pixel(8, 8, Rgba([9, 9, 9, 255]))))
        }

        fn sound(&self, key: SoundKey) -> Result<SoundHandle, AssetError> {
            NoAssets.sound(key)
        }
    }

    #[test]
    fn test_loaded_images_have_no_label() {
        let assets = Assets::load(&SolidArt);
        let mut state = GameState::new(1, 0);
        state.alphas.show(&[Layer::Cover]);
        assert!(texts(&compose(&state, &assets)).is_empty());
    }

    #[test]
    fn test_arms_move_apart_with_spread() {
        let assets = Assets::placeholders();
        let mut state = GameState::new(1, 0);
        state.jump_to(11.0).unwrap();
        state.arms.set_spread(120.0);
        let cmds = compose(&state, &assets);
        let xs: Vec<f32> = cmds
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Image { key: ImageKey::ArmLeft | ImageKey::ArmRight, pos, .. } => {
                    Some(pos.x)
                }
                _ => None,
            })
            .collect();
        let arm_w = assets.size(ImageKey::ArmLeft).0 as f32;
        assert_eq!(xs, vec![650.0 - arm_w - 150.0, 650.0 + 150.0]);
    }

    #[test]
    fn test_countdown_frame_shows_digit_and_no_bars() {
        let assets = Assets::placeholders();
        let mut state = GameState::new(1, 0);
        state.jump_to(25.0).unwrap();
        let cmds = compose(&state, &assets);
        assert!(texts(&cmds).contains(&"3".to_string()));
        assert!(!texts(&cmds).iter().any(|t| t == "sun"));
        assert!(images(&cmds).contains(&ImageKey::SunnyCover));
    }

    #[test]
    fn test_live_level_two_has_three_bars() {
        let assets = Assets::placeholders();
        let mut state = GameState::new(1, 0);
        state.jump_to(25.0).unwrap();
        let input = TickInput {
            dt_ms: 16,
            ..Default::default()
        };
        while state.step.is_counting_down() {
            tick(&mut state, &input);
        }
        let t = texts(&compose(&state, &assets));
        for label in ["sun", "rain", "damage"] {
            assert!(t.iter().any(|x| x == label), "missing {label}");
        }
    }

    #[test]
    fn test_restart_fade_is_black_only() {
        let assets = Assets::placeholders();
        let mut state = GameState::new(1, 0);
        state.jump_to(14.0).unwrap();
        state.step = Step::Tutorial(TutorialBeat::RainLesson {
            damage: 0.0,
            elapsed: 0.0,
            restarting: true,
        });
        state.alphas.show(&[Layer::RestartFade]);
        let cmds = compose(&state, &assets);
        assert_eq!(cmds.len(), 2);
        assert!(images(&cmds).is_empty());
    }

    #[test]
    fn test_level_one_intro_uses_avoid_text() {
        let assets = Assets::placeholders();
        let mut state = GameState::new(1, 0);
        state.jump_to(17.0).unwrap();
        state.alphas.show(&[Layer::PromptRainy, Layer::RainyScene]);
        let t = texts(&compose(&state, &assets));
        assert!(t.contains(&INTRO_RAIN_AVOID.to_string()));
        assert!(!t.contains(&INTRO_RAIN_COLLECT.to_string()));
    }
}
