//! Opacity registry for every fadeable visual element
//!
//! Values are `u8`, so a fade can never leave [0, 255]; all arithmetic saturates.

use serde::{Deserialize, Serialize};

use crate::assets::ImageKey;

/// A named visual element whose opacity the sequencer animates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    // Opening cutscene
    Cover,
    CoverHint,
    PanelTwo,
    PanelTwoInset,
    PanelThree,
    PanelThreeInset,
    PanelFour,
    Planting,
    Seed,
    WateringCan,
    Water,
    Sprout,

    // Tutorial and round scenery
    Ground,
    ArmLeft,
    ArmRight,
    Seedling,
    Mouse,
    Arrow,
    SunnyCover,
    RainyCover,
    PromptSunlight,
    PromptRain,
    PromptSuccess,
    RestartFade,

    // Level intros and settlements
    SunnyScene,
    RainyScene,
    SourScene,
    GroundLost,
    SeedlingLost,
    Bud,
    BudLost,
    Bloom,
    BloomLost,
    Bird,
    LevelTitle,
    PromptSunny,
    PromptBird,
    PromptRainy,
    PromptSour,
    PromptResult,
    LevelNumber,
    LevelTimer,
    BirdWarning,

    // Ending
    HappyEnd,
    FinalEnd,
    EndingText,
    EndingTitle,
}

impl Layer {
    pub const COUNT: usize = Layer::EndingTitle as usize + 1;

    pub const ALL: [Layer; Layer::COUNT] = [
        Layer::Cover,
        Layer::CoverHint,
        Layer::PanelTwo,
        Layer::PanelTwoInset,
        Layer::PanelThree,
        Layer::PanelThreeInset,
        Layer::PanelFour,
        Layer::Planting,
        Layer::Seed,
        Layer::WateringCan,
        Layer::Water,
        Layer::Sprout,
        Layer::Ground,
        Layer::ArmLeft,
        Layer::ArmRight,
        Layer::Seedling,
        Layer::Mouse,
        Layer::Arrow,
        Layer::SunnyCover,
        Layer::RainyCover,
        Layer::PromptSunlight,
        Layer::PromptRain,
        Layer::PromptSuccess,
        Layer::RestartFade,
        Layer::SunnyScene,
        Layer::RainyScene,
        Layer::SourScene,
        Layer::GroundLost,
        Layer::SeedlingLost,
        Layer::Bud,
        Layer::BudLost,
        Layer::Bloom,
        Layer::BloomLost,
        Layer::Bird,
        Layer::LevelTitle,
        Layer::PromptSunny,
        Layer::PromptBird,
        Layer::PromptRainy,
        Layer::PromptSour,
        Layer::PromptResult,
        Layer::LevelNumber,
        Layer::LevelTimer,
        Layer::BirdWarning,
        Layer::HappyEnd,
        Layer::FinalEnd,
        Layer::EndingText,
        Layer::EndingTitle,
    ];

    /// Backing image, for layers that are sprites rather than text or overlays
    pub fn image(self) -> Option<ImageKey> {
        use ImageKey as K;
        Some(match self {
            Layer::Cover => K::Op1,
            Layer::PanelTwo => K::Op2a,
            Layer::PanelTwoInset => K::Op2b,
            Layer::PanelThree => K::Op3a,
            Layer::PanelThreeInset => K::Op3b,
            Layer::PanelFour => K::Op4,
            Layer::Planting => K::Op5a,
            Layer::Seed => K::Op5b,
            Layer::WateringCan => K::Op5c,
            Layer::Water => K::Op5d,
            Layer::Sprout => K::Op5e,
            Layer::Ground => K::Base,
            Layer::ArmLeft => K::ArmLeft,
            Layer::ArmRight => K::ArmRight,
            Layer::Seedling => K::Seedling,
            Layer::Mouse => K::Mouse,
            Layer::Arrow => K::Arrow,
            Layer::SunnyCover => K::SunnyCover,
            Layer::RainyCover => K::RainyCover,
            Layer::SunnyScene => K::SunnyScene,
            Layer::RainyScene => K::RainyScene,
            Layer::SourScene => K::SourScene,
            Layer::GroundLost => K::BaseLose,
            Layer::SeedlingLost => K::SeedlingLost,
            Layer::Bud => K::Bud,
            Layer::BudLost => K::BudLost,
            Layer::Bloom => K::Bloom,
            Layer::BloomLost => K::BloomLost,
            Layer::Bird => K::Bird,
            Layer::HappyEnd => K::HappyEnd,
            Layer::FinalEnd => K::FinalEnd,
            _ => return None,
        })
    }
}

/// Opacity per layer, owned by the sequencer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMap {
    values: [u8; Layer::COUNT],
}

impl Default for AlphaMap {
    fn default() -> Self {
        Self::new()
    }
}

impl AlphaMap {
    /// All layers transparent
    pub fn new() -> Self {
        Self {
            values: [0; Layer::COUNT],
        }
    }

    #[inline]
    pub fn get(&self, layer: Layer) -> u8 {
        self.values[layer as usize]
    }

    #[inline]
    pub fn set(&mut self, layer: Layer, alpha: u8) {
        self.values[layer as usize] = alpha;
    }

    #[inline]
    pub fn is_opaque(&self, layer: Layer) -> bool {
        self.get(layer) == u8::MAX
    }

    #[inline]
    pub fn is_clear(&self, layer: Layer) -> bool {
        self.get(layer) == 0
    }

    /// Step toward 255; no-op once opaque
    pub fn fade_in(&mut self, layer: Layer, speed: u8) {
        let v = &mut self.values[layer as usize];
        *v = v.saturating_add(speed);
    }

    /// Step toward 0; no-op once clear
    pub fn fade_out(&mut self, layer: Layer, speed: u8) {
        let v = &mut self.values[layer as usize];
        *v = v.saturating_sub(speed);
    }

    /// Fade several layers out, returning true once all of them are clear
    pub fn fade_out_all(&mut self, layers: &[Layer], speed: u8) -> bool {
        let mut done = true;
        for &layer in layers {
            if !self.is_clear(layer) {
                self.fade_out(layer, speed);
                done = false;
            }
        }
        done
    }

    pub fn show(&mut self, layers: &[Layer]) {
        for &layer in layers {
            self.set(layer, u8::MAX);
        }
    }

    pub fn hide(&mut self, layers: &[Layer]) {
        for &layer in layers {
            self.set(layer, 0);
        }
    }

    /// Zero every layer
    pub fn reset_all(&mut self) {
        self.values = [0; Layer::COUNT];
    }

    pub fn iter(&self) -> impl Iterator<Item = (Layer, u8)> + '_ {
        Layer::ALL.iter().map(move |&l| (l, self.get(l)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layer_table_matches_discriminants() {
        for (i, layer) in Layer::ALL.iter().enumerate() {
            assert_eq!(*layer as usize, i);
        }
    }

    #[test]
    fn test_fade_in_reaches_exactly_opaque() {
        let mut alphas = AlphaMap::new();
        for _ in 0..51 {
            alphas.fade_in(Layer::Cover, 5);
        }
        assert!(alphas.is_opaque(Layer::Cover));
        alphas.fade_in(Layer::Cover, 5);
        assert_eq!(alphas.get(Layer::Cover), 255);
    }

    #[test]
    fn test_fade_out_all_reports_completion() {
        let mut alphas = AlphaMap::new();
        alphas.set(Layer::SunnyScene, 10);
        alphas.set(Layer::LevelTitle, 5);
        let layers = [Layer::SunnyScene, Layer::LevelTitle];
        assert!(!alphas.fade_out_all(&layers, 5));
        assert!(!alphas.fade_out_all(&layers, 5));
        assert!(alphas.fade_out_all(&layers, 5));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut alphas = AlphaMap::new();
        alphas.show(&[Layer::Bird, Layer::Ground]);
        alphas.reset_all();
        let once = alphas.clone();
        alphas.reset_all();
        assert_eq!(alphas, once);
        assert!(alphas.iter().all(|(_, a)| a == 0));
    }

    #[test]
    fn test_sprite_layers_have_images() {
        assert_eq!(Layer::Bird.image(), Some(ImageKey::Bird));
        assert_eq!(Layer::PromptRain.image(), None);
    }

    proptest! {
        #[test]
        fn test_fades_never_leave_range(ops in prop::collection::vec((any::<bool>(), 0u8..=20, 0usize..Layer::COUNT), 0..400)) {
            let mut alphas = AlphaMap::new();
            let mut model = [0i32; Layer::COUNT];
            for (up, speed, idx) in ops {
                let layer = Layer::ALL[idx];
                if up {
                    alphas.fade_in(layer, speed);
                    model[idx] = (model[idx] + speed as i32).min(255);
                } else {
                    alphas.fade_out(layer, speed);
                    model[idx] = (model[idx] - speed as i32).max(0);
                }
                prop_assert_eq!(alphas.get(layer) as i32, model[idx]);
            }
        }
    }
}
