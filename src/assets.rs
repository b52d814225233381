//! Image and sound tables with placeholder fallback
//!
//! Source art is authored at twice the window resolution. `Assets::load`
//! scales everything by `GLOBAL_SCALE_FACTOR`, enlarges the tutorial seedling
//! by a third and tilts the bird dropping to match its diagonal fall. A missing
//! or broken file never fails the load: it is replaced by a solid labelled
//! block (images) or a silent handle (sounds).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::audio::SoundKey;
use crate::consts::{GLOBAL_SCALE_FACTOR, SCREEN_HEIGHT, SCREEN_WIDTH};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Every image the game draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageKey {
    Op1,
    Op2a,
    Op2b,
    Op3a,
    Op3b,
    Op4,
    Op5a,
    Op5b,
    Op5c,
    Op5d,
    Op5e,
    Base,
    ArmLeft,
    ArmRight,
    Seedling,
    Mouse,
    Arrow,
    SunnyCover,
    RainyCover,
    Raindrop,
    SunnyScene,
    RainyScene,
    BaseLose,
    SeedlingLost,
    Bud,
    SourScene,
    BudLost,
    Bloom,
    SourRaindrop,
    Bird,
    BloomLost,
    HappyEnd,
    FinalEnd,
}

impl ImageKey {
    pub const ALL: [ImageKey; 33] = [
        ImageKey::Op1,
        ImageKey::Op2a,
        ImageKey::Op2b,
        ImageKey::Op3a,
        ImageKey::Op3b,
        ImageKey::Op4,
        ImageKey::Op5a,
        ImageKey::Op5b,
        ImageKey::Op5c,
        ImageKey::Op5d,
        ImageKey::Op5e,
        ImageKey::Base,
        ImageKey::ArmLeft,
        ImageKey::ArmRight,
        ImageKey::Seedling,
        ImageKey::Mouse,
        ImageKey::Arrow,
        ImageKey::SunnyCover,
        ImageKey::RainyCover,
        ImageKey::Raindrop,
        ImageKey::SunnyScene,
        ImageKey::RainyScene,
        ImageKey::BaseLose,
        ImageKey::SeedlingLost,
        ImageKey::Bud,
        ImageKey::SourScene,
        ImageKey::BudLost,
        ImageKey::Bloom,
        ImageKey::SourRaindrop,
        ImageKey::Bird,
        ImageKey::BloomLost,
        ImageKey::HappyEnd,
        ImageKey::FinalEnd,
    ];

    /// Short table key; placeholder size and colour derive from it
    pub fn name(self) -> &'static str {
        match self {
            ImageKey::Op1 => "1",
            ImageKey::Op2a => "2-1",
            ImageKey::Op2b => "2-2",
            ImageKey::Op3a => "3-1",
            ImageKey::Op3b => "3-2",
            ImageKey::Op4 => "4",
            ImageKey::Op5a => "5-1",
            ImageKey::Op5b => "5-2",
            ImageKey::Op5c => "5-3",
            ImageKey::Op5d => "5-4",
            ImageKey::Op5e => "5-5",
            ImageKey::Base => "t-1",
            ImageKey::ArmLeft => "t-l",
            ImageKey::ArmRight => "t-r",
            ImageKey::Seedling => "t-f",
            ImageKey::Mouse => "t-m",
            ImageKey::Arrow => "t-a",
            ImageKey::SunnyCover => "t-sunny",
            ImageKey::RainyCover => "t-rainy",
            ImageKey::Raindrop => "t-raindrop",
            ImageKey::SunnyScene => "1-sunny",
            ImageKey::RainyScene => "1-rainy",
            ImageKey::BaseLose => "1-baselose",
            ImageKey::SeedlingLost => "1-f-l",
            ImageKey::Bud => "2-f",
            ImageKey::SourScene => "1-sourrain",
            ImageKey::BudLost => "2-f-l",
            ImageKey::Bloom => "3-f",
            ImageKey::SourRaindrop => "sourraindrop",
            ImageKey::Bird => "birdshit",
            ImageKey::BloomLost => "3-f-l",
            ImageKey::HappyEnd => "E-1",
            ImageKey::FinalEnd => "E-2",
        }
    }

    /// Path relative to the asset root
    pub fn path(self) -> &'static str {
        match self {
            ImageKey::Op1 => "images/opening/op1.png",
            ImageKey::Op2a => "images/opening/op2-1.png",
            ImageKey::Op2b => "images/opening/op2-2.png",
            ImageKey::Op3a => "images/opening/op3-1.png",
            ImageKey::Op3b => "images/opening/op3-2.png",
            ImageKey::Op4 => "images/opening/op4.png",
            ImageKey::Op5a => "images/opening/op5-1.png",
            ImageKey::Op5b => "images/opening/op5-2.png",
            ImageKey::Op5c => "images/opening/op5-3.png",
            ImageKey::Op5d => "images/opening/op5-4.png",
            ImageKey::Op5e => "images/opening/op5-5.png",
            ImageKey::Base => "images/base.png",
            ImageKey::ArmLeft => "images/arm_l.png",
            ImageKey::ArmRight => "images/arm_r.png",
            ImageKey::Seedling => "images/level1sunny/1.png",
            ImageKey::Mouse => "images/tutorial/mouse.png",
            ImageKey::Arrow => "images/tutorial/arrow.png",
            ImageKey::SunnyCover => "images/level1sunny/cover_sunny.png",
            ImageKey::RainyCover => "images/level2rainy/cover_rain.png",
            ImageKey::Raindrop => "images/raindrop.png",
            ImageKey::SunnyScene => "images/level1sunny/sunny.png",
            ImageKey::RainyScene => "images/level2rainy/rainy.png",
            ImageKey::BaseLose => "images/base_lose.png",
            ImageKey::SeedlingLost => "images/level1sunny/1_f.png",
            ImageKey::Bud => "images/level2rainy/2.png",
            ImageKey::SourScene => "images/level3sourrain/sourrain.png",
            ImageKey::BudLost => "images/level2rainy/2_f.png",
            ImageKey::Bloom => "images/level3sourrain/3.png",
            ImageKey::SourRaindrop => "images/sourraindrop.png",
            ImageKey::Bird => "images/birdshit.png",
            ImageKey::BloomLost => "images/level3sourrain/3_f.png",
            ImageKey::HappyEnd => "images/ending/happy.png",
            ImageKey::FinalEnd => "images/ending/ending.png",
        }
    }

    /// Placeholder dimensions before scaling
    fn placeholder_size(self) -> (u32, u32) {
        let k = self.name();
        let full = k.contains('1')
            || k.contains('4')
            || k.contains("-1")
            || k.contains("5-5")
            || k == "t-1"
            || k.contains("E-");
        if full {
            (SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32)
        } else {
            (200, 200)
        }
    }

    fn placeholder_color(self) -> Rgba<u8> {
        let k = self.name();
        if k.contains("-1") || k.len() == 1 {
            Rgba([50, 50, 150, 255])
        } else {
            Rgba([150, 50, 50, 255])
        }
    }
}

/// Decoded RGBA image
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub pixels: RgbaImage,
    /// Caption drawn over a placeholder block
    pub label: Option<String>,
}

impl Image {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            label: None,
        }
    }

    /// Solid labelled block standing in for a missing file
    pub fn placeholder(key: ImageKey) -> Self {
        let (w, h) = key.placeholder_size();
        Self {
            pixels: RgbaImage::from_pixel(w, h, key.placeholder_color()),
            label: Some(format!("IMG {}", key.name())),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_placeholder(&self) -> bool {
        self.label.is_some()
    }

    /// High-quality resize by `factor`
    pub fn scaled(&self, factor: f32) -> Self {
        let w = ((self.width() as f32 * factor) as u32).max(1);
        let h = ((self.height() as f32 * factor) as u32).max(1);
        Self {
            pixels: imageops::resize(&self.pixels, w, h, FilterType::Lanczos3),
            label: self.label.clone(),
        }
    }

    /// Counter-clockwise rotation; the canvas grows to fit the corners
    pub fn rotated(&self, degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (w, h) = (self.width() as f32, self.height() as f32);
        // Trim float noise so right angles stay exact
        let fit = |v: f32| (v - 1e-3).ceil().max(1.0) as u32;
        let out_w = fit(w * cos.abs() + h * sin.abs());
        let out_h = fit(w * sin.abs() + h * cos.abs());
        let (cx, cy) = (w / 2.0, h / 2.0);
        let (ox, oy) = (out_w as f32 / 2.0, out_h as f32 / 2.0);

        let pixels = RgbaImage::from_fn(out_w, out_h, |x, y| {
            let dx = x as f32 + 0.5 - ox;
            let dy = y as f32 + 0.5 - oy;
            // Inverse of a CCW turn in screen space (y down)
            let sx = dx * cos - dy * sin + cx;
            let sy = dx * sin + dy * cos + cy;
            if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
                *self.pixels.get_pixel(sx as u32, sy as u32)
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        Self {
            pixels,
            label: self.label.clone(),
        }
    }
}

/// A sound file the mixer can play; silent when the file was missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundHandle {
    pub key: SoundKey,
    pub path: PathBuf,
    pub silent: bool,
}

/// Where raw assets come from
pub trait AssetProvider {
    fn image(&self, key: ImageKey) -> Result<Image, AssetError>;
    fn sound(&self, key: SoundKey) -> Result<SoundHandle, AssetError>;
}

/// Assets read from a directory tree
#[derive(Debug, Clone)]
pub struct FsAssets {
    root: PathBuf,
}

impl FsAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetProvider for FsAssets {
    fn image(&self, key: ImageKey) -> Result<Image, AssetError> {
        let path = self.root.join(key.path());
        if !path.is_file() {
            return Err(AssetError::NotFound(path));
        }
        let decoded = image::open(&path).map_err(|source| AssetError::Decode {
            path: path.clone(),
            source,
        })?;
        Ok(Image::new(decoded.to_rgba8()))
    }

    fn sound(&self, key: SoundKey) -> Result<SoundHandle, AssetError> {
        let path = self.root.join(key.path());
        if !path.is_file() {
            return Err(AssetError::NotFound(path));
        }
        Ok(SoundHandle {
            key,
            path,
            silent: false,
        })
    }
}

/// Provider with nothing in it; every asset becomes a placeholder
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetProvider for NoAssets {
    fn image(&self, key: ImageKey) -> Result<Image, AssetError> {
        Err(AssetError::NotFound(PathBuf::from(key.path())))
    }

    fn sound(&self, key: SoundKey) -> Result<SoundHandle, AssetError> {
        Err(AssetError::NotFound(PathBuf::from(key.path())))
    }
}

/// Seedling tutorial sprite is drawn a third larger
const SEEDLING_SCALE: f32 = 4.0 / 3.0;
/// Bird dropping tilt, matching its down-right fall
const BIRD_TILT_DEGREES: f32 = 25.0;

/// Loaded, scaled asset set
#[derive(Debug, Clone)]
pub struct Assets {
    images: HashMap<ImageKey, Image>,
    sounds: HashMap<SoundKey, SoundHandle>,
}

impl Assets {
    /// Load everything, substituting placeholders for anything unavailable
    pub fn load(provider: &impl AssetProvider) -> Self {
        let mut images = HashMap::with_capacity(ImageKey::ALL.len());
        for key in ImageKey::ALL {
            let raw = provider.image(key).unwrap_or_else(|e| {
                log::warn!("{}; using placeholder for {}", e, key.name());
                Image::placeholder(key)
            });
            let mut img = raw.scaled(GLOBAL_SCALE_FACTOR);
            match key {
                ImageKey::Bird => img = img.rotated(BIRD_TILT_DEGREES),
                ImageKey::Seedling => img = img.scaled(SEEDLING_SCALE),
                _ => {}
            }
            images.insert(key, img);
        }

        let mut sounds = HashMap::with_capacity(SoundKey::ALL.len());
        for key in SoundKey::ALL {
            let handle = provider.sound(key).unwrap_or_else(|e| {
                log::warn!("{}; {} will be silent", e, key.path());
                SoundHandle {
                    key,
                    path: PathBuf::from(key.path()),
                    silent: true,
                }
            });
            sounds.insert(key, handle);
        }

        let missing = images.values().filter(|i| i.is_placeholder()).count();
        log::info!(
            "Assets loaded: {} images ({} placeholders), {} sounds",
            images.len(),
            missing,
            sounds.len()
        );
        Self { images, sounds }
    }

    /// Placeholder set for runs without art
    pub fn placeholders() -> Self {
        Self::load(&NoAssets)
    }

    pub fn image(&self, key: ImageKey) -> &Image {
        // Every key is inserted by `load`
        &self.images[&key]
    }

    pub fn sound(&self, key: SoundKey) -> &SoundHandle {
        &self.sounds[&key]
    }

    /// Width and height of a loaded image
    pub fn size(&self, key: ImageKey) -> (u32, u32) {
        let img = self.image(key);
        (img.width(), img.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_rules() {
        assert_eq!(ImageKey::Op1.placeholder_size(), (1280, 720));
        assert_eq!(ImageKey::Op5e.placeholder_size(), (1280, 720));
        assert_eq!(ImageKey::HappyEnd.placeholder_size(), (1280, 720));
        assert_eq!(ImageKey::Mouse.placeholder_size(), (200, 200));
        assert_eq!(ImageKey::Op2b.placeholder_size(), (200, 200));
        // '1' anywhere in the key: the lost seedling is full screen too
        assert_eq!(ImageKey::SeedlingLost.placeholder_size(), (1280, 720));

        assert_eq!(ImageKey::Op4.placeholder_color(), Rgba([50, 50, 150, 255]));
        assert_eq!(ImageKey::Base.placeholder_color(), Rgba([50, 50, 150, 255]));
        assert_eq!(ImageKey::Bird.placeholder_color(), Rgba([150, 50, 50, 255]));
    }

    #[test]
    fn test_missing_assets_become_placeholders() {
        let assets = Assets::placeholders();
        let cover = assets.image(ImageKey::Op1);
        assert!(cover.is_placeholder());
        assert_eq!(cover.label.as_deref(), Some("IMG 1"));
        assert_eq!(assets.size(ImageKey::Op1), (640, 360));
        assert_eq!(assets.size(ImageKey::Mouse), (100, 100));
        assert!(assets.sound(SoundKey::Bgm).silent);
    }

    #[test]
    fn test_seedling_and_bird_transforms() {
        let assets = Assets::placeholders();
        // 200 -> 100 -> 133
        assert_eq!(assets.size(ImageKey::Seedling), (133, 133));
        let (w, h) = assets.size(ImageKey::Bird);
        assert!(w > 100 && h > 100);
    }

    #[test]
    fn test_rotation_keeps_pixels_inside() {
        let img = Image::new(RgbaImage::from_pixel(10, 4, Rgba([1, 2, 3, 255])));
        let turned = img.rotated(90.0);
        assert_eq!((turned.width(), turned.height()), (4, 10));
        assert_eq!(turned.pixels.get_pixel(2, 5), &Rgba([1, 2, 3, 255]));
        let tilted = img.rotated(25.0);
        assert_eq!(tilted.pixels.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_fs_assets_missing_root() {
        let fs = FsAssets::new("/no/such/asset/root");
        assert!(matches!(fs.image(ImageKey::Op1), Err(AssetError::NotFound(_))));
        assert!(matches!(fs.sound(SoundKey::Click), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn test_key_tables_are_unique() {
        let mut names: Vec<_> = ImageKey::ALL.iter().map(|k| k.name()).collect();
        let mut paths: Vec<_> = ImageKey::ALL.iter().map(|k| k.path()).collect();
        names.sort_unstable();
        names.dedup();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(names.len(), ImageKey::ALL.len());
        assert_eq!(paths.len(), ImageKey::ALL.len());
    }
}
