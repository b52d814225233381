//! Software RGBA canvas with optional PNG snapshots
//!
//! Images and rectangles are alpha-blended onto an opaque frame. Text is not
//! rasterised (no font is bundled); it is collected so callers can inspect
//! what a frame said.

use std::path::PathBuf;

use image::{Rgba, RgbaImage, imageops};

use super::{DrawCmd, Rect, RenderError, RenderSink};
use crate::assets::Assets;
use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub struct Canvas {
    frame: RgbaImage,
    texts: Vec<String>,
    snapshot_dir: Option<PathBuf>,
    snapshot_every: u64,
    written: u64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

/// Blend `src` over `dst` at `alpha` (0-255) on top of the source's own alpha
#[inline]
fn blend(dst: &mut Rgba<u8>, src: [u8; 3], alpha: u32) {
    if alpha == 0 {
        return;
    }
    let inv = 255 - alpha;
    for i in 0..3 {
        dst[i] = ((src[i] as u32 * alpha + dst[i] as u32 * inv + 127) / 255) as u8;
    }
    dst[3] = 255;
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            frame: RgbaImage::from_pixel(
                SCREEN_WIDTH as u32,
                SCREEN_HEIGHT as u32,
                Rgba([0, 0, 0, 255]),
            ),
            texts: Vec::new(),
            snapshot_dir: None,
            snapshot_every: 0,
            written: 0,
        }
    }

    /// Write every `every`th frame to `dir`
    pub fn with_snapshots(mut self, dir: impl Into<PathBuf>, every: u64) -> Self {
        self.snapshot_dir = Some(dir.into());
        self.snapshot_every = every;
        self
    }

    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    /// Texts submitted since the last `begin_frame`
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Snapshots written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    fn clip(&self, rect: &Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.min.x.max(0.0) as u32;
        let y0 = rect.min.y.max(0.0) as u32;
        let max = rect.max();
        let x1 = (max.x.min(self.frame.width() as f32)).max(0.0) as u32;
        let y1 = (max.y.min(self.frame.height() as f32)).max(0.0) as u32;
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    fn fill(&mut self, rect: &Rect, color: [u8; 3], alpha: u8) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                blend(self.frame.get_pixel_mut(x, y), color, alpha as u32);
            }
        }
    }

    fn stroke(&mut self, rect: &Rect, color: [u8; 3], width: f32) {
        let (min, size) = (rect.min, rect.size);
        let w = width.min(size.x / 2.0).min(size.y / 2.0);
        for edge in [
            Rect::new(min.x, min.y, size.x, w),
            Rect::new(min.x, min.y + size.y - w, size.x, w),
            Rect::new(min.x, min.y, w, size.y),
            Rect::new(min.x + size.x - w, min.y, w, size.y),
        ] {
            self.fill(&edge, color, 255);
        }
    }

    fn blit(&mut self, src: &RgbaImage, x: i64, y: i64, alpha: u8) {
        let (fw, fh) = (self.frame.width() as i64, self.frame.height() as i64);
        for (sx, sy, px) in src.enumerate_pixels() {
            let (dx, dy) = (x + sx as i64, y + sy as i64);
            if dx < 0 || dy < 0 || dx >= fw || dy >= fh {
                continue;
            }
            let a = px[3] as u32 * alpha as u32 / 255;
            blend(
                self.frame.get_pixel_mut(dx as u32, dy as u32),
                [px[0], px[1], px[2]],
                a,
            );
        }
    }
}

impl RenderSink for Canvas {
    fn begin_frame(&mut self) {
        self.texts.clear();
    }

    fn draw(&mut self, cmd: &DrawCmd, assets: &Assets) {
        match cmd {
            DrawCmd::Clear(color) => {
                let [r, g, b] = color.0;
                for px in self.frame.pixels_mut() {
                    *px = Rgba([r, g, b, 255]);
                }
            }
            DrawCmd::Image {
                key,
                pos,
                alpha,
                scale,
            } => {
                let img = &assets.image(*key).pixels;
                let (x, y) = (pos.x.floor() as i64, pos.y.floor() as i64);
                if (*scale - 1.0).abs() > f32::EPSILON {
                    let w = ((img.width() as f32 * scale) as u32).max(1);
                    let h = ((img.height() as f32 * scale) as u32).max(1);
                    let scaled = imageops::resize(img, w, h, imageops::FilterType::Triangle);
                    self.blit(&scaled, x, y, *alpha);
                } else {
                    self.blit(img, x, y, *alpha);
                }
            }
            DrawCmd::FillRect { rect, color, alpha } => self.fill(rect, color.0, *alpha),
            DrawCmd::StrokeRect { rect, color, width } => self.stroke(rect, color.0, *width),
            DrawCmd::Text { text, .. } => {
                log::trace!("text: {}", text);
                self.texts.push(text.clone());
            }
        }
    }

    fn end_frame(&mut self, frame: u64) -> Result<(), RenderError> {
        let Some(dir) = &self.snapshot_dir else {
            return Ok(());
        };
        if self.snapshot_every == 0 || frame % self.snapshot_every != 0 {
            return Ok(());
        }
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("frame_{:06}.png", frame));
        self.frame
            .save(&path)
            .map_err(|source| RenderError::Snapshot {
                path: path.clone(),
                source,
            })?;
        self.written += 1;
        log::debug!("Snapshot {}", path.display());
        Ok(())
    }
}
