//! Rendering module
//!
//! Composition is pure: `compose` turns a `GameState` into a list of
//! `DrawCmd`s, which any `RenderSink` can rasterise. Text is passed through
//! as strings; the sink decides how to draw it.

pub mod canvas;
pub mod compose;
pub mod hud;

pub use canvas::Canvas;
pub use compose::compose;

use glam::Vec2;
use thiserror::Error;

use crate::assets::{Assets, ImageKey};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot write snapshot {path}: {source}")]
    Snapshot {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot create snapshot directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Opaque RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0]);
    pub const WHITE: Color = Color([255, 255, 255]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b])
    }
}

/// Axis-aligned rectangle in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }
}

/// Which point of the text box `pos` refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    TopLeft,
    TopRight,
    /// Vertically centred, right edge at `pos`
    MidRight,
    /// Vertically centred, left edge at `pos`
    MidLeft,
}

/// Font sizes used by the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Body,
    Title,
    Countdown,
}

impl TextSize {
    pub fn points(self) -> u32 {
        match self {
            TextSize::Body => 24,
            TextSize::Title => 48,
            TextSize::Countdown => 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear(Color),
    Image {
        key: ImageKey,
        /// Top-left corner
        pos: Vec2,
        alpha: u8,
        scale: f32,
    },
    FillRect {
        rect: Rect,
        color: Color,
        alpha: u8,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f32,
    },
    Text {
        text: String,
        pos: Vec2,
        anchor: Anchor,
        size: TextSize,
        color: Color,
        alpha: u8,
    },
}

/// Rasteriser backend
pub trait RenderSink {
    fn begin_frame(&mut self);
    fn draw(&mut self, cmd: &DrawCmd, assets: &Assets);
    fn end_frame(&mut self, frame: u64) -> Result<(), RenderError>;
}

/// Draw one composed frame
pub fn submit(
    sink: &mut impl RenderSink,
    cmds: &[DrawCmd],
    assets: &Assets,
    frame: u64,
) -> Result<(), RenderError> {
    sink.begin_frame();
    for cmd in cmds {
        sink.draw(cmd, assets);
    }
    sink.end_frame(frame)
}
