//! HUD widgets: progress bars, level number, timer and overlays

use glam::Vec2;

use super::{Anchor, Color, DrawCmd, Rect, TextSize};
use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub const BAR_WIDTH: f32 = 400.0;
pub const BAR_HEIGHT: f32 = 20.0;
pub const BAR_X: f32 = ((SCREEN_WIDTH - 400) / 2) as f32;
/// Vertical distance between stacked bars
pub const BAR_SPACING: f32 = 60.0;

const BAR_TRACK: Color = Color::rgb(70, 70, 70);
const SUN_FILL: Color = Color::rgb(255, 200, 0);
const RAIN_FILL: Color = Color::rgb(50, 150, 255);
const DAMAGE_TRACK: Color = Color::rgb(200, 50, 50);
const DAMAGE_FILL: Color = Color::rgb(120, 120, 120);
const COUNTDOWN_SHADE: Color = Color::rgb(128, 128, 128);
const SOUR_TINT: Color = Color::rgb(140, 160, 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    Sun,
    Rain,
    /// Fills from the right as protection runs out
    Damage,
}

impl BarKind {
    fn label(self) -> &'static str {
        match self {
            BarKind::Sun => "sun",
            BarKind::Rain => "rain",
            BarKind::Damage => "damage",
        }
    }
}

pub fn bar_y(offset: u32) -> f32 {
    (SCREEN_HEIGHT - 150) as f32 + offset as f32 * BAR_SPACING
}

fn body_text(text: String, pos: Vec2, anchor: Anchor, alpha: u8) -> DrawCmd {
    DrawCmd::Text {
        text,
        pos,
        anchor,
        size: TextSize::Body,
        color: Color::WHITE,
        alpha,
    }
}

/// One labelled bar; `offset` stacks it below the first
pub fn progress_bar(kind: BarKind, current: f32, required: f32, offset: u32) -> Vec<DrawCmd> {
    let mut cmds = Vec::with_capacity(5);
    let y = bar_y(offset);
    let track = Rect::new(BAR_X, y, BAR_WIDTH, BAR_HEIGHT);
    let ratio = if required > 0.0 {
        (current / required).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let fill_w = (BAR_WIDTH * ratio).floor();

    let time = match kind {
        BarKind::Damage => {
            cmds.push(DrawCmd::FillRect {
                rect: track,
                color: DAMAGE_TRACK,
                alpha: 255,
            });
            if fill_w > 0.0 {
                cmds.push(DrawCmd::FillRect {
                    rect: Rect::new(BAR_X + BAR_WIDTH - fill_w, y, fill_w, BAR_HEIGHT),
                    color: DAMAGE_FILL,
                    alpha: 255,
                });
            }
            format!("{:.1}s / {:.0}s", required - current, required)
        }
        BarKind::Sun | BarKind::Rain => {
            let fill = if kind == BarKind::Sun { SUN_FILL } else { RAIN_FILL };
            cmds.push(DrawCmd::FillRect {
                rect: track,
                color: BAR_TRACK,
                alpha: 255,
            });
            cmds.push(DrawCmd::FillRect {
                rect: Rect::new(BAR_X, y, fill_w, BAR_HEIGHT),
                color: fill,
                alpha: 255,
            });
            format!("{:.1}s / {:.0}s", current, required)
        }
    };

    cmds.push(DrawCmd::StrokeRect {
        rect: track,
        color: Color::WHITE,
        width: 2.0,
    });
    let mid = y + BAR_HEIGHT / 2.0;
    cmds.push(body_text(
        kind.label().to_string(),
        Vec2::new(BAR_X - 10.0, mid),
        Anchor::MidRight,
        255,
    ));
    cmds.push(body_text(
        time,
        Vec2::new(BAR_X + BAR_WIDTH + 10.0, mid),
        Anchor::MidLeft,
        255,
    ));
    cmds
}

pub fn level_number(level: u8, alpha: u8) -> DrawCmd {
    body_text(
        format!("Level {}", level),
        Vec2::new(20.0, 20.0),
        Anchor::TopLeft,
        alpha,
    )
}

pub fn game_timer(time_left: f32, alpha: u8) -> DrawCmd {
    body_text(
        format!("Time: {:.1}s", time_left),
        Vec2::new((SCREEN_WIDTH - 20) as f32, 20.0),
        Anchor::TopRight,
        alpha,
    )
}

/// Centred near the top of the screen
pub fn top_text(text: &str, alpha: u8) -> DrawCmd {
    body_text(
        text.to_string(),
        Vec2::new((SCREEN_WIDTH / 2) as f32, 50.0),
        Anchor::Center,
        alpha,
    )
}

/// Centred near the bottom of the screen
pub fn prompt_text(text: &str, alpha: u8) -> DrawCmd {
    body_text(
        text.to_string(),
        Vec2::new((SCREEN_WIDTH / 2) as f32, (SCREEN_HEIGHT - 30) as f32),
        Anchor::Center,
        alpha,
    )
}

fn full_screen() -> Rect {
    Rect::new(0.0, 0.0, SCREEN_WIDTH as f32, SCREEN_HEIGHT as f32)
}

/// Grey shade plus the big digit; `elapsed_ms` since the countdown began
pub fn countdown_overlay(elapsed_ms: u32) -> Vec<DrawCmd> {
    let mut cmds = vec![DrawCmd::FillRect {
        rect: full_screen(),
        color: COUNTDOWN_SHADE,
        alpha: 150,
    }];
    let remaining = 3 - (elapsed_ms / 1000) as i32;
    if remaining > 0 {
        cmds.push(DrawCmd::Text {
            text: remaining.to_string(),
            pos: Vec2::new((SCREEN_WIDTH / 2) as f32, (SCREEN_HEIGHT / 2) as f32),
            anchor: Anchor::Center,
            size: TextSize::Countdown,
            color: Color::WHITE,
            alpha: 255,
        });
    }
    cmds
}

/// Yellow-green wash shown during sour rain
pub fn sour_overlay() -> DrawCmd {
    DrawCmd::FillRect {
        rect: full_screen(),
        color: SOUR_TINT,
        alpha: 100,
    }
}

/// Full-screen black at `alpha`
pub fn fade_overlay(alpha: u8) -> DrawCmd {
    DrawCmd::FillRect {
        rect: full_screen(),
        color: Color::BLACK,
        alpha,
    }
}
