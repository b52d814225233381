//! Flower Keeper headless driver
//!
//! Runs the frame loop without a window: the autopilot plays, audio goes to a
//! logging sink and the canvas optionally dumps PNG snapshots.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;

use flower_keeper::assets::FsAssets;
use flower_keeper::audio::{AudioDirector, LogAudio};
use flower_keeper::consts::SCREEN_WIDTH;
use flower_keeper::platform::{Autopilot, InputSource};
use flower_keeper::renderer::{Canvas, compose, submit};
use flower_keeper::sim::{GameState, tick};
use flower_keeper::{Assets, Settings};

#[derive(Parser)]
#[command(name = "flower-keeper")]
#[command(about = "Play Flower Keeper headless with the autopilot")]
struct Args {
    /// JSON settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Run seed (overrides the settings file)
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many frames
    #[arg(long, default_value_t = 200_000)]
    frames: u64,

    /// Numeric step id to start from (e.g. 12 or 19)
    #[arg(long)]
    start: Option<f32>,

    /// Write a canvas snapshot every N frames
    #[arg(long)]
    snapshots: Option<u64>,

    /// Trace-level logging
    #[arg(long)]
    trace: bool,
}

fn init_logging(trace: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if trace {
        builder.filter_level(log::LevelFilter::Trace);
    }
    builder.init();
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.trace);
    log::info!("Flower Keeper (headless) starting...");

    let mut settings = Settings::load_or_default(args.settings.as_deref());
    if let Some(every) = args.snapshots {
        settings.snapshot_every = every;
    }
    let seed = args.seed.or(settings.seed).unwrap_or_else(time_seed);
    let frame_ms = settings.effective_frame_ms();

    let assets = Assets::load(&FsAssets::new(&settings.asset_root));

    let mut state = GameState::new(seed, SCREEN_WIDTH / 2);
    log::info!("Game initialized with seed: {}", seed);
    if let Some(id) = args.start {
        if let Err(e) = state.jump_to(id) {
            if cfg!(debug_assertions) {
                panic!("--start {}: {}", id, e);
            }
            log::error!("Ignoring --start {}: {}", id, e);
        }
    }
    // Startup jumps are not part of the played audio
    let _ = state.take_events();

    let mut director = AudioDirector::from_settings(LogAudio::default(), &settings);
    let mut canvas = if settings.snapshots_enabled() {
        Canvas::new().with_snapshots(&settings.snapshot_dir, settings.snapshot_every)
    } else {
        Canvas::new()
    };
    let mut pilot = Autopilot::default();

    while state.running && state.frame < args.frames {
        let mut input = pilot.next_input(&state, frame_ms);
        if !settings.debug_shortcuts {
            input.debug_key = None;
        }
        let events = tick(&mut state, &input);
        director.handle_all(&events);

        if settings.snapshots_enabled() {
            let cmds = compose(&state, &assets);
            submit(&mut canvas, &cmds, &assets, state.frame)
                .with_context(|| format!("rendering frame {}", state.frame))?;
        }
    }

    if state.running {
        log::warn!("Frame limit {} reached", args.frames);
    }
    log::info!(
        "Finished after {} frames ({:.1}s simulated) at step {} ({})",
        state.frame,
        state.clock_ms as f64 / 1000.0,
        state.step.id(),
        state.step.label()
    );
    log::info!(
        "Attempts per level: {:?}, sounds played: {}, snapshots: {}",
        state.attempts,
        director.sink().played(),
        canvas.written()
    );
    Ok(())
}
