use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::tasks::{ComputeTaskPool, TaskPoolBuilder};
use clap::Parser;
use micromegas_telemetry_sink::TelemetryGuardBuilder;
use micromegas_telemetry_sink::tracing_interop::TracingCaptureLayer;
use micromegas_tracing::dispatch::{flush_thread_buffer, init_thread_stream, unregister_thread_stream};
use micromegas_tracing::levels::LevelFilter;
use micromegas_tracing::prelude::info;
use tilechase::TilechasePlugin;
use tilechase::app_state::LevelState;
use tilechase::components::Direction;
use tilechase::events::TickRequested;
use tilechase::nav::grid::LevelLayout;
use tilechase::plugins::level::{CurrentTick, TickQueue};
use tilechase::resources::{Level, LevelStats, NavConfig, TickCount};
use tilechase::tracing_bridge::SpanBridgeLayer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

/// Replay a scripted sequence of player moves on an ASCII level.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Level layout file.
    #[arg(default_value = "assets/levels/demo.txt")]
    level: PathBuf,
    /// Moves to replay: U, R, D, L, or '.' to wait a turn.
    #[arg(short, long, default_value = "")]
    moves: String,
    /// Navigation config (JSON).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overrides the config's RNG seed.
    #[arg(short, long)]
    seed: Option<u64>,
}

fn parse_moves(script: &str) -> Result<Vec<TickRequested>> {
    script
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| {
            let dir = match c.to_ascii_uppercase() {
                'U' => Some(Direction::Up),
                'R' => Some(Direction::Right),
                'D' => Some(Direction::Down),
                'L' => Some(Direction::Left),
                '.' => None,
                other => bail!("unknown move {other:?}, expected U, R, D, L or '.'"),
            };
            Ok(TickRequested(dir))
        })
        .collect()
}

/// Scripted moves written on the first frame.
#[derive(Resource)]
struct Script(Vec<TickRequested>);

fn play_script(script: Res<Script>, mut writer: MessageWriter<TickRequested>) {
    writer.write_batch(script.0.iter().copied());
}

fn exit_when_done(
    state: Res<State<LevelState>>,
    queue: Res<TickQueue>,
    current: Res<CurrentTick>,
    ticks: Res<TickCount>,
    stats: Res<LevelStats>,
    mut idle_frames: Local<u32>,
    mut exit: MessageWriter<AppExit>,
) {
    // A state change requested this frame only lands on the next one.
    if queue.0.is_empty() && current.0.is_none() {
        *idle_frames += 1;
    } else {
        *idle_frames = 0;
    }
    let finished = *state.get() != LevelState::Playing;
    if finished || *idle_frames > 1 {
        info!(
            "replay finished: state={:?} ticks={} items={} doors={}",
            state.get(),
            ticks.0,
            stats.items_collected,
            stats.doors_opened
        );
        println!("{:?} after {} ticks", state.get(), ticks.0);
        exit.write(AppExit::Success);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let _telemetry_guard = TelemetryGuardBuilder::default()
        .with_install_tracing_capture(false)
        .build()
        .map_err(|e| anyhow!("failed to initialize telemetry: {e}"))?;

    let subscriber = Registry::default()
        .with(SpanBridgeLayer::default())
        .with(TracingCaptureLayer {
            max_level: LevelFilter::Info,
        });
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let text = std::fs::read_to_string(&args.level)
        .with_context(|| format!("reading level {}", args.level.display()))?;
    let layout = LevelLayout::parse(&text)
        .with_context(|| format!("parsing level {}", args.level.display()))?;

    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            NavConfig::from_json_str(&json)?
        }
        None => NavConfig::default(),
    };
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    let script = parse_moves(&args.moves)?;
    info!(
        "replaying {} moves on {}",
        script.len(),
        args.level.display()
    );

    ComputeTaskPool::get_or_init(|| {
        TaskPoolBuilder::new()
            .on_thread_spawn(|| {
                init_thread_stream();
            })
            .on_thread_destroy(|| {
                flush_thread_buffer();
                unregister_thread_stream();
            })
            .build()
    });

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .add_plugins(StatesPlugin)
        .insert_resource(Level::new(layout))
        .insert_resource(config)
        .insert_resource(Script(script))
        .add_plugins(TilechasePlugin)
        .add_systems(Startup, play_script)
        .add_systems(Last, exit_when_done)
        .run();

    Ok(())
}
