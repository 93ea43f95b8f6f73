//! Tick-level telemetry and level stats, fed by gameplay events.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::events::{Collected, DoorOpened, HazardNeutralized, LevelCompleted, PlayerCaught, Teleported};
use crate::resources::{LevelStats, TickCount};

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Last, frame_telemetry);
        app.add_observer(on_player_caught);
        app.add_observer(on_level_completed);
        app.add_observer(on_hazard_neutralized);
        app.add_observer(on_collected);
        app.add_observer(on_door_opened);
        app.add_observer(on_teleported);
    }
}

fn frame_telemetry(time: Res<Time>, ticks: Res<TickCount>) {
    span_scope!("frame");
    let dt_ms = time.delta_secs_f64() * 1000.0;
    fmetric!("frame_time_ms", "ms", dt_ms);
    if ticks.is_changed() {
        imetric!("tick", "count", ticks.0);
    }
}

fn on_player_caught(trigger: On<PlayerCaught>, mut stats: ResMut<LevelStats>) {
    let event = trigger.event();
    stats.captures += 1;
    match event.by {
        Some(enemy) => info!("player_caught: at={:?} by={:?}", event.at, enemy),
        None => info!("player_caught: at={:?} by=hazard", event.at),
    }
    imetric!("captures", "count", stats.captures as u64);
}

fn on_level_completed(trigger: On<LevelCompleted>) {
    imetric!("level_ticks", "count", trigger.event().ticks);
}

fn on_hazard_neutralized(trigger: On<HazardNeutralized>) {
    info!("hazard_neutralized: {:?}", trigger.event().0);
}

fn on_collected(trigger: On<Collected>, mut stats: ResMut<LevelStats>) {
    stats.items_collected += 1;
    debug!("collected: {:?}", trigger.event());
}

fn on_door_opened(trigger: On<DoorOpened>, mut stats: ResMut<LevelStats>) {
    stats.doors_opened += 1;
    debug!("door_opened: at={:?}", trigger.event().at);
}

fn on_teleported(trigger: On<Teleported>, mut stats: ResMut<LevelStats>) {
    stats.teleports += 1;
    let event = trigger.event();
    debug!("teleported: {:?} -> {:?}", event.from, event.to);
}
