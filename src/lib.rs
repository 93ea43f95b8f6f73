pub mod ai;
pub mod app_state;
pub mod components;
pub mod events;
pub mod nav;
pub mod plugins;
pub mod resources;
pub mod tracing_bridge;

use bevy::prelude::*;

use plugins::enemies::EnemyPlugin;
use plugins::level::LevelPlugin;
use plugins::player::PlayerPlugin;
use plugins::telemetry::TelemetryPlugin;

/// Turn-based level driver. Needs `StatesPlugin` (or `DefaultPlugins`) and a
/// `Level` resource inserted before the first update.
pub struct TilechasePlugin;

impl Plugin for TilechasePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(LevelPlugin);
        app.add_plugins(PlayerPlugin);
        app.add_plugins(EnemyPlugin);
        app.add_plugins(TelemetryPlugin);
    }
}
