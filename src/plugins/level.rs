//! Level lifecycle and the turn pipeline: spawning actors from the layout,
//! queueing tick requests, running exactly one tick per frame, and restarts.

use std::collections::VecDeque;

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::ai::Behavior;
use crate::app_state::LevelState;
use crate::components::*;
use crate::events::{RestartRequested, TickRequested};
use crate::nav::traversal::Tier;
use crate::plugins::enemies::PursuitTrail;
use crate::resources::{Level, LevelStats, NavConfig, NavRng, TickCount};

/// Stages of one tick, always run in this order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickSet {
    Input,
    Player,
    Enemies,
    Outcome,
}

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<LevelState>();
        app.add_message::<TickRequested>();
        app.add_message::<RestartRequested>();
        app.init_resource::<NavConfig>();
        app.init_resource::<TickCount>();
        app.init_resource::<TickQueue>();
        app.init_resource::<CurrentTick>();
        app.init_resource::<LevelStats>();

        app.configure_sets(
            Update,
            (
                TickSet::Input,
                TickSet::Player,
                TickSet::Enemies,
                TickSet::Outcome,
            )
                .chain(),
        );
        app.configure_sets(
            Update,
            (TickSet::Player, TickSet::Enemies, TickSet::Outcome)
                .run_if(in_state(LevelState::Playing).and(tick_in_progress)),
        );

        app.add_systems(Startup, spawn_level);
        app.add_systems(
            Update,
            (
                queue_tick_requests,
                begin_tick.run_if(in_state(LevelState::Playing)),
            )
                .chain()
                .in_set(TickSet::Input),
        );
        app.add_systems(
            Update,
            end_tick.in_set(TickSet::Outcome).after(crate::plugins::enemies::detect_outcome),
        );
        app.add_systems(Update, restart_level.after(TickSet::Outcome));
    }
}

/// Marks everything spawned from the layout, so a restart can clear it.
#[derive(Component, Debug)]
pub struct LevelEntity;

/// Requested ticks not yet run.
#[derive(Resource, Debug, Default)]
pub struct TickQueue(pub VecDeque<TickRequested>);

/// The tick being resolved this frame, if any.
#[derive(Resource, Debug, Default)]
pub struct CurrentTick(pub Option<TickRequested>);

pub fn tick_in_progress(current: Res<CurrentTick>) -> bool {
    current.0.is_some()
}

/// Spawn the player and enemies described by the loaded `Level`.
#[span_fn]
pub fn spawn_level(
    mut commands: Commands,
    level: Res<Level>,
    config: Res<NavConfig>,
    rng: Option<Res<NavRng>>,
) {
    if rng.is_none() {
        commands.insert_resource(NavRng::from_config(&config));
    }
    spawn_actors(&mut commands, &level, &config);
    info!(
        "level loaded ({}x{}, {} enemies)",
        level.map.width(),
        level.map.height(),
        level.layout().enemy_spawns.len()
    );
}

fn spawn_actors(commands: &mut Commands, level: &Level, config: &NavConfig) {
    let layout = level.layout();
    let pos = layout.player_spawn;
    commands.spawn((
        Player,
        pos,
        PreviousGridPosition(pos),
        Facing(Direction::Down),
        Clearance(Tier::DEADLY),
        Inventory::default(),
        LevelEntity,
    ));

    for (order, spawn) in layout.enemy_spawns.iter().enumerate() {
        let behavior = Behavior::for_kind(spawn.kind, &level.map, config);
        let facing = behavior.initial_facing();
        let mut entity = commands.spawn((
            Enemy,
            spawn.kind,
            spawn.pos,
            PreviousGridPosition(spawn.pos),
            SpawnOrder(order),
            Facing(facing),
            Clearance(config.enemy_clearance),
            behavior,
            LevelEntity,
        ));
        if spawn.kind == EnemyKind::Pursuer {
            entity.insert(PursuitTrail::default());
        }
    }
}

/// Move requests into the queue. Requests arriving after the level ended are
/// dropped.
fn queue_tick_requests(
    mut reader: MessageReader<TickRequested>,
    mut queue: ResMut<TickQueue>,
    state: Res<State<LevelState>>,
) {
    for request in reader.read() {
        if *state.get() == LevelState::Playing {
            queue.0.push_back(*request);
        } else {
            debug!("dropping {:?}, level is {:?}", request, state.get());
        }
    }
}

fn begin_tick(
    mut queue: ResMut<TickQueue>,
    mut current: ResMut<CurrentTick>,
    mut count: ResMut<TickCount>,
) {
    if let Some(request) = queue.0.pop_front() {
        count.0 += 1;
        current.0 = Some(request);
    }
}

fn end_tick(mut current: ResMut<CurrentTick>) {
    current.0 = None;
}

/// Put the map, hazards and actors back to how the layout describes them.
#[allow(clippy::too_many_arguments)]
fn restart_level(
    mut reader: MessageReader<RestartRequested>,
    mut commands: Commands,
    mut level: ResMut<Level>,
    config: Res<NavConfig>,
    actors: Query<Entity, With<LevelEntity>>,
    mut count: ResMut<TickCount>,
    mut queue: ResMut<TickQueue>,
    mut next_state: ResMut<NextState<LevelState>>,
) {
    if reader.read().count() == 0 {
        return;
    }
    span_scope!("restart_level");

    for entity in &actors {
        commands.entity(entity).despawn();
    }
    level.reset();
    spawn_actors(&mut commands, &level, &config);
    count.0 = 0;
    queue.0.clear();
    next_state.set(LevelState::Playing);
    info!("level restarted");
}
