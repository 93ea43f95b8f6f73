//! Enemy turns in spawn order, then capture and goal detection.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::ai::{Agent, Behavior, PlanContext};
use crate::app_state::LevelState;
use crate::components::*;
use crate::events::{LevelCompleted, PlayerCaught};
use crate::nav::grid::TileKind;
use crate::nav::search::Path;
use crate::nav::traversal::Tier;
use crate::plugins::level::TickSet;
use crate::resources::{Level, NavRng, TickCount};

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_enemies.in_set(TickSet::Enemies));
        app.add_systems(Update, detect_outcome.in_set(TickSet::Outcome));
    }
}

/// The route a pursuer planned on its last turn.
#[derive(Component, Debug, Default)]
pub struct PursuitTrail(pub Option<Path>);

/// Run every enemy's behavior once, lowest `SpawnOrder` first, against the
/// map as the player left it this tick.
#[allow(clippy::type_complexity)]
pub fn update_enemies(
    level: Res<Level>,
    mut rng: ResMut<NavRng>,
    player_query: Query<&GridPosition, With<Player>>,
    mut enemy_query: Query<
        (
            Entity,
            &SpawnOrder,
            &mut GridPosition,
            &mut PreviousGridPosition,
            &mut Facing,
            &Clearance,
            &mut Behavior,
            Option<&mut PursuitTrail>,
        ),
        (With<Enemy>, Without<Player>),
    >,
) {
    span_scope!("update_enemies");
    let Ok(target) = player_query.single().copied() else {
        return;
    };
    let ctx = PlanContext {
        map: &level.map,
        rules: &level.rules,
        target,
    };

    let mut turn_order: Vec<(SpawnOrder, Entity)> = enemy_query
        .iter()
        .map(|(entity, order, ..)| (*order, entity))
        .collect();
    turn_order.sort();

    for (_, entity) in turn_order {
        let Ok((_, _, mut pos, mut prev, mut facing, clearance, mut behavior, trail)) =
            enemy_query.get_mut(entity)
        else {
            continue;
        };
        prev.0 = *pos;
        let agent = Agent {
            pos: *pos,
            facing: facing.0,
            clearance: *clearance,
        };
        let mv = behavior.plan(agent, &ctx, &mut rng.0);
        *pos = mv.to;
        facing.0 = mv.facing;
        if let Some(mut trail) = trail {
            trail.0 = behavior.last_path().cloned();
        }
    }
}

/// Decide whether this tick ended the level.
///
/// Reaching the goal wins over everything else. Otherwise the player is caught
/// standing on a deadly tile, sharing a tile with an enemy, or having swapped
/// tiles with one.
pub fn detect_outcome(
    mut commands: Commands,
    level: Res<Level>,
    ticks: Res<TickCount>,
    player_query: Query<(&GridPosition, &PreviousGridPosition), With<Player>>,
    enemy_query: Query<(Entity, &GridPosition, &PreviousGridPosition), (With<Enemy>, Without<Player>)>,
    mut next_state: ResMut<NextState<LevelState>>,
) {
    let Ok((player_pos, player_prev)) = player_query.single() else {
        return;
    };
    let kind = level.map.tile(*player_pos).kind;

    if kind == TileKind::Goal {
        info!("level completed in {} ticks", ticks.0);
        commands.trigger(LevelCompleted { ticks: ticks.0 });
        next_state.set(LevelState::Completed);
        return;
    }

    if level.rules.tier_of(kind) == Tier::DEADLY {
        commands.trigger(PlayerCaught {
            at: *player_pos,
            by: None,
        });
        next_state.set(LevelState::Caught);
        return;
    }

    for (entity, enemy_pos, enemy_prev) in &enemy_query {
        let same_tile = player_pos == enemy_pos;
        let swapped = player_prev.0 == *enemy_pos && enemy_prev.0 == *player_pos;
        if same_tile || swapped {
            commands.trigger(PlayerCaught {
                at: *player_pos,
                by: Some(entity),
            });
            next_state.set(LevelState::Caught);
            return;
        }
    }
}
