//! Player move resolution: doors, teleporters, pickups and hazard immunity.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::components::*;
use crate::events::{Collected, DoorOpened, HazardNeutralized, Teleported};
use crate::nav::grid::{HazardKind, ItemKind, TileKind};
use crate::nav::traversal::Traversal;
use crate::plugins::level::{CurrentTick, TickSet};
use crate::resources::Level;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, resolve_player.in_set(TickSet::Player));
    }
}

/// Side effects of a single player step, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEffect {
    Teleported { from: GridPosition, to: GridPosition },
    DoorOpened(GridPosition),
    Collected(Collected),
    Neutralized(HazardKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub to: GridPosition,
    pub effects: Vec<StepEffect>,
}

/// Resolve one step of the player from `from` in `dir`, writing door and
/// pickup changes into `level` so enemies moving later this tick see them.
pub fn resolve_step(
    level: &mut Level,
    inventory: &mut Inventory,
    clearance: Clearance,
    from: GridPosition,
    dir: Direction,
) -> StepResult {
    let mut effects = Vec::new();
    let mut dest = from.step(dir);
    let mut teleport = None;

    match level.map.get(dest).map(|tile| tile.kind) {
        Some(TileKind::Teleporter { link }) => {
            let exit = link.step(dir);
            teleport = Some((dest, exit));
            dest = exit;
        }
        Some(TileKind::Door(colour)) => {
            if inventory.take_key(colour) {
                level.map.set_kind(dest, TileKind::Floor);
                effects.push(StepEffect::DoorOpened(dest));
            }
        }
        Some(TileKind::TokenDoor { tokens }) => {
            if inventory.tokens == tokens {
                level.map.set_kind(dest, TileKind::Floor);
                effects.push(StepEffect::DoorOpened(dest));
            }
        }
        _ => {}
    }

    let allowed = Traversal::new(&level.rules, clearance).allows(&level.map, dest);
    if !allowed {
        return StepResult { to: from, effects };
    }
    if let Some((from, to)) = teleport {
        effects.push(StepEffect::Teleported { from, to });
    }

    match level.map.tile(dest).kind {
        TileKind::Item(item) => {
            level.map.set_kind(dest, TileKind::Floor);
            effects.push(StepEffect::Collected(Collected::Item(item)));
            let hazard = match item {
                ItemKind::Flippers => {
                    inventory.has_flippers = true;
                    Some(HazardKind::Water)
                }
                ItemKind::IronBoots => {
                    inventory.has_iron_boots = true;
                    Some(HazardKind::Wind)
                }
                ItemKind::Token => {
                    inventory.tokens += 1;
                    None
                }
            };
            if let Some(hazard) = hazard
                && level.rules.neutralize(hazard)
            {
                effects.push(StepEffect::Neutralized(hazard));
            }
        }
        TileKind::Key(colour) => {
            level.map.set_kind(dest, TileKind::Floor);
            inventory.keys.push(colour);
            effects.push(StepEffect::Collected(Collected::Key(colour)));
        }
        _ => {}
    }

    StepResult { to: dest, effects }
}

/// Apply the tick's requested move to the player.
#[allow(clippy::type_complexity)]
fn resolve_player(
    mut commands: Commands,
    current: Res<CurrentTick>,
    mut level: ResMut<Level>,
    mut query: Query<
        (
            &mut GridPosition,
            &mut PreviousGridPosition,
            &mut Facing,
            &mut Inventory,
            &Clearance,
        ),
        With<Player>,
    >,
) {
    span_scope!("resolve_player");
    let Some(request) = current.0 else {
        return;
    };
    let Ok((mut pos, mut prev, mut facing, mut inventory, clearance)) = query.single_mut() else {
        return;
    };

    prev.0 = *pos;
    let Some(dir) = request.0 else {
        return;
    };
    facing.0 = dir;

    let result = resolve_step(&mut level, &mut inventory, *clearance, *pos, dir);
    *pos = result.to;
    for effect in result.effects {
        match effect {
            StepEffect::Teleported { from, to } => commands.trigger(Teleported { from, to }),
            StepEffect::DoorOpened(at) => commands.trigger(DoorOpened { at }),
            StepEffect::Collected(what) => commands.trigger(what),
            StepEffect::Neutralized(hazard) => commands.trigger(HazardNeutralized(hazard)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::grid::{KeyColour, LevelLayout};
    use crate::nav::traversal::Tier;

    const PLAYER: Clearance = Clearance(Tier::DEADLY);

    fn level(text: &str) -> Level {
        Level::new(LevelLayout::parse(text).unwrap())
    }

    #[test]
    fn walls_block_and_floor_moves() {
        let mut level = level("#P.");
        let mut inv = Inventory::default();
        let start = GridPosition::new(1, 0);

        let blocked = resolve_step(&mut level, &mut inv, PLAYER, start, Direction::Left);
        assert_eq!(blocked.to, start);
        let moved = resolve_step(&mut level, &mut inv, PLAYER, start, Direction::Right);
        assert_eq!(moved.to, GridPosition::new(2, 0));
        assert!(moved.effects.is_empty());
    }

    #[test]
    fn off_grid_step_is_blocked() {
        let mut level = level("P.");
        let mut inv = Inventory::default();
        let start = GridPosition::new(0, 0);
        let result = resolve_step(&mut level, &mut inv, PLAYER, start, Direction::Up);
        assert_eq!(result.to, start);
    }

    #[test]
    fn key_opens_matching_door_once() {
        let mut level = level("PrRR.");
        let mut inv = Inventory::default();

        let got_key = resolve_step(&mut level, &mut inv, PLAYER, GridPosition::new(0, 0), Direction::Right);
        assert_eq!(got_key.effects, vec![StepEffect::Collected(Collected::Key(KeyColour::Red))]);
        assert_eq!(inv.keys, vec![KeyColour::Red]);

        let opened = resolve_step(&mut level, &mut inv, PLAYER, got_key.to, Direction::Right);
        assert_eq!(opened.to, GridPosition::new(2, 0));
        assert_eq!(opened.effects, vec![StepEffect::DoorOpened(GridPosition::new(2, 0))]);
        assert!(inv.keys.is_empty());

        let stuck = resolve_step(&mut level, &mut inv, PLAYER, opened.to, Direction::Right);
        assert_eq!(stuck.to, opened.to);
        assert_eq!(level.map.tile(GridPosition::new(3, 0)).kind, TileKind::Door(KeyColour::Red));
    }

    #[test]
    fn token_door_needs_exact_count() {
        let mut level = level("P$$1.");
        let mut inv = Inventory::default();

        let first = resolve_step(&mut level, &mut inv, PLAYER, GridPosition::new(0, 0), Direction::Right);
        let second = resolve_step(&mut level, &mut inv, PLAYER, first.to, Direction::Right);
        assert_eq!(inv.tokens, 2);
        let blocked = resolve_step(&mut level, &mut inv, PLAYER, second.to, Direction::Right);
        assert_eq!(blocked.to, second.to);

        inv.tokens = 1;
        let opened = resolve_step(&mut level, &mut inv, PLAYER, second.to, Direction::Right);
        assert_eq!(opened.to, GridPosition::new(3, 0));
        assert_eq!(inv.tokens, 1);
    }

    #[test]
    fn teleporter_exits_beyond_its_partner() {
        let mut level = level("PT#T.");
        let mut inv = Inventory::default();
        let result = resolve_step(&mut level, &mut inv, PLAYER, GridPosition::new(0, 0), Direction::Right);
        assert_eq!(result.to, GridPosition::new(4, 0));
        assert_eq!(
            result.effects,
            vec![StepEffect::Teleported {
                from: GridPosition::new(1, 0),
                to: GridPosition::new(4, 0),
            }]
        );
    }

    #[test]
    fn teleporter_into_a_wall_goes_nowhere() {
        let mut level = level("PT.T#");
        let mut inv = Inventory::default();
        let start = GridPosition::new(0, 0);
        let result = resolve_step(&mut level, &mut inv, PLAYER, start, Direction::Right);
        assert_eq!(result.to, start);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn flippers_neutralize_water_for_everyone() {
        let mut level = level("Pf~\n.~.");
        let mut inv = Inventory::default();
        let result = resolve_step(&mut level, &mut inv, PLAYER, GridPosition::new(0, 0), Direction::Right);
        assert!(inv.has_flippers);
        assert_eq!(
            result.effects,
            vec![
                StepEffect::Collected(Collected::Item(ItemKind::Flippers)),
                StepEffect::Neutralized(HazardKind::Water),
            ]
        );
        assert_eq!(level.map.tile(GridPosition::new(1, 0)).kind, TileKind::Floor);
        assert!(level.rules.is_neutralized(HazardKind::Water));
        assert!(!level.rules.is_neutralized(HazardKind::Wind));
    }
}
