//! Left-hand wall following.
//!
//! The only state is the agent's facing. Each turn looks at the 3x3 block
//! around the agent and picks, in priority order: turn left into an opening,
//! keep going, turn right, turn around. The grid edge counts as wall.

use super::{Agent, Move, PlanContext};
use crate::components::{Direction, GridPosition};
use crate::nav::grid::GridMap;
use crate::nav::neighbors::{behind_left, is_clear_of_walls};
use crate::nav::traversal::Traversal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallFollow;

impl WallFollow {
    pub fn plan(&self, agent: &Agent, ctx: &PlanContext<'_>) -> Move {
        let traversal = ctx.traversal(agent);
        let map = ctx.map;
        let ahead = agent.pos.step(agent.facing);

        // Nothing to hug: keep walking until a wall shows up.
        if is_clear_of_walls(map, &traversal, agent.pos) {
            return Move {
                to: ahead,
                facing: agent.facing,
            };
        }

        let facing = next_facing(map, &traversal, agent.pos, agent.facing);
        Move::step_or_turn(agent, ctx, facing)
    }
}

fn next_facing(
    map: &GridMap,
    traversal: &Traversal<'_>,
    pos: GridPosition,
    facing: Direction,
) -> Direction {
    if opening_left(map, traversal, pos, facing) {
        return facing.turn_left();
    }

    let ahead = pos.step(facing);
    if traversal.allows(map, ahead) && !is_clear_of_walls(map, traversal, ahead) {
        return facing;
    }

    let right = pos.step(facing.turn_right());
    if traversal.allows(map, right) && !is_clear_of_walls(map, traversal, right) {
        facing.turn_right()
    } else {
        facing.opposite()
    }
}

/// The wall we were following ended: the cell to the left is free while the
/// one behind it is not.
fn opening_left(map: &GridMap, traversal: &Traversal<'_>, pos: GridPosition, facing: Direction) -> bool {
    traversal.allows(map, pos.step(facing.turn_left()))
        && !traversal.allows(map, behind_left(pos, facing))
}
