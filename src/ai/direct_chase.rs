//! Direct chase: head straight for the player along the longer axis,
//! ignoring anything in the way.

use super::{Agent, Move, PlanContext};
use crate::components::{Direction, GridPosition};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectChase;

impl DirectChase {
    pub fn plan(&self, agent: &Agent, ctx: &PlanContext<'_>) -> Move {
        Move::step_or_turn(agent, ctx, chase_direction(agent.pos, ctx.target))
    }
}

/// The axis with the larger gap wins; equal gaps go horizontal.
pub fn chase_direction(from: GridPosition, to: GridPosition) -> Direction {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() >= dy.abs() {
        if dx < 0 { Direction::Left } else { Direction::Right }
    } else if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    }
}
