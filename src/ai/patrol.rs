//! Straight-line patrol: walk along one axis, bounce off whatever blocks it.

use super::{Agent, Move, PlanContext};
use crate::components::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Forward is toward increasing coordinates.
    pub fn forward(self) -> Direction {
        match self {
            Axis::Horizontal => Direction::Right,
            Axis::Vertical => Direction::Down,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patrol {
    axis: Axis,
    heading: Direction,
}

impl Patrol {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            heading: axis.forward(),
        }
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn is_reversed(&self) -> bool {
        self.heading != self.axis.forward()
    }

    /// Step along the heading; if blocked, reverse once and try again.
    pub fn plan(&mut self, agent: &Agent, ctx: &PlanContext<'_>) -> Move {
        let traversal = ctx.traversal(agent);
        let ahead = agent.pos.step(self.heading);
        if traversal.allows(ctx.map, ahead) {
            return Move {
                to: ahead,
                facing: self.heading,
            };
        }

        self.heading = self.heading.opposite();
        let behind = agent.pos.step(self.heading);
        let to = if traversal.allows(ctx.map, behind) {
            behind
        } else {
            agent.pos
        };
        Move {
            to,
            facing: self.heading,
        }
    }
}
