//! Enemy movement policies. Each enemy carries one `Behavior` and the level
//! driver asks it for a `Move` once per tick.

pub mod direct_chase;
pub mod patrol;
pub mod pursuit;
pub mod wall_follow;

use bevy::prelude::*;
use rand::Rng;

use crate::components::{Clearance, Direction, EnemyKind, GridPosition};
use crate::nav::grid::GridMap;
use crate::nav::search::Path;
use crate::nav::traversal::{Traversal, TraversalRules};
use crate::resources::NavConfig;

pub use direct_chase::DirectChase;
pub use patrol::{Axis, Patrol};
pub use pursuit::Pursuit;
pub use wall_follow::WallFollow;

/// The agent being planned for, as of the start of its turn.
#[derive(Debug, Clone, Copy)]
pub struct Agent {
    pub pos: GridPosition,
    pub facing: Direction,
    pub clearance: Clearance,
}

/// Read-only view of the level an agent plans against.
#[derive(Clone, Copy)]
pub struct PlanContext<'a> {
    pub map: &'a GridMap,
    pub rules: &'a TraversalRules,
    /// Where the player stands right now.
    pub target: GridPosition,
}

impl<'a> PlanContext<'a> {
    pub fn traversal(&self, agent: &Agent) -> Traversal<'a> {
        Traversal::new(self.rules, agent.clearance)
    }
}

/// Where an agent ends its turn and which way it faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub to: GridPosition,
    pub facing: Direction,
}

impl Move {
    pub fn stay(agent: &Agent) -> Self {
        Self {
            to: agent.pos,
            facing: agent.facing,
        }
    }

    /// Step in `dir` when the agent may enter that cell; otherwise turn in place.
    pub fn step_or_turn(agent: &Agent, ctx: &PlanContext<'_>, dir: Direction) -> Self {
        let to = agent.pos.step(dir);
        if ctx.traversal(agent).allows(ctx.map, to) {
            Self { to, facing: dir }
        } else {
            Self {
                to: agent.pos,
                facing: dir,
            }
        }
    }
}

/// Closed set of movement policies, one per enemy.
#[derive(Component)]
pub enum Behavior {
    Patrol(Patrol),
    WallFollow(WallFollow),
    DirectChase(DirectChase),
    Pursuit(Pursuit),
}

impl Behavior {
    /// The policy an enemy of `kind` uses on `map`.
    pub fn for_kind(kind: EnemyKind, map: &GridMap, config: &NavConfig) -> Self {
        match kind {
            EnemyKind::HorizontalPatrol => Behavior::Patrol(Patrol::new(Axis::Horizontal)),
            EnemyKind::VerticalPatrol => Behavior::Patrol(Patrol::new(Axis::Vertical)),
            EnemyKind::WallFollower => Behavior::WallFollow(WallFollow),
            EnemyKind::DirectChaser => Behavior::DirectChase(DirectChase),
            EnemyKind::Pursuer => Behavior::Pursuit(Pursuit::new(map, config)),
        }
    }

    /// Facing an enemy of this behavior starts the level with.
    pub fn initial_facing(&self) -> Direction {
        match self {
            Behavior::Patrol(patrol) => patrol.heading(),
            _ => Direction::Up,
        }
    }

    pub fn plan(&mut self, agent: Agent, ctx: &PlanContext<'_>, rng: &mut impl Rng) -> Move {
        match self {
            Behavior::Patrol(patrol) => patrol.plan(&agent, ctx),
            Behavior::WallFollow(follower) => follower.plan(&agent, ctx),
            Behavior::DirectChase(chaser) => chaser.plan(&agent, ctx),
            Behavior::Pursuit(pursuer) => pursuer.plan(&agent, ctx, rng),
        }
    }

    /// The route computed on the last turn, for pursuers.
    pub fn last_path(&self) -> Option<&Path> {
        match self {
            Behavior::Pursuit(pursuer) => pursuer.last_path(),
            _ => None,
        }
    }
}
