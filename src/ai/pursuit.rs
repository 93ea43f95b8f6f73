//! Search-based pursuit: replan a full route to the player every turn and take
//! its first step.

use micromegas_tracing::prelude::*;
use rand::Rng;

use super::{Agent, Move, PlanContext};
use crate::components::Direction;
use crate::nav::grid::GridMap;
use crate::nav::search::{Path, SearchEngine};
use crate::resources::NavConfig;

pub struct Pursuit {
    engine: SearchEngine,
    last_path: Option<Path>,
}

impl Pursuit {
    pub fn new(map: &GridMap, config: &NavConfig) -> Self {
        Self {
            engine: SearchEngine::for_map(map)
                .with_heuristic_weight(config.heuristic_weight)
                .with_fallback_attempts(config.fallback_attempts),
            last_path: None,
        }
    }

    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_ref()
    }

    pub fn plan(&mut self, agent: &Agent, ctx: &PlanContext<'_>, rng: &mut impl Rng) -> Move {
        let traversal = ctx.traversal(agent);
        let path = self
            .engine
            .find_path(agent.pos, ctx.target, ctx.map, &traversal, rng);

        let mv = match path.next_step() {
            Some(next)
                if agent.pos.is_orthogonal_neighbor(next) && traversal.allows(ctx.map, next) =>
            {
                Move {
                    to: next,
                    facing: Direction::between(agent.pos, next).unwrap_or(agent.facing),
                }
            }
            _ => {
                debug!("pursuer at {:?} holds position", agent.pos);
                Move::stay(agent)
            }
        };
        self.last_path = Some(path);
        mv
    }
}
