use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::nav::grid::{GridMap, LevelLayout};
use crate::nav::search::{DEFAULT_FALLBACK_ATTEMPTS, DEFAULT_HEURISTIC_WEIGHT};
use crate::nav::traversal::{Tier, TraversalRules};

// ---------------------------------------------------------------------------
// Navigation config
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid navigation config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("heuristic_weight must be finite and non-negative, got {0}")]
    HeuristicWeight(f32),
    #[error("enemy_clearance {0:?} would let enemies walk through walls")]
    EnemyClearance(Tier),
}

/// Tunables for enemy navigation. Every field has a default, so a config file
/// only lists what it changes.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavConfig {
    /// Scale on the straight-line distance estimate. 1.0 keeps routes shortest.
    pub heuristic_weight: f32,
    /// Random directions tried before a boxed-in pursuer holds still.
    pub fallback_attempts: u32,
    /// Seed for enemy randomness. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
    /// Highest tier an enemy may enter.
    pub enemy_clearance: Tier,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            heuristic_weight: DEFAULT_HEURISTIC_WEIGHT,
            fallback_attempts: DEFAULT_FALLBACK_ATTEMPTS,
            rng_seed: None,
            enemy_clearance: Tier::OPEN,
        }
    }
}

impl NavConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: NavConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.heuristic_weight.is_finite() || self.heuristic_weight < 0.0 {
            return Err(ConfigError::HeuristicWeight(self.heuristic_weight));
        }
        if self.enemy_clearance >= Tier::IMPASSABLE {
            return Err(ConfigError::EnemyClearance(self.enemy_clearance));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// The live map and hazard state. Player actions write here between enemy
/// turns and every search reads it directly.
#[derive(Resource, Debug, Clone)]
pub struct Level {
    pub map: GridMap,
    pub rules: TraversalRules,
    layout: LevelLayout,
}

impl Level {
    pub fn new(layout: LevelLayout) -> Self {
        Self {
            map: layout.map.clone(),
            rules: TraversalRules::default(),
            layout,
        }
    }

    pub fn layout(&self) -> &LevelLayout {
        &self.layout
    }

    /// Put back every picked-up item, locked door and hazard.
    pub fn reset(&mut self) {
        self.map = self.layout.map.clone();
        self.rules = TraversalRules::default();
    }
}

/// Ticks resolved since the level started.
#[derive(Resource, Debug, Default)]
pub struct TickCount(pub u64);

/// Randomness for enemy fallback moves.
#[derive(Resource)]
pub struct NavRng(pub StdRng);

impl NavRng {
    pub fn from_config(config: &NavConfig) -> Self {
        match config.rng_seed {
            Some(seed) => NavRng(StdRng::seed_from_u64(seed)),
            None => NavRng(StdRng::from_entropy()),
        }
    }
}

// ---------------------------------------------------------------------------
// Level stats
// ---------------------------------------------------------------------------

#[derive(Resource, Debug, Default)]
pub struct LevelStats {
    pub captures: u32,
    pub items_collected: u32,
    pub doors_opened: u32,
    pub teleports: u32,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
