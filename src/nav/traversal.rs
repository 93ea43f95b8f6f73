//! Traversal tiers and the per-agent policy that gates movement.
//!
//! Every tile resolves to a `Tier`; an agent may enter a tile when its tier is
//! at or below the agent's `Clearance`. Hazard danger is level-wide state held
//! by `TraversalRules`, so picking up flippers changes every water tile at once
//! and the change is seen by the very next search.

use serde::{Deserialize, Serialize};

use crate::components::{Clearance, GridPosition};
use crate::nav::grid::{GridMap, HazardKind, Tile, TileKind};

/// Ordered traversability rank. Lower is more permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tier(pub u8);

impl Tier {
    /// Open to every agent.
    pub const OPEN: Tier = Tier(0);
    /// Player only: goals, teleporters and hazards that have been neutralized.
    pub const RESTRICTED: Tier = Tier(1);
    /// Enterable by the player, but lethal.
    pub const DEADLY: Tier = Tier(2);
    /// Nobody passes.
    pub const IMPASSABLE: Tier = Tier(3);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalRules {
    water_neutralized: bool,
    wind_neutralized: bool,
}

impl TraversalRules {
    pub fn is_neutralized(&self, hazard: HazardKind) -> bool {
        match hazard {
            HazardKind::Water => self.water_neutralized,
            HazardKind::Wind => self.wind_neutralized,
        }
    }

    /// Make every tile of `hazard` safe for the player. Returns `false` when it
    /// already was.
    pub fn neutralize(&mut self, hazard: HazardKind) -> bool {
        let flag = match hazard {
            HazardKind::Water => &mut self.water_neutralized,
            HazardKind::Wind => &mut self.wind_neutralized,
        };
        !std::mem::replace(flag, true)
    }

    pub fn tier_of(&self, kind: TileKind) -> Tier {
        match kind {
            TileKind::Floor | TileKind::Item(_) | TileKind::Key(_) => Tier::OPEN,
            TileKind::Goal | TileKind::Teleporter { .. } => Tier::RESTRICTED,
            TileKind::Hazard(hazard) if self.is_neutralized(hazard) => Tier::RESTRICTED,
            TileKind::Hazard(_) => Tier::DEADLY,
            TileKind::Wall | TileKind::Door(_) | TileKind::TokenDoor { .. } => Tier::IMPASSABLE,
        }
    }

    pub fn tier(&self, tile: &Tile) -> Tier {
        self.tier_of(tile.kind)
    }
}

/// The movement oracle for one agent: rules plus that agent's clearance.
#[derive(Debug, Clone, Copy)]
pub struct Traversal<'a> {
    pub rules: &'a TraversalRules,
    pub clearance: Clearance,
}

impl<'a> Traversal<'a> {
    pub fn new(rules: &'a TraversalRules, clearance: Clearance) -> Self {
        Self { rules, clearance }
    }

    pub fn permits(&self, tile: &Tile) -> bool {
        self.rules.tier(tile) <= self.clearance.0
    }

    /// Whether the agent may stand on `pos`. Off-grid cells are never allowed.
    pub fn allows(&self, map: &GridMap, pos: GridPosition) -> bool {
        map.get(pos).is_some_and(|tile| self.permits(tile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::grid::{ItemKind, KeyColour};

    #[test]
    fn base_tiers() {
        let rules = TraversalRules::default();
        assert_eq!(rules.tier_of(TileKind::Floor), Tier::OPEN);
        assert_eq!(rules.tier_of(TileKind::Item(ItemKind::Token)), Tier::OPEN);
        assert_eq!(rules.tier_of(TileKind::Key(KeyColour::Red)), Tier::OPEN);
        assert_eq!(rules.tier_of(TileKind::Goal), Tier::RESTRICTED);
        assert_eq!(rules.tier_of(TileKind::Hazard(HazardKind::Water)), Tier::DEADLY);
        assert_eq!(rules.tier_of(TileKind::Wall), Tier::IMPASSABLE);
        assert_eq!(rules.tier_of(TileKind::Door(KeyColour::Blue)), Tier::IMPASSABLE);
        assert_eq!(rules.tier_of(TileKind::TokenDoor { tokens: 2 }), Tier::IMPASSABLE);
    }

    #[test]
    fn neutralizing_one_hazard_leaves_the_other_deadly() {
        let mut rules = TraversalRules::default();
        assert!(rules.neutralize(HazardKind::Water));
        assert!(!rules.neutralize(HazardKind::Water));
        assert_eq!(rules.tier_of(TileKind::Hazard(HazardKind::Water)), Tier::RESTRICTED);
        assert_eq!(rules.tier_of(TileKind::Hazard(HazardKind::Wind)), Tier::DEADLY);
    }

    #[test]
    fn traversal_respects_clearance_and_bounds() {
        let mut map = GridMap::new(3, 1);
        map.set_kind(GridPosition::new(1, 0), TileKind::Goal);
        let rules = TraversalRules::default();

        let enemy = Traversal::new(&rules, Clearance(Tier::OPEN));
        assert!(enemy.allows(&map, GridPosition::new(0, 0)));
        assert!(!enemy.allows(&map, GridPosition::new(1, 0)));
        assert!(!enemy.allows(&map, GridPosition::new(3, 0)));

        let player = Traversal::new(&rules, Clearance(Tier::DEADLY));
        assert!(player.allows(&map, GridPosition::new(1, 0)));
        assert!(!player.allows(&map, GridPosition::new(-1, 0)));
    }
}
