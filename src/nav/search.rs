//! Best-first grid search used by pursuing enemies.
//!
//! One `SearchEngine` belongs to one agent and owns a node arena sized to the
//! level. Each call to [`SearchEngine::find_path`] resets the arena, so nothing
//! leaks from one tick into the next. Predecessors are arena indices and are
//! only ever written for nodes that are still open, which keeps every
//! predecessor chain a simple path back to the start.
//!
//! The open set is a plain `Vec` scanned for the lowest f-score. Ties go to the
//! entry inserted first. This is quadratic in the number of cells, which is
//! fine for hand-built levels.

use micromegas_tracing::prelude::*;
use rand::Rng;

use crate::components::{Direction, GridPosition};
use crate::nav::grid::GridMap;
use crate::nav::neighbors;
use crate::nav::traversal::Traversal;

pub const DEFAULT_HEURISTIC_WEIGHT: f32 = 1.0;
pub const DEFAULT_FALLBACK_ATTEMPTS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// A real route from the start to the goal.
    Found,
    /// The goal was unreachable; one random legal step away from the start.
    Fallback,
    /// The goal was unreachable and no neighbor could be entered.
    Hold,
}

/// Positions ordered goal-first, start-last.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    steps: Vec<GridPosition>,
    kind: PathKind,
}

impl Path {
    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn steps(&self) -> &[GridPosition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_found(&self) -> bool {
        self.kind == PathKind::Found
    }

    /// The cell one step from the start: the second-to-last entry, or the
    /// only entry of a single-cell path.
    pub fn next_step(&self) -> Option<GridPosition> {
        match self.steps.len() {
            0 => None,
            1 => Some(self.steps[0]),
            n => Some(self.steps[n - 2]),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SearchNode {
    g: f32,
    h: f32,
    parent: Option<usize>,
    open: bool,
    closed: bool,
}

impl SearchNode {
    fn f(&self) -> f32 {
        self.g + self.h
    }
}

pub struct SearchEngine {
    width: usize,
    height: usize,
    nodes: Vec<SearchNode>,
    open: Vec<usize>,
    heuristic_weight: f32,
    fallback_attempts: u32,
}

impl SearchEngine {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            nodes: vec![SearchNode::default(); width * height],
            open: Vec::new(),
            heuristic_weight: DEFAULT_HEURISTIC_WEIGHT,
            fallback_attempts: DEFAULT_FALLBACK_ATTEMPTS,
        }
    }

    /// An engine sized to `map`.
    pub fn for_map(map: &GridMap) -> Self {
        Self::new(map.width(), map.height())
    }

    pub fn with_heuristic_weight(mut self, weight: f32) -> Self {
        self.heuristic_weight = weight;
        self
    }

    pub fn with_fallback_attempts(mut self, attempts: u32) -> Self {
        self.fallback_attempts = attempts;
        self
    }

    fn index(&self, pos: GridPosition) -> usize {
        assert!(
            pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height,
            "search position ({}, {}) is outside the {}x{} grid",
            pos.x,
            pos.y,
            self.width,
            self.height
        );
        pos.y as usize * self.width + pos.x as usize
    }

    fn position(&self, idx: usize) -> GridPosition {
        GridPosition::new((idx % self.width) as i32, (idx / self.width) as i32)
    }

    fn reset(&mut self, start: GridPosition, goal: GridPosition) {
        for idx in 0..self.nodes.len() {
            let pos = self.position(idx);
            self.nodes[idx] = SearchNode {
                g: pos.euclidean(start),
                h: pos.euclidean(goal) * self.heuristic_weight,
                parent: None,
                open: false,
                closed: false,
            };
        }
        self.open.clear();
    }

    /// Shortest route from `start` to `goal` over cells `traversal` allows.
    ///
    /// Unreachable goals never fail: the result is a one-step random fallback
    /// or, when the agent is boxed in, a hold on the start cell.
    ///
    /// # Panics
    ///
    /// When `map` does not have the engine's dimensions, or `start`/`goal`
    /// lie outside the grid.
    pub fn find_path(
        &mut self,
        start: GridPosition,
        goal: GridPosition,
        map: &GridMap,
        traversal: &Traversal<'_>,
        rng: &mut impl Rng,
    ) -> Path {
        span_scope!("find_path");
        assert_eq!(
            (map.width(), map.height()),
            (self.width, self.height),
            "search engine dimensions do not match the map"
        );

        let start_idx = self.index(start);
        let goal_idx = self.index(goal);
        self.reset(start, goal);

        self.nodes[start_idx].g = 0.0;
        self.nodes[start_idx].open = true;
        self.open.push(start_idx);

        let mut expanded: u64 = 0;
        while let Some(slot) = self.cheapest_open() {
            let current = self.open.remove(slot);
            if current == goal_idx {
                imetric!("search_expansions", "count", expanded);
                return Path {
                    steps: self.reconstruct(current),
                    kind: PathKind::Found,
                };
            }

            self.nodes[current].open = false;
            self.nodes[current].closed = true;
            expanded += 1;

            let here = self.position(current);
            let candidates: Vec<GridPosition> = {
                let nodes = &self.nodes;
                let width = self.width;
                neighbors::passable_neighbors(map, traversal, here, move |p| {
                    nodes[p.y as usize * width + p.x as usize].closed
                })
                .collect()
            };

            let tentative = self.nodes[current].g + 1.0;
            for pos in candidates {
                let next = self.index(pos);
                if self.nodes[current].parent == Some(next) {
                    continue;
                }
                let node = &mut self.nodes[next];
                if node.open {
                    if tentative < node.g {
                        node.g = tentative;
                        node.parent = Some(current);
                    }
                } else {
                    node.g = tentative;
                    node.parent = Some(current);
                    node.open = true;
                    self.open.push(next);
                }
            }
        }

        imetric!("search_expansions", "count", expanded);
        debug!("no route from {:?} to {:?}, falling back", start, goal);
        self.fallback(start, map, traversal, rng)
    }

    fn cheapest_open(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (slot, &idx) in self.open.iter().enumerate() {
            let f = self.nodes[idx].f();
            match best {
                Some((_, best_f)) if f >= best_f => {}
                _ => best = Some((slot, f)),
            }
        }
        best.map(|(slot, _)| slot)
    }

    fn reconstruct(&self, from: usize) -> Vec<GridPosition> {
        let mut steps = Vec::new();
        let mut cursor = Some(from);
        while let Some(idx) = cursor {
            steps.push(self.position(idx));
            debug_assert!(steps.len() <= self.nodes.len(), "predecessor chain loops");
            cursor = self.nodes[idx].parent;
        }
        steps
    }

    fn fallback(
        &self,
        start: GridPosition,
        map: &GridMap,
        traversal: &Traversal<'_>,
        rng: &mut impl Rng,
    ) -> Path {
        for _ in 0..self.fallback_attempts {
            let dir = Direction::CLOCKWISE[rng.gen_range(0..Direction::CLOCKWISE.len())];
            let step = start.step(dir);
            if traversal.allows(map, step) {
                return Path {
                    steps: vec![step, start],
                    kind: PathKind::Fallback,
                };
            }
        }
        warn!("agent at {:?} has no legal move, holding", start);
        Path {
            steps: vec![start],
            kind: PathKind::Hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Clearance;
    use crate::nav::grid::{HazardKind, TileKind};
    use crate::nav::traversal::{Tier, TraversalRules};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn assert_connected(path: &Path, start: GridPosition, goal: GridPosition) {
        let steps = path.steps();
        assert_eq!(steps.first(), Some(&goal));
        assert_eq!(steps.last(), Some(&start));
        for pair in steps.windows(2) {
            assert!(pair[0].is_orthogonal_neighbor(pair[1]), "{:?} not adjacent", pair);
        }
    }

    /// 5x5 with a plus-shaped wall whose centre (2,2) is left open.
    fn plus_wall() -> GridMap {
        let mut map = GridMap::new(5, 5);
        for i in 0..5 {
            if i != 2 {
                map.set_kind(GridPosition::new(2, i), TileKind::Wall);
                map.set_kind(GridPosition::new(i, 2), TileKind::Wall);
            }
        }
        map
    }

    #[test]
    fn open_grid_path_is_manhattan_length() {
        let map = GridMap::new(6, 4);
        let rules = TraversalRules::default();
        let enemy = Traversal::new(&rules, Clearance(Tier::OPEN));
        let mut engine = SearchEngine::for_map(&map);

        let start = GridPosition::new(0, 0);
        let goal = GridPosition::new(5, 3);
        let path = engine.find_path(start, goal, &map, &enemy, &mut rng());
        assert!(path.is_found());
        assert_eq!(path.len(), 9);
        assert_connected(&path, start, goal);
    }

    #[test]
    fn plus_wall_routes_through_the_gap() {
        let map = plus_wall();
        let rules = TraversalRules::default();
        let enemy = Traversal::new(&rules, Clearance(Tier::OPEN));
        let mut engine = SearchEngine::for_map(&map);

        let start = GridPosition::new(0, 0);
        let goal = GridPosition::new(4, 4);
        let path = engine.find_path(start, goal, &map, &enemy, &mut rng());
        assert!(path.is_found());
        assert_eq!(path.len(), 9);
        assert!(path.steps().contains(&GridPosition::new(2, 2)));
        assert_connected(&path, start, goal);
    }

    #[test]
    fn start_equals_goal() {
        let map = GridMap::new(3, 3);
        let rules = TraversalRules::default();
        let enemy = Traversal::new(&rules, Clearance(Tier::OPEN));
        let mut engine = SearchEngine::for_map(&map);

        let here = GridPosition::new(1, 1);
        let path = engine.find_path(here, here, &map, &enemy, &mut rng());
        assert_eq!(path.steps(), &[here]);
        assert_eq!(path.next_step(), Some(here));
    }

    #[test]
    fn next_step_is_adjacent_to_start() {
        let map = GridMap::new(4, 4);
        let rules = TraversalRules::default();
        let enemy = Traversal::new(&rules, Clearance(Tier::OPEN));
        let mut engine = SearchEngine::for_map(&map);

        let start = GridPosition::new(3, 0);
        let path = engine.find_path(start, GridPosition::new(0, 3), &map, &enemy, &mut rng());
        let next = path.next_step().unwrap();
        assert!(start.is_orthogonal_neighbor(next));
    }

    #[test]
    fn walled_off_goal_falls_back_to_a_passable_step() {
        let mut map = GridMap::new(5, 3);
        for y in 0..3 {
            map.set_kind(GridPosition::new(2, y), TileKind::Wall);
        }
        let rules = TraversalRules::default();
        let enemy = Traversal::new(&rules, Clearance(Tier::OPEN));
        let mut engine = SearchEngine::for_map(&map);
        let mut rng = rng();

        let start = GridPosition::new(1, 1);
        for _ in 0..20 {
            let path = engine.find_path(start, GridPosition::new(4, 1), &map, &enemy, &mut rng);
            assert_eq!(path.kind(), PathKind::Fallback);
            let step = path.next_step().unwrap();
            assert!(start.is_orthogonal_neighbor(step));
            assert!(enemy.allows(&map, step));
        }
    }

    #[test]
    fn enclosed_agent_holds_position() {
        let mut map = GridMap::filled(3, 3, TileKind::Wall);
        map.set_kind(GridPosition::new(1, 1), TileKind::Floor);
        let rules = TraversalRules::default();
        let enemy = Traversal::new(&rules, Clearance(Tier::OPEN));
        let mut engine = SearchEngine::for_map(&map);

        let start = GridPosition::new(1, 1);
        let path = engine.find_path(start, GridPosition::new(0, 0), &map, &enemy, &mut rng());
        assert_eq!(path.kind(), PathKind::Hold);
        assert_eq!(path.next_step(), Some(start));
    }

    #[test]
    fn repeated_searches_agree_on_length() {
        let map = plus_wall();
        let rules = TraversalRules::default();
        let enemy = Traversal::new(&rules, Clearance(Tier::OPEN));
        let mut engine = SearchEngine::for_map(&map);
        let mut rng = rng();

        let start = GridPosition::new(4, 0);
        let goal = GridPosition::new(0, 4);
        let first = engine.find_path(start, goal, &map, &enemy, &mut rng);
        let second = engine.find_path(start, goal, &map, &enemy, &mut rng);
        assert_eq!(first.len(), second.len());
        assert_eq!(first, second);
    }

    #[test]
    fn paths_never_cross_tiles_above_clearance() {
        // Water sits on the direct route, so the enemy has to go around it.
        let layout = "\
.....
.~~~.
.~~~.
.....";
        let mut map = GridMap::new(5, 4);
        for (y, row) in layout.lines().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '~' {
                    map.set_kind(
                        GridPosition::new(x as i32, y as i32),
                        TileKind::Hazard(HazardKind::Water),
                    );
                }
            }
        }
        let mut rules = TraversalRules::default();
        let mut engine = SearchEngine::for_map(&map);

        let start = GridPosition::new(2, 0);
        let goal = GridPosition::new(2, 3);
        let enemy = Traversal::new(&rules, Clearance(Tier::OPEN));
        let path = engine.find_path(start, goal, &map, &enemy, &mut rng());
        assert!(path.is_found());
        for pos in path.steps() {
            assert!(rules.tier(map.tile(*pos)) <= Tier::OPEN);
        }
        assert_eq!(path.len(), 8);

        // Neutralizing water lifts it to RESTRICTED, still out of an enemy's reach
        // but within the player's.
        rules.neutralize(HazardKind::Water);
        let player = Traversal::new(&rules, Clearance(Tier::RESTRICTED));
        let path = engine.find_path(start, goal, &map, &player, &mut rng());
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn predecessor_chains_end_at_start() {
        let map = GridMap::new(7, 7);
        let rules = TraversalRules::default();
        let enemy = Traversal::new(&rules, Clearance(Tier::OPEN));
        let mut engine = SearchEngine::for_map(&map);
        let start = GridPosition::new(3, 3);
        engine.find_path(start, GridPosition::new(6, 6), &map, &enemy, &mut rng());

        for idx in 0..engine.nodes.len() {
            if engine.nodes[idx].parent.is_none() {
                continue;
            }
            let chain = engine.reconstruct(idx);
            assert!(chain.len() <= engine.nodes.len());
            assert_eq!(chain.last(), Some(&start));
        }
    }

    #[test]
    #[should_panic(expected = "dimensions do not match")]
    fn mismatched_map_panics() {
        let map = GridMap::new(4, 4);
        let rules = TraversalRules::default();
        let enemy = Traversal::new(&rules, Clearance(Tier::OPEN));
        let mut engine = SearchEngine::new(3, 3);
        engine.find_path(
            GridPosition::new(0, 0),
            GridPosition::new(1, 1),
            &map,
            &enemy,
            &mut rng(),
        );
    }

    mod random_maps {
        use std::collections::VecDeque;

        use proptest::prelude::*;
        use proptest::sample::Index;
        use rand::SeedableRng;
        use rand::rngs::StdRng;

        use crate::components::{Clearance, Direction, GridPosition};
        use crate::nav::grid::{GridMap, HazardKind, KeyColour, TileKind};
        use crate::nav::search::SearchEngine;
        use crate::nav::traversal::{Tier, Traversal, TraversalRules};

        /// Floor-heavy mix with at least one tile of every tier.
        fn tile_kind(code: u8) -> TileKind {
            match code {
                0..=3 => TileKind::Floor,
                4 => TileKind::Wall,
                5 => TileKind::Hazard(HazardKind::Water),
                6 => TileKind::Goal,
                7 => TileKind::Key(KeyColour::Red),
                _ => TileKind::Door(KeyColour::Blue),
            }
        }

        fn arb_map() -> impl Strategy<Value = GridMap> {
            (1_usize..=9, 1_usize..=9).prop_flat_map(|(width, height)| {
                proptest::collection::vec(0_u8..=8, width * height).prop_map(move |codes| {
                    let mut map = GridMap::new(width, height);
                    for (i, code) in codes.into_iter().enumerate() {
                        let pos = GridPosition::new((i % width) as i32, (i / width) as i32);
                        map.set_kind(pos, tile_kind(code));
                    }
                    map
                })
            })
        }

        /// Steps on the shortest route, counting from `start`, which is
        /// entered regardless of its tier.
        fn bfs_distance(
            map: &GridMap,
            traversal: &Traversal<'_>,
            start: GridPosition,
            goal: GridPosition,
        ) -> Option<usize> {
            let width = map.width();
            let index = |p: GridPosition| p.y as usize * width + p.x as usize;
            let mut dist = vec![None; width * map.height()];
            dist[index(start)] = Some(0);
            let mut open = VecDeque::from([start]);
            while let Some(pos) = open.pop_front() {
                let here = dist[index(pos)]?;
                if pos == goal {
                    return Some(here);
                }
                for dir in Direction::CLOCKWISE {
                    let next = pos.step(dir);
                    if traversal.allows(map, next) && dist[index(next)].is_none() {
                        dist[index(next)] = Some(here + 1);
                        open.push_back(next);
                    }
                }
            }
            None
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(512))]
            #[test]
            fn search_agrees_with_breadth_first_search(
                map in arb_map(),
                start_pick in any::<Index>(),
                goal_pick in any::<Index>(),
                clearance in 0_u8..=3,
                water_safe in any::<bool>(),
                seed in any::<u64>()
            ) {
                let width = map.width();
                let cells = width * map.height();
                let at = |i: usize| GridPosition::new((i % width) as i32, (i / width) as i32);
                let start = at(start_pick.index(cells));
                let goal = at(goal_pick.index(cells));

                let mut rules = TraversalRules::default();
                if water_safe {
                    rules.neutralize(HazardKind::Water);
                }
                let traversal = Traversal::new(&rules, Clearance(Tier(clearance)));
                let mut engine = SearchEngine::for_map(&map);
                let mut rng = StdRng::seed_from_u64(seed);
                let path = engine.find_path(start, goal, &map, &traversal, &mut rng);

                let steps = path.steps();
                prop_assert_eq!(steps.last(), Some(&start));
                for pair in steps.windows(2) {
                    prop_assert!(
                        pair[0].is_orthogonal_neighbor(pair[1]),
                        "{:?} and {:?} are not adjacent", pair[0], pair[1]
                    );
                }
                for &pos in &steps[..steps.len() - 1] {
                    prop_assert!(traversal.allows(&map, pos), "{:?} is above clearance {}", pos, clearance);
                }

                match bfs_distance(&map, &traversal, start, goal) {
                    Some(distance) => {
                        prop_assert!(path.is_found(), "reachable goal {:?} from {:?} not found", goal, start);
                        prop_assert_eq!(steps.first(), Some(&goal));
                        prop_assert_eq!(path.len(), distance + 1);
                    }
                    None => prop_assert!(!path.is_found(), "unreachable goal {:?} reported found", goal),
                }
            }
        }
    }
}
