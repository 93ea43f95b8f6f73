//! Local neighborhood queries shared by the search engine and the wall follower.
//!
//! Nothing here is cached: tiers can change between ticks, so every call reads
//! the live map.

use crate::components::{Direction, GridPosition};
use crate::nav::grid::GridMap;
use crate::nav::traversal::Traversal;

/// Orthogonal candidates in scan order: +x, +y, -x, -y.
const SCAN_ORDER: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// In-bounds orthogonal cells around `pos`, in scan order.
pub fn orthogonal(map: &GridMap, pos: GridPosition) -> impl Iterator<Item = GridPosition> + '_ {
    SCAN_ORDER
        .iter()
        .map(move |&(dx, dy)| pos.offset(dx, dy))
        .filter(|p| map.in_bounds(*p))
}

/// Orthogonal neighbors the agent may enter and that `excluded` does not reject.
///
/// The search engine passes its closed-set membership as `excluded`.
pub fn passable_neighbors<'a>(
    map: &'a GridMap,
    traversal: &'a Traversal<'_>,
    pos: GridPosition,
    excluded: impl Fn(GridPosition) -> bool + 'a,
) -> impl Iterator<Item = GridPosition> + 'a {
    orthogonal(map, pos).filter(move |p| traversal.allows(map, *p) && !excluded(*p))
}

/// The cell diagonally behind-left of an agent facing `facing`.
///
/// This is the cell a left-hand wall follower was hugging one step ago.
pub fn behind_left(pos: GridPosition, facing: Direction) -> GridPosition {
    let (lx, ly) = facing.turn_left().delta();
    let (bx, by) = facing.opposite().delta();
    pos.offset(lx + bx, ly + by)
}

/// The eight cells surrounding `pos`, whether or not they are on the grid.
pub fn ring(pos: GridPosition) -> [GridPosition; 8] {
    [
        pos.offset(-1, -1),
        pos.offset(0, -1),
        pos.offset(1, -1),
        pos.offset(1, 0),
        pos.offset(1, 1),
        pos.offset(0, 1),
        pos.offset(-1, 1),
        pos.offset(-1, 0),
    ]
}

/// True when every cell around `pos` is enterable. Off-grid cells count as walls.
pub fn is_clear_of_walls(map: &GridMap, traversal: &Traversal<'_>, pos: GridPosition) -> bool {
    ring(pos).iter().all(|p| traversal.allows(map, *p))
}
