//! Grid model and pathfinding, independent of the ECS.

pub mod grid;
pub mod neighbors;
pub mod search;
pub mod traversal;
