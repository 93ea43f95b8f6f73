use bevy::prelude::*;

use crate::nav::grid::KeyColour;
use crate::nav::traversal::Tier;

// ---------------------------------------------------------------------------
// Grid and spatial
// ---------------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell one step away in `dir`. May lie outside the map.
    pub fn step(self, dir: Direction) -> GridPosition {
        let (dx, dy) = dir.delta();
        GridPosition {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn offset(self, dx: i32, dy: i32) -> GridPosition {
        GridPosition {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// True when `other` shares an edge with `self`.
    pub fn is_orthogonal_neighbor(self, other: GridPosition) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) == 1
    }

    pub fn euclidean(self, other: GridPosition) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Cardinal direction for movement, listed clockwise from `Up`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const CLOCKWISE: [Direction; 4] =
        [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    /// Grid offset for this direction.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Quarter turn counter-clockwise.
    pub fn turn_left(&self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
        }
    }

    /// Quarter turn clockwise.
    pub fn turn_right(&self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    /// Direction of a single orthogonal step, if `to` is adjacent to `from`.
    pub fn between(from: GridPosition, to: GridPosition) -> Option<Direction> {
        match (to.x - from.x, to.y - from.y) {
            (1, 0) => Some(Direction::Right),
            (-1, 0) => Some(Direction::Left),
            (0, 1) => Some(Direction::Down),
            (0, -1) => Some(Direction::Up),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Actor state
// ---------------------------------------------------------------------------

/// Direction an actor currently faces. Persisted between ticks.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Facing(pub Direction);

/// Highest traversal tier the actor may enter.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clearance(pub Tier);

/// Position at the start of the current tick, for swap detection.
#[derive(Component, Debug, Clone, Copy)]
pub struct PreviousGridPosition(pub GridPosition);

/// Fixed update order among enemies; lower runs first.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpawnOrder(pub usize);

// ---------------------------------------------------------------------------
// Entity markers
// ---------------------------------------------------------------------------

#[derive(Component, Debug)]
pub struct Player;

#[derive(Component, Debug)]
pub struct Enemy;

/// The kind of enemy, determining which movement policy drives it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    HorizontalPatrol,
    VerticalPatrol,
    WallFollower,
    DirectChaser,
    Pursuer,
}

// ---------------------------------------------------------------------------
// Player inventory
// ---------------------------------------------------------------------------

#[derive(Component, Debug, Default, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub keys: Vec<KeyColour>,
    pub tokens: u32,
    pub has_flippers: bool,
    pub has_iron_boots: bool,
}

impl Inventory {
    /// Remove one key of `colour`, returning whether one was held.
    pub fn take_key(&mut self, colour: KeyColour) -> bool {
        match self.keys.iter().position(|k| *k == colour) {
            Some(idx) => {
                self.keys.remove(idx);
                true
            }
            None => false,
        }
    }
}
