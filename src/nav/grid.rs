//! The tile grid agents navigate.
//!
//! A `GridMap` is a rectangular, row-major array of tiles. Tile identity is
//! fixed for the lifetime of a level; a tile's kind may be overwritten between
//! ticks (pickups and opened doors turn into floor), and every search reads the
//! live map.

use thiserror::Error;

use crate::components::{EnemyKind, GridPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyColour {
    Red,
    Green,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Flippers,
    IronBoots,
    Token,
}

/// Hazard families whose danger is switched off level-wide by an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardKind {
    Water,
    Wind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Floor,
    Wall,
    Hazard(HazardKind),
    Goal,
    Teleporter { link: GridPosition },
    Door(KeyColour),
    TokenDoor { tokens: u32 },
    Item(ItemKind),
    Key(KeyColour),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub pos: GridPosition,
    pub kind: TileKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridMap {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl GridMap {
    /// A map of the given size filled with floor.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, TileKind::Floor)
    }

    pub fn filled(width: usize, height: usize, kind: TileKind) -> Self {
        let mut tiles = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile {
                    pos: GridPosition::new(x as i32, y as i32),
                    kind,
                });
            }
        }
        Self { width, height, tiles }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Row-major index of an in-bounds position.
    pub fn index_of(&self, pos: GridPosition) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width + pos.x as usize)
    }

    /// Tile at `pos`, or `None` outside the grid.
    pub fn get(&self, pos: GridPosition) -> Option<&Tile> {
        self.index_of(pos).map(|idx| &self.tiles[idx])
    }

    /// Tile at `pos`.
    ///
    /// # Panics
    ///
    /// Panics when `pos` is outside the grid. Callers validate coordinates
    /// before asking; an out-of-bounds request is a bug, not a game event.
    pub fn tile(&self, pos: GridPosition) -> &Tile {
        match self.get(pos) {
            Some(tile) => tile,
            None => panic!(
                "tile ({}, {}) is outside the {}x{} grid",
                pos.x, pos.y, self.width, self.height
            ),
        }
    }

    /// Overwrite the kind of the tile at `pos`.
    ///
    /// # Panics
    ///
    /// Panics when `pos` is outside the grid.
    pub fn set_kind(&mut self, pos: GridPosition, kind: TileKind) {
        let Some(idx) = self.index_of(pos) else {
            panic!(
                "cannot overwrite ({}, {}) outside the {}x{} grid",
                pos.x, pos.y, self.width, self.height
            );
        };
        self.tiles[idx].kind = kind;
    }

}

// ---------------------------------------------------------------------------
// Layout parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout is empty")]
    Empty,
    #[error("row {row} has width {actual}, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown tile character '{ch}' at ({x}, {y})")]
    UnknownGlyph { ch: char, x: usize, y: usize },
    #[error("no player spawn ('P') found")]
    MissingPlayer,
    #[error("multiple player spawns, second at ({x}, {y})")]
    DuplicatePlayer { x: usize, y: usize },
    #[error("teleporter at ({x}, {y}) has no partner")]
    UnpairedTeleporter { x: i32, y: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemySpawn {
    pub pos: GridPosition,
    pub kind: EnemyKind,
}

/// A parsed level: the map and where everyone starts.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelLayout {
    pub map: GridMap,
    pub player_spawn: GridPosition,
    /// Enemies in reading order, which is also their update order.
    pub enemy_spawns: Vec<EnemySpawn>,
}

enum Glyph {
    Tile(TileKind),
    Teleporter,
    Player,
    Enemy(EnemyKind),
}

fn glyph(ch: char) -> Option<Glyph> {
    let glyph = match ch {
        '#' => Glyph::Tile(TileKind::Wall),
        '.' | ' ' => Glyph::Tile(TileKind::Floor),
        '~' => Glyph::Tile(TileKind::Hazard(HazardKind::Water)),
        '^' => Glyph::Tile(TileKind::Hazard(HazardKind::Wind)),
        '@' => Glyph::Tile(TileKind::Goal),
        'R' => Glyph::Tile(TileKind::Door(KeyColour::Red)),
        'G' => Glyph::Tile(TileKind::Door(KeyColour::Green)),
        'B' => Glyph::Tile(TileKind::Door(KeyColour::Blue)),
        'r' => Glyph::Tile(TileKind::Key(KeyColour::Red)),
        'g' => Glyph::Tile(TileKind::Key(KeyColour::Green)),
        'b' => Glyph::Tile(TileKind::Key(KeyColour::Blue)),
        'f' => Glyph::Tile(TileKind::Item(ItemKind::Flippers)),
        'i' => Glyph::Tile(TileKind::Item(ItemKind::IronBoots)),
        '$' => Glyph::Tile(TileKind::Item(ItemKind::Token)),
        '1'..='9' => Glyph::Tile(TileKind::TokenDoor {
            tokens: ch.to_digit(10).unwrap_or(0),
        }),
        'T' => Glyph::Teleporter,
        'P' => Glyph::Player,
        'h' => Glyph::Enemy(EnemyKind::HorizontalPatrol),
        'v' => Glyph::Enemy(EnemyKind::VerticalPatrol),
        'w' => Glyph::Enemy(EnemyKind::WallFollower),
        'd' => Glyph::Enemy(EnemyKind::DirectChaser),
        'a' => Glyph::Enemy(EnemyKind::Pursuer),
        _ => return None,
    };
    Some(glyph)
}

impl LevelLayout {
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let all: Vec<&str> = text.lines().collect();
        let first_row = all.iter().position(|l| !l.is_empty()).unwrap_or(all.len());
        let last_row = all.iter().rposition(|l| !l.is_empty()).map_or(first_row, |i| i + 1);
        // Blank lines are only trimmed at the edges; inside the grid they are ragged rows.
        let lines = &all[first_row..last_row];
        let Some(first) = lines.first() else {
            return Err(LayoutError::Empty);
        };
        let width = first.chars().count();
        let height = lines.len();

        let mut map = GridMap::new(width, height);
        let mut player_spawn = None;
        let mut enemy_spawns = Vec::new();
        let mut teleporters = Vec::new();

        for (y, line) in lines.iter().enumerate() {
            let actual = line.chars().count();
            if actual != width {
                return Err(LayoutError::Ragged {
                    row: y,
                    expected: width,
                    actual,
                });
            }
            for (x, ch) in line.chars().enumerate() {
                let pos = GridPosition::new(x as i32, y as i32);
                match glyph(ch).ok_or(LayoutError::UnknownGlyph { ch, x, y })? {
                    Glyph::Tile(kind) => map.set_kind(pos, kind),
                    Glyph::Teleporter => teleporters.push(pos),
                    Glyph::Player => {
                        if player_spawn.is_some() {
                            return Err(LayoutError::DuplicatePlayer { x, y });
                        }
                        player_spawn = Some(pos);
                    }
                    Glyph::Enemy(kind) => enemy_spawns.push(EnemySpawn { pos, kind }),
                }
            }
        }

        for pair in teleporters.chunks(2) {
            match pair {
                &[a, b] => {
                    map.set_kind(a, TileKind::Teleporter { link: b });
                    map.set_kind(b, TileKind::Teleporter { link: a });
                }
                &[lone] => {
                    return Err(LayoutError::UnpairedTeleporter {
                        x: lone.x,
                        y: lone.y,
                    });
                }
                _ => {}
            }
        }

        let player_spawn = player_spawn.ok_or(LayoutError::MissingPlayer)?;

        Ok(LevelLayout {
            map,
            player_spawn,
            enemy_spawns,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
