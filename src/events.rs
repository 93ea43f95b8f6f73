//! Tick input arrives as messages; gameplay outcomes are triggered as events
//! and observed by telemetry and stats.

use bevy::prelude::*;

use crate::components::{Direction, GridPosition};
use crate::nav::grid::{HazardKind, ItemKind, KeyColour};

/// Advance the level by one turn. `None` lets the enemies move while the
/// player stands still.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRequested(pub Option<Direction>);

/// Reload the level from its layout after a capture.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct RestartRequested;

#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerCaught {
    pub at: GridPosition,
    /// The enemy responsible, or `None` for a deadly tile.
    pub by: Option<Entity>,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct LevelCompleted {
    pub ticks: u64,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct HazardNeutralized(pub HazardKind);

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collected {
    Item(ItemKind),
    Key(KeyColour),
}

#[derive(Event, Debug, Clone, Copy)]
pub struct DoorOpened {
    pub at: GridPosition,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct Teleported {
    pub from: GridPosition,
    pub to: GridPosition,
}
