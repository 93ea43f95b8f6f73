use bevy::prelude::*;

/// Where the current level stands. Ticks only run while `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, States)]
pub enum LevelState {
    #[default]
    Playing,
    /// The player died; waits for a restart.
    Caught,
    Completed,
}
