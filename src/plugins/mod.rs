pub mod enemies;
pub mod level;
pub mod player;
pub mod telemetry;
