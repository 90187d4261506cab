//! Configuration errors.
//!
//! Everything here is fatal: a session cannot start from a malformed maze or
//! phase table. Unreachable pathfinding targets and out-of-contract state
//! changes are not errors and never show up here.

use std::path::PathBuf;

use crate::types::GhostName;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("maze must be {expected_width}x{expected_height} tiles, got {width}x{height}")]
    Dimensions {
        expected_width: i32,
        expected_height: i32,
        width: i32,
        height: i32,
    },

    #[error("unknown tile {ch:?} at ({x},{y})")]
    UnknownTile { ch: char, x: i32, y: i32 },

    #[error("marker {ch:?} appears more than once (again at ({x},{y}))")]
    DuplicateMarker { ch: char, x: i32, y: i32 },

    #[error("maze has no player start")]
    MissingPlayerStart,

    #[error("maze has no spawn for {0:?}")]
    MissingGhostSpawn(GhostName),

    #[error("maze has no ghost house door")]
    MissingDoor,

    #[error("expected exactly one tunnel row reachable from the player start, found {0}")]
    TunnelRows(usize),

    #[error("no open tile above the ghost house door at ({x},{y})")]
    NoReturnTile { x: i32, y: i32 },

    #[error("fruit tile ({x},{y}) is not walkable")]
    FruitTileBlocked { x: i32, y: i32 },

    #[error("phase table is empty")]
    EmptyPhaseTable,

    #[error("phase segment {index} has invalid duration {duration}")]
    InvalidPhaseDuration { index: usize, duration: f32 },

    #[error("failed to read maze file {}: {source}", path.display())]
    MazeFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
