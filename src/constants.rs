use crate::types::{FruitKind, GhostName, PhaseMode, Vec2};

pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;
pub const TICK_SECONDS: f32 = 1.0 / TICK_RATE as f32;
/// Upper bound for one simulation step. At the fastest actor speed this keeps a
/// single step well under half a tile.
pub const MAX_FRAME_DT: f32 = 0.05;

pub const MAZE_WIDTH: i32 = 28;
pub const MAZE_HEIGHT: i32 = 31;

pub const CENTER_EPSILON: f32 = 0.05;
pub const ACTOR_BOX_SIZE: f32 = 0.7;
pub const TUNNEL_WRAP_MARGIN: f32 = 0.4;
pub const MAX_MOVE_SEGMENTS: usize = 6;

pub const PLAYER_SPEED: f32 = 6.0;
pub const GHOST_SPEED: f32 = 5.0;
pub const FRIGHTENED_SPEED: f32 = 4.0;
pub const EATEN_SPEED_MULTIPLIER: f32 = 1.2;
pub const TUNNEL_SPEED: f32 = 2.5;

pub const POWER_DURATION: f32 = 6.0;
pub const FRIGHTENED_FLASH_WINDOW: f32 = 2.0;

pub const STARTING_LIVES: u32 = 3;
pub const PELLET_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const GHOST_EAT_SCORE: u32 = 200;

pub const SHY_GHOST_RADIUS: i32 = 8;
pub const AMBUSH_LOOKAHEAD: i32 = 4;
pub const FLANK_LOOKAHEAD: i32 = 2;

/// Remaining-pellet counts at which a bonus fruit appears.
pub const BONUS_SPAWN_THRESHOLDS: [u32; 2] = [160, 60];
pub const MAX_ACTIVE_FRUITS: usize = 1;
pub const FRUIT_LIFETIME: f32 = 10.0;
pub const FRUIT_TILE: Vec2 = Vec2 { x: 13, y: 17 };

pub const PHASE_TABLE: [(f32, PhaseMode); 6] = [
    (7.0, PhaseMode::Scatter),
    (20.0, PhaseMode::Chase),
    (7.0, PhaseMode::Scatter),
    (20.0, PhaseMode::Chase),
    (5.0, PhaseMode::Scatter),
    (999.0, PhaseMode::Chase),
];

/// Inky and Clyde aim at the bottom corridor; the rows below it are outside
/// the playfield.
pub fn scatter_corner(name: GhostName) -> Vec2 {
    match name {
        GhostName::Blinky => Vec2 { x: 25, y: 1 },
        GhostName::Pinky => Vec2 { x: 2, y: 1 },
        GhostName::Inky => Vec2 { x: 25, y: 26 },
        GhostName::Clyde => Vec2 { x: 2, y: 26 },
    }
}

pub fn fruit_for_level(level: u32) -> FruitKind {
    match level {
        0 | 1 => FruitKind::Cherry,
        2 => FruitKind::Strawberry,
        3 | 4 => FruitKind::Orange,
        5 | 6 => FruitKind::Apple,
        7 | 8 => FruitKind::Grape,
        _ => FruitKind::Key,
    }
}

pub fn fruit_points(kind: FruitKind) -> u32 {
    match kind {
        FruitKind::Cherry => 100,
        FruitKind::Strawberry => 300,
        FruitKind::Orange => 500,
        FruitKind::Apple => 700,
        FruitKind::Grape => 1_000,
        FruitKind::Key => 5_000,
    }
}
