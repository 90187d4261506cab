use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Neighbor enumeration order shared by search and flee tie-breaking: +x, -x, +y, -y.
    pub const SEARCH_ORDER: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Self {
        match (dx.signum(), dy.signum()) {
            (1, 0) => Self::Right,
            (-1, 0) => Self::Left,
            (0, 1) => Self::Down,
            (0, -1) => Self::Up,
            _ => Self::None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

/// Tile coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction, tiles: i32) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx * tiles,
            y: self.y + dy * tiles,
        }
    }

    pub fn manhattan(self, other: Vec2) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn center(self) -> (f32, f32) {
        (self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostName {
    /// Direct chaser.
    Blinky,
    /// Ambusher.
    Pinky,
    /// Flanker.
    Inky,
    /// Shy.
    Clyde,
}

impl GhostName {
    /// Roster order. The flanker reads the direct chaser's tile, so the chaser moves first.
    pub const ALL: [GhostName; 4] = [
        GhostName::Blinky,
        GhostName::Pinky,
        GhostName::Inky,
        GhostName::Clyde,
    ];

    pub fn spawn_marker(self) -> char {
        match self {
            Self::Blinky => 'B',
            Self::Pinky => 'P',
            Self::Inky => 'I',
            Self::Clyde => 'C',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseMode {
    Scatter,
    Chase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    Scatter,
    Chase,
    Frightened,
    Eaten,
}

impl From<PhaseMode> for GhostMode {
    fn from(mode: PhaseMode) -> Self {
        match mode {
            PhaseMode::Scatter => GhostMode::Scatter,
            PhaseMode::Chase => GhostMode::Chase,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitKind {
    Cherry,
    Strawberry,
    Orange,
    Apple,
    Grape,
    Key,
}

/// One tick's worth of player intent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickInput {
    pub dir: Option<Direction>,
    pub toggle_pause: bool,
    pub restart: bool,
}

impl TickInput {
    pub fn steer(dir: Direction) -> Self {
        Self {
            dir: Some(dir),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MazeInit {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
    #[serde(rename = "tunnelRow")]
    pub tunnel_row: i32,
    pub pellets: Vec<(i32, i32)>,
    #[serde(rename = "powerPellets")]
    pub power_pellets: Vec<(i32, i32)>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "tickRate")]
    pub tick_rate: u32,
    #[serde(rename = "startingLives")]
    pub starting_lives: u32,
    #[serde(rename = "powerDuration")]
    pub power_duration: f32,
    #[serde(rename = "fruitLifetime")]
    pub fruit_lifetime: f32,
    #[serde(rename = "playerSpeed")]
    pub player_speed: f32,
    #[serde(rename = "ghostSpeed")]
    pub ghost_speed: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub pending: Option<Direction>,
    pub lives: u32,
    pub score: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub name: GhostName,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub mode: GhostMode,
    #[serde(rename = "frightRemaining")]
    pub fright_remaining: f32,
    pub flashing: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct FruitView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FruitKind,
    pub x: i32,
    pub y: i32,
    pub points: u32,
    pub remaining: f32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        x: i32,
        y: i32,
        score: u32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
        score: u32,
    },
    GhostsFrightened {
        count: usize,
    },
    GhostEaten {
        ghost: GhostName,
        score: u32,
    },
    LifeLost {
        lives: u32,
    },
    LevelAdvanced {
        level: u32,
    },
    GameOver {
        score: u32,
        level: u32,
    },
    FruitSpawned {
        fruit: FruitView,
    },
    FruitTaken {
        #[serde(rename = "fruitId")]
        fruit_id: String,
        #[serde(rename = "fruitType")]
        kind: FruitKind,
        points: u32,
        score: u32,
    },
    FruitExpired {
        #[serde(rename = "fruitId")]
        fruit_id: String,
    },
    PhaseChanged {
        mode: PhaseMode,
    },
    PauseToggled {
        paused: bool,
    },
    Restarted,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub level: u32,
    pub score: u32,
    #[serde(rename = "highScore")]
    pub high_score: u32,
    pub lives: u32,
    pub phase: PhaseMode,
    pub paused: bool,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    #[serde(rename = "pelletsRemaining")]
    pub pellets_remaining: u32,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub fruits: Vec<FruitView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SessionStats {
    pub pellets: u32,
    #[serde(rename = "powerPellets")]
    pub power_pellets: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    pub fruits: u32,
    #[serde(rename = "livesLost")]
    pub lives_lost: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub score: u32,
    #[serde(rename = "highScore")]
    pub high_score: u32,
    pub level: u32,
    pub ticks: u64,
    #[serde(rename = "elapsedSeconds")]
    pub elapsed_seconds: f32,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    pub stats: SessionStats,
}
