use tracing::debug;

use crate::constants::{
    fruit_for_level, fruit_points, BONUS_SPAWN_THRESHOLDS, FRUIT_LIFETIME, GHOST_EAT_SCORE,
    GHOST_SPEED, MAX_ACTIVE_FRUITS, PELLET_SCORE, PLAYER_SPEED, POWER_DURATION,
    POWER_PELLET_SCORE, STARTING_LIVES, TICK_RATE,
};
use crate::error::ConfigError;
use crate::ghost::{Ghost, GhostContext};
use crate::maze::{MazeBlueprint, TileMap};
use crate::phase::{classic_table, PhaseScheduler, PhaseSegment};
use crate::player::Player;
use crate::types::{
    FruitView, GameConfig, GhostMode, GhostName, MazeInit, PhaseMode, RuntimeEvent,
    SessionStats, SessionSummary, Snapshot, TickInput, Vec2,
};

mod bonus_system;
mod collision_system;
mod pickup_system;
mod utils;

use self::utils::{clamp_frame_dt, overlaps_tile};

#[derive(Clone, Debug)]
struct FruitInternal {
    view: FruitView,
    tile: Vec2,
}

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    /// Best score from the persistent store; the session never reports less.
    pub high_score: u32,
    pub phase_table: Vec<PhaseSegment>,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            high_score: 0,
            phase_table: classic_table(),
        }
    }
}

/// One single-player session. All simulation state lives here and is only
/// mutated from [`GameEngine::step`].
#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: GameConfig,

    pristine_maze: TileMap,
    pristine_phase: PhaseScheduler,
    maze: TileMap,
    phase: PhaseScheduler,
    player: Player,
    ghosts: Vec<Ghost>,
    fruits: Vec<FruitInternal>,
    events: Vec<RuntimeEvent>,
    stats: SessionStats,

    level: u32,
    high_score: u32,
    paused: bool,
    game_over: bool,
    tick_counter: u64,
    elapsed: f32,
    spawned_thresholds: Vec<u32>,
    next_id_counter: u64,
}

impl GameEngine {
    pub fn new(blueprint: &MazeBlueprint, options: GameEngineOptions) -> Result<Self, ConfigError> {
        let maze = blueprint.build()?;
        let phase = PhaseScheduler::new(options.phase_table)?;

        let config = GameConfig {
            tick_rate: TICK_RATE,
            starting_lives: STARTING_LIVES,
            power_duration: POWER_DURATION,
            fruit_lifetime: FRUIT_LIFETIME,
            player_speed: PLAYER_SPEED,
            ghost_speed: GHOST_SPEED,
        };

        let player = Player::new(maze.player_start());
        let ghosts = GhostName::ALL
            .into_iter()
            .map(|name| {
                Ghost::new(
                    name,
                    maze.ghost_spawn(name),
                    maze.return_tile(),
                    phase.current_mode(),
                )
            })
            .collect();

        Ok(Self {
            config,
            pristine_maze: maze.clone(),
            pristine_phase: phase.clone(),
            maze,
            phase,
            player,
            ghosts,
            fruits: Vec::new(),
            events: Vec::new(),
            stats: SessionStats::default(),
            level: 1,
            high_score: options.high_score,
            paused: false,
            game_over: false,
            tick_counter: 0,
            elapsed: 0.0,
            spawned_thresholds: Vec::new(),
            next_id_counter: 1,
        })
    }

    pub fn maze(&self) -> &TileMap {
        &self.maze
    }

    pub fn maze_init(&self) -> MazeInit {
        self.maze.to_init()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn fruit_tiles(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.fruits.iter().map(|fruit| fruit.tile)
    }

    pub fn score(&self) -> u32 {
        self.player.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lives(&self) -> u32 {
        self.player.lives
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn phase_mode(&self) -> PhaseMode {
        self.phase.current_mode()
    }

    pub fn step(&mut self, dt: f32, input: &TickInput) {
        if input.restart && self.game_over {
            self.restart();
        }
        if input.toggle_pause && !self.game_over {
            self.paused = !self.paused;
            self.events.push(RuntimeEvent::PauseToggled {
                paused: self.paused,
            });
        }
        if self.paused || self.game_over {
            return;
        }

        let dt = clamp_frame_dt(dt);
        self.tick_counter += 1;
        self.elapsed += dt;

        if let Some(dir) = input.dir {
            self.player.request_turn(dir);
        }
        self.update_phase(dt);
        self.player.step(&self.maze, dt);

        let remaining_before_pickup = self.maze.pellets_remaining();
        self.resolve_pickups();
        self.update_fruits(dt, remaining_before_pickup);
        self.update_ghosts(dt);

        if self.resolve_ghost_collisions() {
            return;
        }
        self.resolve_fruit_pickup();
        self.check_level_clear();
    }

    /// Score, lives and level go back to their starting values. The high score stays.
    pub fn restart(&mut self) {
        self.maze = self.pristine_maze.clone();
        self.phase = self.pristine_phase.clone();
        self.player = Player::new(self.maze.player_start());
        self.reset_actors();
        self.fruits.clear();
        self.spawned_thresholds.clear();
        self.stats = SessionStats::default();
        self.level = 1;
        self.paused = false;
        self.game_over = false;
        self.tick_counter = 0;
        self.elapsed = 0.0;
        self.events.push(RuntimeEvent::Restarted);
        debug!(high_score = self.high_score, "session restarted");
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            level: self.level,
            score: self.player.score,
            high_score: self.high_score,
            lives: self.player.lives,
            phase: self.phase.current_mode(),
            paused: self.paused,
            game_over: self.game_over,
            pellets_remaining: self.maze.pellets_remaining(),
            player: self.player.view(),
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
            fruits: self.fruits.iter().map(|fruit| fruit.view.clone()).collect(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.player.score,
            high_score: self.high_score,
            level: self.level,
            ticks: self.tick_counter,
            elapsed_seconds: self.elapsed,
            game_over: self.game_over,
            stats: self.stats.clone(),
        }
    }

    fn update_phase(&mut self, dt: f32) {
        let before = self.phase.index();
        let mode = self.phase.advance(dt);
        if self.phase.index() != before {
            debug!(?mode, index = self.phase.index(), "phase changed");
            self.events.push(RuntimeEvent::PhaseChanged { mode });
        }
    }

    fn update_ghosts(&mut self, dt: f32) {
        let player_tile = self.player.actor.tile();
        let player_dir = self.player.actor.dir;
        let phase_mode = self.phase.current_mode();

        for idx in 0..self.ghosts.len() {
            let chaser_tile = self
                .ghosts
                .iter()
                .find(|ghost| ghost.name == GhostName::Blinky)
                .map(|ghost| ghost.actor.tile());
            let ctx = GhostContext {
                player_tile,
                player_dir,
                chaser_tile,
                phase_mode,
            };
            self.ghosts[idx].update(&self.maze, &ctx, dt);
        }
    }

    fn reset_actors(&mut self) {
        self.player.reset_to_spawn();
        let mode = self.phase.current_mode();
        for ghost in &mut self.ghosts {
            ghost.reset_to_spawn(mode);
        }
    }

    fn add_score(&mut self, points: u32) {
        self.player.score = self.player.score.saturating_add(points);
        self.high_score = self.high_score.max(self.player.score);
    }

    fn make_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next_id_counter);
        self.next_id_counter = self.next_id_counter.saturating_add(1);
        id
    }
}
