use crate::constants::{MAX_MOVE_SEGMENTS, PLAYER_SPEED, STARTING_LIVES, TUNNEL_SPEED};
use crate::maze::{Passage, TileMap};
use crate::movement::Actor;
use crate::types::{Direction, PlayerView, Vec2};

/// Buffered turn intent. A pending turn survives until it can be taken at a
/// tile center or is replaced by a newer request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnBuffer {
    Idle,
    Pending(Direction),
}

impl TurnBuffer {
    pub fn pending(self) -> Option<Direction> {
        match self {
            Self::Idle => None,
            Self::Pending(dir) => Some(dir),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub actor: Actor,
    pub turn: TurnBuffer,
    pub lives: u32,
    pub score: u32,
    spawn: Vec2,
}

impl Player {
    pub fn new(spawn: Vec2) -> Self {
        Self {
            actor: Actor::at_tile(spawn, PLAYER_SPEED),
            turn: TurnBuffer::Idle,
            lives: STARTING_LIVES,
            score: 0,
            spawn,
        }
    }

    /// `Direction::None` clears the buffer.
    pub fn request_turn(&mut self, dir: Direction) {
        self.turn = match dir {
            Direction::None => TurnBuffer::Idle,
            dir => TurnBuffer::Pending(dir),
        };
    }

    pub fn reset_to_spawn(&mut self) {
        self.actor = Actor::at_tile(self.spawn, PLAYER_SPEED);
        self.turn = TurnBuffer::Idle;
    }

    pub fn current_speed(&self, maze: &TileMap) -> f32 {
        let tile = self.actor.tile();
        if maze.is_tunnel(tile.x, tile.y) {
            TUNNEL_SPEED
        } else {
            self.actor.speed
        }
    }

    /// Commits the pending turn when the actor sits on a tile center and the
    /// tile in that direction is open. Returns whether a turn was taken.
    fn try_commit_turn(&mut self, maze: &TileMap) -> bool {
        let TurnBuffer::Pending(dir) = self.turn else {
            return false;
        };
        if !self.actor.is_at_tile_center() {
            return false;
        }
        if !self.actor.can_enter(maze, dir, Passage::Standard) {
            return false;
        }
        self.actor.snap_to_center();
        self.actor.dir = dir;
        self.turn = TurnBuffer::Idle;
        true
    }

    pub fn step(&mut self, maze: &TileMap, dt: f32) {
        let mut remaining = self.current_speed(maze) * dt;
        let mut segments = 0;

        while segments < MAX_MOVE_SEGMENTS {
            segments += 1;
            if self.actor.is_at_tile_center() {
                self.actor.snap_to_center();
                self.try_commit_turn(maze);
            }
            if self.actor.dir == Direction::None || remaining <= 0.0 {
                break;
            }

            let travel = remaining.min(self.actor.distance_to_next_center());
            self.actor.advance(maze, Passage::Standard, travel);
            remaining -= travel;
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.actor.x,
            y: self.actor.y,
            dir: self.actor.dir,
            pending: self.turn.pending(),
            lives: self.lives,
            score: self.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TICK_SECONDS;
    use crate::maze::MazeBlueprint;

    fn classic() -> TileMap {
        MazeBlueprint::classic()
            .build()
            .expect("classic layout parses")
    }

    fn run(player: &mut Player, maze: &TileMap, ticks: usize) {
        for _ in 0..ticks {
            player.step(maze, TICK_SECONDS);
        }
    }

    #[test]
    fn pending_turn_waits_for_an_opening() {
        let maze = classic();
        let mut player = Player::new(maze.player_start());
        player.request_turn(Direction::Right);
        run(&mut player, &maze, 1);
        assert_eq!(player.actor.dir, Direction::Right);
        assert_eq!(player.turn, TurnBuffer::Idle);

        // Above (14,22) is a wall; the first opening upward is column 15.
        player.request_turn(Direction::Up);
        run(&mut player, &maze, 3);
        assert_eq!(player.actor.dir, Direction::Right);
        assert_eq!(player.turn, TurnBuffer::Pending(Direction::Up));

        run(&mut player, &maze, 20);
        assert_eq!(player.actor.dir, Direction::Up);
        assert_eq!(player.actor.tile().x, 15);
        assert_eq!(player.turn, TurnBuffer::Idle);
    }

    #[test]
    fn rejected_turn_keeps_current_direction() {
        let maze = classic();
        let mut player = Player::new(maze.player_start());
        player.request_turn(Direction::Left);
        run(&mut player, &maze, 1);
        assert_eq!(player.actor.dir, Direction::Left);

        // Below (12,22) is a wall.
        player.request_turn(Direction::Down);
        run(&mut player, &maze, 2);
        assert_eq!(player.actor.dir, Direction::Left);
        assert_eq!(player.turn, TurnBuffer::Pending(Direction::Down));
    }

    #[test]
    fn runs_into_wall_and_stops_on_center() {
        let maze = classic();
        let mut player = Player::new(Vec2::new(3, 1));
        player.request_turn(Direction::Left);
        run(&mut player, &maze, 60);
        assert_eq!(player.actor.tile(), Vec2::new(1, 1));
        assert_eq!(player.actor.dir, Direction::None);
        assert!((player.actor.x - 1.5).abs() < 1e-4);
        assert!((player.actor.y - 1.5).abs() < 1e-4);
    }

    #[test]
    fn fast_step_does_not_skip_turn_points() {
        let maze = classic();
        let mut player = Player::new(Vec2::new(1, 5));
        player.request_turn(Direction::Right);
        player.step(&maze, TICK_SECONDS);
        // Column 6 is the first junction with an opening downward.
        player.request_turn(Direction::Down);
        for _ in 0..20 {
            player.step(&maze, 0.05);
        }
        assert_eq!(player.actor.dir, Direction::Down);
        assert_eq!(player.actor.tile().x, 6);
    }

    #[test]
    fn tunnel_slows_the_player() {
        let maze = classic();
        let mut player = Player::new(Vec2::new(0, maze.tunnel_row()));
        assert_eq!(player.current_speed(&maze), TUNNEL_SPEED);
        player.actor.x = 10.5;
        assert_eq!(player.current_speed(&maze), PLAYER_SPEED);
    }

    #[test]
    fn reset_to_spawn_clears_motion_and_buffer() {
        let maze = classic();
        let mut player = Player::new(maze.player_start());
        player.request_turn(Direction::Right);
        run(&mut player, &maze, 10);
        player.request_turn(Direction::Up);
        player.score = 120;
        player.lives = 2;

        player.reset_to_spawn();
        assert_eq!(player.actor.tile(), maze.player_start());
        assert_eq!(player.actor.dir, Direction::None);
        assert_eq!(player.turn, TurnBuffer::Idle);
        assert_eq!(player.score, 120);
        assert_eq!(player.lives, 2);
    }
}
