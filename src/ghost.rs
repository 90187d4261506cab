use crate::constants::{
    scatter_corner, AMBUSH_LOOKAHEAD, EATEN_SPEED_MULTIPLIER, FLANK_LOOKAHEAD,
    FRIGHTENED_FLASH_WINDOW, FRIGHTENED_SPEED, GHOST_SPEED, MAX_MOVE_SEGMENTS, SHY_GHOST_RADIUS,
    TUNNEL_SPEED,
};
use crate::maze::{Passage, TileMap};
use crate::movement::Actor;
use crate::pathfinding::next_step;
use crate::types::{Direction, GhostMode, GhostName, GhostView, PhaseMode, Vec2};

const ALIGN_EPSILON: f32 = 1e-4;

/// Read-only view of the world a ghost steers by, rebuilt before each ghost's update.
#[derive(Clone, Copy, Debug)]
pub struct GhostContext {
    pub player_tile: Vec2,
    pub player_dir: Direction,
    /// Live tile of the direct chaser, for the flanker.
    pub chaser_tile: Option<Vec2>,
    pub phase_mode: PhaseMode,
}

/// Target tile for a ghost in Scatter or Chase.
pub fn target_tile(
    name: GhostName,
    mode: PhaseMode,
    ghost_tile: Vec2,
    corner: Vec2,
    ctx: &GhostContext,
) -> Vec2 {
    if mode == PhaseMode::Scatter {
        return corner;
    }
    let player = ctx.player_tile;
    match name {
        GhostName::Blinky => player,
        GhostName::Pinky => player.offset(ctx.player_dir, AMBUSH_LOOKAHEAD),
        GhostName::Inky => {
            let Some(chaser) = ctx.chaser_tile else {
                return player;
            };
            let reference = player.offset(ctx.player_dir, FLANK_LOOKAHEAD);
            Vec2 {
                x: reference.x + (reference.x - chaser.x),
                y: reference.y + (reference.y - chaser.y),
            }
        }
        GhostName::Clyde => {
            if ghost_tile.manhattan(player) > SHY_GHOST_RADIUS {
                player
            } else {
                corner
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ghost {
    pub name: GhostName,
    pub actor: Actor,
    pub mode: GhostMode,
    pub fright_remaining: f32,
    corner: Vec2,
    spawn: Vec2,
    return_tile: Vec2,
}

impl Ghost {
    pub fn new(name: GhostName, spawn: Vec2, return_tile: Vec2, phase_mode: PhaseMode) -> Self {
        Self {
            name,
            actor: Actor::at_tile(spawn, GHOST_SPEED),
            mode: phase_mode.into(),
            fright_remaining: 0.0,
            corner: scatter_corner(name),
            spawn,
            return_tile,
        }
    }

    pub fn spawn(&self) -> Vec2 {
        self.spawn
    }

    /// No-op returning false for an Eaten ghost.
    pub fn frighten(&mut self, duration: f32) -> bool {
        if self.mode == GhostMode::Eaten {
            return false;
        }
        self.mode = GhostMode::Frightened;
        self.fright_remaining = duration;
        true
    }

    /// Only a Frightened ghost can be eaten.
    pub fn mark_eaten(&mut self) -> bool {
        if self.mode != GhostMode::Frightened {
            return false;
        }
        self.mode = GhostMode::Eaten;
        self.fright_remaining = 0.0;
        true
    }

    pub fn is_flashing(&self) -> bool {
        self.mode == GhostMode::Frightened && self.fright_remaining <= FRIGHTENED_FLASH_WINDOW
    }

    pub fn is_dangerous(&self) -> bool {
        matches!(self.mode, GhostMode::Scatter | GhostMode::Chase)
    }

    pub fn reset_to_spawn(&mut self, phase_mode: PhaseMode) {
        self.actor = Actor::at_tile(self.spawn, GHOST_SPEED);
        self.mode = phase_mode.into();
        self.fright_remaining = 0.0;
    }

    /// Tunnel tiles slow every mode, Eaten included.
    pub fn current_speed(&self, maze: &TileMap) -> f32 {
        let tile = self.actor.tile();
        if maze.is_tunnel(tile.x, tile.y) {
            return TUNNEL_SPEED;
        }
        match self.mode {
            GhostMode::Eaten => GHOST_SPEED * EATEN_SPEED_MULTIPLIER,
            GhostMode::Frightened => FRIGHTENED_SPEED,
            GhostMode::Scatter | GhostMode::Chase => GHOST_SPEED,
        }
    }

    fn passage(&self) -> Passage {
        if self.mode == GhostMode::Eaten {
            Passage::ThroughDoor
        } else {
            Passage::Standard
        }
    }

    pub fn update(&mut self, maze: &TileMap, ctx: &GhostContext, dt: f32) {
        match self.mode {
            GhostMode::Frightened => {
                self.fright_remaining -= dt;
                if self.fright_remaining <= 0.0 {
                    self.fright_remaining = 0.0;
                    self.mode = ctx.phase_mode.into();
                }
            }
            GhostMode::Eaten => {}
            GhostMode::Scatter | GhostMode::Chase => self.mode = ctx.phase_mode.into(),
        }

        self.actor.speed = self.current_speed(maze);
        let mut remaining = self.actor.speed * dt;
        let mut safety = 0;
        while remaining > 1e-6 && safety < MAX_MOVE_SEGMENTS {
            safety += 1;
            let tile = self.actor.tile();
            if self.mode == GhostMode::Eaten
                && tile == self.return_tile
                && self.actor.is_at_tile_center()
            {
                self.actor.snap_to_center();
                self.mode = ctx.phase_mode.into();
                self.actor.speed = self.current_speed(maze);
                break;
            }

            let next = self.choose_next_tile(maze, ctx, tile);
            remaining -= self.move_toward(maze, tile, next, remaining);
        }
    }

    fn choose_next_tile(&self, maze: &TileMap, ctx: &GhostContext, tile: Vec2) -> Vec2 {
        let passable = |t: Vec2| maze.is_passable(t.x, t.y);
        match self.mode {
            GhostMode::Frightened => {
                let mut best = tile;
                let mut best_distance = -1;
                for neighbor in maze.passable_neighbors(tile) {
                    let distance = neighbor.manhattan(ctx.player_tile);
                    if distance > best_distance {
                        best = neighbor;
                        best_distance = distance;
                    }
                }
                best
            }
            GhostMode::Eaten => next_step(tile, self.return_tile, passable),
            GhostMode::Scatter | GhostMode::Chase => {
                let mode = if self.mode == GhostMode::Scatter {
                    PhaseMode::Scatter
                } else {
                    PhaseMode::Chase
                };
                let goal = target_tile(self.name, mode, tile, self.corner, ctx);
                next_step(tile, goal, passable)
            }
        }
    }

    /// Moves toward `next`'s center, first lining up with the current tile's
    /// center on the other axis. `next == tile` settles on the center and holds.
    /// Returns the distance consumed.
    fn move_toward(&mut self, maze: &TileMap, tile: Vec2, next: Vec2, budget: f32) -> f32 {
        let (cx, cy) = tile.center();
        let off_x = cx - self.actor.x;
        let off_y = cy - self.actor.y;
        let dir = Direction::from_delta(next.x - tile.x, next.y - tile.y);

        let (settle_dir, settle_distance) = if dir.is_horizontal() {
            (Direction::from_delta(0, signum(off_y)), off_y.abs())
        } else if dir.is_vertical() || off_x.abs() > ALIGN_EPSILON {
            (Direction::from_delta(signum(off_x), 0), off_x.abs())
        } else {
            (Direction::from_delta(0, signum(off_y)), off_y.abs())
        };
        if settle_distance > ALIGN_EPSILON {
            let travel = budget.min(settle_distance);
            self.actor.dir = settle_dir;
            self.actor.advance(maze, self.passage(), travel);
            return travel;
        }

        if dir == Direction::None {
            self.actor.snap_to_center();
            self.actor.dir = Direction::None;
            return budget;
        }

        let (nx, ny) = next.center();
        let distance = if dir.is_horizontal() {
            (nx - self.actor.x).abs()
        } else {
            (ny - self.actor.y).abs()
        };
        let travel = budget.min(distance);
        self.actor.dir = dir;
        self.actor.advance(maze, self.passage(), travel);
        travel
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            name: self.name,
            x: self.actor.x,
            y: self.actor.y,
            dir: self.actor.dir,
            mode: self.mode,
            fright_remaining: self.fright_remaining.max(0.0),
            flashing: self.is_flashing(),
        }
    }
}

fn signum(value: f32) -> i32 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{POWER_DURATION, TICK_SECONDS};
    use crate::maze::MazeBlueprint;
    use crate::pathfinding::find_path;

    fn classic() -> TileMap {
        MazeBlueprint::classic()
            .build()
            .expect("classic layout parses")
    }

    fn ctx(player_tile: Vec2, player_dir: Direction, phase_mode: PhaseMode) -> GhostContext {
        GhostContext {
            player_tile,
            player_dir,
            chaser_tile: None,
            phase_mode,
        }
    }

    fn ghost_at(maze: &TileMap, name: GhostName, tile: Vec2, mode: PhaseMode) -> Ghost {
        let mut ghost = Ghost::new(name, maze.ghost_spawn(name), maze.return_tile(), mode);
        ghost.actor = Actor::at_tile(tile, GHOST_SPEED);
        ghost
    }

    #[test]
    fn scatter_overrides_identity() {
        let c = ctx(Vec2::new(10, 10), Direction::Left, PhaseMode::Scatter);
        for name in GhostName::ALL {
            let corner = scatter_corner(name);
            assert_eq!(
                target_tile(name, PhaseMode::Scatter, Vec2::new(3, 3), corner, &c),
                corner
            );
        }
    }

    #[test]
    fn chase_targets_follow_identity() {
        let mut c = ctx(Vec2::new(10, 10), Direction::Left, PhaseMode::Chase);
        let corner = Vec2::new(1, 1);

        assert_eq!(
            target_tile(GhostName::Blinky, PhaseMode::Chase, Vec2::new(3, 3), corner, &c),
            Vec2::new(10, 10)
        );
        assert_eq!(
            target_tile(GhostName::Pinky, PhaseMode::Chase, Vec2::new(3, 3), corner, &c),
            Vec2::new(6, 10)
        );

        // Without the chaser the flanker aims at the player.
        assert_eq!(
            target_tile(GhostName::Inky, PhaseMode::Chase, Vec2::new(3, 3), corner, &c),
            Vec2::new(10, 10)
        );
        c.chaser_tile = Some(Vec2::new(9, 12));
        // ref = (8,10); target = ref + (ref - chaser) = (7,8)
        assert_eq!(
            target_tile(GhostName::Inky, PhaseMode::Chase, Vec2::new(3, 3), corner, &c),
            Vec2::new(7, 8)
        );

        assert_eq!(
            target_tile(GhostName::Clyde, PhaseMode::Chase, Vec2::new(1, 1), corner, &c),
            Vec2::new(10, 10)
        );
        assert_eq!(
            target_tile(GhostName::Clyde, PhaseMode::Chase, Vec2::new(8, 9), corner, &c),
            corner
        );
    }

    #[test]
    fn scatter_corners_are_reachable_from_the_house_exit() {
        let maze = classic();
        assert_eq!(scatter_corner(GhostName::Blinky), Vec2::new(25, 1));
        assert_eq!(scatter_corner(GhostName::Pinky), Vec2::new(2, 1));
        for name in GhostName::ALL {
            let corner = scatter_corner(name);
            let path = find_path(maze.return_tile(), corner, |t| maze.is_passable(t.x, t.y));
            assert!(path.is_some(), "{name:?} corner is unreachable");
        }
    }

    #[test]
    fn frighten_is_noop_for_eaten_ghost() {
        let maze = classic();
        let mut ghost = ghost_at(&maze, GhostName::Blinky, Vec2::new(6, 5), PhaseMode::Chase);

        assert!(ghost.frighten(POWER_DURATION));
        assert_eq!(ghost.mode, GhostMode::Frightened);
        assert_eq!(ghost.fright_remaining, POWER_DURATION);

        assert!(ghost.mark_eaten());
        assert_eq!(ghost.mode, GhostMode::Eaten);
        assert!(!ghost.frighten(POWER_DURATION));
        assert_eq!(ghost.mode, GhostMode::Eaten);
        assert_eq!(ghost.fright_remaining, 0.0);
    }

    #[test]
    fn mark_eaten_requires_frightened() {
        let maze = classic();
        let mut ghost = ghost_at(&maze, GhostName::Pinky, Vec2::new(6, 5), PhaseMode::Scatter);
        assert!(!ghost.mark_eaten());
        assert_eq!(ghost.mode, GhostMode::Scatter);
    }

    #[test]
    fn frightened_ghost_flees_and_reverts_to_phase_mode() {
        let maze = classic();
        let mut ghost = ghost_at(&maze, GhostName::Blinky, Vec2::new(6, 5), PhaseMode::Scatter);
        ghost.frighten(0.1);
        let c = ctx(Vec2::new(7, 5), Direction::Left, PhaseMode::Chase);

        ghost.update(&maze, &c, TICK_SECONDS);
        assert_eq!(ghost.actor.dir, Direction::Left);
        assert!(ghost.actor.x < 6.5);
        assert_eq!(ghost.mode, GhostMode::Frightened);

        for _ in 0..10 {
            ghost.update(&maze, &c, TICK_SECONDS);
        }
        assert_eq!(ghost.mode, GhostMode::Chase);
        assert_eq!(ghost.fright_remaining, 0.0);
    }

    #[test]
    fn flashing_covers_the_last_seconds_of_fright() {
        let maze = classic();
        let mut ghost = ghost_at(&maze, GhostName::Inky, Vec2::new(6, 5), PhaseMode::Chase);
        ghost.frighten(POWER_DURATION);
        assert!(!ghost.is_flashing());
        ghost.fright_remaining = FRIGHTENED_FLASH_WINDOW - 0.1;
        assert!(ghost.is_flashing());
        assert!(ghost.view().flashing);
    }

    #[test]
    fn speed_table_is_tunnel_adjusted_for_every_mode() {
        let maze = classic();
        let open = Vec2::new(6, 5);
        let tunnel = Vec2::new(0, maze.tunnel_row());
        let table = [
            (GhostMode::Scatter, GHOST_SPEED),
            (GhostMode::Chase, GHOST_SPEED),
            (GhostMode::Frightened, FRIGHTENED_SPEED),
            (GhostMode::Eaten, GHOST_SPEED * EATEN_SPEED_MULTIPLIER),
        ];
        for (mode, open_speed) in table {
            let mut ghost = ghost_at(&maze, GhostName::Blinky, open, PhaseMode::Scatter);
            ghost.mode = mode;
            assert_eq!(ghost.current_speed(&maze), open_speed, "{mode:?} in the open");

            ghost.actor = Actor::at_tile(tunnel, GHOST_SPEED);
            assert_eq!(ghost.current_speed(&maze), TUNNEL_SPEED, "{mode:?} in the tunnel");
        }
    }

    #[test]
    fn eaten_ghost_slows_down_in_the_tunnel() {
        let maze = classic();
        let tunnel = Vec2::new(0, maze.tunnel_row());
        let mut ghost = ghost_at(&maze, GhostName::Blinky, tunnel, PhaseMode::Chase);
        ghost.frighten(POWER_DURATION);
        assert_eq!(ghost.current_speed(&maze), TUNNEL_SPEED);
        assert!(ghost.mark_eaten());
        assert_eq!(ghost.current_speed(&maze), TUNNEL_SPEED);

        let c = ctx(maze.player_start(), Direction::None, PhaseMode::Chase);
        ghost.update(&maze, &c, TICK_SECONDS);
        assert_eq!(ghost.actor.speed, TUNNEL_SPEED);
    }

    #[test]
    fn eaten_ghost_returns_home_and_revives() {
        let maze = classic();
        let mut ghost = ghost_at(&maze, GhostName::Clyde, Vec2::new(6, 5), PhaseMode::Chase);
        ghost.frighten(POWER_DURATION);
        assert!(ghost.mark_eaten());
        assert_eq!(ghost.current_speed(&maze), GHOST_SPEED * EATEN_SPEED_MULTIPLIER);

        let c = ctx(Vec2::new(6, 5), Direction::None, PhaseMode::Scatter);
        let mut ticks = 0;
        while ghost.mode == GhostMode::Eaten && ticks < 600 {
            ghost.update(&maze, &c, TICK_SECONDS);
            ticks += 1;
        }
        assert_eq!(ghost.mode, GhostMode::Scatter);
        assert_eq!(ghost.actor.tile(), maze.return_tile());
    }

    #[test]
    fn unreachable_target_holds_position() {
        let maze = classic();
        let mut ghost = ghost_at(&maze, GhostName::Blinky, Vec2::new(6, 5), PhaseMode::Chase);
        // The player tile reads as a wall, so there is no route.
        let c = ctx(Vec2::new(0, 0), Direction::None, PhaseMode::Chase);
        for _ in 0..30 {
            ghost.update(&maze, &c, TICK_SECONDS);
        }
        assert_eq!(ghost.actor.tile(), Vec2::new(6, 5));
        assert!((ghost.actor.x - 6.5).abs() < 1e-4);
        assert!((ghost.actor.y - 5.5).abs() < 1e-4);
    }

    #[test]
    fn chasing_ghost_closes_distance() {
        let maze = classic();
        let mut ghost = ghost_at(&maze, GhostName::Blinky, Vec2::new(1, 1), PhaseMode::Chase);
        let player = Vec2::new(6, 5);
        let c = ctx(player, Direction::None, PhaseMode::Chase);
        let start_distance = ghost.actor.tile().manhattan(player);
        for _ in 0..60 {
            ghost.update(&maze, &c, TICK_SECONDS);
        }
        assert!(ghost.actor.tile().manhattan(player) < start_distance);
    }

    #[test]
    fn ghost_leaves_the_house() {
        let maze = classic();
        let mut ghost = Ghost::new(
            GhostName::Blinky,
            maze.ghost_spawn(GhostName::Blinky),
            maze.return_tile(),
            PhaseMode::Scatter,
        );
        let c = ctx(maze.player_start(), Direction::None, PhaseMode::Scatter);
        for _ in 0..240 {
            ghost.update(&maze, &c, TICK_SECONDS);
        }
        assert!(ghost.actor.tile().y < 11);
    }
}
