use crate::constants::{ACTOR_BOX_SIZE, CENTER_EPSILON, TUNNEL_WRAP_MARGIN};
use crate::maze::{Passage, TileMap};
use crate::types::{Direction, Vec2};

/// Continuous position in tile units. Tile `(tx, ty)` spans `[tx, tx + 1)`,
/// with its center at `tx + 0.5`.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub speed: f32,
}

impl Actor {
    pub fn at_tile(tile: Vec2, speed: f32) -> Self {
        let (x, y) = tile.center();
        Self {
            x,
            y,
            dir: Direction::None,
            speed,
        }
    }

    pub fn tile(&self) -> Vec2 {
        Vec2 {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
        }
    }

    pub fn is_at_tile_center(&self) -> bool {
        let (cx, cy) = self.tile().center();
        (self.x - cx).abs() <= CENTER_EPSILON && (self.y - cy).abs() <= CENTER_EPSILON
    }

    pub fn snap_to_center(&mut self) {
        let (cx, cy) = self.tile().center();
        self.x = cx;
        self.y = cy;
    }

    /// Distance along `dir` to the next tile center strictly ahead. A center
    /// within epsilon counts as already reached.
    pub fn distance_to_next_center(&self) -> f32 {
        match self.dir {
            Direction::Right => next_center_ahead(self.x) - self.x,
            Direction::Left => self.x - next_center_behind(self.x),
            Direction::Down => next_center_ahead(self.y) - self.y,
            Direction::Up => self.y - next_center_behind(self.y),
            Direction::None => 0.0,
        }
    }

    /// Moves `distance` along the current direction, resolving each axis against
    /// the tile ahead. Returns true when the move was cut short by a blocked tile,
    /// in which case the actor rests on its tile center with `dir` cleared.
    pub fn advance(&mut self, maze: &TileMap, passage: Passage, distance: f32) -> bool {
        let (dx, dy) = self.dir.delta();
        let tile = self.tile();
        let (cx, cy) = tile.center();
        let mut blocked = false;

        if dx != 0 {
            let candidate = self.x + dx as f32 * distance;
            let passes_center = if dx > 0 { candidate > cx } else { candidate < cx };
            if passes_center && maze.blocks(tile.x + dx, tile.y, passage) {
                self.x = cx;
                blocked = true;
            } else {
                self.x = candidate;
            }
        }

        if dy != 0 {
            let candidate = self.y + dy as f32 * distance;
            let passes_center = if dy > 0 { candidate > cy } else { candidate < cy };
            if passes_center && maze.blocks(tile.x, tile.y + dy, passage) {
                self.y = cy;
                blocked = true;
            } else {
                self.y = candidate;
            }
        }

        if blocked {
            self.dir = Direction::None;
        }
        self.wrap_tunnel(maze);
        blocked
    }

    /// Teleports to the mirrored margin once past either edge of the tunnel row.
    pub fn wrap_tunnel(&mut self, maze: &TileMap) {
        if self.tile().y != maze.tunnel_row() {
            return;
        }
        let width = maze.width() as f32;
        if self.x < -TUNNEL_WRAP_MARGIN {
            self.x = width + TUNNEL_WRAP_MARGIN;
        } else if self.x > width + TUNNEL_WRAP_MARGIN {
            self.x = -TUNNEL_WRAP_MARGIN;
        }
    }

    pub fn overlaps(&self, other: &Actor) -> bool {
        (self.x - other.x).abs() < ACTOR_BOX_SIZE && (self.y - other.y).abs() < ACTOR_BOX_SIZE
    }

    pub fn can_enter(&self, maze: &TileMap, dir: Direction, passage: Passage) -> bool {
        if dir == Direction::None {
            return false;
        }
        let next = self.tile().offset(dir, 1);
        !maze.blocks(next.x, next.y, passage)
    }
}

fn next_center_ahead(v: f32) -> f32 {
    (v - 0.5 + CENTER_EPSILON).floor() + 1.5
}

fn next_center_behind(v: f32) -> f32 {
    (v - 0.5 - CENTER_EPSILON).ceil() - 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::MazeBlueprint;

    fn classic() -> TileMap {
        MazeBlueprint::classic()
            .build()
            .expect("classic layout parses")
    }

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn distance_to_next_center_skips_current_center() {
        let mut actor = Actor::at_tile(Vec2::new(3, 5), 6.0);
        actor.dir = Direction::Right;
        assert!(approx_eq(actor.distance_to_next_center(), 1.0, 1e-4));
        actor.dir = Direction::Up;
        assert!(approx_eq(actor.distance_to_next_center(), 1.0, 1e-4));

        actor.x = 3.8;
        actor.dir = Direction::Right;
        assert!(approx_eq(actor.distance_to_next_center(), 0.7, 1e-4));
        actor.dir = Direction::Left;
        assert!(approx_eq(actor.distance_to_next_center(), 0.3, 1e-4));
    }

    #[test]
    fn wall_ahead_clamps_to_center_and_clears_direction() {
        let maze = classic();
        // (1,1) has a wall on its left.
        let mut actor = Actor::at_tile(Vec2::new(1, 1), 6.0);
        actor.x = 1.7;
        actor.dir = Direction::Left;

        assert!(!actor.advance(&maze, Passage::Standard, 0.1));
        assert!(approx_eq(actor.x, 1.6, 1e-4));

        assert!(actor.advance(&maze, Passage::Standard, 0.5));
        assert!(approx_eq(actor.x, 1.5, 1e-4));
        assert_eq!(actor.dir, Direction::None);
    }

    #[test]
    fn open_tile_ahead_lets_actor_cross_center() {
        let maze = classic();
        let mut actor = Actor::at_tile(Vec2::new(1, 1), 6.0);
        actor.dir = Direction::Right;
        assert!(!actor.advance(&maze, Passage::Standard, 0.8));
        assert!(approx_eq(actor.x, 2.3, 1e-4));
        assert_eq!(actor.tile(), Vec2::new(2, 1));
    }

    #[test]
    fn door_blocks_unless_passage_allows() {
        let maze = classic();
        // (13,12) sits directly above the door.
        let mut actor = Actor::at_tile(Vec2::new(13, 12), 5.0);
        actor.dir = Direction::Down;
        assert!(actor.advance(&maze, Passage::Standard, 0.6));
        assert_eq!(actor.tile(), Vec2::new(13, 12));

        actor.dir = Direction::Down;
        assert!(!actor.advance(&maze, Passage::ThroughDoor, 0.6));
        assert_eq!(actor.tile(), Vec2::new(13, 13));
    }

    #[test]
    fn tunnel_wrap_round_trip_preserves_row_and_direction() {
        let maze = classic();
        let row = maze.tunnel_row();
        let mut actor = Actor::at_tile(Vec2::new(0, row), 2.5);
        actor.dir = Direction::Left;

        let mut wrapped = false;
        for _ in 0..10 {
            actor.advance(&maze, Passage::Standard, 0.2);
            if actor.x > maze.width() as f32 {
                wrapped = true;
                break;
            }
        }
        assert!(wrapped);
        assert!(approx_eq(actor.x, maze.width() as f32 + TUNNEL_WRAP_MARGIN, 1e-4));
        assert_eq!(actor.dir, Direction::Left);
        assert_eq!(actor.tile().y, row);

        actor.dir = Direction::Right;
        actor.advance(&maze, Passage::Standard, 0.2);
        assert!(approx_eq(actor.x, -TUNNEL_WRAP_MARGIN, 1e-4));
        assert_eq!(actor.dir, Direction::Right);
    }

    #[test]
    fn overlap_uses_box_size() {
        let a = Actor::at_tile(Vec2::new(5, 5), 6.0);
        let mut b = Actor::at_tile(Vec2::new(5, 5), 5.0);
        b.x += 0.69;
        assert!(a.overlaps(&b));
        b.x += 0.02;
        assert!(!a.overlaps(&b));
    }
}
