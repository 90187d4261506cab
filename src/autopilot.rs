//! Seeded bot that drives the player for the batch simulator and the
//! server's attract mode. Reads the session, never mutates it.

use crate::engine::GameEngine;
use crate::maze::Passage;
use crate::pathfinding::first_step_to_nearest;
use crate::rng::Rng;
use crate::types::{Direction, GhostMode, Vec2};

const THINK_MIN_TICKS: i32 = 4;
const THINK_MAX_TICKS: i32 = 10;
const DANGER_RADIUS: i32 = 4;
const HUNT_RADIUS: i32 = 6;
const WANDER_CHANCE: f32 = 0.02;

#[derive(Clone, Debug)]
pub struct Autopilot {
    rng: Rng,
    think_in: i32,
}

impl Autopilot {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: Rng::new(seed),
            think_in: 0,
        }
    }

    /// A fresh steering intent on thinking ticks, `None` in between.
    pub fn decide(&mut self, engine: &GameEngine) -> Option<Direction> {
        if engine.is_game_over() || engine.is_paused() {
            return None;
        }
        if self.think_in > 0 {
            self.think_in -= 1;
            return None;
        }
        self.think_in = self.rng.int(THINK_MIN_TICKS, THINK_MAX_TICKS);

        let maze = engine.maze();
        let tile = engine.player().actor.tile();
        let walkable = |t: Vec2| !maze.blocks(t.x, t.y, Passage::Standard) && maze.in_bounds(t.x, t.y);

        let threat = engine
            .ghosts()
            .iter()
            .filter(|ghost| ghost.is_dangerous())
            .map(|ghost| ghost.actor.tile())
            .min_by_key(|ghost_tile| ghost_tile.manhattan(tile));
        if let Some(threat) = threat {
            if threat.manhattan(tile) <= DANGER_RADIUS {
                return self.escape_direction(engine, tile);
            }
        }

        let prey = engine
            .ghosts()
            .iter()
            .filter(|ghost| ghost.mode == GhostMode::Frightened && !ghost.is_flashing())
            .map(|ghost| ghost.actor.tile())
            .filter(|ghost_tile| ghost_tile.manhattan(tile) <= HUNT_RADIUS)
            .min_by_key(|ghost_tile| ghost_tile.manhattan(tile));
        if let Some(prey) = prey {
            if let Some(dir) = first_step_to_nearest(tile, walkable, |t| t == prey) {
                return Some(dir);
            }
        }

        if self.rng.chance(WANDER_CHANCE) {
            let options: Vec<Direction> = Direction::SEARCH_ORDER
                .into_iter()
                .filter(|dir| walkable(tile.offset(*dir, 1)))
                .collect();
            if !options.is_empty() {
                let pick = self.rng.int(0, options.len() as i32 - 1) as usize;
                return options.get(pick).copied();
            }
        }

        let fruits: Vec<Vec2> = engine.fruit_tiles().collect();
        first_step_to_nearest(tile, walkable, |t| {
            maze.has_pellet(t) || maze.has_power(t) || fruits.contains(&t)
        })
    }

    fn escape_direction(&mut self, engine: &GameEngine, tile: Vec2) -> Option<Direction> {
        let maze = engine.maze();
        let mut best = None;
        let mut best_score = f32::NEG_INFINITY;
        for dir in Direction::SEARCH_ORDER {
            let next = tile.offset(dir, 1);
            if !maze.in_bounds(next.x, next.y) || maze.blocks(next.x, next.y, Passage::Standard) {
                continue;
            }
            let distance = engine
                .ghosts()
                .iter()
                .filter(|ghost| ghost.is_dangerous())
                .map(|ghost| ghost.actor.tile().manhattan(next))
                .min()
                .unwrap_or(99);
            let score = distance as f32 + self.rng.next_f32() * 0.4;
            if score > best_score {
                best_score = score;
                best = Some(dir);
            }
        }
        best
    }
}
