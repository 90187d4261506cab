use super::*;

impl GameEngine {
    /// Eats whatever sits on the player's tile.
    pub(super) fn resolve_pickups(&mut self) {
        let tile = self.player.actor.tile();

        if self.maze.remove_pellet(tile) {
            self.add_score(PELLET_SCORE);
            self.stats.pellets += 1;
            self.events.push(RuntimeEvent::PelletEaten {
                x: tile.x,
                y: tile.y,
                score: self.player.score,
            });
        }

        if self.maze.remove_power(tile) {
            self.add_score(POWER_PELLET_SCORE);
            self.stats.power_pellets += 1;
            self.events.push(RuntimeEvent::PowerPelletEaten {
                x: tile.x,
                y: tile.y,
                score: self.player.score,
            });
            let count = self
                .ghosts
                .iter_mut()
                .map(|ghost| ghost.frighten(POWER_DURATION))
                .filter(|frightened| *frightened)
                .count();
            self.events.push(RuntimeEvent::GhostsFrightened { count });
        }
    }
}
