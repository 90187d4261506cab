use super::*;

impl GameEngine {
    /// Player against each ghost in roster order. Returns true when a life was
    /// lost, which ends the tick.
    pub(super) fn resolve_ghost_collisions(&mut self) -> bool {
        for idx in 0..self.ghosts.len() {
            if !self.player.actor.overlaps(&self.ghosts[idx].actor) {
                continue;
            }
            match self.ghosts[idx].mode {
                GhostMode::Frightened => {
                    if self.ghosts[idx].mark_eaten() {
                        self.add_score(GHOST_EAT_SCORE);
                        self.stats.ghosts_eaten += 1;
                        self.events.push(RuntimeEvent::GhostEaten {
                            ghost: self.ghosts[idx].name,
                            score: self.player.score,
                        });
                    }
                }
                GhostMode::Eaten => {}
                GhostMode::Scatter | GhostMode::Chase => {
                    self.lose_life();
                    return true;
                }
            }
        }
        false
    }

    fn lose_life(&mut self) {
        self.player.lives = self.player.lives.saturating_sub(1);
        self.stats.lives_lost += 1;
        self.events.push(RuntimeEvent::LifeLost {
            lives: self.player.lives,
        });
        debug!(lives = self.player.lives, level = self.level, "life lost");

        if self.player.lives == 0 {
            self.game_over = true;
            self.events.push(RuntimeEvent::GameOver {
                score: self.player.score,
                level: self.level,
            });
            debug!(score = self.player.score, level = self.level, "game over");
            return;
        }
        self.reset_actors();
    }

    pub(super) fn check_level_clear(&mut self) {
        if self.maze.pellets_remaining() > 0 {
            return;
        }
        self.level += 1;
        self.maze = self.pristine_maze.clone();
        self.phase = self.pristine_phase.clone();
        self.reset_actors();
        self.fruits.clear();
        self.spawned_thresholds.clear();
        self.events.push(RuntimeEvent::LevelAdvanced { level: self.level });
        debug!(level = self.level, score = self.player.score, "level advanced");
    }
}
