use super::*;

impl GameEngine {
    /// Ages active fruits, then spawns one for each threshold the remaining
    /// pellet count crossed this tick.
    pub(super) fn update_fruits(&mut self, dt: f32, remaining_before: u32) {
        for fruit in &mut self.fruits {
            fruit.view.remaining -= dt;
        }
        let mut expired = Vec::new();
        self.fruits.retain(|fruit| {
            if fruit.view.remaining > 0.0 {
                return true;
            }
            expired.push(fruit.view.id.clone());
            false
        });
        for fruit_id in expired {
            self.events.push(RuntimeEvent::FruitExpired { fruit_id });
        }

        let remaining = self.maze.pellets_remaining();
        for threshold in BONUS_SPAWN_THRESHOLDS {
            let crossed = remaining_before > threshold && remaining <= threshold;
            if !crossed || self.spawned_thresholds.contains(&threshold) {
                continue;
            }
            self.spawned_thresholds.push(threshold);
            if self.fruits.len() < MAX_ACTIVE_FRUITS {
                self.spawn_fruit();
            }
        }
    }

    pub(super) fn spawn_fruit(&mut self) {
        let tile = self.maze.fruit_tile();
        let kind = fruit_for_level(self.level);
        let view = FruitView {
            id: self.make_id("fruit"),
            kind,
            x: tile.x,
            y: tile.y,
            points: fruit_points(kind),
            remaining: FRUIT_LIFETIME,
        };
        self.events.push(RuntimeEvent::FruitSpawned { fruit: view.clone() });
        self.fruits.push(FruitInternal { view, tile });
    }

    pub(super) fn resolve_fruit_pickup(&mut self) {
        let Some(idx) = self
            .fruits
            .iter()
            .position(|fruit| overlaps_tile(&self.player.actor, fruit.tile))
        else {
            return;
        };
        let fruit = self.fruits.remove(idx);
        self.add_score(fruit.view.points);
        self.stats.fruits += 1;
        self.events.push(RuntimeEvent::FruitTaken {
            fruit_id: fruit.view.id,
            kind: fruit.view.kind,
            points: fruit.view.points,
            score: self.player.score,
        });
    }
}
