//! Breadth-first search over the tile grid.
//!
//! Searches are pure: they take a passability predicate and never read or
//! mutate anything else, so the same inputs always give the same path.

use std::collections::{HashMap, VecDeque};

use crate::types::{Direction, Vec2};

/// Full path from `start` to `goal`, both inclusive. `None` when the goal is
/// unreachable or not itself passable. `start == goal` yields `[start]`.
pub fn find_path<F>(start: Vec2, goal: Vec2, passable: F) -> Option<Vec<Vec2>>
where
    F: Fn(Vec2) -> bool,
{
    if start == goal {
        return Some(vec![start]);
    }
    if !passable(goal) {
        return None;
    }

    let mut came_from: HashMap<Vec2, Vec2> = HashMap::new();
    let mut queue = VecDeque::new();
    came_from.insert(start, start);
    queue.push_back(start);

    while let Some(tile) = queue.pop_front() {
        if tile == goal {
            break;
        }
        for dir in Direction::SEARCH_ORDER {
            let next = tile.offset(dir, 1);
            if came_from.contains_key(&next) || !passable(next) {
                continue;
            }
            came_from.insert(next, tile);
            queue.push_back(next);
        }
    }

    if !came_from.contains_key(&goal) {
        return None;
    }

    let mut path = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        cursor = *came_from.get(&cursor)?;
        path.push(cursor);
    }
    path.reverse();
    Some(path)
}

/// First tile to step onto when walking from `start` toward `goal`.
/// Returns `start` itself when already there or when no route exists.
pub fn next_step<F>(start: Vec2, goal: Vec2, passable: F) -> Vec2
where
    F: Fn(Vec2) -> bool,
{
    match find_path(start, goal, passable) {
        Some(path) if path.len() >= 2 => path[1],
        _ => start,
    }
}

/// Direction of the first step on the shortest route from `start` to any tile
/// matching `is_goal`. Ties go to the tile discovered first in search order.
pub fn first_step_to_nearest<F, G>(start: Vec2, passable: F, is_goal: G) -> Option<Direction>
where
    F: Fn(Vec2) -> bool,
    G: Fn(Vec2) -> bool,
{
    let mut first_dir: HashMap<Vec2, Direction> = HashMap::new();
    let mut queue = VecDeque::new();

    for dir in Direction::SEARCH_ORDER {
        let next = start.offset(dir, 1);
        if next == start || first_dir.contains_key(&next) || !passable(next) {
            continue;
        }
        first_dir.insert(next, dir);
        queue.push_back(next);
    }

    while let Some(tile) = queue.pop_front() {
        let dir = first_dir.get(&tile).copied()?;
        if is_goal(tile) {
            return Some(dir);
        }
        for step in Direction::SEARCH_ORDER {
            let next = tile.offset(step, 1);
            if next == start || first_dir.contains_key(&next) || !passable(next) {
                continue;
            }
            first_dir.insert(next, dir);
            queue.push_back(next);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{MazeBlueprint, TileMap};

    fn classic() -> TileMap {
        MazeBlueprint::classic()
            .build()
            .expect("classic layout parses")
    }

    fn open_grid(width: i32, height: i32) -> impl Fn(Vec2) -> bool {
        move |tile: Vec2| tile.x >= 0 && tile.y >= 0 && tile.x < width && tile.y < height
    }

    #[test]
    fn same_start_and_goal_is_a_single_tile_path() {
        let start = Vec2::new(2, 2);
        assert_eq!(find_path(start, start, open_grid(5, 5)), Some(vec![start]));
        assert_eq!(next_step(start, start, open_grid(5, 5)), start);
    }

    #[test]
    fn path_is_shortest_and_contiguous() {
        let map = classic();
        let start = map.player_start();
        let goal = Vec2::new(1, 1);
        let path = find_path(start, goal, |t| map.is_passable(t.x, t.y)).expect("route exists");

        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1);
            assert!(map.is_passable(pair[1].x, pair[1].y));
        }
        assert!(path.len() as i32 - 1 >= start.manhattan(goal));
    }

    #[test]
    fn ties_follow_search_order() {
        // From (0,0) to (1,1) both (1,0) and (0,1) are valid first steps; +x wins.
        let step = next_step(Vec2::new(0, 0), Vec2::new(1, 1), open_grid(3, 3));
        assert_eq!(step, Vec2::new(1, 0));
    }

    #[test]
    fn unreachable_goal_returns_start() {
        let map = classic();
        let start = map.player_start();
        let wall = Vec2::new(0, 0);
        assert_eq!(find_path(start, wall, |t| map.is_passable(t.x, t.y)), None);
        assert_eq!(next_step(start, wall, |t| map.is_passable(t.x, t.y)), start);

        // Column 2 splits the grid in two.
        let walled_off = |t: Vec2| open_grid(5, 5)(t) && t.x != 2;
        assert_eq!(next_step(Vec2::new(0, 0), Vec2::new(4, 4), walled_off), Vec2::new(0, 0));
    }

    #[test]
    fn search_is_repeatable() {
        let map = classic();
        let passable = |t: Vec2| map.is_passable(t.x, t.y);
        let a = find_path(Vec2::new(1, 26), Vec2::new(26, 1), passable);
        let b = find_path(Vec2::new(1, 26), Vec2::new(26, 1), passable);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn nearest_goal_direction_is_reported() {
        let passable = open_grid(7, 1);
        let dir = first_step_to_nearest(Vec2::new(3, 0), passable, |t| t.x == 0 || t.x == 5);
        assert_eq!(dir, Some(Direction::Right));

        let dir = first_step_to_nearest(Vec2::new(3, 0), open_grid(7, 1), |t| t.x == 0);
        assert_eq!(dir, Some(Direction::Left));

        let dir = first_step_to_nearest(Vec2::new(3, 0), open_grid(7, 1), |_| false);
        assert_eq!(dir, None);
    }
}
