use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;

use crate::constants::{FRUIT_TILE, MAZE_HEIGHT, MAZE_WIDTH};
use crate::error::ConfigError;
use crate::types::{Direction, GhostName, MazeInit, Vec2};

// Legend:
// '#' wall, '.' pellet, 'o' power pellet, ' ' empty, 'G' ghost house door,
// 'H' ghost house interior, 'S' player start, 'B' 'P' 'I' 'C' ghost spawns.
pub const CLASSIC_LAYOUT: [&str; 31] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "     #.##### ## #####.#     ",
    "     #.##          ##.#     ",
    "     #.## ###HH### ##.#     ",
    "######.## #B G  I# ##.######",
    "      .   #      #   .      ",
    "######.## #C    P# ##.######",
    "     #.## ######## ##.#     ",
    "     #.##          ##.#     ",
    "     #.## ######## ##.#     ",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o..##.......S........##..o#",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
    "                            ",
    "                            ",
    "                            ",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Empty,
    Pellet,
    PowerPellet,
    Door,
    HouseInterior,
}

/// Which cells an actor's collision treats as open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Passage {
    Standard,
    ThroughDoor,
}

/// Textual maze source. Parsed into a fresh [`TileMap`] on every level load.
#[derive(Clone, Debug)]
pub struct MazeBlueprint {
    pub rows: Vec<String>,
    pub fruit_tile: Vec2,
}

impl MazeBlueprint {
    pub fn classic() -> Self {
        Self {
            rows: CLASSIC_LAYOUT.iter().map(|row| row.to_string()).collect(),
            fruit_tile: FRUIT_TILE,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rows: text
                .lines()
                .map(|line| line.trim_end_matches('\r').to_string())
                .collect(),
            fruit_tile: FRUIT_TILE,
        }
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::MazeFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_text(&text))
    }

    pub fn build(&self) -> Result<TileMap, ConfigError> {
        TileMap::parse(&self.rows, self.fruit_tile)
    }
}

#[derive(Clone, Debug)]
pub struct TileMap {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    rows: Vec<String>,
    pellets: BTreeSet<Vec2>,
    power_pellets: BTreeSet<Vec2>,
    tunnel_row: i32,
    player_start: Vec2,
    ghost_spawns: BTreeMap<GhostName, Vec2>,
    door: Vec2,
    return_tile: Vec2,
    fruit_tile: Vec2,
}

impl TileMap {
    /// Rows shorter than the maze width are padded with empty tiles, since
    /// editors tend to strip the trailing spaces of the tunnel row.
    pub fn parse<S: AsRef<str>>(rows: &[S], fruit_tile: Vec2) -> Result<Self, ConfigError> {
        let widest = rows
            .iter()
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0) as i32;
        if rows.len() as i32 != MAZE_HEIGHT || widest > MAZE_WIDTH {
            return Err(ConfigError::Dimensions {
                expected_width: MAZE_WIDTH,
                expected_height: MAZE_HEIGHT,
                width: widest,
                height: rows.len() as i32,
            });
        }

        let mut cells = Vec::with_capacity((MAZE_WIDTH * MAZE_HEIGHT) as usize);
        let mut normalized_rows = Vec::with_capacity(rows.len());
        let mut pellets = BTreeSet::new();
        let mut power_pellets = BTreeSet::new();
        let mut player_start = None;
        let mut ghost_spawns = BTreeMap::new();
        let mut door = None;

        for (y, row) in rows.iter().enumerate() {
            let y = y as i32;
            let mut chars: Vec<char> = row.as_ref().chars().collect();
            chars.resize(MAZE_WIDTH as usize, ' ');
            for (x, ch) in chars.iter().copied().enumerate() {
                let x = x as i32;
                let pos = Vec2 { x, y };
                let cell = match ch {
                    '#' => Cell::Wall,
                    ' ' => Cell::Empty,
                    '.' => {
                        pellets.insert(pos);
                        Cell::Pellet
                    }
                    'o' => {
                        power_pellets.insert(pos);
                        Cell::PowerPellet
                    }
                    'G' => {
                        if door.is_none() {
                            door = Some(pos);
                        }
                        Cell::Door
                    }
                    'H' => Cell::HouseInterior,
                    'S' => {
                        if player_start.replace(pos).is_some() {
                            return Err(ConfigError::DuplicateMarker { ch, x, y });
                        }
                        Cell::Empty
                    }
                    _ => {
                        let Some(name) = GhostName::ALL
                            .into_iter()
                            .find(|name| name.spawn_marker() == ch)
                        else {
                            return Err(ConfigError::UnknownTile { ch, x, y });
                        };
                        if ghost_spawns.insert(name, pos).is_some() {
                            return Err(ConfigError::DuplicateMarker { ch, x, y });
                        }
                        Cell::Empty
                    }
                };
                cells.push(cell);
            }
            normalized_rows.push(chars.into_iter().collect::<String>());
        }

        let player_start = player_start.ok_or(ConfigError::MissingPlayerStart)?;
        for name in GhostName::ALL {
            if !ghost_spawns.contains_key(&name) {
                return Err(ConfigError::MissingGhostSpawn(name));
            }
        }
        let door = door.ok_or(ConfigError::MissingDoor)?;

        let mut map = Self {
            width: MAZE_WIDTH,
            height: MAZE_HEIGHT,
            cells,
            rows: normalized_rows,
            pellets,
            power_pellets,
            tunnel_row: 0,
            player_start,
            ghost_spawns,
            door,
            return_tile: door,
            fruit_tile,
        };

        let reachable = map.reachable_from(player_start);
        let tunnel_rows: Vec<i32> = (0..map.height)
            .filter(|&y| {
                reachable.contains(&Vec2 { x: 0, y })
                    && reachable.contains(&Vec2 { x: map.width - 1, y })
            })
            .collect();
        if tunnel_rows.len() != 1 {
            return Err(ConfigError::TunnelRows(tunnel_rows.len()));
        }
        map.tunnel_row = tunnel_rows[0];
        map.return_tile = map.find_return_tile()?;

        if map.blocks(fruit_tile.x, fruit_tile.y, Passage::Standard)
            || map.is_house(fruit_tile.x, fruit_tile.y)
        {
            return Err(ConfigError::FruitTileBlocked {
                x: fruit_tile.x,
                y: fruit_tile.y,
            });
        }

        Ok(map)
    }

    /// Passable tiles connected to `start` inside the map bounds. Open edge
    /// cells walled off from the playfield never count as tunnel mouths.
    fn reachable_from(&self, start: Vec2) -> BTreeSet<Vec2> {
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(tile) = queue.pop_front() {
            for next in self.passable_neighbors(tile) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// First tile straight above the door that is neither door nor house.
    fn find_return_tile(&self) -> Result<Vec2, ConfigError> {
        let mut y = self.door.y - 1;
        while y >= 0 {
            match self.cell(self.door.x, y) {
                Cell::Wall => break,
                Cell::Door | Cell::HouseInterior => y -= 1,
                _ => return Ok(Vec2 { x: self.door.x, y }),
            }
        }
        Err(ConfigError::NoReturnTile {
            x: self.door.x,
            y: self.door.y,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tunnel_row(&self) -> i32 {
        self.tunnel_row
    }

    pub fn player_start(&self) -> Vec2 {
        self.player_start
    }

    pub fn ghost_spawn(&self, name: GhostName) -> Vec2 {
        self.ghost_spawns
            .get(&name)
            .copied()
            .unwrap_or(self.return_tile)
    }

    pub fn door(&self) -> Vec2 {
        self.door
    }

    pub fn return_tile(&self) -> Vec2 {
        self.return_tile
    }

    pub fn fruit_tile(&self) -> Vec2 {
        self.fruit_tile
    }

    pub fn in_bounds(&self, tx: i32, ty: i32) -> bool {
        tx >= 0 && ty >= 0 && tx < self.width && ty < self.height
    }

    /// Out-of-bounds reads as wall.
    pub fn cell(&self, tx: i32, ty: i32) -> Cell {
        if !self.in_bounds(tx, ty) {
            return Cell::Wall;
        }
        self.cells
            .get((ty * self.width + tx) as usize)
            .copied()
            .unwrap_or(Cell::Wall)
    }

    pub fn is_wall(&self, tx: i32, ty: i32) -> bool {
        self.cell(tx, ty) == Cell::Wall
    }

    pub fn is_door(&self, tx: i32, ty: i32) -> bool {
        self.cell(tx, ty) == Cell::Door
    }

    pub fn is_house(&self, tx: i32, ty: i32) -> bool {
        self.cell(tx, ty) == Cell::HouseInterior
    }

    pub fn is_tunnel(&self, tx: i32, ty: i32) -> bool {
        ty == self.tunnel_row && (tx < 1 || tx > self.width - 2)
    }

    /// Movement-collision predicate. The off-map columns of the tunnel row stay
    /// open so actors can run out to the wrap margin.
    pub fn blocks(&self, tx: i32, ty: i32, passage: Passage) -> bool {
        if ty == self.tunnel_row && (tx < 0 || tx >= self.width) {
            return false;
        }
        match self.cell(tx, ty) {
            Cell::Wall => true,
            Cell::Door => passage != Passage::ThroughDoor,
            _ => false,
        }
    }

    /// In bounds, not a wall, not a door.
    pub fn is_passable(&self, tx: i32, ty: i32) -> bool {
        self.in_bounds(tx, ty) && !self.is_wall(tx, ty) && !self.is_door(tx, ty)
    }

    pub fn passable_neighbors(&self, tile: Vec2) -> impl Iterator<Item = Vec2> + '_ {
        Direction::SEARCH_ORDER
            .into_iter()
            .map(move |dir| tile.offset(dir, 1))
            .filter(move |next| self.is_passable(next.x, next.y))
    }

    pub fn has_pellet(&self, tile: Vec2) -> bool {
        self.pellets.contains(&tile)
    }

    pub fn has_power(&self, tile: Vec2) -> bool {
        self.power_pellets.contains(&tile)
    }

    pub fn remove_pellet(&mut self, tile: Vec2) -> bool {
        self.pellets.remove(&tile)
    }

    pub fn remove_power(&mut self, tile: Vec2) -> bool {
        self.power_pellets.remove(&tile)
    }

    pub fn pellets_remaining(&self) -> u32 {
        (self.pellets.len() + self.power_pellets.len()) as u32
    }

    pub fn pellets(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.pellets.iter().copied()
    }

    pub fn power_pellets(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.power_pellets.iter().copied()
    }

    pub fn to_init(&self) -> MazeInit {
        MazeInit {
            width: self.width,
            height: self.height,
            tiles: self.rows.clone(),
            tunnel_row: self.tunnel_row,
            pellets: self.pellets.iter().map(|p| (p.x, p.y)).collect(),
            power_pellets: self.power_pellets.iter().map(|p| (p.x, p.y)).collect(),
        }
    }
}
