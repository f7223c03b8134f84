//! Map construction and building functionality.

use std::collections::HashSet;

use bevy_ecs::resource::Resource;
use bitflags::bitflags;
use glam::Vec2;
use pathfinding::prelude::bfs_reach;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::constants::{MapTile, CELL_SIZE};
use crate::error::{GameResult, MapError};
use crate::map::direction::Direction;
use crate::map::parser::{MapTileParser, ParsedMap};
use crate::map::Cell;

bitflags! {
    /// The set of directions an entity may leave a cell in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Exits: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl Exits {
    pub fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::Up => Exits::UP,
            Direction::Down => Exits::DOWN,
            Direction::Left => Exits::LEFT,
            Direction::Right => Exits::RIGHT,
        }
    }

    pub fn allows(self, direction: Direction) -> bool {
        self.contains(Self::from_direction(direction))
    }

    /// Open directions in [`Direction::DIRECTIONS`] order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::DIRECTIONS.into_iter().filter(move |d| self.allows(*d))
    }
}

/// The immutable maze for one level.
///
/// Both axes wrap: leaving the grid on one edge enters it on the opposite edge of the
/// same row or column, so tunnels are simply open edge cells.
#[derive(Resource, Debug, Clone)]
pub struct Map {
    width: u16,
    height: u16,
    tiles: Vec<MapTile>,
    exits: Vec<Exits>,
    player_spawn: Cell,
    agent_spawns: SmallVec<[Cell; 4]>,
    /// Open cells nearest to the top-left, top-right, bottom-right and bottom-left corners.
    corners: [Cell; 4],
}

impl Map {
    /// Creates a new `Map` from a raw board layout.
    ///
    /// # Errors
    ///
    /// Fails if the layout does not parse, has nothing to collect, or if any collectible is
    /// unreachable from the player spawn.
    pub fn new<S: AsRef<str>>(raw_board: &[S]) -> GameResult<Map> {
        let parsed = MapTileParser::parse_board(raw_board)?;
        Self::from_parsed(parsed)
    }

    pub fn from_parsed(parsed: ParsedMap) -> GameResult<Map> {
        let ParsedMap {
            width,
            height,
            tiles,
            player_spawn,
            agent_spawns,
        } = parsed;

        let mut map = Map {
            width,
            height,
            tiles,
            exits: Vec::new(),
            player_spawn,
            agent_spawns,
            corners: [Cell::default(); 4],
        };

        map.exits = map
            .cells()
            .map(|cell| {
                if map.is_wall(cell) {
                    return Exits::empty();
                }
                let exits = Direction::DIRECTIONS
                    .into_iter()
                    .filter(|d| !map.is_wall(map.neighbor(cell, *d)))
                    .fold(Exits::empty(), |acc, d| acc | Exits::from_direction(d));
                if exits.is_empty() {
                    warn!(%cell, "Open cell has no exits; anything placed here cannot move");
                }
                exits
            })
            .collect();

        let max_row = height - 1;
        let max_col = width - 1;
        map.corners = [
            map.nearest_open(Cell::new(0, 0)),
            map.nearest_open(Cell::new(0, max_col)),
            map.nearest_open(Cell::new(max_row, max_col)),
            map.nearest_open(Cell::new(max_row, 0)),
        ];

        let collectibles = map.tiles.iter().filter(|tile| tile.is_collectible()).count();
        if collectibles == 0 {
            return Err(MapError::NoCollectibles.into());
        }
        map.validate_reachability()?;

        debug!(width, height, agents = map.agent_spawns.len(), collectibles, "Map built");

        Ok(map)
    }

    fn validate_reachability(&self) -> Result<(), MapError> {
        let reachable: HashSet<Cell> = bfs_reach(self.player_spawn, |cell| self.successors(*cell)).collect();
        match self
            .cells()
            .find(|cell| self.tile(*cell).is_collectible() && !reachable.contains(cell))
        {
            Some(cell) => Err(MapError::UnreachableCollectible(cell)),
            None => Ok(()),
        }
    }

    fn nearest_open(&self, target: Cell) -> Cell {
        self.cells()
            .filter(|cell| !self.is_wall(*cell))
            .min_by_key(|cell| cell.manhattan(target))
            .unwrap_or(self.player_spawn)
    }

    fn index(&self, cell: Cell) -> usize {
        cell.row as usize * self.width as usize + cell.col as usize
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |col| Cell::new(row, col)))
    }

    /// Out-of-range cells read as walls.
    pub fn tile(&self, cell: Cell) -> MapTile {
        if !self.contains(cell) {
            return MapTile::Wall;
        }
        self.tiles[self.index(cell)]
    }

    pub fn is_wall(&self, cell: Cell) -> bool {
        self.tile(cell) == MapTile::Wall
    }

    /// The adjacent cell in `direction`, wrapping around the grid edges.
    pub fn neighbor(&self, cell: Cell, direction: Direction) -> Cell {
        let offset = direction.as_ivec2();
        let row = (i32::from(cell.row) + offset.y).rem_euclid(i32::from(self.height));
        let col = (i32::from(cell.col) + offset.x).rem_euclid(i32::from(self.width));
        Cell::new(row as u16, col as u16)
    }

    pub fn exits(&self, cell: Cell) -> Exits {
        if !self.contains(cell) {
            return Exits::empty();
        }
        self.exits[self.index(cell)]
    }

    pub fn can_move(&self, cell: Cell, direction: Direction) -> bool {
        self.exits(cell).allows(direction)
    }

    /// Open neighbouring cells, in [`Direction::DIRECTIONS`] order.
    pub fn successors(&self, cell: Cell) -> SmallVec<[Cell; 4]> {
        self.exits(cell).directions().map(|d| self.neighbor(cell, d)).collect()
    }

    /// The pixel centre of a cell.
    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        (Vec2::new(f32::from(cell.col), f32::from(cell.row)) + 0.5) * CELL_SIZE as f32
    }

    /// The board's extent in pixels.
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(f32::from(self.width), f32::from(self.height)) * CELL_SIZE as f32
    }

    pub fn player_spawn(&self) -> Cell {
        self.player_spawn
    }

    pub fn agent_spawns(&self) -> &[Cell] {
        &self.agent_spawns
    }

    /// The scatter target for the agent at `index`.
    pub fn corner(&self, index: usize) -> Cell {
        self.corners[index % self.corners.len()]
    }
}
