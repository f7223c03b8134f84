use bevy_ecs::resource::Resource;

use crate::constants::MapTile;
use crate::map::builder::Map;
use crate::map::Cell;

/// Tracks which collectibles of the current level are still on the board.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct DotOverlay {
    width: u16,
    /// Row-major; `Some` while the collectible is still present.
    cells: Vec<Option<MapTile>>,
    remaining: u32,
    total: u32,
}

impl DotOverlay {
    pub fn from_map(map: &Map) -> Self {
        let cells: Vec<Option<MapTile>> = map
            .cells()
            .map(|cell| Some(map.tile(cell)).filter(|tile| tile.is_collectible()))
            .collect();
        let total = cells.iter().flatten().count() as u32;

        Self {
            width: map.width(),
            cells,
            remaining: total,
            total,
        }
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.col >= self.width {
            return None;
        }
        let index = cell.row as usize * self.width as usize + cell.col as usize;
        (index < self.cells.len()).then_some(index)
    }

    /// The collectible still present at `cell`, if any.
    pub fn get(&self, cell: Cell) -> Option<MapTile> {
        self.index(cell).and_then(|index| self.cells[index])
    }

    /// Removes and returns the collectible at `cell`.
    pub fn consume(&mut self, cell: Cell) -> Option<MapTile> {
        let index = self.index(cell)?;
        let tile = self.cells[index].take()?;
        self.remaining -= 1;
        Some(tile)
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn collected(&self) -> u32 {
        self.total - self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RAW_BOARD;

    #[test]
    fn test_overlay_counts_collectibles() {
        let map = Map::new(&RAW_BOARD).unwrap();
        let overlay = DotOverlay::from_map(&map);
        assert_eq!(overlay.total(), 176);
        assert_eq!(overlay.remaining(), 176);
        assert!(!overlay.is_exhausted());
    }

    #[test]
    fn test_consume_only_once() {
        let map = Map::new(&RAW_BOARD).unwrap();
        let mut overlay = DotOverlay::from_map(&map);

        assert_eq!(overlay.consume(Cell::new(1, 1)), Some(MapTile::Dot));
        assert_eq!(overlay.consume(Cell::new(1, 1)), None);
        assert_eq!(overlay.consume(Cell::new(2, 1)), Some(MapTile::PowerPellet));
        assert_eq!(overlay.consume(Cell::new(0, 0)), None);
        assert_eq!(overlay.remaining(), 174);
        assert_eq!(overlay.collected(), 2);
    }
}
