use bevy_ecs::component::Component;
use glam::Vec2;

use crate::constants::CELL_SIZE;
use crate::map::{builder::Map, direction::Direction, Cell};

/// Grid position of a moving entity.
///
/// Progress is measured in cells: `0` is the source cell, `1` is the target.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum Position {
    /// At rest in `cell`; the entity may choose a new direction.
    Stopped { cell: Cell },
    /// Committed to reaching `to`; no new choice is made until it arrives.
    Moving {
        from: Cell,
        to: Cell,
        direction: Direction,
        progress: f32,
    },
}

impl Position {
    /// Commits an entity resting in `from` to the adjacent cell in `direction`.
    ///
    /// Callers check [`Map::can_move`] first.
    pub fn depart(map: &Map, from: Cell, direction: Direction) -> Self {
        Position::Moving {
            from,
            to: map.neighbor(from, direction),
            direction,
            progress: 0.0,
        }
    }

    /// The cell the entity occupies or is leaving.
    pub fn current_cell(&self) -> Cell {
        match *self {
            Position::Stopped { cell } => cell,
            Position::Moving { from, .. } => from,
        }
    }

    /// The cell the entity is heading into; equal to the current cell while at rest.
    pub fn target_cell(&self) -> Cell {
        match *self {
            Position::Stopped { cell } => cell,
            Position::Moving { to, .. } => to,
        }
    }

    pub fn is_at_rest(&self) -> bool {
        matches!(self, Position::Stopped { .. })
    }

    pub fn progress(&self) -> f32 {
        match *self {
            Position::Stopped { .. } => 0.0,
            Position::Moving { progress, .. } => progress,
        }
    }

    /// Advances along the current move by `delta` cells.
    ///
    /// Returns the unused distance once the target is reached, snapping to rest there.
    /// Returns `None` while still in transit or when already at rest.
    pub fn tick(&mut self, delta: f32) -> Option<f32> {
        match self {
            Position::Stopped { .. } => None,
            Position::Moving { to, progress, .. } => {
                *progress += delta;
                if *progress >= 1.0 {
                    let overflow = *progress - 1.0;
                    *self = Position::Stopped { cell: *to };
                    Some(overflow)
                } else {
                    None
                }
            }
        }
    }

    /// Turns a move around in place, keeping the pixel position unchanged.
    pub fn reverse(&mut self) {
        if let Position::Moving {
            from,
            to,
            direction,
            progress,
        } = *self
        {
            *self = Position::Moving {
                from: to,
                to: from,
                direction: direction.opposite(),
                progress: 1.0 - progress,
            };
        }
    }

    /// Pixel position, interpolated from the source cell centre and wrapped onto the board.
    pub fn pixel_position(&self, map: &Map) -> Vec2 {
        match *self {
            Position::Stopped { cell } => map.cell_center(cell),
            Position::Moving {
                from,
                direction,
                progress,
                ..
            } => {
                let raw = map.cell_center(from) + direction.as_vec2() * (CELL_SIZE as f32 * progress);
                raw.rem_euclid(map.pixel_size())
            }
        }
    }
}

/// Speed in cells per second and the last committed direction.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub speed: f32,
    pub direction: Option<Direction>,
}

/// Pending turn request for the player, applied at the next cell.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferedDirection {
    #[default]
    None,
    Some(Direction),
}

/// Euclidean distance between two pixel positions on the wrapped board.
pub fn wrapped_distance(a: Vec2, b: Vec2, board: Vec2) -> f32 {
    let delta = (a - b).abs();
    delta.min(board - delta).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RAW_BOARD;

    #[test]
    fn test_tick_reports_overflow_on_arrival() {
        let mut position = Position::Moving {
            from: Cell::new(1, 1),
            to: Cell::new(1, 2),
            direction: Direction::Right,
            progress: 0.8,
        };
        assert_eq!(position.tick(0.1), None);
        let overflow = position.tick(0.25).unwrap();
        assert!((overflow - 0.15).abs() < 1e-5);
        assert_eq!(position, Position::Stopped { cell: Cell::new(1, 2) });
    }

    #[test]
    fn test_reverse_keeps_pixel_position() {
        let map = Map::new(&RAW_BOARD).unwrap();
        let mut position = Position::Moving {
            from: Cell::new(1, 1),
            to: Cell::new(1, 2),
            direction: Direction::Right,
            progress: 0.25,
        };
        let before = position.pixel_position(&map);
        position.reverse();
        assert_eq!(position.target_cell(), Cell::new(1, 1));
        assert!(position.pixel_position(&map).distance(before) < 1e-3);
    }

    #[test]
    fn test_pixel_position_wraps_through_tunnel() {
        let map = Map::new(&RAW_BOARD).unwrap();
        let position = Position::Moving {
            from: Cell::new(9, 0),
            to: Cell::new(9, 18),
            direction: Direction::Left,
            progress: 0.75,
        };
        let pixel = position.pixel_position(&map);
        assert!(pixel.x > map.pixel_size().x - CELL_SIZE as f32);
        assert_eq!(pixel.y, map.cell_center(Cell::new(9, 0)).y);
    }

    #[test]
    fn test_wrapped_distance_across_edge() {
        let board = Vec2::new(100.0, 100.0);
        let d = wrapped_distance(Vec2::new(2.0, 50.0), Vec2::new(98.0, 50.0), board);
        assert!((d - 4.0).abs() < 1e-5);
    }
}
