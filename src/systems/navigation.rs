//! Direction choice for pursuit agents: bounded breadth-first search with a
//! Manhattan fallback, and flee selection.

use pathfinding::prelude::bfs;
use smallvec::SmallVec;
use tracing::trace;

use crate::map::{builder::Map, direction::Direction, Cell};

/// Directions an entity resting in `cell` may take without reversing `heading`.
///
/// Reversal is offered only when nothing else is open (a dead end). An empty result
/// means the cell has no exits at all.
pub fn legal_directions(map: &Map, cell: Cell, heading: Option<Direction>) -> SmallVec<[Direction; 4]> {
    let exits = map.exits(cell);
    let reverse = heading.map(|d| d.opposite());
    let forward: SmallVec<[Direction; 4]> = exits.directions().filter(|d| Some(*d) != reverse).collect();
    if forward.is_empty() {
        exits.directions().collect()
    } else {
        forward
    }
}

/// The first step of a shortest path from `from` to `target` whose first move is one of `legal`.
///
/// The search expands at most `budget` cells. Returns `None` if the target was not found
/// within budget, is unreachable, or is `from` itself.
pub fn first_step_toward(map: &Map, from: Cell, target: Cell, legal: &[Direction], budget: usize) -> Option<Direction> {
    if legal.is_empty() || from == target {
        return None;
    }

    let mut expanded = 0usize;
    let path = bfs(
        &from,
        |cell: &Cell| -> SmallVec<[Cell; 4]> {
            if expanded >= budget {
                return SmallVec::new();
            }
            expanded += 1;
            if *cell == from {
                legal.iter().map(|d| map.neighbor(from, *d)).collect()
            } else {
                map.successors(*cell)
            }
        },
        |cell| *cell == target,
    )?;

    let next = *path.get(1)?;
    legal.iter().copied().find(|d| map.neighbor(from, *d) == next)
}

/// The legal direction whose next cell is closest to `target` by Manhattan distance.
pub fn closest_direction(map: &Map, from: Cell, target: Cell, legal: &[Direction]) -> Option<Direction> {
    legal
        .iter()
        .copied()
        .min_by_key(|d| map.neighbor(from, *d).manhattan(target))
}

/// The legal direction whose next cell is furthest from `threat` by Manhattan distance.
pub fn flee_direction(map: &Map, from: Cell, threat: Cell, legal: &[Direction]) -> Option<Direction> {
    // `max_by_key` keeps the last maximum; reversing keeps the earliest in direction order.
    legal
        .iter()
        .rev()
        .copied()
        .max_by_key(|d| map.neighbor(from, *d).manhattan(threat))
}

/// Bounded search toward `target`, falling back to the Manhattan-closest legal direction.
pub fn steer_toward(map: &Map, from: Cell, target: Cell, legal: &[Direction], budget: usize) -> Option<Direction> {
    first_step_toward(map, from, target, legal, budget).or_else(|| {
        trace!(%from, %target, budget, "Search gave up; using distance fallback");
        closest_direction(map, from, target, legal)
    })
}
