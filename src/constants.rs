//! This module contains all the constants used by the simulation.

use std::time::Duration;

/// Length of a single simulation step (60 steps per second).
pub const LOOP_TIME: Duration = Duration::from_nanos((1_000_000_000.0 / 60.0) as u64);

/// Upper bound on wall-clock time accepted from one host callback.
///
/// Anything longer (a suspended host, a debugger pause) is truncated rather than replayed.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// The size of each cell, in pixels.
pub const CELL_SIZE: u32 = 16;

/// Scoring and movement rules shared by every level.
pub mod mechanics {
    /// Points for a regular dot.
    pub const DOT_SCORE: u32 = 10;
    /// Points for a power pellet.
    pub const POWER_PELLET_SCORE: u32 = 50;
    /// Rewards for consecutive captures within one power mode activation.
    pub const CAPTURE_TIERS: [u32; 4] = [200, 400, 800, 1600];
    /// Collision threshold as a fraction of [`super::CELL_SIZE`].
    pub const COLLISION_FRACTION: f32 = 0.6;
    /// Maximum number of cells a single search may expand.
    pub const SEARCH_BUDGET: usize = 100;
    /// Speed multiplier applied to vulnerable agents.
    pub const VULNERABLE_SPEED_FACTOR: f32 = 0.5;
    /// Speed multiplier applied to the player while boosting.
    pub const BOOST_MULTIPLIER: f32 = 1.5;
    pub const STARTING_LIVES: u8 = 3;
    pub const MAX_LIVES: u8 = 5;
    /// A life is awarded each time the score crosses a multiple of this value.
    pub const EXTRA_LIFE_SCORE: u32 = 10_000;
}

/// Fixed phase delays, measured in simulation time.
pub mod timing {
    use std::time::Duration;

    /// Non-interactive pause after a life is lost.
    pub const RECOVERY_DELAY: Duration = Duration::from_secs(2);
    /// Pause between clearing a level and starting the next one.
    pub const LEVEL_COMPLETE_PAUSE: Duration = Duration::from_secs(3);
    /// Time a captured agent stays out of play.
    pub const RESPAWN_DELAY: Duration = Duration::from_secs(3);
}

/// An enum representing the different types of tiles on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapTile {
    /// Open path with nothing to collect.
    Empty,
    /// Impassable tile.
    Wall,
    /// A regular dot.
    Dot,
    /// A power pellet.
    PowerPellet,
}

impl MapTile {
    pub fn is_collectible(self) -> bool {
        matches!(self, MapTile::Dot | MapTile::PowerPellet)
    }
}

/// The first built-in board.
///
/// `X` marks the player spawn and `G` the agent spawns; both are open path.
pub const RAW_BOARD: [&str; 21] = [
    "###################",
    "#........#........#",
    "#o##.###.#.###.##o#",
    "#.................#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "####.###.#.###.####",
    "####.#.......#.####",
    "####.#.##G##.#.####",
    "    ...#GGG#...    ",
    "####.#.#####.#.####",
    "####.#.......#.####",
    "####.#.#####.#.####",
    "#........#........#",
    "#.##.###.#.###.##.#",
    "#o.#.....X.....#.o#",
    "##.#.#.#####.#.#.##",
    "#....#...#...#....#",
    "#.######.#.######.#",
    "#.................#",
    "###################",
];

/// The second built-in board, used on alternating levels.
pub const RAW_BOARD_ALT: [&str; 19] = [
    "#####################",
    "#o........#........o#",
    "#.###.###.#.###.###.#",
    "#...................#",
    "###.#.#.#####.#.#.###",
    "#...#.#...#...#.#...#",
    "#.###.###.#.###.###.#",
    "#.....#.......#.....#",
    "#####.#.##G##.#.#####",
    "     ...#GGG#...     ",
    "#####.#.#####.#.#####",
    "#.....#.......#.....#",
    "#.###.#.#####.#.###.#",
    "#...#.....X.....#...#",
    "###.#.###.#.###.#.###",
    "#o....#...#...#....o#",
    "#.######.###.######.#",
    "#...................#",
    "#####################",
];
