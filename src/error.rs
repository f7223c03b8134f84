//! Centralized error types for the simulation.
//!
//! Only level loading and host misuse can fail. Runtime anomalies inside a tick
//! are handled locally and logged, never surfaced as errors.

use crate::map::Cell;

/// Main error type for the simulation.
///
/// This is the primary error type that should be used in public APIs.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Map parsing error: {0}")]
    MapParse(#[from] ParseError),

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Error type for map parsing operations.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown character in board: {0:?}")]
    UnknownCharacter(char),
    #[error("Board has no rows")]
    EmptyBoard,
    #[error("Row {row} has {found} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("Board has no player spawn")]
    MissingPlayerSpawn,
    #[error("Board must have exactly 1 player spawn, found {0}")]
    MultiplePlayerSpawns(usize),
    #[error("Board has no agent spawns")]
    MissingAgentSpawn,
    #[error("Board {axis} of {found} cells exceeds the maximum of {}", u16::MAX)]
    TooLarge { axis: &'static str, found: usize },
}

/// Errors related to map validation after parsing.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MapError {
    #[error("Collectible at {0} cannot be reached from the player spawn")]
    UnreachableCollectible(Cell),

    #[error("Board has no dots or power pellets to collect")]
    NoCollectibles,
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;
