//! Map parsing functionality for converting raw board layouts into structured data.

use smallvec::SmallVec;

use crate::constants::MapTile;
use crate::error::ParseError;
use crate::map::Cell;

/// Represents the parsed data from a raw board layout.
#[derive(Debug, Clone)]
pub struct ParsedMap {
    pub width: u16,
    pub height: u16,
    /// Row-major tile layout.
    pub tiles: Vec<MapTile>,
    pub player_spawn: Cell,
    /// Agent spawns in reading order.
    pub agent_spawns: SmallVec<[Cell; 4]>,
}

/// Parser for converting raw board layouts into structured map data.
pub struct MapTileParser;

impl MapTileParser {
    /// Parses a single character into a map tile.
    ///
    /// Spawn markers parse to [`MapTile::Empty`]; [`parse_board`](Self::parse_board) records their positions.
    pub fn parse_character(c: char) -> Result<MapTile, ParseError> {
        match c {
            '#' => Ok(MapTile::Wall),
            '.' => Ok(MapTile::Dot),
            'o' => Ok(MapTile::PowerPellet),
            ' ' => Ok(MapTile::Empty),
            'X' => Ok(MapTile::Empty), // Player spawn
            'G' => Ok(MapTile::Empty), // Agent spawn
            _ => Err(ParseError::UnknownCharacter(c)),
        }
    }

    /// Parses a raw board layout into structured map data.
    ///
    /// # Errors
    ///
    /// Returns an error if the board is empty or ragged, contains unknown characters,
    /// or does not have exactly one player spawn and at least one agent spawn.
    pub fn parse_board<S: AsRef<str>>(raw_board: &[S]) -> Result<ParsedMap, ParseError> {
        let width = raw_board.first().map(|row| row.as_ref().chars().count()).unwrap_or(0);
        if width == 0 {
            return Err(ParseError::EmptyBoard);
        }
        let board_width = Self::dimension("width", width)?;
        let board_height = Self::dimension("height", raw_board.len())?;

        let mut tiles = Vec::with_capacity(width * raw_board.len());
        let mut player_spawns: SmallVec<[Cell; 1]> = SmallVec::new();
        let mut agent_spawns = SmallVec::new();

        for (row, line) in raw_board.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(ParseError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }

            for (col, character) in line.chars().enumerate() {
                tiles.push(Self::parse_character(character)?);

                // Both indices are bounded by the dimensions checked above.
                let cell = Cell::new(row as u16, col as u16);
                match character {
                    'X' => player_spawns.push(cell),
                    'G' => agent_spawns.push(cell),
                    _ => {}
                }
            }
        }

        let player_spawn = match player_spawns.as_slice() {
            [] => return Err(ParseError::MissingPlayerSpawn),
            [cell] => *cell,
            many => return Err(ParseError::MultiplePlayerSpawns(many.len())),
        };
        if agent_spawns.is_empty() {
            return Err(ParseError::MissingAgentSpawn);
        }

        Ok(ParsedMap {
            width: board_width,
            height: board_height,
            tiles,
            player_spawn,
            agent_spawns,
        })
    }

    fn dimension(axis: &'static str, found: usize) -> Result<u16, ParseError> {
        u16::try_from(found).map_err(|_| ParseError::TooLarge { axis, found })
    }
}
