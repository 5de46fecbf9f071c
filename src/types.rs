// Core value types shared by the board model, move generator and search

use serde::{Deserialize, Serialize};
use std::fmt;

/// Board edge length
pub const BOARD_SIZE: i8 = 10;

/// Number of cells on the board
pub const CELL_COUNT: usize = (BOARD_SIZE as usize) * (BOARD_SIZE as usize);

/// Pieces owned by each side
pub const PIECES_PER_SIDE: usize = 4;

/// Ordered piece positions of one side; index is piece identity
pub type Pieces = [Square; PIECES_PER_SIDE];

/// 2D coordinate on the board
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Square {
    pub row: i8,
    pub col: i8,
}

impl Square {
    pub const fn new(row: i8, col: i8) -> Self {
        Square { row, col }
    }

    /// True if both coordinates are inside the 10x10 board
    pub fn in_bounds(&self) -> bool {
        (0..BOARD_SIZE).contains(&self.row) && (0..BOARD_SIZE).contains(&self.col)
    }

    /// Row-major cell index; only meaningful for in-bounds squares
    pub fn index(&self) -> usize {
        self.row as usize * BOARD_SIZE as usize + self.col as usize
    }

    pub fn from_index(index: usize) -> Self {
        Square {
            row: (index / BOARD_SIZE as usize) as i8,
            col: (index % BOARD_SIZE as usize) as i8,
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}|{})", self.row, self.col)
    }
}

/// The eight queen-line directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    South,
    North,
    East,
    West,
    SouthEast,
    NorthEast,
    NorthWest,
    SouthWest,
}

impl Direction {
    /// Returns all directions in generation order
    pub fn all() -> [Direction; 8] {
        [
            Direction::South,
            Direction::North,
            Direction::East,
            Direction::West,
            Direction::SouthEast,
            Direction::NorthEast,
            Direction::NorthWest,
            Direction::SouthWest,
        ]
    }

    /// (row, col) step of this direction
    pub fn delta(&self) -> (i8, i8) {
        match self {
            Direction::South => (1, 0),
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
            Direction::SouthEast => (1, 1),
            Direction::NorthEast => (-1, 1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthWest => (1, -1),
        }
    }

    /// Calculates the next square when stepping once in this direction
    pub fn apply(&self, square: &Square) -> Square {
        let (dr, dc) = self.delta();
        Square {
            row: square.row + dr,
            col: square.col + dc,
        }
    }

    /// Direction of the straight or diagonal line from `from` to `to`, if any
    pub fn between(from: Square, to: Square) -> Option<Direction> {
        let dr = (to.row - from.row).signum();
        let dc = (to.col - from.col).signum();
        let straight = from.row == to.row || from.col == to.col;
        let diagonal = (to.row - from.row).abs() == (to.col - from.col).abs();
        if from == to || !(straight || diagonal) {
            return None;
        }
        Direction::all().into_iter().find(|d| d.delta() == (dr, dc))
    }
}

/// Absolute piece colour; White moves first
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn other(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

/// Side relative to the player running a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Own,
    Opponent,
}

impl Side {
    pub fn other(&self) -> Side {
        match self {
            Side::Own => Side::Opponent,
            Side::Opponent => Side::Own,
        }
    }
}

/// One full turn: move a piece, then fire an arrow from its new square
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Play {
    pub source: Square,
    pub destination: Square,
    pub arrow: Square,
}

impl Play {
    pub const fn new(source: Square, destination: Square, arrow: Square) -> Self {
        Play {
            source,
            destination,
            arrow,
        }
    }
}

impl fmt::Display for Play {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} x {}",
            self.source, self.destination, self.arrow
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for index in 0..CELL_COUNT {
            assert_eq!(Square::from_index(index).index(), index);
        }
    }

    #[test]
    fn test_direction_between() {
        let origin = Square::new(4, 4);
        assert_eq!(Direction::between(origin, Square::new(9, 4)), Some(Direction::South));
        assert_eq!(Direction::between(origin, Square::new(0, 8)), Some(Direction::NorthEast));
        assert_eq!(Direction::between(origin, Square::new(5, 6)), None);
        assert_eq!(Direction::between(origin, origin), None);
    }
}
