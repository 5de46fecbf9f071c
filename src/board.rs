// Board model: passability bitmap, search snapshots and the driver-facing game field
//
// The evaluator and move generator only distinguish "passable" from "blocked";
// pieces and arrows are both blocked cells. `Board` and `Position` are `Copy`
// values so every search branch works on its own snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, EngineResult};
use crate::movegen;
use crate::types::{Color, Direction, Pieces, Play, Side, Square, BOARD_SIZE, CELL_COUNT};

const CELL_MASK: u128 = (1u128 << CELL_COUNT) - 1;

/// 10x10 occupancy bitmap; bit `row * 10 + col` set means blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    blocked: u128,
}

impl Board {
    /// Creates a board with every cell empty
    pub fn empty() -> Self {
        Board { blocked: 0 }
    }

    /// Creates a board from raw occupancy bits; bits above cell 99 are dropped
    pub fn from_bits(bits: u128) -> Self {
        Board {
            blocked: bits & CELL_MASK,
        }
    }

    /// Creates a board with the given squares blocked
    pub fn with_blocked<I: IntoIterator<Item = Square>>(squares: I) -> Self {
        let mut board = Board::empty();
        for square in squares {
            board.block(square);
        }
        board
    }

    pub fn bits(&self) -> u128 {
        self.blocked
    }

    /// True if the square is on the board and not blocked
    pub fn is_passable(&self, square: Square) -> bool {
        square.in_bounds() && self.blocked & (1u128 << square.index()) == 0
    }

    /// True if the square is on the board and blocked
    pub fn is_blocked(&self, square: Square) -> bool {
        square.in_bounds() && self.blocked & (1u128 << square.index()) != 0
    }

    pub fn block(&mut self, square: Square) {
        if square.in_bounds() {
            self.blocked |= 1u128 << square.index();
        }
    }

    pub fn clear(&mut self, square: Square) {
        if square.in_bounds() {
            self.blocked &= !(1u128 << square.index());
        }
    }

    pub fn blocked_count(&self) -> u32 {
        self.blocked.count_ones()
    }

    /// Returns a copy with the play applied: source vacated, destination and arrow blocked
    pub fn with_play(&self, play: &Play) -> Board {
        let mut board = *self;
        board.clear(play.source);
        board.block(play.destination);
        board.block(play.arrow);
        board
    }
}

/// Search snapshot: board plus both ordered piece lists, seen from one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub board: Board,
    pub own: Pieces,
    pub opponent: Pieces,
}

impl Position {
    pub fn new(board: Board, own: Pieces, opponent: Pieces) -> Self {
        Position {
            board,
            own,
            opponent,
        }
    }

    pub fn pieces(&self, side: Side) -> &Pieces {
        match side {
            Side::Own => &self.own,
            Side::Opponent => &self.opponent,
        }
    }

    /// Returns a new position with the play applied
    ///
    /// The moved piece is located by its pre-move square in either list. A
    /// source found in neither list means move generation and application
    /// disagree, which is reported instead of producing a wrong score.
    pub fn apply(&self, play: &Play) -> EngineResult<Position> {
        crate::profile!("apply_play", {
            let mut next = *self;
            next.board = self.board.with_play(play);

            if let Some(slot) = next.own.iter_mut().find(|s| **s == play.source) {
                *slot = play.destination;
            } else if let Some(slot) = next.opponent.iter_mut().find(|s| **s == play.source) {
                *slot = play.destination;
            } else {
                return Err(EngineError::InternalInconsistency {
                    play: *play,
                    source_square: play.source,
                });
            }
            Ok(next)
        })
    }
}

/// Game state as the driver sees it: piece lists per colour plus fired arrows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameField {
    pub white: Pieces,
    pub black: Pieces,
    pub arrows: Vec<Square>,
}

impl Default for GameField {
    fn default() -> Self {
        GameField::new()
    }
}

impl GameField {
    /// Creates the canonical starting position
    pub fn new() -> Self {
        GameField {
            white: [
                Square::new(6, 0),
                Square::new(9, 3),
                Square::new(9, 6),
                Square::new(6, 9),
            ],
            black: [
                Square::new(3, 0),
                Square::new(0, 3),
                Square::new(0, 6),
                Square::new(3, 9),
            ],
            arrows: Vec::new(),
        }
    }

    pub fn pieces(&self, color: Color) -> &Pieces {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn pieces_mut(&mut self, color: Color) -> &mut Pieces {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Occupancy board with all pieces and arrows blocked
    pub fn board(&self) -> Board {
        Board::with_blocked(
            self.white
                .iter()
                .chain(self.black.iter())
                .chain(self.arrows.iter())
                .copied(),
        )
    }

    /// Search snapshot from `color`'s point of view
    pub fn position(&self, color: Color) -> Position {
        Position::new(
            self.board(),
            *self.pieces(color),
            *self.pieces(color.other()),
        )
    }

    /// Returns the colour and piece index standing on `square`, if any
    pub fn piece_at(&self, square: Square) -> Option<(Color, usize)> {
        [Color::White, Color::Black].into_iter().find_map(|color| {
            self.pieces(color)
                .iter()
                .position(|s| *s == square)
                .map(|index| (color, index))
        })
    }

    /// Reports whether `color` has at least one legal play
    pub fn can_move(&self, color: Color) -> bool {
        movegen::has_any_play(self.pieces(color), &self.board())
    }

    /// Checks that `to` lies on an unobstructed queen line from `from`
    pub fn is_clear_line(board: &Board, from: Square, to: Square) -> bool {
        if !from.in_bounds() || !to.in_bounds() {
            return false;
        }
        let direction = match Direction::between(from, to) {
            Some(direction) => direction,
            None => return false,
        };
        let mut current = direction.apply(&from);
        loop {
            if !board.is_passable(current) {
                return false;
            }
            if current == to {
                return true;
            }
            current = direction.apply(&current);
        }
    }

    /// Moves piece `piece` of `color` to `destination` and fires at `arrow`
    ///
    /// Legality is checked independently of the move generator. The field is
    /// left untouched when the move is rejected.
    pub fn apply_move(
        &mut self,
        color: Color,
        piece: usize,
        destination: Square,
        arrow: Square,
    ) -> EngineResult<()> {
        let illegal = |reason: String| EngineError::IllegalMove {
            color,
            piece,
            reason,
        };

        let source = *self
            .pieces(color)
            .get(piece)
            .ok_or_else(|| illegal(format!("no piece with index {}", piece)))?;

        let board = self.board();
        if !Self::is_clear_line(&board, source, destination) {
            return Err(illegal(format!(
                "{} is not reachable from {}",
                destination, source
            )));
        }

        let mut after_move = board;
        after_move.clear(source);
        after_move.block(destination);
        if !Self::is_clear_line(&after_move, destination, arrow) {
            return Err(illegal(format!(
                "arrow target {} is not reachable from {}",
                arrow, destination
            )));
        }

        self.pieces_mut(color)[piece] = destination;
        self.arrows.push(arrow);
        Ok(())
    }

    /// Applies a play given by squares, locating the piece by its source square
    pub fn apply_play(&mut self, color: Color, play: &Play) -> EngineResult<()> {
        let piece = self
            .pieces(color)
            .iter()
            .position(|s| *s == play.source)
            .ok_or_else(|| EngineError::IllegalMove {
                color,
                piece: usize::MAX,
                reason: format!("no {} piece on {}", color.as_str(), play.source),
            })?;
        self.apply_move(color, piece, play.destination, play.arrow)
    }
}

impl fmt::Display for GameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIZE {
            let mut line = String::new();
            for col in 0..BOARD_SIZE {
                let square = Square::new(row, col);
                let cell = match self.piece_at(square) {
                    Some((Color::White, index)) => format!("w{}", index),
                    Some((Color::Black, index)) => format!("b{}", index),
                    None if self.arrows.contains(&square) => "X ".to_string(),
                    None => format!("{}{}", row, col),
                };
                line.push_str(&cell);
                if col + 1 < BOARD_SIZE {
                    line.push(' ');
                }
            }
            if row + 1 < BOARD_SIZE {
                writeln!(f, "{}", line)?;
            } else {
                write!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_block_and_clear() {
        let mut board = Board::empty();
        let square = Square::new(4, 7);
        assert!(board.is_passable(square));
        board.block(square);
        assert!(board.is_blocked(square));
        assert_eq!(board.blocked_count(), 1);
        board.clear(square);
        assert!(board.is_passable(square));
        assert!(!board.is_passable(Square::new(10, 0)));
    }

    #[test]
    fn test_position_apply_moves_opponent_piece() {
        let field = GameField::new();
        let position = field.position(Color::White);
        let play = Play::new(Square::new(3, 0), Square::new(3, 5), Square::new(4, 5));
        let next = position.apply(&play).expect("source is an opponent piece");
        assert_eq!(next.opponent[0], Square::new(3, 5));
        assert_eq!(next.own, position.own);
        assert!(next.board.is_passable(Square::new(3, 0)));
        assert!(next.board.is_blocked(Square::new(4, 5)));
        // original snapshot is untouched
        assert!(position.board.is_blocked(Square::new(3, 0)));
    }

    #[test]
    fn test_render_starting_field() {
        let rendered = GameField::new().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 10);
        assert!(lines[0].starts_with("00 01 02 b1"));
        assert!(lines[6].starts_with("w0 61"));
    }
}
