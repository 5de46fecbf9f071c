// Legal move generation
//
// Destinations are produced by walking each of the eight queen lines in
// `Direction::all()` order. Plays are the cross product of piece moves and
// arrow shots from the new square, in piece order then direction order.

use crate::board::Board;
use crate::types::{Direction, Play, Square};

/// Enumerates every queen-line destination reachable from `source`
///
/// `ignore` is treated as passable even when blocked; it models the piece's
/// own vacated origin when computing arrow targets.
pub fn possible_destinations(source: Square, board: &Board, ignore: Option<Square>) -> Vec<Square> {
    let mut destinations = Vec::new();
    for direction in Direction::all() {
        let mut current = direction.apply(&source);
        while current.in_bounds() && (board.is_passable(current) || Some(current) == ignore) {
            destinations.push(current);
            current = direction.apply(&current);
        }
    }
    destinations
}

/// Enumerates all full plays (move plus arrow) for the given pieces
pub fn enumerate_plays(pieces: &[Square], board: &Board) -> Vec<Play> {
    crate::profile!("move_gen", {
        let mut plays = Vec::new();
        for &piece in pieces {
            for destination in possible_destinations(piece, board, None) {
                // the piece now stands on `destination`, which still reads as empty
                let mut after_move = *board;
                after_move.block(destination);
                for arrow in possible_destinations(destination, &after_move, Some(piece)) {
                    plays.push(Play::new(piece, destination, arrow));
                }
            }
        }
        plays
    })
}

/// Counts plays without materialising them
pub fn count_plays(pieces: &[Square], board: &Board) -> usize {
    let mut count = 0;
    for &piece in pieces {
        for destination in possible_destinations(piece, board, None) {
            let mut after_move = *board;
            after_move.block(destination);
            count += possible_destinations(destination, &after_move, Some(piece)).len();
        }
    }
    count
}

/// Cheap "can this side move" check: some piece has an empty neighbour
///
/// A piece that can step anywhere can always shoot back at its vacated
/// origin, so one free neighbour is enough for a full play.
pub fn has_any_play(pieces: &[Square], board: &Board) -> bool {
    pieces.iter().any(|piece| {
        Direction::all()
            .iter()
            .any(|direction| board.is_passable(direction.apply(piece)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_piece_on_empty_board() {
        let board = Board::empty();
        let destinations = possible_destinations(Square::new(0, 0), &board, None);
        // 9 down, 9 right, 9 along the diagonal
        assert_eq!(destinations.len(), 27);
    }

    #[test]
    fn test_blocked_square_stops_walk() {
        let board = Board::with_blocked([Square::new(2, 0)]);
        let destinations = possible_destinations(Square::new(0, 0), &board, None);
        assert!(destinations.contains(&Square::new(1, 0)));
        assert!(!destinations.contains(&Square::new(2, 0)));
        assert!(!destinations.contains(&Square::new(3, 0)));
    }

    #[test]
    fn test_ignore_square_is_walked_through() {
        let board = Board::with_blocked([Square::new(2, 0), Square::new(0, 1), Square::new(1, 1)]);
        let destinations = possible_destinations(Square::new(0, 0), &board, Some(Square::new(2, 0)));
        assert!(destinations.contains(&Square::new(2, 0)));
        assert!(destinations.contains(&Square::new(9, 0)));
        assert!(!destinations.contains(&Square::new(0, 1)));
    }

    #[test]
    fn test_arrow_may_land_on_vacated_origin() {
        let piece = Square::new(0, 0);
        let board = Board::with_blocked([piece, Square::new(0, 1), Square::new(1, 1)]);
        let plays = enumerate_plays(&[piece], &board);
        // only move is down the file; each destination can shoot back to the origin
        assert!(plays.iter().all(|p| p.destination.col == 0));
        assert!(plays
            .iter()
            .any(|p| p.destination == Square::new(1, 0) && p.arrow == piece));
        assert_eq!(plays.len(), count_plays(&[piece], &board));
    }

    #[test]
    fn test_surrounded_piece_has_no_play() {
        let piece = Square::new(0, 0);
        let board = Board::with_blocked([piece, Square::new(0, 1), Square::new(1, 0), Square::new(1, 1)]);
        assert!(possible_destinations(piece, &board, None).is_empty());
        assert!(enumerate_plays(&[piece], &board).is_empty());
        assert!(!has_any_play(&[piece], &board));
    }
}
