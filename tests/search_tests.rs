//! Search Tests
//!
//! Alpha-beta against exhaustive minimax, depth selection, backup fallback
//! and terminal handling.

use amazons_engine::board::{Board, GameField, Position};
use amazons_engine::config::{Config, EngineConfig};
use amazons_engine::error::EngineError;
use amazons_engine::eval::Heuristic;
use amazons_engine::player::{AdaptivePlayer, OnePlyPlayer, Player};
use amazons_engine::search::{branching_factor, depth_for, Searcher};
use amazons_engine::types::{Color, Play, Side, Square, BOARD_SIZE};

fn heuristic() -> Heuristic {
    Config::default_engine().heuristic().expect("default engine is valid")
}

/// Board fully blocked except the given rectangle (inclusive bounds)
fn pocket(rows: std::ops::RangeInclusive<i8>, cols: std::ops::RangeInclusive<i8>) -> Board {
    let mut board = Board::with_blocked(
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Square::new(row, col))),
    );
    for row in rows {
        for col in cols.clone() {
            board.clear(Square::new(row, col));
        }
    }
    board
}

/// Small endgame: two pieces per side inside a 2x4 pocket, the rest parked
///
/// Four free squares remain, so no line of play is longer than four plies.
fn small_endgame() -> Position {
    let own = [Square::new(0, 0), Square::new(1, 3), Square::new(9, 9), Square::new(9, 8)];
    let opponent = [Square::new(0, 3), Square::new(1, 0), Square::new(9, 0), Square::new(9, 1)];
    let mut board = pocket(0..=1, 0..=3);
    for square in own.iter().chain(opponent.iter()) {
        board.block(*square);
    }
    Position::new(board, own, opponent)
}

/// Driver-side field for a position with white as the own side
fn field_for(position: &Position) -> GameField {
    let arrows = (0..BOARD_SIZE)
        .flat_map(|row| (0..BOARD_SIZE).map(move |col| Square::new(row, col)))
        .filter(|s| position.board.is_blocked(*s))
        .filter(|s| !position.own.contains(s) && !position.opponent.contains(s))
        .collect();
    GameField {
        white: position.own,
        black: position.opponent,
        arrows,
    }
}

/// Opening field with every white piece boxed in by arrows
fn white_boxed_in() -> GameField {
    let mut field = GameField::new();
    let board = field.board();
    let mut arrows = Vec::new();
    for piece in field.white {
        for dr in -1..=1 {
            for dc in -1..=1 {
                let square = Square::new(piece.row + dr, piece.col + dc);
                if board.is_passable(square) && !arrows.contains(&square) {
                    arrows.push(square);
                }
            }
        }
    }
    field.arrows = arrows;
    field
}

#[test]
fn test_alpha_beta_matches_exhaustive_minimax() {
    let position = small_endgame();
    let pruned = Searcher::new(heuristic(), true);
    let exhaustive = Searcher::new(heuristic(), false);

    for depth in 0..=3 {
        let a = pruned.best_play(&position, depth).unwrap().expect("own side can move");
        let b = exhaustive.best_play(&position, depth).unwrap().expect("own side can move");
        assert_eq!(a.score, b.score, "Root value differs at depth {}", depth);
        assert_eq!(a.play, b.play, "Root play differs at depth {}", depth);
        assert!(a.stats.nodes <= b.stats.nodes);
    }
}

#[test]
fn test_alpha_beta_matches_minimax_from_both_sides() {
    let position = small_endgame();
    let pruned = Searcher::new(heuristic(), true);
    let exhaustive = Searcher::new(heuristic(), false);
    for side in [Side::Own, Side::Opponent] {
        assert_eq!(
            pruned.value(&position, side, 3).unwrap(),
            exhaustive.value(&position, side, 3).unwrap()
        );
    }
}

#[test]
fn test_pruning_produces_cutoffs() {
    let position = small_endgame();
    let pruned = Searcher::new(heuristic(), true);
    let outcome = pruned.best_play(&position, 2).unwrap().unwrap();
    assert!(outcome.stats.cutoffs > 0, "Expected at least one cutoff");
}

#[test]
fn test_depth_is_monotone_in_branching() {
    let slider = [400, 200, 100, 50, 25, 10];
    let mut previous = depth_for(&slider, 0);
    assert_eq!(previous, 6);
    for branching in 1..600 {
        let depth = depth_for(&slider, branching);
        assert!(depth <= previous, "Depth rose from {} to {} at {}", previous, depth, branching);
        previous = depth;
    }
    assert_eq!(previous, 0);
}

#[test]
fn test_opening_branching_factor() {
    let position = GameField::new().position(Color::White);
    assert_eq!(branching_factor(&position), 2 * 2176);
}

#[test]
fn test_depth_zero_delegates_to_backup() {
    let engine = EngineConfig {
        plays_calculated: 2,
        seed: Some(42),
        depth_slider: vec![100],
        ..Config::default_engine()
    };
    let field = GameField::new();
    let backup = OnePlyPlayer::new("backup", &engine, None).unwrap();
    let adaptive = AdaptivePlayer::new("adaptive", &engine, Box::new(backup)).unwrap();
    let reference = OnePlyPlayer::new("reference", &engine, None).unwrap();

    let decision = adaptive.play(&field, Color::White).unwrap();
    assert_eq!(decision, reference.play(&field, Color::White).unwrap());
    assert_eq!(decision.depth, 0);
}

#[test]
fn test_adaptive_searches_small_positions() {
    let engine = EngineConfig {
        plays_calculated: 2,
        seed: Some(1),
        depth_slider: vec![100_000, 50_000],
        ..Config::default_engine()
    };
    let position = small_endgame();
    let field = field_for(&position);
    assert_eq!(field.position(Color::White), position);

    let searcher = Searcher::new(engine.heuristic().unwrap(), true);
    let expected = searcher.best_play(&position, 2).unwrap().unwrap();

    let backup = OnePlyPlayer::new("backup", &engine, None).unwrap();
    let adaptive = AdaptivePlayer::new("adaptive", &engine, Box::new(backup)).unwrap();
    let decision = adaptive.play(&field, Color::White).unwrap();
    assert_eq!(decision.play, expected.play);
    assert_eq!(decision.score, Some(expected.score));
    assert_eq!(decision.depth, 2);
}

#[test]
fn test_boxed_in_side_cannot_move() {
    let field = white_boxed_in();
    assert!(!field.can_move(Color::White));
    assert!(field.can_move(Color::Black));

    let engine = EngineConfig {
        depth_slider: vec![100_000, 100_000, 100_000],
        ..Config::default_engine()
    };
    let backup = OnePlyPlayer::new("backup", &engine, None).unwrap();
    let adaptive = AdaptivePlayer::new("adaptive", &engine, Box::new(backup)).unwrap();
    assert_eq!(
        adaptive.play(&field, Color::White),
        Err(EngineError::NoLegalPlay(Color::White))
    );
}

#[test]
fn test_no_move_position_is_terminal_in_search() {
    let field = white_boxed_in();
    let position = field.position(Color::White);
    let searcher = Searcher::new(heuristic(), true);
    assert!(searcher.best_play(&position, 3).unwrap().is_none());

    // own side to move with no plays: value is the static leaf score at any depth
    let leaf = searcher.leaf_score(&position, Side::Own);
    assert_eq!(searcher.value(&position, Side::Own, 3).unwrap(), leaf);
}

#[test]
fn test_unknown_source_is_internal_inconsistency() {
    let position = GameField::new().position(Color::White);
    let bogus = Play::new(Square::new(5, 5), Square::new(5, 6), Square::new(5, 7));
    assert!(matches!(
        position.apply(&bogus),
        Err(EngineError::InternalInconsistency { .. })
    ));
    assert!(matches!(
        heuristic().score_play(&position, &bogus),
        Err(EngineError::InternalInconsistency { .. })
    ));
}
