// Adaptive-depth minimax with alpha-beta pruning
//
// Depth is chosen from the total branching factor of both sides: open
// positions get shallow searches, collapsed late-game positions deep ones.
// All values are from the root side's maximising perspective.

use log::debug;

use crate::board::Position;
use crate::error::EngineResult;
use crate::eval::Heuristic;
use crate::movegen::{count_plays, enumerate_plays};
use crate::types::{Play, Side};

/// Number of thresholds in `depth_slider` that `branching` falls under
///
/// Counting (rather than scanning for the first match) makes the result
/// independent of the order the thresholds are listed in.
pub fn depth_for(depth_slider: &[usize], branching: usize) -> u32 {
    depth_slider.iter().filter(|&&threshold| branching < threshold).count() as u32
}

/// Total plays available to both sides
pub fn branching_factor(position: &Position) -> usize {
    count_plays(&position.own, &position.board) + count_plays(&position.opponent, &position.board)
}

/// Node and cutoff counters for one search call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub leaves: u64,
    pub cutoffs: u64,
}

/// Best root play found by a deep search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    pub play: Play,
    pub score: f64,
    pub depth: u32,
    pub stats: SearchStats,
}

/// Minimax searcher over `Position` snapshots
#[derive(Debug, Clone)]
pub struct Searcher {
    heuristic: Heuristic,
    pruning: bool,
}

impl Searcher {
    /// `pruning = false` runs plain exhaustive minimax over the same tree
    pub fn new(heuristic: Heuristic, pruning: bool) -> Self {
        Searcher { heuristic, pruning }
    }

    pub fn heuristic(&self) -> &Heuristic {
        &self.heuristic
    }

    /// Leaf value of a position with `to_move` about to play
    ///
    /// The combined score is taken from the view of the side that made the
    /// last play (the same view the one-ply scorer uses) and negated when
    /// that side is the opponent.
    pub fn leaf_score(&self, position: &Position, to_move: Side) -> f64 {
        let last_mover = to_move.other();
        let score = self.heuristic.combined(
            position.pieces(last_mover),
            position.pieces(to_move),
            &position.board,
        );
        match last_mover {
            Side::Own => score,
            Side::Opponent => -score,
        }
    }

    /// Minimax value of `position` with a full window
    pub fn value(&self, position: &Position, to_move: Side, depth: u32) -> EngineResult<f64> {
        let mut stats = SearchStats::default();
        self.alpha_beta(
            position,
            to_move,
            depth,
            f64::NEG_INFINITY,
            f64::INFINITY,
            &mut stats,
        )
    }

    fn alpha_beta(
        &self,
        position: &Position,
        to_move: Side,
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
        stats: &mut SearchStats,
    ) -> EngineResult<f64> {
        crate::profile!("alpha_beta", {
            stats.nodes += 1;

            if depth == 0 {
                stats.leaves += 1;
                return Ok(self.leaf_score(position, to_move));
            }
            let plays = enumerate_plays(position.pieces(to_move), &position.board);
            if plays.is_empty() {
                stats.leaves += 1;
                return Ok(self.leaf_score(position, to_move));
            }

            match to_move {
                Side::Own => {
                    let mut best = f64::NEG_INFINITY;
                    for play in &plays {
                        let child = position.apply(play)?;
                        let value =
                            self.alpha_beta(&child, Side::Opponent, depth - 1, alpha, beta, stats)?;
                        best = best.max(value);
                        alpha = alpha.max(best);
                        if self.pruning && beta <= alpha {
                            stats.cutoffs += 1;
                            crate::simple_profiler::record_alpha_beta_cutoff();
                            break;
                        }
                    }
                    Ok(best)
                }
                Side::Opponent => {
                    let mut best = f64::INFINITY;
                    for play in &plays {
                        let child = position.apply(play)?;
                        let value = self.alpha_beta(&child, Side::Own, depth - 1, alpha, beta, stats)?;
                        best = best.min(value);
                        beta = beta.min(best);
                        if self.pruning && beta <= alpha {
                            stats.cutoffs += 1;
                            crate::simple_profiler::record_alpha_beta_cutoff();
                            break;
                        }
                    }
                    Ok(best)
                }
            }
        })
    }

    /// Searches every own play with `depth` plies below it
    ///
    /// Returns `None` when the own side has no play. Ties keep the first
    /// play in generation order.
    pub fn best_play(&self, position: &Position, depth: u32) -> EngineResult<Option<SearchOutcome>> {
        let plays = enumerate_plays(&position.own, &position.board);
        let mut stats = SearchStats::default();
        let mut alpha = f64::NEG_INFINITY;
        let beta = f64::INFINITY;
        let mut best: Option<(Play, f64)> = None;

        for play in &plays {
            let child = position.apply(play)?;
            let value = self.alpha_beta(&child, Side::Opponent, depth, alpha, beta, &mut stats)?;
            let improves = match best {
                Some((_, best_value)) => value > best_value,
                None => true,
            };
            if improves {
                best = Some((*play, value));
                alpha = alpha.max(value);
            }
        }

        debug!(
            "Searched {} root plays at depth {}: {} nodes, {} cutoffs",
            plays.len(),
            depth,
            stats.nodes,
            stats.cutoffs
        );

        Ok(best.map(|(play, score)| SearchOutcome {
            play,
            score,
            depth,
            stats,
        }))
    }
}
