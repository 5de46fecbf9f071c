// Territory evaluation
//
// A multi-source flood along queen lines: ring i holds the squares a side
// can first reach in i moves. Closer rings are weighted more heavily by a
// caller-supplied schedule. The centrality variant also rewards squares that
// several ring-(i-1) squares reach at once.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::error::EngineResult;
use crate::types::{Direction, Play, Square, CELL_COUNT};

const UNREACHED: u8 = 0;
const ORIGIN: u8 = u8::MAX;

/// Constant part of the centrality bonus numerator
const CENTRALITY_BASE: f64 = 5.0;

/// Territory heuristic variant used by an engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Evaluator {
    /// Weighted ring sizes only
    #[default]
    Flat,
    /// Weighted ring sizes plus a per-square multi-path bonus
    Centrality,
}

/// Result of flooding from a set of origins
#[derive(Debug, Clone)]
pub struct Flood {
    /// Ring each cell was first reached in (0 = never, u8::MAX = origin)
    pub ring_of: [u8; CELL_COUNT],
    /// How many squares of the previous ring reached each cell in its ring
    pub hits: [u16; CELL_COUNT],
    /// `ring_sizes[i]` = number of squares first reached in ring i; index 0 is unused
    pub ring_sizes: Vec<usize>,
}

impl Flood {
    pub fn ring_size(&self, ring: usize) -> usize {
        self.ring_sizes.get(ring).copied().unwrap_or(0)
    }
}

/// Floods outward from `origins` for up to `depth_limit` rings
pub fn flood(origins: &[Square], board: &Board, depth_limit: usize) -> Flood {
    crate::profile!("flood_fill", {
        let mut ring_of = [UNREACHED; CELL_COUNT];
        let mut hits = [0u16; CELL_COUNT];
        let mut ring_sizes = vec![0usize];

        for origin in origins.iter().filter(|s| s.in_bounds()) {
            ring_of[origin.index()] = ORIGIN;
        }

        let mut frontier: Vec<Square> = origins.to_vec();
        for ring in 1..=depth_limit.min(ORIGIN as usize - 1) {
            let ring_mark = ring as u8;
            let mut next = Vec::new();
            for square in &frontier {
                for direction in Direction::all() {
                    let mut current = direction.apply(square);
                    while board.is_passable(current) {
                        let index = current.index();
                        if ring_of[index] == UNREACHED {
                            ring_of[index] = ring_mark;
                            hits[index] = 1;
                            next.push(current);
                        } else if ring_of[index] == ring_mark {
                            hits[index] += 1;
                        }
                        current = direction.apply(&current);
                    }
                }
            }
            ring_sizes.push(next.len());
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        Flood {
            ring_of,
            hits,
            ring_sizes,
        }
    })
}

/// Distance-weighted mobility score of the side whose pieces are `origins`
///
/// `weights[i - 1]` multiplies the size of ring i. Missing weights count as zero.
pub fn evaluate(
    evaluator: Evaluator,
    origins: &[Square],
    board: &Board,
    depth_limit: usize,
    weights: &[f64],
) -> f64 {
    let flood = flood(origins, board, depth_limit);

    let mut score: f64 = (1..=depth_limit)
        .map(|ring| weights.get(ring - 1).copied().unwrap_or(0.0) * flood.ring_size(ring) as f64)
        .sum();

    if evaluator == Evaluator::Centrality {
        for index in 0..CELL_COUNT {
            let ring = flood.ring_of[index];
            if ring == UNREACHED || ring == ORIGIN || ring as usize > depth_limit {
                continue;
            }
            let ring_count = flood.ring_size(ring as usize) as f64;
            score += centrality_bonus(ring_count, flood.hits[index] as f64);
        }
    }

    score
}

/// Bonus for a square reached `count` times in a ring of `ring_count` squares
pub fn centrality_bonus(ring_count: f64, count: f64) -> f64 {
    count / ring_count + CENTRALITY_BASE / ring_count
}

/// Heuristic parameters of one engine instance
#[derive(Debug, Clone, PartialEq)]
pub struct Heuristic {
    pub evaluator: Evaluator,
    /// Flood horizon in rings
    pub plays_calculated: usize,
    pub weights: Vec<f64>,
    /// 0 maximises own mobility only, 1 minimises the opponent's only
    pub aggressiveness: f64,
}

/// Hashable identity of a `Heuristic`; floats compare by bit pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeuristicKey {
    evaluator: Evaluator,
    plays_calculated: usize,
    weights: Vec<u64>,
    aggressiveness: u64,
}

impl Heuristic {
    pub fn key(&self) -> HeuristicKey {
        HeuristicKey {
            evaluator: self.evaluator,
            plays_calculated: self.plays_calculated,
            weights: self.weights.iter().map(|w| w.to_bits()).collect(),
            aggressiveness: self.aggressiveness.to_bits(),
        }
    }

    /// Default ring weights `2^n, 2^(n-1), ..., 2^1`
    pub fn default_weights(plays_calculated: usize) -> Vec<f64> {
        (1..=plays_calculated)
            .rev()
            .map(|exponent| 2f64.powi(exponent as i32))
            .collect()
    }

    pub fn territory(&self, origins: &[Square], board: &Board) -> f64 {
        evaluate(
            self.evaluator,
            origins,
            board,
            self.plays_calculated,
            &self.weights,
        )
    }

    /// `(1 - a) * mobility(mine) - a * mobility(theirs)` on one board
    pub fn combined(&self, mine: &[Square], theirs: &[Square], board: &Board) -> f64 {
        crate::profile!("eval", {
            let own_score = self.territory(mine, board);
            let their_score = self.territory(theirs, board);
            (1.0 - self.aggressiveness) * own_score - self.aggressiveness * their_score
        })
    }

    /// Scores a play of the own side; both floods run on the post-play board
    pub fn score_play(&self, position: &Position, play: &Play) -> EngineResult<f64> {
        let after = position.apply(play)?;
        Ok(self.combined(&after.own, &after.opponent, &after.board))
    }
}
