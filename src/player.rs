// Players: turn a game field into one chosen play
//
// Every player works on a `Position` snapshot taken from the field, so the
// driver's field is never touched while a decision is made.

use log::{debug, info};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::board::{GameField, Position};
use crate::cache::{dequantize, quantize, ScoredPlay, StateCache};
use crate::config::{EngineConfig, PlayerConfig, Strategy};
use crate::error::{EngineError, EngineResult};
use crate::eval::Heuristic;
use crate::movegen::enumerate_plays;
use crate::search::{branching_factor, depth_for, Searcher};
use crate::types::{Color, Direction, Play, CELL_COUNT};

/// A player's answer for one turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub play: Play,
    /// Heuristic value of the play, when the player computed one
    pub score: Option<f64>,
    /// Search depth below the root; 0 for one-ply and non-searching players
    pub depth: u32,
}

impl Decision {
    /// Index of the moved piece in `color`'s piece list
    pub fn piece_index(&self, field: &GameField, color: Color) -> Option<usize> {
        field
            .pieces(color)
            .iter()
            .position(|square| *square == self.play.source)
    }
}

pub trait Player: Send + Sync {
    fn name(&self) -> &str;
    fn play(&self, field: &GameField, color: Color) -> EngineResult<Decision>;
}

/// Seedable random choice shared by all players that break ties
struct TieBreaker {
    rng: Mutex<StdRng>,
}

impl TieBreaker {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        TieBreaker {
            rng: Mutex::new(rng),
        }
    }

    fn pick<T: Copy>(&self, candidates: &[T]) -> Option<T> {
        candidates.choose(&mut *self.rng.lock()).copied()
    }
}

/// Scores every play one ply deep and picks randomly among the best
pub struct OnePlyPlayer {
    name: String,
    heuristic: Heuristic,
    pool: Option<rayon::ThreadPool>,
    cache: Option<Arc<StateCache>>,
    tie_breaker: TieBreaker,
}

impl OnePlyPlayer {
    pub fn new(
        name: &str,
        engine: &EngineConfig,
        cache: Option<Arc<StateCache>>,
    ) -> EngineResult<Self> {
        let heuristic = engine.heuristic()?;
        let pool = if engine.worker_count > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(engine.worker_count)
                .thread_name(|i| format!("one-ply-{}", i))
                .build()
                .map_err(|e| {
                    EngineError::Configuration(format!("failed to build worker pool: {}", e))
                })?;
            Some(pool)
        } else {
            None
        };
        Ok(OnePlyPlayer {
            name: name.to_string(),
            heuristic,
            pool,
            cache,
            tie_breaker: TieBreaker::new(engine.seed),
        })
    }

    fn score_all(&self, position: &Position, plays: &[Play]) -> EngineResult<Vec<f64>> {
        let heuristic = &self.heuristic;
        match &self.pool {
            Some(pool) => {
                let scores = pool.install(|| {
                    plays
                        .par_iter()
                        .map(|play| heuristic.score_play(position, play))
                        .collect::<EngineResult<Vec<f64>>>()
                });
                if crate::simple_profiler::is_profiling_enabled() {
                    pool.broadcast(|_| crate::simple_profiler::merge_thread_local());
                }
                scores
            }
            None => plays
                .iter()
                .map(|play| heuristic.score_play(position, play))
                .collect(),
        }
    }

    /// All own plays with quantised scores, best first
    ///
    /// Equal scores keep generation order. Goes through the cache when one
    /// is attached.
    pub fn scored_plays(&self, position: &Position) -> EngineResult<Vec<ScoredPlay>> {
        if let Some(cache) = &self.cache {
            let stored =
                cache.lookup(&self.heuristic, &position.board, &position.own, &position.opponent)?;
            if let Some(stored) = stored {
                return Ok(stored);
            }
        }

        let plays = enumerate_plays(&position.own, &position.board);
        let scores = self.score_all(position, &plays)?;
        let mut scored: Vec<ScoredPlay> = plays
            .into_iter()
            .zip(scores)
            .map(|(play, score)| ScoredPlay {
                score: quantize(score),
                play,
            })
            .collect();
        scored.sort_by(|a, b| b.score.cmp(&a.score));

        if let Some(cache) = &self.cache {
            cache.store(
                &self.heuristic,
                &position.board,
                &position.own,
                &position.opponent,
                &scored,
            )?;
        }
        Ok(scored)
    }

    /// Best play and its score, `None` when the own side cannot move
    pub fn choose(&self, position: &Position) -> EngineResult<Option<(Play, f64)>> {
        let scored = self.scored_plays(position)?;
        let top = match scored.first() {
            Some(first) => first.score,
            None => return Ok(None),
        };
        let best: Vec<Play> = scored
            .iter()
            .take_while(|scored| scored.score == top)
            .map(|scored| scored.play)
            .collect();
        debug!("{} plays tied at score {}", best.len(), dequantize(top));
        Ok(self.tie_breaker.pick(&best).map(|play| (play, dequantize(top))))
    }
}

impl Player for OnePlyPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn play(&self, field: &GameField, color: Color) -> EngineResult<Decision> {
        match self.choose(&field.position(color))? {
            Some((play, score)) => Ok(Decision {
                play,
                score: Some(score),
                depth: 0,
            }),
            None => Err(EngineError::NoLegalPlay(color)),
        }
    }
}

/// Alpha-beta search whose depth follows the branching factor
pub struct AdaptivePlayer {
    name: String,
    searcher: Searcher,
    depth_slider: Vec<usize>,
    backup: Box<dyn Player>,
}

impl AdaptivePlayer {
    pub fn new(name: &str, engine: &EngineConfig, backup: Box<dyn Player>) -> EngineResult<Self> {
        Ok(AdaptivePlayer {
            name: name.to_string(),
            searcher: Searcher::new(engine.heuristic()?, engine.alpha_beta),
            depth_slider: engine.depth_slider.clone(),
            backup,
        })
    }
}

impl Player for AdaptivePlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn play(&self, field: &GameField, color: Color) -> EngineResult<Decision> {
        let position = field.position(color);
        let branching = branching_factor(&position);
        let depth = depth_for(&self.depth_slider, branching);

        if depth == 0 {
            debug!(
                "Branching factor {} too high for a deep search, using {}",
                branching,
                self.backup.name()
            );
            return self.backup.play(field, color);
        }

        info!("Branching factor {}, searching depth {}", branching, depth);
        match self.searcher.best_play(&position, depth)? {
            Some(outcome) => Ok(Decision {
                play: outcome.play,
                score: Some(outcome.score),
                depth: outcome.depth,
            }),
            None => Err(EngineError::NoLegalPlay(color)),
        }
    }
}

/// Uniformly random legal play
pub struct RandomPlayer {
    name: String,
    tie_breaker: TieBreaker,
}

impl RandomPlayer {
    pub fn new(name: &str, seed: Option<u64>) -> Self {
        RandomPlayer {
            name: name.to_string(),
            tie_breaker: TieBreaker::new(seed),
        }
    }
}

impl Player for RandomPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn play(&self, field: &GameField, color: Color) -> EngineResult<Decision> {
        let plays = enumerate_plays(field.pieces(color), &field.board());
        let play = self
            .tie_breaker
            .pick(&plays)
            .ok_or(EngineError::NoLegalPlay(color))?;
        Ok(Decision {
            play,
            score: None,
            depth: 0,
        })
    }
}

/// Delegates to a different player depending on the colour to move
pub struct SwitchPlayer {
    name: String,
    white: Box<dyn Player>,
    black: Box<dyn Player>,
}

impl SwitchPlayer {
    pub fn new(name: &str, white: Box<dyn Player>, black: Box<dyn Player>) -> Self {
        SwitchPlayer {
            name: name.to_string(),
            white,
            black,
        }
    }
}

impl Player for SwitchPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn play(&self, field: &GameField, color: Color) -> EngineResult<Decision> {
        match color {
            Color::White => self.white.play(field, color),
            Color::Black => self.black.play(field, color),
        }
    }
}

/// Free squares in the region holding all own pieces, if no opponent can enter it
///
/// The region is the king-step closure of the empty squares around the own
/// pieces. Any opponent piece touching the region means the side is not
/// sealed off.
pub fn sealed_region(position: &Position) -> Option<usize> {
    let mut visited = [false; CELL_COUNT];
    let mut queue: VecDeque<_> = position.own.iter().copied().collect();
    let mut free = 0;

    while let Some(square) = queue.pop_front() {
        for direction in Direction::all() {
            let neighbour = direction.apply(&square);
            if !neighbour.in_bounds() {
                continue;
            }
            if position.opponent.contains(&neighbour) {
                return None;
            }
            if position.board.is_passable(neighbour) && !visited[neighbour.index()] {
                visited[neighbour.index()] = true;
                free += 1;
                queue.push_back(neighbour);
            }
        }
    }
    Some(free)
}

/// Endgame filler: once sealed off, plays to use as many squares as possible
pub struct BuildInPlayer {
    name: String,
    threshold: usize,
    fallback: OnePlyPlayer,
    inner: Box<dyn Player>,
    tie_breaker: TieBreaker,
}

impl BuildInPlayer {
    pub fn new(
        name: &str,
        engine: &EngineConfig,
        fallback: OnePlyPlayer,
        inner: Box<dyn Player>,
    ) -> Self {
        BuildInPlayer {
            name: name.to_string(),
            threshold: engine.build_in_threshold,
            fallback,
            inner,
            tie_breaker: TieBreaker::new(engine.seed),
        }
    }

    /// Longest run of own turns from `position`; every turn uses one free square
    fn survival(position: &Position, turns: usize, free: usize) -> EngineResult<usize> {
        let plays = enumerate_plays(&position.own, &position.board);
        let mut best = turns;
        for play in &plays {
            let child = position.apply(play)?;
            best = best.max(Self::survival(&child, turns + 1, free)?);
            if best >= free {
                break;
            }
        }
        Ok(best)
    }

    /// Plays that keep the most turns available, with the turn count
    pub fn longest_survival(position: &Position, free: usize) -> EngineResult<(Vec<Play>, usize)> {
        let mut best_turns = 0;
        let mut best = Vec::new();
        for play in enumerate_plays(&position.own, &position.board) {
            let turns = Self::survival(&position.apply(&play)?, 1, free)?;
            if turns > best_turns || best.is_empty() {
                best_turns = turns;
                best = vec![play];
            } else if turns == best_turns {
                best.push(play);
            }
            if best_turns >= free {
                break;
            }
        }
        Ok((best, best_turns))
    }
}

impl Player for BuildInPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn play(&self, field: &GameField, color: Color) -> EngineResult<Decision> {
        let position = field.position(color);
        let free = match sealed_region(&position) {
            Some(free) => free,
            None => return self.inner.play(field, color),
        };

        if free > self.threshold {
            debug!("Sealed off with {} free squares, filling one ply deep", free);
            return self.fallback.play(field, color);
        }

        let (plays, turns) = Self::longest_survival(&position, free)?;
        info!("Sealed off with {} free squares, {} turns reachable", free, turns);
        let play = self
            .tie_breaker
            .pick(&plays)
            .ok_or(EngineError::NoLegalPlay(color))?;
        Ok(Decision {
            play,
            score: Some(turns as f64),
            depth: turns as u32,
        })
    }
}

/// Cache handed to a one-ply player: the shared one, or a private one
fn cache_for(engine: &EngineConfig, shared: &Option<Arc<StateCache>>) -> Option<Arc<StateCache>> {
    if !engine.use_cache {
        return None;
    }
    Some(shared.clone().unwrap_or_else(|| Arc::new(StateCache::new())))
}

fn build_strategy(
    strategy: Strategy,
    config: &PlayerConfig,
    shared: &Option<Arc<StateCache>>,
) -> EngineResult<Box<dyn Player>> {
    let engine = &config.engine;
    let name = config.name.as_str();
    let player: Box<dyn Player> = match strategy {
        Strategy::OnePly => Box::new(OnePlyPlayer::new(name, engine, cache_for(engine, shared))?),
        Strategy::Random => Box::new(RandomPlayer::new(name, engine.seed)),
        Strategy::Adaptive => {
            let backup = match config.backup.unwrap_or(Strategy::OnePly) {
                Strategy::Adaptive | Strategy::BuildIn => {
                    return Err(EngineError::Configuration(format!(
                        "player '{}' cannot use a searching backup",
                        name
                    )))
                }
                backup => build_strategy(backup, config, shared)?,
            };
            Box::new(AdaptivePlayer::new(name, engine, backup)?)
        }
        Strategy::Switch => {
            let missing = || {
                EngineError::Configuration(format!(
                    "player '{}' uses switch but lacks white_engine/black_engine",
                    name
                ))
            };
            let white_engine = config.white_engine.as_ref().ok_or_else(missing)?;
            let black_engine = config.black_engine.as_ref().ok_or_else(missing)?;
            let white = OnePlyPlayer::new(name, white_engine, cache_for(white_engine, shared))?;
            let black = OnePlyPlayer::new(name, black_engine, cache_for(black_engine, shared))?;
            Box::new(SwitchPlayer::new(name, Box::new(white), Box::new(black)))
        }
        Strategy::BuildIn => {
            let inner = match config.inner.unwrap_or(Strategy::Adaptive) {
                Strategy::BuildIn => {
                    return Err(EngineError::Configuration(format!(
                        "player '{}' cannot nest build_in",
                        name
                    )))
                }
                inner => build_strategy(inner, config, shared)?,
            };
            let fallback = OnePlyPlayer::new(name, engine, cache_for(engine, shared))?;
            Box::new(BuildInPlayer::new(name, engine, fallback, inner))
        }
    };
    Ok(player)
}

/// Builds the configured player
///
/// `shared` is used by every cache-enabled engine when present; otherwise
/// each such engine gets its own cache.
pub fn build_player(
    config: &PlayerConfig,
    shared: Option<Arc<StateCache>>,
) -> EngineResult<Box<dyn Player>> {
    config.validate()?;
    build_strategy(config.strategy, config, &shared)
}
