// State cache with a fixed-width, collision-free key encoding
//
// EncodedState layout (164 bits, left-padded with 4 zero bits into 21 bytes):
//   100 occupancy bits, row-major, 1 = blocked
//   own pieces:      4 x (4-bit row, 4-bit col), in list order
//   opponent pieces: 4 x (4-bit row, 4-bit col), in list order
// EncodedPlay layout (24 bits in a u32): src row/col, dst row/col, arrow row/col.
//
// Entries map a state to its one-ply scored play list, sorted descending.
// Lists are partitioned by the heuristic that scored them, so engines with
// different parameters never read each other's entries. Entries are never
// evicted and live for one process only.

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::board::{Board, Position};
use crate::error::{EngineError, EngineResult};
use crate::eval::{Heuristic, HeuristicKey};
use crate::types::{Pieces, Play, Square, BOARD_SIZE, CELL_COUNT, PIECES_PER_SIDE};

const COORD_BITS: usize = 4;
const PIECE_GROUP_BITS: usize = PIECES_PER_SIDE * 2 * COORD_BITS;

/// Meaningful bits of an encoded state
pub const STATE_BITS: usize = CELL_COUNT + 2 * PIECE_GROUP_BITS;
/// Bytes of an encoded state including leading padding
pub const STATE_BYTES: usize = (STATE_BITS + 7) / 8;
const STATE_PADDING: usize = STATE_BYTES * 8 - STATE_BITS;

/// Meaningful bits of an encoded play
pub const PLAY_BITS: usize = 6 * COORD_BITS;

/// Scores are stored as integer thousandths
pub const SCORE_SCALE: f64 = 1000.0;

/// Converts a heuristic score into the integer form used for ranking and caching
pub fn quantize(score: f64) -> i64 {
    (score * SCORE_SCALE).round() as i64
}

pub fn dequantize(score: i64) -> f64 {
    score as f64 / SCORE_SCALE
}

/// A play with its quantised one-ply score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredPlay {
    pub score: i64,
    pub play: Play,
}

struct BitWriter {
    bytes: [u8; STATE_BYTES],
    cursor: usize,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter {
            bytes: [0; STATE_BYTES],
            cursor: STATE_PADDING,
        }
    }

    fn push(&mut self, value: u32, width: usize) {
        for shift in (0..width).rev() {
            if (value >> shift) & 1 == 1 {
                self.bytes[self.cursor / 8] |= 0x80 >> (self.cursor % 8);
            }
            self.cursor += 1;
        }
    }
}

struct BitReader<'a> {
    bytes: &'a [u8; STATE_BYTES],
    cursor: usize,
}

impl<'a> BitReader<'a> {
    fn take(&mut self, width: usize) -> u32 {
        let mut value = 0u32;
        for _ in 0..width {
            let bit = (self.bytes[self.cursor / 8] >> (7 - self.cursor % 8)) & 1;
            value = (value << 1) | bit as u32;
            self.cursor += 1;
        }
        value
    }
}

fn coordinate_bits(square: Square, what: &str) -> EngineResult<(u32, u32)> {
    if !square.in_bounds() {
        return Err(EngineError::Encoding(format!(
            "{} {} is outside the {}x{} board",
            what, square, BOARD_SIZE, BOARD_SIZE
        )));
    }
    Ok((square.row as u32, square.col as u32))
}

fn coordinate_from_bits(row: u32, col: u32, what: &str) -> EngineResult<Square> {
    if row >= BOARD_SIZE as u32 || col >= BOARD_SIZE as u32 {
        return Err(EngineError::Encoding(format!(
            "{} decodes to out-of-range coordinate ({}|{})",
            what, row, col
        )));
    }
    Ok(Square::new(row as i8, col as i8))
}

/// Fixed-width encoding of (board, own pieces, opponent pieces)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedState([u8; STATE_BYTES]);

impl EncodedState {
    /// Encodes a state; fails if a side does not have exactly four in-bounds
    /// pieces or a piece does not stand on a blocked cell
    pub fn encode(board: &Board, own: &[Square], opponent: &[Square]) -> EngineResult<Self> {
        let mut writer = BitWriter::new();
        for index in 0..CELL_COUNT {
            writer.push(board.is_blocked(Square::from_index(index)) as u32, 1);
        }
        for (label, pieces) in [("own", own), ("opponent", opponent)] {
            if pieces.len() != PIECES_PER_SIDE {
                return Err(EngineError::Encoding(format!(
                    "{} side has {} pieces, encoding holds exactly {}",
                    label,
                    pieces.len(),
                    PIECES_PER_SIDE
                )));
            }
            for &piece in pieces {
                let (row, col) = coordinate_bits(piece, "piece")?;
                if !board.is_blocked(piece) {
                    return Err(EngineError::Encoding(format!(
                        "{} piece on {} stands on an empty cell",
                        label, piece
                    )));
                }
                writer.push(row, COORD_BITS);
                writer.push(col, COORD_BITS);
            }
        }
        debug_assert_eq!(writer.cursor, STATE_BYTES * 8);
        Ok(EncodedState(writer.bytes))
    }

    pub fn from_position(position: &Position) -> EngineResult<Self> {
        Self::encode(&position.board, &position.own, &position.opponent)
    }

    pub fn from_bytes(bytes: [u8; STATE_BYTES]) -> Self {
        EncodedState(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; STATE_BYTES] {
        &self.0
    }

    /// Decodes back into (board, own pieces, opponent pieces)
    pub fn decode(&self) -> EngineResult<(Board, Pieces, Pieces)> {
        let mut reader = BitReader {
            bytes: &self.0,
            cursor: 0,
        };
        if reader.take(STATE_PADDING) != 0 {
            return Err(EngineError::Encoding(
                "state padding bits are not zero".to_string(),
            ));
        }

        let mut board = Board::empty();
        for index in 0..CELL_COUNT {
            if reader.take(1) == 1 {
                board.block(Square::from_index(index));
            }
        }

        let mut groups = [[Square::new(0, 0); PIECES_PER_SIDE]; 2];
        for group in groups.iter_mut() {
            for slot in group.iter_mut() {
                let row = reader.take(COORD_BITS);
                let col = reader.take(COORD_BITS);
                let square = coordinate_from_bits(row, col, "piece")?;
                if !board.is_blocked(square) {
                    return Err(EngineError::Encoding(format!(
                        "decoded piece on {} stands on an empty cell",
                        square
                    )));
                }
                *slot = square;
            }
        }
        Ok((board, groups[0], groups[1]))
    }

    pub fn to_position(&self) -> EngineResult<Position> {
        let (board, own, opponent) = self.decode()?;
        Ok(Position::new(board, own, opponent))
    }
}

impl fmt::Display for EncodedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Fixed-width encoding of a play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedPlay(u32);

impl EncodedPlay {
    pub fn encode(play: &Play) -> EngineResult<Self> {
        let mut bits = 0u32;
        for (square, what) in [
            (play.source, "play source"),
            (play.destination, "play destination"),
            (play.arrow, "play arrow"),
        ] {
            let (row, col) = coordinate_bits(square, what)?;
            bits = (bits << COORD_BITS) | row;
            bits = (bits << COORD_BITS) | col;
        }
        Ok(EncodedPlay(bits))
    }

    pub fn from_bits(bits: u32) -> Self {
        EncodedPlay(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn decode(&self) -> EngineResult<Play> {
        if self.0 >> PLAY_BITS != 0 {
            return Err(EngineError::Encoding(format!(
                "play bits {:#x} exceed {} bits",
                self.0, PLAY_BITS
            )));
        }
        let nibble = |slot: usize| (self.0 >> (PLAY_BITS - COORD_BITS * (slot + 1))) & 0xF;
        Ok(Play::new(
            coordinate_from_bits(nibble(0), nibble(1), "play source")?,
            coordinate_from_bits(nibble(2), nibble(3), "play destination")?,
            coordinate_from_bits(nibble(4), nibble(5), "play arrow")?,
        ))
    }
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub lookups: u64,
    pub hits: u64,
    pub stores: u64,
    pub entries: usize,
}

type ScoredEntries = HashMap<EncodedState, Vec<(i64, EncodedPlay)>>;

/// Process-local map from (heuristic, encoded state) to a score-sorted play list
///
/// Shared between players through `Arc`; `store` is serialised by the write
/// lock, and the last writer wins.
#[derive(Debug, Default)]
pub struct StateCache {
    entries: RwLock<HashMap<HeuristicKey, ScoredEntries>>,
    lookups: AtomicU64,
    hits: AtomicU64,
    stores: AtomicU64,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the plays `heuristic` scored for a state, if present
    pub fn lookup(
        &self,
        heuristic: &Heuristic,
        board: &Board,
        own: &[Square],
        opponent: &[Square],
    ) -> EngineResult<Option<Vec<ScoredPlay>>> {
        let key = EncodedState::encode(board, own, opponent)?;
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let entries = self.entries.read();
        let stored = match entries
            .get(&heuristic.key())
            .and_then(|partition| partition.get(&key))
        {
            Some(stored) => stored,
            None => {
                crate::simple_profiler::record_cache_lookup(false);
                return Ok(None);
            }
        };
        self.hits.fetch_add(1, Ordering::Relaxed);
        crate::simple_profiler::record_cache_lookup(true);
        debug!("Cache hit for {} ({} plays)", key, stored.len());

        stored
            .iter()
            .map(|(score, encoded)| {
                Ok(ScoredPlay {
                    score: *score,
                    play: encoded.decode()?,
                })
            })
            .collect::<EngineResult<Vec<_>>>()
            .map(Some)
    }

    /// Stores the scored plays of a state, sorted descending by score
    ///
    /// Ties keep their given relative order.
    pub fn store(
        &self,
        heuristic: &Heuristic,
        board: &Board,
        own: &[Square],
        opponent: &[Square],
        scored_plays: &[ScoredPlay],
    ) -> EngineResult<()> {
        let key = EncodedState::encode(board, own, opponent)?;
        let mut value = scored_plays
            .iter()
            .map(|scored| Ok((scored.score, EncodedPlay::encode(&scored.play)?)))
            .collect::<EngineResult<Vec<_>>>()?;
        value.sort_by(|a, b| b.0.cmp(&a.0));

        self.entries
            .write()
            .entry(heuristic.key())
            .or_default()
            .insert(key, value);
        self.stores.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Stored entries across all heuristics
    pub fn len(&self) -> usize {
        self.entries.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
