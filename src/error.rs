//! Error types for the engine
//!
//! Covers rule violations reported to the game driver, internal consistency
//! failures inside the search, configuration problems and cache encoding
//! capacity violations.

use thiserror::Error;

use crate::types::{Color, Play, Square};

/// Errors that can occur in the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A proposed play breaks the line-of-movement or blocking rules
    #[error("Illegal move for {color:?} piece {piece}: {reason}")]
    IllegalMove {
        color: Color,
        piece: usize,
        reason: String,
    },

    /// A play's source matched neither side's piece list while applying it
    #[error("Play {play} has source {source_square} which is in neither piece list")]
    InternalInconsistency { play: Play, source_square: Square },

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A state or play does not fit the fixed-width cache encoding
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The side to move has no legal play
    #[error("No legal play available for {0:?}")]
    NoLegalPlay(Color),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
