// Library exports for the Amazons engine
// The game driver, the replay tool and the integration tests all build on these

pub mod board;
pub mod cache;
pub mod config;
pub mod debug_logger;
pub mod error;
pub mod eval;
pub mod movegen;
pub mod player;
pub mod replay;
pub mod search;
pub mod simple_profiler;
pub mod types;
