use log::{error, info, warn};
use std::env;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use amazons_engine::board::GameField;
use amazons_engine::cache::StateCache;
use amazons_engine::config::{Config, PlayerConfig};
use amazons_engine::debug_logger::DebugLogger;
use amazons_engine::error::EngineError;
use amazons_engine::player::{build_player, Decision, Player};
use amazons_engine::simple_profiler;
use amazons_engine::types::Color;

/// Attempts per turn before a side that keeps proposing illegal plays forfeits
const MAX_ATTEMPTS: usize = 3;

/// Runs one player decision off the async runtime
async fn decide(player: Arc<dyn Player>, field: &GameField, color: Color) -> Result<Decision, String> {
    let snapshot = field.clone();
    tokio::task::spawn_blocking(move || {
        let decision = player.play(&snapshot, color);
        simple_profiler::merge_thread_local();
        decision
    })
    .await
    .map_err(|e| format!("player task failed: {}", e))?
    .map_err(|e| e.to_string())
}

fn build_or_exit(config: &PlayerConfig, shared: Option<Arc<StateCache>>) -> Arc<dyn Player> {
    match build_player(config, shared) {
        Ok(player) => Arc::from(player),
        Err(e) => {
            error!("Failed to build player '{}': {}", config.name, e);
            process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    info!("Starting Amazons game...");

    let config = match env::args().nth(1) {
        Some(path) => Config::from_file(&path).unwrap_or_else(|e| {
            error!("{}", e);
            process::exit(1);
        }),
        None => Config::load_or_default(),
    };

    let shared = config.cache.shared.then(|| Arc::new(StateCache::new()));
    let white = build_or_exit(&config.white, shared.clone());
    let black = build_or_exit(&config.black, shared.clone());
    info!("White: {}, Black: {}", white.name(), black.name());

    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;
    let start_time = Instant::now();

    let mut field = GameField::new();
    let mut color = Color::White;
    let mut turn: u32 = 1;

    let winner = loop {
        if !field.can_move(color) {
            info!("{} cannot move", color.as_str());
            break color.other();
        }

        let player = match color {
            Color::White => white.clone(),
            Color::Black => black.clone(),
        };

        let mut applied = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let decision = match decide(player.clone(), &field, color).await {
                Ok(decision) => decision,
                Err(e) => {
                    error!("Turn {}: {} failed to decide: {}", turn, player.name(), e);
                    process::exit(1);
                }
            };

            let piece = match decision.piece_index(&field, color) {
                Some(piece) => piece,
                None => {
                    warn!(
                        "Turn {} attempt {}: no {} piece on {}",
                        turn,
                        attempt,
                        color.as_str(),
                        decision.play.source
                    );
                    continue;
                }
            };

            let before = field.clone();
            match field.apply_move(color, piece, decision.play.destination, decision.play.arrow) {
                Ok(()) => {
                    logger.log_turn(turn, color, player.name(), &before, &decision);
                    applied = Some((decision, piece));
                    break;
                }
                Err(e @ EngineError::IllegalMove { .. }) => {
                    warn!("Turn {} attempt {}: {}", turn, attempt, e);
                }
                Err(e) => {
                    error!("Turn {}: {} could not be applied: {}", turn, decision.play, e);
                    process::exit(1);
                }
            }
        }

        let (decision, piece) = match applied {
            Some(applied) => applied,
            None => {
                warn!("{} forfeits after {} attempts", color.as_str(), MAX_ATTEMPTS);
                break color.other();
            }
        };

        info!(
            "Turn {} ({}, {}): piece {} {} score={:?} depth={}\n{}",
            turn,
            color.as_str(),
            player.name(),
            piece,
            decision.play,
            decision.score,
            decision.depth,
            field
        );

        color = color.other();
        turn += 1;
    };

    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    info!(
        "{} wins after {} turns ({}ms)",
        winner.as_str(),
        turn - 1,
        elapsed_ms
    );

    simple_profiler::merge_thread_local();
    simple_profiler::print_report(elapsed_ms);

    if let Some(cache) = &shared {
        let stats = cache.stats();
        info!(
            "Cache: {} entries, {} lookups, {} hits, {} stores",
            stats.entries, stats.lookups, stats.hits, stats.stores
        );
    }

    logger.flush().await;
}
