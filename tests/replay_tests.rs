// Integration tests for game logging and replay
//
// A short game between seeded players is logged through the async logger,
// then replayed with freshly built players from the same configuration.

use std::sync::Arc;

use amazons_engine::board::GameField;
use amazons_engine::config::{Config, Strategy};
use amazons_engine::debug_logger::DebugLogger;
use amazons_engine::player::{build_player, Player};
use amazons_engine::replay::ReplayEngine;
use amazons_engine::types::Color;

fn seeded_config() -> Config {
    let mut config = Config::default_hardcoded();
    config.white.strategy = Strategy::Random;
    config.white.engine.seed = Some(3);
    config.black.strategy = Strategy::OnePly;
    config.black.engine.plays_calculated = 2;
    config.black.engine.seed = Some(4);
    config
}

async fn play_logged_game(config: &Config, turns: u32, path: &str) {
    let logger = DebugLogger::new(true, path).await;
    let white: Arc<dyn Player> = Arc::from(build_player(&config.white, None).unwrap());
    let black: Arc<dyn Player> = Arc::from(build_player(&config.black, None).unwrap());

    let mut field = GameField::new();
    let mut color = Color::White;
    for turn in 1..=turns {
        let player = match color {
            Color::White => white.clone(),
            Color::Black => black.clone(),
        };
        let decision = player.play(&field, color).unwrap();
        let before = field.clone();
        field.apply_play(color, &decision.play).unwrap();
        logger.log_turn(turn, color, player.name(), &before, &decision);
        color = color.other();
    }
    logger.flush().await;
}

fn temp_log(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("{}_{}.jsonl", name, std::process::id()))
        .to_string_lossy()
        .to_string()
}

#[tokio::test]
async fn test_replay_reproduces_seeded_game() {
    let config = seeded_config();
    let path = temp_log("amazons_replay_full");
    play_logged_game(&config, 8, &path).await;

    let engine = ReplayEngine::new(&config, false).unwrap();
    let entries = engine.load_log_file(&path).unwrap();
    assert_eq!(entries.len(), 8);
    assert!(entries.windows(2).all(|pair| pair[0].turn < pair[1].turn));

    let results = engine.replay_all(&entries);
    let stats = engine.generate_stats(&results);
    assert_eq!(stats.total_turns, 8);
    assert_eq!(stats.mismatches, 0, "Seeded players must replay identically");
    assert_eq!(stats.match_rate, 100.0);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_replay_selected_turns() {
    let config = seeded_config();
    let path = temp_log("amazons_replay_turns");
    play_logged_game(&config, 4, &path).await;

    let engine = ReplayEngine::new(&config, true).unwrap();
    let entries = engine.load_log_file(&path).unwrap();
    let results = engine.replay_turns(&entries, &[1, 3]).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.color == Color::White));
    assert!(engine.replay_turns(&entries, &[99]).is_err());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_missing_log_file_is_an_error() {
    let engine = ReplayEngine::new(&Config::default_hardcoded(), false).unwrap();
    assert!(engine.load_log_file("does_not_exist.jsonl").is_err());
}
