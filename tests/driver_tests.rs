// Integration tests for the game driver binary
//
// Plays a full seeded game between a random player and a cached one-ply
// player sharing one cache, then checks the driver's turn and result lines.

use std::process::Command;

const QUICK_GAME: &str = r#"
[white]
name = "Wanderer"
strategy = "random"

[white.engine]
plays_calculated = 1
aggressiveness = 0.5
worker_count = 1
use_cache = true
seed = 11
build_in_threshold = 9

[black]
name = "Greedy"
strategy = "one_ply"

[black.engine]
plays_calculated = 1
aggressiveness = 0.8
worker_count = 1
use_cache = true
seed = 12
build_in_threshold = 9

[cache]
shared = true

[debug]
enabled = false
log_file_path = "unused.jsonl"
"#;

fn write_config(name: &str, contents: &str) -> String {
    let path = std::env::temp_dir().join(format!("{}_{}.toml", name, std::process::id()));
    std::fs::write(&path, contents).expect("Failed to write config");
    path.to_string_lossy().to_string()
}

#[test]
fn test_driver_plays_a_full_game() {
    let path = write_config("amazons_driver_game", QUICK_GAME);
    let output = Command::new(env!("CARGO_BIN_EXE_amazons-engine"))
        .arg(&path)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to run driver");
    let _ = std::fs::remove_file(&path);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Driver failed: {}", stderr);
    assert!(stderr.contains("Turn 1 (white, Wanderer): piece "), "Missing first turn: {}", stderr);
    assert!(stderr.contains("wins after"), "Missing game result: {}", stderr);
    assert!(!stderr.contains("forfeits"), "Generated plays must never be rejected");
}

#[test]
fn test_driver_rejects_invalid_config() {
    let path = write_config("amazons_driver_invalid", "[white]\nname = 3\n");
    let output = Command::new(env!("CARGO_BIN_EXE_amazons-engine"))
        .arg(&path)
        .output()
        .expect("Failed to run driver");
    let _ = std::fs::remove_file(&path);
    assert!(!output.status.success());
}
