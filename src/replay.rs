// Replay module for re-running players on logged games
//
// Loads a JSONL game log, asks the configured player for each logged
// position again and compares the replayed play with the logged one. With
// seeded players and the log replayed in turn order, every play matches.

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::board::GameField;
use crate::cache::StateCache;
use crate::config::Config;
pub use crate::debug_logger::LogEntry;
use crate::player::{build_player, Decision, Player};
use crate::types::{Color, Play};

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: u32,
    pub color: Color,
    pub original_play: Play,
    pub replayed_play: Play,
    pub matches: bool,
    pub original_score: Option<f64>,
    pub replayed_score: Option<f64>,
    pub search_depth: u32,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine holding one freshly built player per colour
pub struct ReplayEngine {
    white: Box<dyn Player>,
    black: Box<dyn Player>,
    verbose: bool,
}

impl ReplayEngine {
    /// Builds both configured players
    pub fn new(config: &Config, verbose: bool) -> Result<Self, String> {
        let shared = config.cache.shared.then(|| Arc::new(StateCache::new()));
        let white = build_player(&config.white, shared.clone())
            .map_err(|e| format!("Failed to build white player: {}", e))?;
        let black = build_player(&config.black, shared)
            .map_err(|e| format!("Failed to build black player: {}", e))?;
        Ok(ReplayEngine {
            white,
            black,
            verbose,
        })
    }

    /// Loads all log entries from a JSONL file, ordered by turn
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;
            entries.push(entry);
        }

        // writes are concurrent, so file order may differ from turn order
        entries.sort_by_key(|entry| entry.turn);
        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    fn player_for(&self, color: Color) -> &dyn Player {
        match color {
            Color::White => self.white.as_ref(),
            Color::Black => self.black.as_ref(),
        }
    }

    /// Runs the configured player on one field
    pub fn replay_turn(&self, field: &GameField, color: Color) -> Result<(Decision, u128), String> {
        let start_time = Instant::now();
        let decision = self
            .player_for(color)
            .play(field, color)
            .map_err(|e| e.to_string())?;
        Ok((decision, start_time.elapsed().as_millis()))
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        if self.verbose {
            info!("Replaying turn {}...", entry.turn);
        }

        let (decision, computation_time) = self.replay_turn(&entry.field, entry.color)?;
        let matches = decision.play == entry.play;

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: ✓ MATCH - {} (depth: {}, time: {}ms)",
                    entry.turn, decision.play, decision.depth, computation_time
                );
            } else {
                warn!(
                    "Turn {}: ✗ MISMATCH - Original: {}, Replayed: {} (depth: {}, time: {}ms)",
                    entry.turn, entry.play, decision.play, decision.depth, computation_time
                );
            }
        }

        Ok(ReplayResult {
            turn: entry.turn,
            color: entry.color,
            original_play: entry.play,
            replayed_play: decision.play,
            matches,
            original_score: entry.score,
            replayed_score: decision.score,
            search_depth: decision.depth,
            computation_time_ms: computation_time,
        })
    }

    /// Replays all entries in order
    pub fn replay_all(&self, entries: &[LogEntry]) -> Vec<ReplayResult> {
        let mut results = Vec::new();
        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => warn!("Failed to replay turn {}: {}", entry.turn, e),
            }
        }
        results
    }

    /// Replays specific turns from a log
    pub fn replay_turns(
        &self,
        entries: &[LogEntry],
        turn_numbers: &[u32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();
        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn_num)
                .ok_or_else(|| format!("Turn {} not found in log file", turn_num))?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => warn!("Failed to replay turn {}: {}", turn_num, e),
            }
        }
        Ok(results)
    }

    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches: total_turns - matches,
            match_rate,
        }
    }

    /// Prints a summary and every mismatch
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let count = results.len() as f64;
            let avg_time =
                results.iter().map(|r| r.computation_time_ms as f64).sum::<f64>() / count;
            let avg_depth = results.iter().map(|r| r.search_depth as f64).sum::<f64>() / count;
            println!("Average Search Depth:       {:.1}", avg_depth);
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("DETAILED MISMATCHES");
            for result in mismatches {
                println!(
                    "Turn {} ({}): {} → {} (depth: {}, time: {}ms)",
                    result.turn,
                    result.color.as_str(),
                    result.original_play,
                    result.replayed_play,
                    result.search_depth,
                    result.computation_time_ms
                );
            }
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(matches: bool) -> ReplayResult {
        let play = Play::new(
            crate::types::Square::new(6, 0),
            crate::types::Square::new(5, 0),
            crate::types::Square::new(4, 0),
        );
        ReplayResult {
            turn: 1,
            color: Color::White,
            original_play: play,
            replayed_play: play,
            matches,
            original_score: None,
            replayed_score: None,
            search_depth: 0,
            computation_time_ms: 0,
        }
    }

    #[test]
    fn test_stats_match_rate() {
        let engine = ReplayEngine::new(&Config::default_hardcoded(), false).unwrap();
        let stats = engine.generate_stats(&[result(true), result(true), result(false), result(true)]);
        assert_eq!(stats.total_turns, 4);
        assert_eq!(stats.mismatches, 1);
        assert_eq!(stats.match_rate, 75.0);
    }

    #[test]
    fn test_empty_results_have_zero_rate() {
        let engine = ReplayEngine::new(&Config::default_hardcoded(), false).unwrap();
        assert_eq!(engine.generate_stats(&[]).match_rate, 0.0);
    }
}
