// Asynchronous game logging
//
// Fire-and-forget JSONL writes so the game loop never waits on disk. Each
// line holds the field as it was before the turn and the play that was made,
// which is all the replay tool needs to re-run a player on that position.

use log::error;
use parking_lot::Mutex as SyncMutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::board::GameField;
use crate::player::Decision;
use crate::types::{Color, Play};

/// One logged turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub turn: u32,
    pub color: Color,
    pub player: String,
    /// Field before the play was applied
    pub field: GameField,
    pub play: Play,
    pub score: Option<f64>,
    pub depth: u32,
    pub timestamp: String,
}

/// Shared game logger
/// Clones write to the same file; `flush` waits for every write issued so far
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    pending: Arc<SyncMutex<Vec<JoinHandle<()>>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new logger
    /// If enabled is true, truncates or creates the log file
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Game logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    pending: Arc::new(SyncMutex::new(Vec::new())),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create game log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            pending: Arc::new(SyncMutex::new(Vec::new())),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a turn without blocking the caller
    pub fn log_turn(
        &self,
        turn: u32,
        color: Color,
        player: &str,
        field: &GameField,
        decision: &Decision,
    ) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            turn,
            color,
            player: player.to_string(),
            field: field.clone(),
            play: decision.play,
            score: decision.score,
            depth: decision.depth,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let file_handle = self.file.clone();
        let handle = tokio::spawn(async move {
            Self::write_entry(file_handle, entry).await;
        });
        self.pending.lock().push(handle);
    }

    async fn write_entry(file_handle: Arc<Mutex<Option<File>>>, entry: LogEntry) {
        let mut file_guard = file_handle.lock().await;
        let file = match file_guard.as_mut() {
            Some(file) => file,
            None => return,
        };

        let json_line = match serde_json::to_string(&entry) {
            Ok(json_line) => json_line,
            Err(e) => {
                error!("Failed to serialize log entry for turn {}: {}", entry.turn, e);
                return;
            }
        };
        if let Err(e) = file.write_all(format!("{}\n", json_line).as_bytes()).await {
            error!("Failed to write log entry: {}", e);
        } else if let Err(e) = file.flush().await {
            error!("Failed to flush game log: {}", e);
        }
    }

    /// Waits until every entry logged so far has been written
    pub async fn flush(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.pending.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Game log task failed: {}", e);
            }
        }
    }
}
