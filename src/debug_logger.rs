// Tick log: one JSONL line per processed tick
//
// Writes are fire-and-forget so the session task never waits on the disk. The
// line is built and stamped when the tick happens; a spawned task only appends
// the bytes. Spawned writes can land out of order, which is why the replay
// loader sorts by (round, tick).

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::engine::GameSnapshot;

/// One line of the tick log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickLogEntry {
    #[serde(flatten)]
    pub snapshot: GameSnapshot,
    pub timestamp: String,
}

impl TickLogEntry {
    pub fn now(snapshot: GameSnapshot) -> Self {
        TickLogEntry {
            snapshot,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

struct LogFile {
    path: PathBuf,
    file: Mutex<File>,
    written: AtomicU64,
}

/// Cheap to clone; a disabled logger drops every entry
#[derive(Clone, Default)]
pub struct DebugLogger {
    inner: Option<Arc<LogFile>>,
}

impl DebugLogger {
    /// Opens (and truncates) `log_file_path` when `enabled`.
    /// A file that cannot be opened leaves the logger disabled.
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return DebugLogger::disabled();
        }

        let opened = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await;

        match opened {
            Ok(file) => {
                info!("Tick log enabled: {}", log_file_path);
                DebugLogger {
                    inner: Some(Arc::new(LogFile {
                        path: PathBuf::from(log_file_path),
                        file: Mutex::new(file),
                        written: AtomicU64::new(0),
                    })),
                }
            }
            Err(e) => {
                error!("Failed to create tick log '{}': {}", log_file_path, e);
                DebugLogger::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        DebugLogger { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.as_ref().map(|log| log.path.as_path())
    }

    /// Lines appended so far
    pub fn entries_written(&self) -> u64 {
        self.inner
            .as_ref()
            .map_or(0, |log| log.written.load(Ordering::Relaxed))
    }

    /// Queues `snapshot` for writing. Must be called from inside a tokio runtime.
    pub fn log_tick(&self, snapshot: GameSnapshot) {
        let Some(log) = &self.inner else {
            return;
        };

        let mut line = match serde_json::to_string(&TickLogEntry::now(snapshot)) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize tick log entry: {}", e);
                return;
            }
        };
        line.push('\n');

        let log = Arc::clone(log);
        tokio::spawn(async move {
            let mut file = log.file.lock().await;
            let result = match file.write_all(line.as_bytes()).await {
                Ok(()) => file.flush().await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {
                    log.written.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => error!("Failed to write tick log '{}': {}", log.path.display(), e),
            }
        });
    }
}
