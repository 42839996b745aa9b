//! Human-readable run log exposed by the status endpoint.
//!
//! Every entry is also emitted through `tracing`, so the log sink sees the
//! same lines the status endpoint serves.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;
use time::OffsetDateTime;

/// Entries kept when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 500;

/// One timestamped status line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// The status payload: `{"status": {"date": .., "log": [..]}}`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub status: StatusBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBody {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub log: Vec<StatusEntry>,
}

/// Bounded, shared log of routine progress messages.
#[derive(Debug)]
pub struct StatusLog {
    entries: Mutex<VecDeque<StatusEntry>>,
    capacity: usize,
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` entries, dropping the oldest first.
    pub fn with_capacity(capacity: usize) -> Self {
        StatusLog {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Record an informational line.
    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.push(message);
    }

    /// Record a failure line.
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        self.push(message);
    }

    fn push(&self, message: String) {
        let entry = StatusEntry {
            message,
            date: OffsetDateTime::now_utc(),
        };
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> Vec<StatusEntry> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.iter().cloned().collect()
    }

    /// Current time plus the retained entries.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: StatusBody {
                date: OffsetDateTime::now_utc(),
                log: self.entries(),
            },
        }
    }

    /// Write the retained entries to `path` as pretty JSON.
    pub async fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.entries()).map_err(std::io::Error::other)?;
        tokio::fs::write(path, json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_entries_in_order() {
        let log = StatusLog::new();
        log.info("BOT ROUTINE STARTED.");
        log.error("PUBLISH FAILED.");
        let messages: Vec<String> = log.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["BOT ROUTINE STARTED.", "PUBLISH FAILED."]);
    }

    #[test]
    fn drops_oldest_beyond_capacity() {
        let log = StatusLog::with_capacity(2);
        for i in 0..5 {
            log.info(format!("line {i}"));
        }
        let messages: Vec<String> = log.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["line 3", "line 4"]);
    }

    #[test]
    fn snapshot_has_status_shape() {
        let log = StatusLog::new();
        log.info("hello");
        let json = serde_json::to_value(log.snapshot()).unwrap();
        assert!(json["status"]["date"].is_string());
        assert_eq!(json["status"]["log"][0]["message"], "hello");
    }

    #[tokio::test]
    async fn save_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let log = StatusLog::new();
        log.info("one");
        log.save(&path).await.unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved[0]["message"], "one");
    }
}
