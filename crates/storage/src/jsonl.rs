//! File backend: one JSON document per line, one file per history.
//!
//! ```text
//! <dir>/progress.jsonl    ProgressRecord per line, oldest first
//! <dir>/fetch_log.jsonl   PeriodFetchLog per line, oldest first
//! <dir>/.lock             advisory lock taken around every append
//! ```
//!
//! Appends are flushed and `fsync`ed before returning. The version check
//! and the append run under an in-process mutex plus an exclusive lock on
//! `<dir>/.lock`, so stores in other processes sharing the directory see
//! each other's appends before checking the sequence.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::record::{PeriodFetchLog, ProgressRecord};
use crate::traits::ProgressStore;

const PROGRESS_FILE: &str = "progress.jsonl";
const FETCH_LOG_FILE: &str = "fetch_log.jsonl";
const LOCK_FILE: &str = ".lock";

/// A [`ProgressStore`] backed by JSON-lines files in a directory.
#[derive(Debug)]
pub struct JsonlStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("create store directory", &dir, e))?;
        Ok(JsonlStore {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn progress_path(&self) -> PathBuf {
        self.dir.join(PROGRESS_FILE)
    }

    fn fetch_log_path(&self) -> PathBuf {
        self.dir.join(FETCH_LOG_FILE)
    }

    /// Block until this process holds the directory lock. Released on drop.
    async fn lock_dir(&self) -> Result<std::fs::File, StorageError> {
        let path = self.dir.join(LOCK_FILE);
        tokio::task::spawn_blocking(move || {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&path)
                .map_err(|e| io_error("open lock file", &path, e))?;
            file.lock().map_err(|e| io_error("lock", &path, e))?;
            Ok(file)
        })
        .await
        .map_err(|e| StorageError::Backend(format!("lock task failed: {}", e)))?
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Backend(format!("{} '{}': {}", action, path.display(), e))
}

/// Read every line of a JSON-lines file. A missing file is an empty history.
async fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
    let content = match fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error("read", path, e)),
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|e| {
                StorageError::Backend(format!(
                    "corrupt line {} in '{}': {}",
                    n + 1,
                    path.display(),
                    e
                ))
            })
        })
        .collect()
}

async fn append_line<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let mut line = serde_json::to_string(value)
        .map_err(|e| StorageError::Backend(format!("serialize record: {}", e)))?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| io_error("open", path, e))?;
    file.write_all(line.as_bytes())
        .await
        .map_err(|e| io_error("append to", path, e))?;
    file.sync_data()
        .await
        .map_err(|e| io_error("sync", path, e))?;
    Ok(())
}

#[async_trait]
impl ProgressStore for JsonlStore {
    async fn latest_progress(&self) -> Result<Option<ProgressRecord>, StorageError> {
        let mut history: Vec<ProgressRecord> = read_lines(&self.progress_path()).await?;
        Ok(history.pop())
    }

    async fn append_progress(&self, record: ProgressRecord) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let _dir_lock = self.lock_dir().await?;
        let latest = self.latest_progress().await?;
        record.validate_successor(latest.as_ref())?;
        append_line(&self.progress_path(), &record).await?;
        tracing::debug!(sequence = record.sequence, "appended progress record");
        Ok(())
    }

    async fn append_fetch_log(&self, log: PeriodFetchLog) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let _dir_lock = self.lock_dir().await?;
        append_line(&self.fetch_log_path(), &log).await
    }

    async fn recent_fetch_logs(&self, limit: usize) -> Result<Vec<PeriodFetchLog>, StorageError> {
        let mut logs: Vec<PeriodFetchLog> = read_lines(&self.fetch_log_path()).await?;
        logs.reverse();
        if limit > 0 {
            logs.truncate(limit);
        }
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use time::macros::datetime;

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let now = datetime!(2026-10-10 12:00 UTC);
        {
            let store = JsonlStore::open(dir.path()).await.unwrap();
            store.latest_or_seed(now).await.unwrap();
            let mut next = ProgressRecord::seed(now);
            next.sequence = 1;
            next.accumulated_area = 42.0;
            store.append_progress(next).await.unwrap();
        }

        let reopened = JsonlStore::open(dir.path()).await.unwrap();
        let latest = reopened.latest_progress().await.unwrap().unwrap();
        assert_eq!(latest.sequence, 1);
        assert_eq!(latest.accumulated_area, 42.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn separate_stores_on_one_directory_reject_the_stale_writer() {
        let dir = tempfile::tempdir().unwrap();
        let now = datetime!(2026-10-10 12:00 UTC);
        let stores: Vec<Arc<JsonlStore>> = vec![
            Arc::new(JsonlStore::open(dir.path()).await.unwrap()),
            Arc::new(JsonlStore::open(dir.path()).await.unwrap()),
        ];
        stores[0].latest_or_seed(now).await.unwrap();

        for round in 1..=20u64 {
            let handles: Vec<_> = stores
                .iter()
                .map(|store| {
                    let store = store.clone();
                    tokio::spawn(async move {
                        let mut next = ProgressRecord::seed(now);
                        next.sequence = round;
                        store.append_progress(next).await
                    })
                })
                .collect();

            let mut ok = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(()) => ok += 1,
                    Err(StorageError::ConcurrentConflict { .. }) => {}
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            assert_eq!(ok, 1, "round {round}: exactly one writer wins");
        }

        let lines = std::fs::read_to_string(dir.path().join(PROGRESS_FILE)).unwrap();
        assert_eq!(lines.lines().count(), 21);
    }

    #[tokio::test]
    async fn corrupt_line_is_a_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROGRESS_FILE), "{not json}\n").unwrap();
        let store = JsonlStore::open(dir.path()).await.unwrap();
        let err = store.latest_progress().await.unwrap_err();
        assert!(matches!(err, StorageError::Backend(msg) if msg.contains("corrupt line 1")));
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let seed = ProgressRecord::seed(datetime!(2026-10-10 12:00 UTC));
        let line = serde_json::to_string(&seed).unwrap();
        std::fs::write(dir.path().join(PROGRESS_FILE), format!("\n{line}\n\n")).unwrap();
        let store = JsonlStore::open(dir.path()).await.unwrap();
        assert_eq!(store.latest_progress().await.unwrap(), Some(seed));
    }
}
