//! In-process backend, used for dry runs and tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::record::{PeriodFetchLog, ProgressRecord};
use crate::traits::ProgressStore;

#[derive(Debug, Default)]
struct Histories {
    progress: Vec<ProgressRecord>,
    fetch_logs: Vec<PeriodFetchLog>,
}

/// A [`ProgressStore`] holding both histories in memory.
///
/// Can be switched "offline" to simulate an unreachable database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Histories>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing progress history (oldest first).
    pub fn with_progress(progress: Vec<ProgressRecord>) -> Self {
        MemoryStore {
            inner: Mutex::new(Histories {
                progress,
                fetch_logs: Vec::new(),
            }),
            offline: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with `StorageError::Backend`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Full progress history, oldest first.
    pub async fn progress_history(&self) -> Vec<ProgressRecord> {
        self.inner.lock().await.progress.clone()
    }

    /// Full fetch log history, oldest first.
    pub async fn fetch_log_history(&self) -> Vec<PeriodFetchLog> {
        self.inner.lock().await.fetch_logs.clone()
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::Backend("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn latest_progress(&self) -> Result<Option<ProgressRecord>, StorageError> {
        self.check_online()?;
        Ok(self.inner.lock().await.progress.last().cloned())
    }

    async fn append_progress(&self, record: ProgressRecord) -> Result<(), StorageError> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        record.validate_successor(inner.progress.last())?;
        inner.progress.push(record);
        Ok(())
    }

    async fn append_fetch_log(&self, log: PeriodFetchLog) -> Result<(), StorageError> {
        self.check_online()?;
        self.inner.lock().await.fetch_logs.push(log);
        Ok(())
    }

    async fn recent_fetch_logs(&self, limit: usize) -> Result<Vec<PeriodFetchLog>, StorageError> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        let take = if limit == 0 { usize::MAX } else { limit };
        Ok(inner.fetch_logs.iter().rev().take(take).cloned().collect())
    }
}
