use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::StorageError;
use crate::record::{PeriodFetchLog, ProgressRecord};

/// The storage trait for deforest progress backends.
///
/// Two independent append-only histories live behind it:
///
/// - **progress**: [`ProgressRecord`]s, the latest of which is "where the
///   bot is". Appends are version-checked: a record must carry
///   `latest.sequence + 1` (or 0 for the first one), otherwise the append
///   fails with `StorageError::ConcurrentConflict`. Backends must also run
///   [`ProgressRecord::validate_successor`] before persisting.
/// - **fetch logs**: [`PeriodFetchLog`]s, appended unconditionally.
///
/// Every append must be durable when the returned future resolves.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` to be used in axum
/// application state and across async task boundaries.
#[async_trait]
pub trait ProgressStore: Send + Sync + 'static {
    // ── Progress ──────────────────────────────────────────────────────────────

    /// Read the most recently appended progress record, if any.
    async fn latest_progress(&self) -> Result<Option<ProgressRecord>, StorageError>;

    /// Append a progress record after checking it against the latest one.
    async fn append_progress(&self, record: ProgressRecord) -> Result<(), StorageError>;

    // ── Fetch logs ────────────────────────────────────────────────────────────

    /// Append a fetch log entry.
    async fn append_fetch_log(&self, log: PeriodFetchLog) -> Result<(), StorageError>;

    /// Read up to `limit` fetch logs, newest first (0 = no limit).
    async fn recent_fetch_logs(&self, limit: usize) -> Result<Vec<PeriodFetchLog>, StorageError>;

    // ── Provided ──────────────────────────────────────────────────────────────

    /// Read the latest progress record, seeding the store on first use.
    ///
    /// An empty store gets a zero record (period = `now`, area 0, country 0)
    /// which is persisted before being returned.
    async fn latest_or_seed(&self, now: OffsetDateTime) -> Result<ProgressRecord, StorageError> {
        if let Some(latest) = self.latest_progress().await? {
            return Ok(latest);
        }

        let seed = ProgressRecord::seed(now);
        self.append_progress(seed.clone()).await?;
        tracing::info!("seeded empty progress store");
        Ok(seed)
    }
}
