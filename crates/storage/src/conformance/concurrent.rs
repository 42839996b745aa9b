use std::future::Future;
use std::sync::Arc;

use super::{check, make_fetch_log, make_progress, Check};
use crate::{ProgressStore, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<Check>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(check(
        "concurrent",
        "concurrent_appends_exactly_one_wins",
        concurrent_appends_exactly_one_wins(factory).await,
    ));
    results.push(check(
        "concurrent",
        "concurrent_fetch_logs_all_recorded",
        concurrent_fetch_logs_all_recorded(factory).await,
    ));

    results
}

// ── Concurrent append: exactly one wins ─────────────────────────────────────

/// N tasks read the same latest record and race to append its successor.
/// Exactly one append succeeds; the rest must get ConcurrentConflict.
async fn concurrent_appends_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    storage
        .append_progress(make_progress(0, 0, 0.0))
        .await
        .map_err(|e| format!("seed: {e}"))?;

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            match s.append_progress(make_progress(1, 0, i as f64)).await {
                Ok(()) => Ok(true),
                Err(StorageError::ConcurrentConflict { .. }) => Ok(false),
                Err(e) => Err(e),
            }
        }));
    }

    let mut winners = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
        if won {
            winners += 1;
        }
    }

    if winners != 1 {
        return Err(format!("expected exactly 1 winner, got {winners}"));
    }

    let latest = storage
        .latest_progress()
        .await
        .map_err(|e| e.to_string())?
        .ok_or("expected a record")?;
    if latest.sequence != 1 {
        return Err(format!("expected latest sequence 1, got {}", latest.sequence));
    }
    Ok(())
}

/// Fetch log appends never conflict: all N land.
async fn concurrent_fetch_logs_all_recorded<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            s.append_fetch_log(make_fetch_log(i as i64)).await
        }));
    }
    for handle in handles {
        handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("storage error: {e}"))?;
    }

    let logs = storage
        .recent_fetch_logs(0)
        .await
        .map_err(|e| e.to_string())?;
    if logs.len() != N {
        return Err(format!("expected {N} logs, got {}", logs.len()));
    }
    Ok(())
}
