use std::future::Future;

use super::{check, make_progress, Check};
use crate::{ProgressStore, StorageError};

pub(super) async fn run_sequence_tests<S, F, Fut>(factory: &F) -> Vec<Check>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(check(
        "sequence",
        "first_record_must_be_sequence_zero",
        first_record_must_be_sequence_zero(factory).await,
    ));
    results.push(check(
        "sequence",
        "stale_sequence_returns_conflict",
        stale_sequence_returns_conflict(factory).await,
    ));
    results.push(check(
        "sequence",
        "skipped_sequence_returns_conflict",
        skipped_sequence_returns_conflict(factory).await,
    ));
    results.push(check(
        "sequence",
        "conflict_leaves_latest_unchanged",
        conflict_leaves_latest_unchanged(factory).await,
    ));
    results.push(check(
        "sequence",
        "country_index_cannot_decrease",
        country_index_cannot_decrease(factory).await,
    ));
    results.push(check(
        "sequence",
        "negative_accumulated_area_rejected",
        negative_accumulated_area_rejected(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

/// Appending sequence 1 to an empty store is a conflict (expected 0).
async fn first_record_must_be_sequence_zero<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.append_progress(make_progress(1, 0, 0.0)).await {
        Err(StorageError::ConcurrentConflict {
            expected: 0,
            found: 1,
        }) => Ok(()),
        other => Err(format!("expected conflict 0/1, got {:?}", other)),
    }
}

/// Re-appending an already used sequence is a conflict.
async fn stale_sequence_returns_conflict<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.append_progress(make_progress(0, 0, 0.0))
        .await
        .map_err(|e| e.to_string())?;
    s.append_progress(make_progress(1, 0, 10.0))
        .await
        .map_err(|e| e.to_string())?;
    match s.append_progress(make_progress(1, 0, 20.0)).await {
        Err(StorageError::ConcurrentConflict {
            expected: 2,
            found: 1,
        }) => Ok(()),
        other => Err(format!("expected conflict 2/1, got {:?}", other)),
    }
}

/// Jumping ahead of the next sequence is also a conflict.
async fn skipped_sequence_returns_conflict<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.append_progress(make_progress(0, 0, 0.0))
        .await
        .map_err(|e| e.to_string())?;
    match s.append_progress(make_progress(5, 0, 0.0)).await {
        Err(StorageError::ConcurrentConflict { .. }) => Ok(()),
        other => Err(format!("expected conflict, got {:?}", other)),
    }
}

/// A rejected append does not change what latest_progress returns.
async fn conflict_leaves_latest_unchanged<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let first = make_progress(0, 0, 3.0);
    s.append_progress(first.clone())
        .await
        .map_err(|e| e.to_string())?;
    let _ = s.append_progress(make_progress(0, 0, 99.0)).await;
    let latest = s.latest_progress().await.map_err(|e| e.to_string())?;
    if latest.as_ref() != Some(&first) {
        return Err(format!("latest changed after conflict: {:?}", latest));
    }
    Ok(())
}

/// The country pointer is monotonically non-decreasing.
async fn country_index_cannot_decrease<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.append_progress(make_progress(0, 2, 0.0))
        .await
        .map_err(|e| e.to_string())?;
    match s.append_progress(make_progress(1, 1, 0.0)).await {
        Err(StorageError::InvalidRecord(_)) => Ok(()),
        other => Err(format!("expected InvalidRecord, got {:?}", other)),
    }
}

/// Accumulated area must never be negative.
async fn negative_accumulated_area_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.append_progress(make_progress(0, 0, -0.5)).await {
        Err(StorageError::InvalidRecord(_)) => Ok(()),
        other => Err(format!("expected InvalidRecord, got {:?}", other)),
    }
}
