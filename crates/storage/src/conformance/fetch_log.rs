use std::future::Future;

use super::{check, make_fetch_log, make_progress, Check};
use crate::ProgressStore;

pub(super) async fn run_fetch_log_tests<S, F, Fut>(factory: &F) -> Vec<Check>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(check(
        "fetch_log",
        "empty_store_has_no_logs",
        empty_store_has_no_logs(factory).await,
    ));
    results.push(check(
        "fetch_log",
        "logs_read_newest_first",
        logs_read_newest_first(factory).await,
    ));
    results.push(check(
        "fetch_log",
        "limit_truncates_to_newest",
        limit_truncates_to_newest(factory).await,
    ));
    results.push(check(
        "fetch_log",
        "payload_round_trips",
        payload_round_trips(factory).await,
    ));
    results.push(check(
        "fetch_log",
        "logs_independent_of_progress",
        logs_independent_of_progress(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn empty_store_has_no_logs<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let logs = s.recent_fetch_logs(0).await.map_err(|e| e.to_string())?;
    if !logs.is_empty() {
        return Err(format!("expected no logs, got {}", logs.len()));
    }
    Ok(())
}

/// Logs come back in reverse append order.
async fn logs_read_newest_first<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for day in 0..4 {
        s.append_fetch_log(make_fetch_log(day))
            .await
            .map_err(|e| e.to_string())?;
    }
    let logs = s.recent_fetch_logs(0).await.map_err(|e| e.to_string())?;
    let days: Vec<i64> = logs
        .iter()
        .filter_map(|l| l.payload["day"].as_i64())
        .collect();
    if days != vec![3, 2, 1, 0] {
        return Err(format!("expected days [3, 2, 1, 0], got {:?}", days));
    }
    Ok(())
}

/// A non-zero limit returns only the newest `limit` entries.
async fn limit_truncates_to_newest<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for day in 0..5 {
        s.append_fetch_log(make_fetch_log(day))
            .await
            .map_err(|e| e.to_string())?;
    }
    let logs = s.recent_fetch_logs(2).await.map_err(|e| e.to_string())?;
    let days: Vec<i64> = logs
        .iter()
        .filter_map(|l| l.payload["day"].as_i64())
        .collect();
    if days != vec![4, 3] {
        return Err(format!("expected days [4, 3], got {:?}", days));
    }
    Ok(())
}

/// The raw payload and period bounds read back unchanged.
async fn payload_round_trips<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut log = make_fetch_log(7);
    log.payload = serde_json::json!({
        "responses": [{"iso": "BRA", "areaHa": 1250.0}, {"iso": "COD", "error": "timeout"}],
    });
    s.append_fetch_log(log.clone())
        .await
        .map_err(|e| e.to_string())?;
    let logs = s.recent_fetch_logs(1).await.map_err(|e| e.to_string())?;
    if logs.first() != Some(&log) {
        return Err(format!("expected {:?}, got {:?}", log, logs.first()));
    }
    Ok(())
}

/// Appending logs does not create or alter progress records, and vice versa.
async fn logs_independent_of_progress<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.append_fetch_log(make_fetch_log(0))
        .await
        .map_err(|e| e.to_string())?;
    if s.latest_progress()
        .await
        .map_err(|e| e.to_string())?
        .is_some()
    {
        return Err("fetch log append created a progress record".to_string());
    }
    s.append_progress(make_progress(0, 0, 0.0))
        .await
        .map_err(|e| e.to_string())?;
    let logs = s.recent_fetch_logs(0).await.map_err(|e| e.to_string())?;
    if logs.len() != 1 {
        return Err(format!("expected 1 log, got {}", logs.len()));
    }
    Ok(())
}
