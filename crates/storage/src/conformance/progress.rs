use std::future::Future;

use super::{base_time, check, make_progress, Check};
use crate::ProgressStore;

pub(super) async fn run_progress_tests<S, F, Fut>(factory: &F) -> Vec<Check>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(check(
        "progress",
        "empty_store_has_no_latest",
        empty_store_has_no_latest(factory).await,
    ));
    results.push(check(
        "progress",
        "seed_is_zero_record_at_now",
        seed_is_zero_record_at_now(factory).await,
    ));
    results.push(check(
        "progress",
        "seed_is_persisted",
        seed_is_persisted(factory).await,
    ));
    results.push(check(
        "progress",
        "seed_not_written_twice",
        seed_not_written_twice(factory).await,
    ));
    results.push(check(
        "progress",
        "latest_is_last_appended",
        latest_is_last_appended(factory).await,
    ));
    results.push(check(
        "progress",
        "appended_record_round_trips",
        appended_record_round_trips(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

/// A fresh store has no latest progress record.
async fn empty_store_has_no_latest<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.latest_progress().await.map_err(|e| e.to_string())? {
        None => Ok(()),
        Some(r) => Err(format!("expected no record, got sequence {}", r.sequence)),
    }
}

/// Seeding an empty store yields sequence 0, country 0, zero areas, period = now.
async fn seed_is_zero_record_at_now<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let seed = s
        .latest_or_seed(base_time())
        .await
        .map_err(|e| e.to_string())?;
    if seed.sequence != 0 || seed.country_index != 0 {
        return Err(format!(
            "expected sequence 0 / country 0, got {} / {}",
            seed.sequence, seed.country_index
        ));
    }
    if seed.accumulated_area != 0.0 || seed.period_area != 0.0 {
        return Err("seed areas must be zero".to_string());
    }
    if seed.period_start != base_time() || seed.period_end != base_time() {
        return Err("seed period must be the given time".to_string());
    }
    Ok(())
}

/// The seed written by latest_or_seed is visible to latest_progress.
async fn seed_is_persisted<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let seed = s
        .latest_or_seed(base_time())
        .await
        .map_err(|e| e.to_string())?;
    let latest = s.latest_progress().await.map_err(|e| e.to_string())?;
    if latest.as_ref() != Some(&seed) {
        return Err(format!("expected persisted seed, got {:?}", latest));
    }
    Ok(())
}

/// A second latest_or_seed returns the existing record instead of seeding again.
async fn seed_not_written_twice<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.latest_or_seed(base_time())
        .await
        .map_err(|e| e.to_string())?;
    s.append_progress(make_progress(1, 0, 12.0))
        .await
        .map_err(|e| e.to_string())?;
    let again = s
        .latest_or_seed(base_time())
        .await
        .map_err(|e| e.to_string())?;
    if again.sequence != 1 || again.accumulated_area != 12.0 {
        return Err(format!(
            "expected existing record (seq 1, area 12), got seq {} area {}",
            again.sequence, again.accumulated_area
        ));
    }
    Ok(())
}

/// After several appends, latest_progress returns the newest.
async fn latest_is_last_appended<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for (seq, idx, area) in [(0, 0, 0.0), (1, 0, 30.0), (2, 0, 60.0), (3, 1, 0.0)] {
        s.append_progress(make_progress(seq, idx, area))
            .await
            .map_err(|e| format!("append {seq}: {e}"))?;
    }
    let latest = s
        .latest_progress()
        .await
        .map_err(|e| e.to_string())?
        .ok_or("expected a record")?;
    if latest.sequence != 3 || latest.country_index != 1 || latest.accumulated_area != 0.0 {
        return Err(format!("unexpected latest record: {:?}", latest));
    }
    Ok(())
}

/// Every field of an appended record reads back unchanged.
async fn appended_record_round_trips<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut rec = make_progress(0, 0, 1234.5);
    rec.period_area = 0.75;
    s.append_progress(rec.clone())
        .await
        .map_err(|e| e.to_string())?;
    let latest = s.latest_progress().await.map_err(|e| e.to_string())?;
    if latest.as_ref() != Some(&rec) {
        return Err(format!("expected {:?}, got {:?}", rec, latest));
    }
    Ok(())
}
