//! Behaviour every `ProgressStore` backend must share.
//!
//! [`run_conformance_suite`] calls `factory` once per check for a fresh,
//! empty store and collects the outcome of each check:
//!
//! ```ignore
//! let report = run_conformance_suite(|| async { MemoryStore::new() }).await;
//! assert!(report.is_clean(), "{report}");
//! ```

mod concurrent;
mod fetch_log;
mod progress;
mod sequence;

use std::fmt;
use std::future::Future;

use time::{Duration, OffsetDateTime};

use crate::record::{PeriodFetchLog, ProgressRecord};
use crate::ProgressStore;

/// Outcome of one named check, e.g. `sequence/rejects_gap`.
#[derive(Debug, Clone)]
pub struct Check {
    pub name: String,
    pub outcome: Result<(), String>,
}

fn check(group: &str, name: &str, outcome: Result<(), String>) -> Check {
    Check {
        name: format!("{group}/{name}"),
        outcome,
    }
}

#[derive(Debug, Clone)]
pub struct SuiteReport {
    pub checks: Vec<Check>,
}

impl SuiteReport {
    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.outcome.is_err())
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        writeln!(f, "{} checks, {} failed", self.checks.len(), failed)?;
        for c in self.failures() {
            if let Err(msg) = &c.outcome {
                writeln!(f, "  {}: {}", c.name, msg)?;
            }
        }
        Ok(())
    }
}

pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> SuiteReport
where
    S: ProgressStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut checks = progress::run_progress_tests(&factory).await;
    checks.extend(sequence::run_sequence_tests(&factory).await);
    checks.extend(fetch_log::run_fetch_log_tests(&factory).await);
    checks.extend(concurrent::run_concurrent_tests(&factory).await);
    SuiteReport { checks }
}

// ── Record builders ───────────────────────────────────────────────────────────

fn base_time() -> OffsetDateTime {
    time::macros::datetime!(2026-01-01 00:00 UTC)
}

fn make_progress(sequence: u64, country_index: usize, accumulated_area: f64) -> ProgressRecord {
    let period = base_time() + Duration::days(sequence as i64);
    ProgressRecord {
        sequence,
        period_start: period,
        period_end: period,
        period_area: 5.0,
        country_index,
        accumulated_area,
        recorded_at: period + Duration::hours(1),
    }
}

fn make_fetch_log(day: i64) -> PeriodFetchLog {
    let period = base_time() + Duration::days(day);
    PeriodFetchLog {
        period_start: period,
        period_end: period,
        payload: serde_json::json!({ "day": day, "area_km2": day as f64 * 1.5 }),
        recorded_at: period,
    }
}
