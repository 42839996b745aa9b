//! The routine state machine.
//!
//! One call to [`Routine::run_cycle`] walks the states below, each handled by
//! its own transition in [`Routine::step`]:
//!
//! | state      | does                                              | next                  |
//! |------------|---------------------------------------------------|-----------------------|
//! | Init       | read (or seed) the latest progress record         | Measure               |
//! | Measure    | query the period, append the fetch log            | Decide                |
//! | Decide     | ignore periods below the minimum area             | NoOp / Compute        |
//! | Compute    | load country + base map, totals, pixel budgets    | Transition            |
//! | Transition | advance the country when its forest is exhausted  | Render                |
//! | Render     | paint the three layers                            | Publish               |
//! | Publish    | hand image + message to the publisher             | Commit                |
//! | Commit     | append the new progress record                    | Done                  |
//!
//! Any failing transition ends in `Fatal`. Progress is appended only in
//! `Commit`, so a failed publish leaves the next cycle to redo the same
//! accumulation from the last committed record.

use std::sync::Arc;
use std::time::Duration;

use deforest_core::{format_area, format_date, MapImage};
use deforest_storage::{PeriodFetchLog, ProgressRecord, ProgressStore};
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::adapter::{BaseMapProvider, CountryCatalog, MeasurementSource, Period, Publisher};
use crate::error::RoutineError;
use crate::message;
use crate::render::{Palette, PixelBudgets, RenderContext};
use crate::status::StatusLog;

// ──────────────────────────────────────────────
// Settings and collaborators
// ──────────────────────────────────────────────

/// Tunables for the routine, built once from configuration.
#[derive(Debug, Clone)]
pub struct RoutineSettings {
    /// How many days back the measured period lies.
    pub lag_days: i64,
    /// Pause between consecutive measurement requests.
    pub request_delay: Duration,
    /// Periods with less loss than this (km²) are skipped.
    pub min_area_km2: f64,
    pub palette: Palette,
}

/// The external systems one routine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ProgressStore>,
    pub source: Arc<dyn MeasurementSource>,
    pub catalog: Arc<dyn CountryCatalog>,
    pub maps: Arc<dyn BaseMapProvider>,
    pub publisher: Arc<dyn Publisher>,
}

// ──────────────────────────────────────────────
// States
// ──────────────────────────────────────────────

/// Country, map and arithmetic for one cycle.
#[derive(Debug, Clone)]
pub struct Plan {
    pub context: RenderContext,
    pub budgets: PixelBudgets,
    /// Prior accumulated area plus this period's area, km².
    pub total_km2: f64,
    /// Country forest area minus `total_km2`; negative once exhausted.
    pub remaining_km2: f64,
}

/// A state of one routine cycle.
#[derive(Debug)]
pub enum RoutineState {
    Init,
    Measure {
        prior: ProgressRecord,
    },
    Decide {
        prior: ProgressRecord,
        period: Period,
        area_km2: f64,
    },
    Compute {
        prior: ProgressRecord,
        period: Period,
        area_km2: f64,
    },
    Transition {
        prior: ProgressRecord,
        period: Period,
        area_km2: f64,
        plan: Box<Plan>,
    },
    Render {
        plan: Box<Plan>,
        next: ProgressRecord,
        message: String,
    },
    Publish {
        image: MapImage,
        next: ProgressRecord,
        message: String,
    },
    Commit {
        next: ProgressRecord,
        message: String,
    },
    Done {
        record: ProgressRecord,
        message: String,
    },
    NoOp {
        area_km2: f64,
    },
    Fatal {
        error: RoutineError,
        failed_in: &'static str,
    },
}

impl RoutineState {
    pub fn name(&self) -> &'static str {
        match self {
            RoutineState::Init => "init",
            RoutineState::Measure { .. } => "measure",
            RoutineState::Decide { .. } => "decide",
            RoutineState::Compute { .. } => "compute",
            RoutineState::Transition { .. } => "transition",
            RoutineState::Render { .. } => "render",
            RoutineState::Publish { .. } => "publish",
            RoutineState::Commit { .. } => "commit",
            RoutineState::Done { .. } => "done",
            RoutineState::NoOp { .. } => "no-op",
            RoutineState::Fatal { .. } => "fatal",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RoutineState::Done { .. } | RoutineState::NoOp { .. } | RoutineState::Fatal { .. }
        )
    }
}

/// How a cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// A new progress record was committed.
    Done {
        record: ProgressRecord,
        message: String,
    },
    /// The period had too little loss; nothing was rendered or committed.
    NoOp { area_km2: f64 },
    /// A step after reading progress failed.
    Failed(RoutineError),
    /// Progress could not be read; the routine did not run at all.
    NotRun(RoutineError),
}

impl CycleOutcome {
    /// Process exit status: 0 for done / no-op, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            CycleOutcome::Done { .. } | CycleOutcome::NoOp { .. } => 0,
            CycleOutcome::Failed(_) | CycleOutcome::NotRun(_) => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }
}

// ──────────────────────────────────────────────
// Routine
// ──────────────────────────────────────────────

/// Runs measurement-accumulation-render-publish cycles.
///
/// Cycles on the same `Routine` are serialized. Separate processes sharing
/// a store are kept apart by the store's version-checked append: the loser
/// fails in `Commit` with a conflict.
pub struct Routine {
    collaborators: Collaborators,
    settings: RoutineSettings,
    status: Arc<StatusLog>,
    run_lock: Mutex<()>,
}

impl Routine {
    pub fn new(
        collaborators: Collaborators,
        settings: RoutineSettings,
        status: Arc<StatusLog>,
    ) -> Self {
        Routine {
            collaborators,
            settings,
            status,
            run_lock: Mutex::new(()),
        }
    }

    pub fn status(&self) -> &Arc<StatusLog> {
        &self.status
    }

    pub fn store(&self) -> &Arc<dyn ProgressStore> {
        &self.collaborators.store
    }

    pub fn settings(&self) -> &RoutineSettings {
        &self.settings
    }

    /// Run one cycle now.
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.run_cycle_at(OffsetDateTime::now_utc()).await
    }

    /// Run one cycle as if the current time were `now`.
    pub async fn run_cycle_at(&self, now: OffsetDateTime) -> CycleOutcome {
        let _running = self.run_lock.lock().await;
        self.status.info("Routine started.");

        let mut state = RoutineState::Init;
        loop {
            state = match state {
                RoutineState::Done { record, message } => {
                    self.status.info("Routine finished.");
                    return CycleOutcome::Done { record, message };
                }
                RoutineState::NoOp { area_km2 } => return CycleOutcome::NoOp { area_km2 },
                RoutineState::Fatal {
                    error,
                    failed_in: "init",
                } => return CycleOutcome::NotRun(error),
                RoutineState::Fatal { error, .. } => return CycleOutcome::Failed(error),
                active => {
                    let name = active.name();
                    match self.step(active, now).await {
                        Ok(next) => next,
                        Err(error) => {
                            self.status
                                .error(format!("Routine failed in {}: {}", name, error));
                            RoutineState::Fatal {
                                error,
                                failed_in: name,
                            }
                        }
                    }
                }
            };
        }
    }

    /// Apply the transition for `state`. Terminal states are returned as is.
    pub async fn step(
        &self,
        state: RoutineState,
        now: OffsetDateTime,
    ) -> Result<RoutineState, RoutineError> {
        match state {
            RoutineState::Init => self.init(now).await,
            RoutineState::Measure { prior } => self.measure(prior, now).await,
            RoutineState::Decide {
                prior,
                period,
                area_km2,
            } => Ok(self.decide(prior, period, area_km2)),
            RoutineState::Compute {
                prior,
                period,
                area_km2,
            } => self.compute(prior, period, area_km2).await,
            RoutineState::Transition {
                prior,
                period,
                area_km2,
                plan,
            } => Ok(self.transition(prior, period, area_km2, plan, now)),
            RoutineState::Render {
                plan,
                next,
                message,
            } => Ok(self.render(*plan, next, message)),
            RoutineState::Publish {
                image,
                next,
                message,
            } => self.publish(image, next, message).await,
            RoutineState::Commit { next, message } => self.commit(next, message).await,
            terminal => Ok(terminal),
        }
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    async fn init(&self, now: OffsetDateTime) -> Result<RoutineState, RoutineError> {
        let prior = self
            .collaborators
            .store
            .latest_or_seed(now)
            .await
            .map_err(RoutineError::StorageUnavailable)?;

        self.status.info(format!(
            "Progress read: country #{}, {} accumulated.",
            prior.country_index,
            format_area(prior.accumulated_area)
        ));
        Ok(RoutineState::Measure { prior })
    }

    async fn measure(
        &self,
        prior: ProgressRecord,
        now: OffsetDateTime,
    ) -> Result<RoutineState, RoutineError> {
        let source = &self.collaborators.source;
        let period = Period::lagged(now, self.settings.lag_days).ok_or(
            RoutineError::PeriodOutOfRange {
                lag_days: self.settings.lag_days,
                now,
            },
        )?;
        self.status.info(format!(
            "Fetching alerts from {} for {}.",
            source.adapter_id(),
            format_date(period.end_date())
        ));

        let result = source
            .get_alerts(&period, self.settings.request_delay)
            .await;

        let payload = match &result {
            Ok(m) => m.raw_log.clone(),
            Err(e) => serde_json::json!({
                "source": source.adapter_id(),
                "error": e.to_string(),
            }),
        };
        self.collaborators
            .store
            .append_fetch_log(PeriodFetchLog {
                period_start: period.start,
                period_end: period.end,
                payload,
                recorded_at: now,
            })
            .await
            .map_err(RoutineError::StorageUnavailable)?;

        let measurement = result.map_err(RoutineError::MeasurementSource)?;
        self.status
            .info(format!("Area is {}.", format_area(measurement.area_km2)));

        Ok(RoutineState::Decide {
            prior,
            period,
            area_km2: measurement.area_km2,
        })
    }

    fn decide(&self, prior: ProgressRecord, period: Period, area_km2: f64) -> RoutineState {
        if area_km2 < self.settings.min_area_km2 {
            self.status
                .info("No new deforestation in this period. Nothing to do.");
            return RoutineState::NoOp { area_km2 };
        }
        RoutineState::Compute {
            prior,
            period,
            area_km2,
        }
    }

    async fn compute(
        &self,
        prior: ProgressRecord,
        period: Period,
        area_km2: f64,
    ) -> Result<RoutineState, RoutineError> {
        let catalog = &self.collaborators.catalog;
        let countries = catalog.list();
        let country = countries
            .get(prior.country_index)
            .cloned()
            .ok_or(RoutineError::CountriesExhausted {
                index: prior.country_index,
                count: countries.len(),
            })?;
        self.status.info(format!("Country is {}.", country.name));

        let details = catalog
            .details(&country.code)
            .await
            .map_err(RoutineError::Render)?;
        let base_map = self
            .collaborators
            .maps
            .fetch_image(&details.map_image_ref)
            .await
            .map_err(RoutineError::Render)?;

        let context = RenderContext::new(country, details, base_map, self.settings.palette.land)?;
        let total_km2 = area_km2 + prior.accumulated_area;
        let remaining_km2 = context.country.total_area - total_km2;
        let budgets = context.budgets(prior.accumulated_area, area_km2);

        tracing::debug!(
            total_km2,
            remaining_km2,
            whole = budgets.whole,
            prior = budgets.prior,
            new = budgets.new,
            "computed pixel budgets"
        );

        Ok(RoutineState::Transition {
            prior,
            period,
            area_km2,
            plan: Box::new(Plan {
                context,
                budgets,
                total_km2,
                remaining_km2,
            }),
        })
    }

    fn transition(
        &self,
        prior: ProgressRecord,
        period: Period,
        area_km2: f64,
        plan: Box<Plan>,
        now: OffsetDateTime,
    ) -> RoutineState {
        let country_count = self.collaborators.catalog.list().len();
        let name = plan.context.country.name.clone();

        let (country_index, accumulated_area, message) = if plan.remaining_km2 < 0.0 {
            let next_index = prior.country_index + 1;
            let message = message::depleted(
                plan.total_km2,
                &name,
                country_count.saturating_sub(next_index),
            );
            (next_index, 0.0, message)
        } else {
            let message = message::ongoing(
                area_km2,
                period.end_date(),
                plan.total_km2,
                plan.remaining_km2,
                &name,
            );
            (prior.country_index, plan.total_km2, message)
        };

        let next = ProgressRecord {
            sequence: prior.sequence + 1,
            period_start: period.start,
            period_end: period.end,
            period_area: area_km2,
            country_index,
            accumulated_area,
            recorded_at: now,
        };

        RoutineState::Render {
            plan,
            next,
            message,
        }
    }

    fn render(&self, plan: Plan, next: ProgressRecord, message: String) -> RoutineState {
        let image = plan.context.render(&plan.budgets, &self.settings.palette);
        self.status.info("Map generated.");
        self.status.info(message.clone());
        RoutineState::Publish {
            image,
            next,
            message,
        }
    }

    async fn publish(
        &self,
        image: MapImage,
        next: ProgressRecord,
        message: String,
    ) -> Result<RoutineState, RoutineError> {
        let publisher = &self.collaborators.publisher;
        publisher
            .publish(&image, &message)
            .await
            .map_err(RoutineError::Publish)?;
        self.status
            .info(format!("Published via {}.", publisher.adapter_id()));
        Ok(RoutineState::Commit { next, message })
    }

    async fn commit(
        &self,
        next: ProgressRecord,
        message: String,
    ) -> Result<RoutineState, RoutineError> {
        self.collaborators
            .store
            .append_progress(next.clone())
            .await
            .map_err(RoutineError::Commit)?;
        self.status.info(format!(
            "Progress saved: country #{}, {} accumulated.",
            next.country_index,
            format_area(next.accumulated_area)
        ));
        Ok(RoutineState::Done {
            record: next,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deforest_storage::StorageError;

    #[test]
    fn exit_codes() {
        let done = CycleOutcome::Done {
            record: ProgressRecord::seed(OffsetDateTime::UNIX_EPOCH),
            message: String::new(),
        };
        assert_eq!(done.exit_code(), 0);
        assert_eq!(CycleOutcome::NoOp { area_km2: 0.2 }.exit_code(), 0);

        let offline = || RoutineError::StorageUnavailable(StorageError::Backend("down".into()));
        assert_eq!(CycleOutcome::NotRun(offline()).exit_code(), 1);
        assert_eq!(CycleOutcome::Failed(offline()).exit_code(), 1);
        assert!(!CycleOutcome::Failed(offline()).is_success());
    }

    #[test]
    fn only_done_no_op_and_fatal_are_terminal() {
        assert!(!RoutineState::Init.is_terminal());
        assert!(RoutineState::NoOp { area_km2: 0.0 }.is_terminal());
        let fatal = RoutineState::Fatal {
            error: RoutineError::CountriesExhausted { index: 3, count: 3 },
            failed_in: "compute",
        };
        assert!(fatal.is_terminal());
        assert_eq!(fatal.name(), "fatal");
    }
}
