use std::path::Path;
use std::process;
use std::sync::Arc;

use deforest_core::format_area;
use deforest_routine::{CycleOutcome, StatusLog};

use crate::config::Config;
use crate::wiring::{build_routine, build_store};
use crate::{report_error, OutputFormat};

/// Run one routine cycle and exit with its status.
pub(crate) async fn cmd_run(
    config: &Config,
    save_log: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let status = Arc::new(StatusLog::new());

    let store = match build_store(config).await {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("{}; routine not run", e), output, quiet);
            process::exit(1);
        }
    };
    let routine = match build_routine(config, store, status.clone()) {
        Ok(r) => r,
        Err(e) => {
            report_error(&format!("configuration error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let outcome = routine.run_cycle().await;

    if let Some(path) = save_log {
        if let Err(e) = status.save(path).await {
            report_error(
                &format!("could not save log to '{}': {}", path.display(), e),
                output,
                quiet,
            );
        }
    }

    match output {
        OutputFormat::Json => println!("{}", outcome_json(&outcome)),
        OutputFormat::Text => match &outcome {
            CycleOutcome::Done { message, .. } => {
                if !quiet {
                    println!("{}", message);
                }
            }
            CycleOutcome::NoOp { area_km2 } => {
                if !quiet {
                    println!("No new deforestation ({}).", format_area(*area_km2));
                }
            }
            CycleOutcome::Failed(e) => {
                report_error(&format!("routine failed: {}", e), output, quiet)
            }
            CycleOutcome::NotRun(e) => {
                report_error(&format!("{}; routine not run", e), output, quiet)
            }
        },
    }

    process::exit(outcome.exit_code());
}

fn outcome_json(outcome: &CycleOutcome) -> serde_json::Value {
    match outcome {
        CycleOutcome::Done { record, message } => serde_json::json!({
            "outcome": "done",
            "message": message,
            "record": record,
        }),
        CycleOutcome::NoOp { area_km2 } => serde_json::json!({
            "outcome": "no-op",
            "area_km2": area_km2,
        }),
        CycleOutcome::Failed(e) => serde_json::json!({
            "outcome": "failed",
            "error": e.to_string(),
        }),
        CycleOutcome::NotRun(e) => serde_json::json!({
            "outcome": "not-run",
            "error": e.to_string(),
        }),
    }
}
