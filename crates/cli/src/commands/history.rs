use std::process;

use deforest_core::format_area;
use deforest_storage::ProgressStore;

use crate::config::Config;
use crate::wiring::build_store;
use crate::{report_error, OutputFormat};

/// Print the latest progress record and the most recent fetch logs.
pub(crate) async fn cmd_history(config: &Config, limit: usize, output: OutputFormat, quiet: bool) {
    let store = match build_store(config).await {
        Ok(s) => s,
        Err(e) => {
            report_error(&e, output, quiet);
            process::exit(1);
        }
    };

    let latest = store.latest_progress().await;
    let logs = store.recent_fetch_logs(limit).await;
    let (latest, logs) = match (latest, logs) {
        (Ok(latest), Ok(logs)) => (latest, logs),
        (Err(e), _) | (_, Err(e)) => {
            report_error(&format!("storage unavailable: {}", e), output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "progress": latest,
                "fetch_logs": logs,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
            );
        }
        OutputFormat::Text => {
            if quiet {
                return;
            }
            match &latest {
                Some(r) => println!(
                    "progress #{}: country #{}, {} accumulated (last period {}, recorded {})",
                    r.sequence,
                    r.country_index,
                    format_area(r.accumulated_area),
                    r.period_end.date(),
                    r.recorded_at.date()
                ),
                None => println!("no progress recorded"),
            }
            for log in &logs {
                println!(
                    "fetch {}..{} recorded {}",
                    log.period_start.date(),
                    log.period_end.date(),
                    log.recorded_at
                );
            }
        }
    }
}
