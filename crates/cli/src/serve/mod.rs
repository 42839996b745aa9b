//! `deforest serve` -- status server for a long-running bot.
//!
//! Runs one routine cycle as soon as the listener is bound, then keeps
//! serving the status log until Ctrl+C.
//!
//! Endpoints:
//! - GET /health - Server status
//! - GET /status - `{"status": {"date", "log"}}`, the routine's status log
//!
//! All responses use Content-Type: application/json.

mod handlers;
mod state;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use deforest_routine::{CycleOutcome, Routine, StatusLog};
use tower_http::cors::{Any, CorsLayer};

use self::handlers::{handle_health, handle_not_found, handle_status};
use self::state::AppState;
use crate::config::Config;
use crate::wiring::{build_routine, build_store};

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Build the router over `state`.
fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on `port` and kick off the startup cycle.
pub async fn start_server(config: Config, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let status = Arc::new(StatusLog::new());
    let store = build_store(&config).await?;
    let routine = Arc::new(build_routine(&config, store, status)?);

    let state = Arc::new(AppState {
        routine: routine.clone(),
    });

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "deforest status server listening");

    tokio::spawn(run_startup_cycle(routine));

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

async fn run_startup_cycle(routine: Arc<Routine>) {
    match routine.run_cycle().await {
        CycleOutcome::Done { record, .. } => {
            tracing::info!(sequence = record.sequence, "startup cycle committed")
        }
        CycleOutcome::NoOp { area_km2 } => {
            tracing::info!(area_km2, "startup cycle had nothing to publish")
        }
        CycleOutcome::Failed(e) | CycleOutcome::NotRun(e) => {
            tracing::warn!(error = %e, "startup cycle failed")
        }
    }
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
