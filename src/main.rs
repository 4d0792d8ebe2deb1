// =============================================================================
// Vega Options Oracle: Main Entry Point
// =============================================================================
//
// Boot order: env + logging, config (file, then env overrides), persisted
// engine state, shared AppState, background persistence task, HTTP shell.
// The engine keeps working in memory if any persistence step fails.
// =============================================================================

mod api;
mod app_state;
mod engine;
mod persistence;
mod runtime_config;
mod signals;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Vega Options Oracle — Starting Up                ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load("oracle_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Port override from the environment, VEGA_PORT winning over PORT.
    if let Some(port) = std::env::var("VEGA_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
    {
        config.port = port;
    }

    info!(
        port = config.port,
        adaptive_weights = config.adaptive_weights,
        state_path = %config.state_path,
        "engine configuration resolved"
    );

    // ── 2. Restore persisted engine state ────────────────────────────────
    let initial = match persistence::load_state(&config.state_path) {
        Ok(state) => {
            info!(
                records = state.history.len(),
                feedback_total = state.accuracy.total,
                "persisted engine state restored"
            );
            Some(state)
        }
        Err(e) => {
            warn!(error = %e, "no persisted state restored, starting with default weights");
            None
        }
    };

    // ── 3. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config, initial));

    // ── 4. Spawn the persistence sweep ───────────────────────────────────
    tokio::spawn(persistence::run_persistence_task(state.clone()));

    // ── 5. Start the API server ──────────────────────────────────────────
    let bind_addr = format!("0.0.0.0:{}", state.config.port);
    let api_state = state.clone();
    let bind_addr_clone = bind_addr.clone();
    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr_clone)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr_clone, "API server listening");
        axum::serve(listener, app)
            .await
            .expect("API server failed");
    });

    info!("Oracle running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    if let Err(e) = persistence::save_state(&state.config.state_path, &state.engine.export_state())
    {
        error!(error = %e, "Failed to save engine state on shutdown");
    }

    info!("Vega Options Oracle shut down complete.");
    Ok(())
}
