// =============================================================================
// Application State
// =============================================================================
//
// Ties the runtime configuration and the signal engine together for the API
// handlers and background tasks. All mutable engine state lives behind the
// engine's own lock; this struct is shared as `Arc<AppState>` and never
// mutated after construction.
// =============================================================================

use std::time::Instant;

use crate::engine::{EngineState, SignalEngine};
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    pub config: RuntimeConfig,
    pub engine: SignalEngine,
    /// Instant the process started. Used for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    /// Construct the shared state, optionally seeding the engine with
    /// previously persisted state.
    pub fn new(config: RuntimeConfig, initial: Option<EngineState>) -> Self {
        let settings = config.engine_settings();
        let engine = match initial {
            Some(state) => SignalEngine::with_state(settings, state),
            None => SignalEngine::new(settings),
        };

        Self {
            config,
            engine,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
