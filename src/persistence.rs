// =============================================================================
// Engine State Persistence
// =============================================================================
//
// Best-effort durability for the engine triple (weights, history, accuracy).
// One JSON blob, loaded once at startup and rewritten by a detached interval
// task whenever the engine revision has moved. Saves use an atomic tmp +
// rename pattern to prevent corruption on crash.
//
// Failures here are logged and never surfaced: the decision path must not
// know persistence exists.
// =============================================================================

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::app_state::AppState;
use crate::engine::EngineState;

/// Load a previously persisted engine state blob.
pub fn load_state(path: impl AsRef<Path>) -> Result<EngineState> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read engine state from {}", path.display()))?;

    let state: EngineState = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse engine state from {}", path.display()))?;

    Ok(state)
}

/// Persist `state` to `path` using an atomic write (write to `.tmp`, then
/// rename).
pub fn save_state(path: impl AsRef<Path>, state: &EngineState) -> Result<()> {
    let path = path.as_ref();

    let content =
        serde_json::to_string(state).context("failed to serialise engine state to JSON")?;

    let tmp_path = path.with_extension("json.tmp");

    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write tmp state to {}", tmp_path.display()))?;

    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename tmp state to {}", path.display()))?;

    Ok(())
}

/// Detached snapshot loop. Wakes on the configured interval, and saves only
/// when the engine revision moved since the last successful save. The state
/// copy is taken under the engine lock; the file write happens outside it.
pub async fn run_persistence_task(state: Arc<AppState>) {
    let path = state.config.state_path.clone();
    let interval_secs = state.config.persist_interval_secs.max(1);
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    let mut last_saved = state.engine.revision();

    loop {
        interval.tick().await;

        let current = state.engine.revision();
        if current == last_saved {
            continue;
        }

        let snapshot = state.engine.export_state();
        match save_state(&path, &snapshot) {
            Ok(()) => {
                last_saved = current;
                debug!(path = %path, records = snapshot.history.len(), "engine state saved");
            }
            Err(e) => {
                warn!(error = %e, "engine state save failed, continuing in memory");
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalId;
    use crate::types::Outcome;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("oracle-state-{tag}-{}.json", std::process::id()))
    }

    #[test]
    fn state_round_trips_through_disk() {
        let path = temp_path("roundtrip");

        let mut state = EngineState::default();
        state.accuracy.record(Outcome::Correct);
        state.accuracy.record(Outcome::Other);
        state.weights.decay(0.95);

        save_state(&path, &state).unwrap();
        let loaded = load_state(&path).unwrap();

        assert_eq!(loaded.accuracy.total, 2);
        assert_eq!(loaded.accuracy.correct, 1);
        assert!(
            (loaded.weights.get(SignalId::RsiOversold) - state.weights.get(SignalId::RsiOversold))
                .abs()
                < f64::EPSILON
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_is_an_error_not_a_panic() {
        let err = load_state(temp_path("missing")).unwrap_err();
        assert!(err.to_string().contains("failed to read engine state"));
    }

    #[test]
    fn save_replaces_existing_blob() {
        let path = temp_path("replace");

        let state = EngineState::default();
        save_state(&path, &state).unwrap();

        let mut updated = EngineState::default();
        updated.accuracy.record(Outcome::Correct);
        save_state(&path, &updated).unwrap();

        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded.accuracy.total, 1);

        let _ = std::fs::remove_file(&path);
    }
}
