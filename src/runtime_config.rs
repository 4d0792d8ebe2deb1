// =============================================================================
// Runtime Configuration
// =============================================================================
//
// Every tunable knob for the oracle lives here and loads from a JSON file
// next to the binary. All fields carry `#[serde(default)]` helpers so that
// adding new fields never breaks loading an older config file; a missing
// file just means defaults.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::EngineSettings;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_weight_decay_factor() -> f64 {
    0.95
}

fn default_min_accuracy() -> f64 {
    0.6
}

fn default_state_path() -> String {
    "oracle_state.json".to_string()
}

fn default_persist_interval_secs() -> u64 {
    30
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the oracle process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// TCP port the HTTP shell binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether low tracked accuracy triggers weight decay after feedback.
    #[serde(default = "default_true")]
    pub adaptive_weights: bool,

    /// Multiplier applied to every weight on a decay cycle.
    #[serde(default = "default_weight_decay_factor")]
    pub weight_decay_factor: f64,

    /// Accuracy threshold below which decay fires.
    #[serde(default = "default_min_accuracy")]
    pub min_accuracy: f64,

    /// Path of the persisted engine-state blob.
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Seconds between persistence sweeps.
    #[serde(default = "default_persist_interval_secs")]
    pub persist_interval_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            adaptive_weights: true,
            weight_decay_factor: default_weight_decay_factor(),
            min_accuracy: default_min_accuracy(),
            state_path: default_state_path(),
            persist_interval_secs: default_persist_interval_secs(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            port = config.port,
            adaptive_weights = config.adaptive_weights,
            "config loaded"
        );

        Ok(config)
    }

    /// Engine policy knobs derived from this configuration.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            adaptive_weights: self.adaptive_weights,
            weight_decay_factor: self.weight_decay_factor,
            min_accuracy: self.min_accuracy,
        }
    }
}
