// =============================================================================
// Signal Engine: decision core behind one synchronization boundary
// =============================================================================
//
// Owns the mutable triple (weight table, rolling history, accuracy counters)
// behind a single parking_lot mutex. Weight adaptation reads the counters and
// writes the weights atomically with respect to concurrent decisions, so the
// whole triple lives under one lock; stats and health reads take the same
// lock and hand out clones.
//
// A monotone revision counter is bumped on every mutation. The persistence
// task compares revisions to decide whether anything is worth saving, and
// snapshots state via `export_state` so file I/O never happens under the
// lock or on the decision path.
// =============================================================================

pub mod history;
pub mod weights;

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::signals::decision::{self, MarketRegime, VolatilityLevel};
use crate::signals::{technical, writers_zone, SignalId};
use crate::types::{IndicatorSnapshot, Outcome, TradeAction, WritersZoneSnapshot, ZoneDirection};

use history::{AccuracyTracker, RollingHistory, SignalRecord};
use weights::WeightTable;

// =============================================================================
// Settings & state
// =============================================================================

/// Engine policy knobs, derived from the runtime configuration once at
/// startup.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Whether feedback may trigger weight decay.
    pub adaptive_weights: bool,
    /// Multiplier applied to every weight on a decay cycle.
    pub weight_decay_factor: f64,
    /// Accuracy below which a feedback call triggers decay.
    pub min_accuracy: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            adaptive_weights: true,
            weight_decay_factor: 0.95,
            min_accuracy: 0.6,
        }
    }
}

/// The persisted triple. Serialized as one blob; every field has a default
/// so older state files keep loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineState {
    #[serde(default)]
    pub weights: WeightTable,
    #[serde(default)]
    pub history: RollingHistory,
    #[serde(default)]
    pub accuracy: AccuracyTracker,
}

// =============================================================================
// Reports
// =============================================================================

/// Analysis block echoed alongside every decision.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionAnalysis {
    pub detected_signals: Vec<SignalId>,
    pub total_strength: f64,
    pub vix_condition: VolatilityLevel,
    pub market_regime: MarketRegime,
    pub ltp: f64,
    pub signal_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writers_zone: Option<ZoneDirection>,
    pub writers_confidence: f64,
}

/// The engine's answer to one decision request. A fault still produces a
/// well-formed report (HOLD at zero confidence with the error message)
/// rather than an error the caller has to handle.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionReport {
    pub signal: TradeAction,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<DecisionAnalysis>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DecisionReport {
    /// Safe-default report for the fault path.
    pub fn fault(message: impl Into<String>) -> Self {
        Self {
            signal: TradeAction::Hold,
            confidence: 0.0,
            analysis: None,
            timestamp: Utc::now().to_rfc3339(),
            error: Some(message.into()),
        }
    }
}

/// Statistics payload for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_predictions: u64,
    pub correct_predictions: u64,
    pub accuracy: f64,
    pub recent_signals: Vec<SignalRecord>,
    pub pattern_weights: WeightTable,
}

/// Health payload for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EngineHealth {
    pub status: &'static str,
    pub timestamp: String,
    pub model_loaded: bool,
    pub total_signals: usize,
    pub accuracy: f64,
    pub pattern_weights: WeightTable,
}

// =============================================================================
// SignalEngine
// =============================================================================

pub struct SignalEngine {
    settings: EngineSettings,
    revision: AtomicU64,
    state: Mutex<EngineState>,
}

impl SignalEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_state(settings, EngineState::default())
    }

    /// Build an engine around previously persisted state.
    pub fn with_state(settings: EngineSettings, state: EngineState) -> Self {
        Self {
            settings,
            revision: AtomicU64::new(1),
            state: Mutex::new(state),
        }
    }

    // ── Decision path ───────────────────────────────────────────────────

    /// Evaluate one snapshot (plus the optional writers-zone overlay) into a
    /// decision report, recording it in the rolling history.
    ///
    /// Deterministic for a fixed weight table: extraction and classification
    /// are pure, and only the history append mutates state.
    pub fn decide(
        &self,
        snapshot: &IndicatorSnapshot,
        writers: Option<&WritersZoneSnapshot>,
    ) -> DecisionReport {
        let mut state = self.state.lock();

        let (mut signals, mut strength) = technical::extract(snapshot, &state.weights);
        if let Some(zone) = writers {
            let (zone_signals, zone_strength) = writers_zone::extract(zone, &state.weights);
            signals.extend(zone_signals);
            strength += zone_strength;
        }

        let (action, confidence) = decision::classify(&signals, strength, snapshot, writers);

        state.history.push(SignalRecord::new(
            action,
            confidence,
            signals.clone(),
            strength,
            snapshot.clone(),
            writers.cloned(),
        ));
        drop(state);
        self.bump_revision();

        info!(signal = %action, confidence = round3(confidence), "prediction generated");

        DecisionReport {
            signal: action,
            confidence: round3(confidence),
            analysis: Some(DecisionAnalysis {
                signal_count: signals.len(),
                detected_signals: signals,
                total_strength: round2(strength),
                vix_condition: decision::vix_condition(snapshot.vix.value()),
                market_regime: decision::market_regime(snapshot, writers),
                ltp: snapshot.ltp(),
                writers_zone: writers.map(|w| w.zone),
                writers_confidence: writers.map(|w| w.confidence()).unwrap_or(0.0),
            }),
            timestamp: Utc::now().to_rfc3339(),
            error: None,
        }
    }

    // ── Feedback path ───────────────────────────────────────────────────

    /// Record an outcome for a past prediction. The predicted signal is
    /// logged but never matched against the history. When adaptive weights
    /// are enabled and tracked accuracy sits below the threshold, every
    /// weight decays in the same critical section.
    pub fn feedback(&self, predicted: Option<&str>, outcome: Outcome) {
        let mut state = self.state.lock();
        state.accuracy.record(outcome);

        if self.settings.adaptive_weights {
            let accuracy = state.accuracy.accuracy();
            if state.accuracy.total > 0 && accuracy < self.settings.min_accuracy {
                state.weights.decay(self.settings.weight_decay_factor);
                debug!(accuracy = round3(accuracy), "accuracy below threshold, weights decayed");
            }
        }
        drop(state);
        self.bump_revision();

        debug!(
            predicted = predicted.unwrap_or("unspecified"),
            correct = (outcome == Outcome::Correct),
            "feedback recorded"
        );
    }

    // ── Introspection ───────────────────────────────────────────────────

    pub fn stats(&self) -> EngineStats {
        let state = self.state.lock();
        EngineStats {
            total_predictions: state.accuracy.total,
            correct_predictions: state.accuracy.correct,
            accuracy: round3(state.accuracy.accuracy()),
            recent_signals: state.history.recent(10),
            pattern_weights: state.weights.clone(),
        }
    }

    pub fn health_snapshot(&self) -> EngineHealth {
        let state = self.state.lock();
        EngineHealth {
            status: "healthy",
            timestamp: Utc::now().to_rfc3339(),
            model_loaded: true,
            total_signals: state.history.len(),
            accuracy: round3(state.accuracy.accuracy()),
            pattern_weights: state.weights.clone(),
        }
    }

    /// Consistent copy of the persisted triple for the snapshot task.
    pub fn export_state(&self) -> EngineState {
        self.state.lock().clone()
    }

    /// Monotone mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    fn bump_revision(&self) {
        self.revision.fetch_add(1, Ordering::SeqCst);
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::decode_predict_payload;
    use serde_json::json;

    fn engine() -> SignalEngine {
        SignalEngine::new(EngineSettings::default())
    }

    fn bullish_payload() -> serde_json::Value {
        json!({
            "RSI": {"rsi": 25, "status": "Oversold"},
            "EMA20": {"status": "Bullish"},
            "SMA50": {"status": "Bullish"},
            "MACD": {"status": "Bullish"},
            "VIX": {"vix": 10, "status": "Calm Market"},
            "SuperTrend": {"status": "Bullish"},
            "Aroon": {"status": "Uptrend"},
            "writersZone": "BULLISH",
            "confidence": 0.8,
            "LTP": 19525.5
        })
    }

    #[test]
    fn decide_is_deterministic_for_fixed_weights() {
        let engine = engine();
        let (snapshot, writers) = decode_predict_payload(&bullish_payload()).unwrap();

        let first = engine.decide(&snapshot, writers.as_ref());
        let second = engine.decide(&snapshot, writers.as_ref());

        assert_eq!(first.signal, second.signal);
        assert!((first.confidence - second.confidence).abs() < f64::EPSILON);
        let a = first.analysis.unwrap();
        let b = second.analysis.unwrap();
        assert_eq!(a.detected_signals, b.detected_signals);
        assert!((a.total_strength - b.total_strength).abs() < f64::EPSILON);
    }

    #[test]
    fn strong_setup_reports_full_analysis() {
        let engine = engine();
        let (snapshot, writers) = decode_predict_payload(&bullish_payload()).unwrap();
        let report = engine.decide(&snapshot, writers.as_ref());

        assert_eq!(report.signal, TradeAction::BuyCe);
        assert!(report.confidence >= 0.8 && report.confidence <= 0.95);
        assert!(report.error.is_none());

        let analysis = report.analysis.unwrap();
        assert_eq!(analysis.signal_count, analysis.detected_signals.len());
        assert_eq!(analysis.vix_condition, VolatilityLevel::LowVolatility);
        assert_eq!(analysis.market_regime, MarketRegime::LowVolatility);
        assert_eq!(analysis.writers_zone, Some(ZoneDirection::Bullish));
        assert!((analysis.writers_confidence - 0.8).abs() < f64::EPSILON);
        assert!((analysis.ltp - 19525.5).abs() < f64::EPSILON);
    }

    #[test]
    fn high_vix_always_holds() {
        let engine = engine();
        let (snapshot, writers) = decode_predict_payload(&json!({
            "RSI": {"rsi": 25, "status": "Oversold"},
            "EMA20": {"status": "Bullish"},
            "SMA50": {"status": "Bullish"},
            "MACD": {"status": "Bullish"},
            "SuperTrend": {"status": "Bullish"},
            "Aroon": {"status": "Uptrend"},
            "VIX": {"vix": 22},
            "writersZone": "BULLISH",
            "confidence": 0.9
        }))
        .unwrap();

        let report = engine.decide(&snapshot, writers.as_ref());
        assert_eq!(report.signal, TradeAction::Hold);
        assert!((report.confidence - 0.0).abs() < f64::EPSILON);
        assert_eq!(
            report.analysis.unwrap().vix_condition,
            VolatilityLevel::HighVolatility
        );
    }

    #[test]
    fn every_decision_lands_in_history() {
        let engine = engine();
        let (snapshot, _) = decode_predict_payload(&json!({})).unwrap();
        for _ in 0..5 {
            engine.decide(&snapshot, None);
        }
        let stats = engine.stats();
        assert_eq!(stats.recent_signals.len(), 5);
        assert_eq!(engine.health_snapshot().total_signals, 5);
    }

    #[test]
    fn feedback_updates_accuracy_and_decays_weights() {
        let engine = engine();

        // 5 correct then 5 incorrect. Accuracy drops below 0.6 on calls 9
        // (5/9) and 10 (5/10), so the table decays exactly twice.
        for _ in 0..5 {
            engine.feedback(Some("BUY_CE"), Outcome::Correct);
        }
        for _ in 0..5 {
            engine.feedback(Some("BUY_CE"), Outcome::Other);
        }

        let stats = engine.stats();
        assert_eq!(stats.total_predictions, 10);
        assert_eq!(stats.correct_predictions, 5);
        assert!((stats.accuracy - 0.5).abs() < f64::EPSILON);

        let expected = 0.8 * 0.95 * 0.95;
        assert!((stats.pattern_weights.get(SignalId::RsiOversold) - expected).abs() < 1e-9);
        // Negative entries were lifted to the floor by the first decay.
        assert!((stats.pattern_weights.get(SignalId::VixHigh) - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn decay_disabled_leaves_weights_untouched() {
        let engine = SignalEngine::new(EngineSettings {
            adaptive_weights: false,
            ..EngineSettings::default()
        });
        for _ in 0..10 {
            engine.feedback(None, Outcome::Other);
        }
        let stats = engine.stats();
        assert!((stats.accuracy - 0.0).abs() < f64::EPSILON);
        assert!((stats.pattern_weights.get(SignalId::RsiOversold) - 0.8).abs() < f64::EPSILON);
        assert!((stats.pattern_weights.get(SignalId::VixHigh) + 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn revision_moves_on_every_mutation() {
        let engine = engine();
        let start = engine.revision();
        let (snapshot, _) = decode_predict_payload(&json!({})).unwrap();
        engine.decide(&snapshot, None);
        assert!(engine.revision() > start);

        let after_decide = engine.revision();
        engine.feedback(None, Outcome::Correct);
        assert!(engine.revision() > after_decide);
    }

    #[test]
    fn fault_report_is_a_safe_hold() {
        let report = DecisionReport::fault("boom");
        assert_eq!(report.signal, TradeAction::Hold);
        assert!((report.confidence - 0.0).abs() < f64::EPSILON);
        assert_eq!(report.error.as_deref(), Some("boom"));
        assert!(report.analysis.is_none());
    }

    #[test]
    fn restored_state_is_visible() {
        let mut state = EngineState::default();
        state.accuracy.record(Outcome::Correct);
        state.accuracy.record(Outcome::Other);

        let engine = SignalEngine::with_state(EngineSettings::default(), state);
        let stats = engine.stats();
        assert_eq!(stats.total_predictions, 2);
        assert_eq!(stats.correct_predictions, 1);
    }
}
