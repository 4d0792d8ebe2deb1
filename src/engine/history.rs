// =============================================================================
// Rolling History & Accuracy Tracker
// =============================================================================
//
// Every engine invocation appends one immutable SignalRecord; the ring is
// capped at HISTORY_CAPACITY with oldest-first eviction. Accuracy counters
// only ever move forward and are never reconciled against specific records.
// =============================================================================

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signals::SignalId;
use crate::types::{IndicatorSnapshot, Outcome, TradeAction, WritersZoneSnapshot};

/// Maximum number of decision records retained.
pub const HISTORY_CAPACITY: usize = 1000;

// =============================================================================
// SignalRecord
// =============================================================================

/// Auditable record of one decision: what was decided, which conditions
/// fired, and the snapshot that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    /// Unique identifier for this record (UUID v4).
    pub id: String,

    /// ISO 8601 timestamp of when the decision was made.
    pub timestamp: String,

    /// The action decided.
    pub signal: TradeAction,

    /// Confidence attached to the action (unrounded).
    pub confidence: f64,

    /// Every condition detected during extraction, in ladder order.
    pub detected_signals: Vec<SignalId>,

    /// Signed aggregate of the matched signal weights.
    pub strength: f64,

    /// The indicator snapshot that was evaluated.
    pub snapshot: IndicatorSnapshot,

    /// The writers-zone block, when one was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writers: Option<WritersZoneSnapshot>,
}

impl SignalRecord {
    pub fn new(
        signal: TradeAction,
        confidence: f64,
        detected_signals: Vec<SignalId>,
        strength: f64,
        snapshot: IndicatorSnapshot,
        writers: Option<WritersZoneSnapshot>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            signal,
            confidence,
            detected_signals,
            strength,
            snapshot,
            writers,
        }
    }
}

// =============================================================================
// RollingHistory
// =============================================================================

/// Bounded FIFO of past decisions, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollingHistory {
    records: VecDeque<SignalRecord>,
}

impl RollingHistory {
    /// Append a record, evicting the oldest once the cap is exceeded.
    pub fn push(&mut self, record: SignalRecord) {
        self.records.push_back(record);
        while self.records.len() > HISTORY_CAPACITY {
            self.records.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recent `n` records in chronological order.
    pub fn recent(&self, n: usize) -> Vec<SignalRecord> {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalRecord> {
        self.records.iter()
    }
}

// =============================================================================
// AccuracyTracker
// =============================================================================

/// Monotone feedback counters. `correct <= total` by construction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AccuracyTracker {
    #[serde(default)]
    pub correct: u64,
    #[serde(default)]
    pub total: u64,
}

impl AccuracyTracker {
    pub fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        if outcome == Outcome::Correct {
            self.correct += 1;
        }
    }

    /// Fraction of correct outcomes, or 0.0 before any feedback.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn record(marker: f64) -> SignalRecord {
        SignalRecord::new(
            TradeAction::Hold,
            0.0,
            Vec::new(),
            marker,
            IndicatorSnapshot::default(),
            None,
        )
    }

    #[test]
    fn history_evicts_oldest_beyond_capacity() {
        let mut history = RollingHistory::default();
        for i in 0..(HISTORY_CAPACITY + 25) {
            history.push(record(i as f64));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        // The survivors are the most recent 1000, oldest first.
        let first = history.iter().next().unwrap();
        assert!((first.strength - 25.0).abs() < f64::EPSILON);
        let last = history.iter().last().unwrap();
        assert!((last.strength - (HISTORY_CAPACITY + 24) as f64).abs() < f64::EPSILON);
    }

    #[test]
    fn recent_returns_chronological_tail() {
        let mut history = RollingHistory::default();
        for i in 0..20 {
            history.push(record(i as f64));
        }
        let tail = history.recent(10);
        assert_eq!(tail.len(), 10);
        assert!((tail[0].strength - 10.0).abs() < f64::EPSILON);
        assert!((tail[9].strength - 19.0).abs() < f64::EPSILON);

        // Asking for more than exists returns everything.
        assert_eq!(history.recent(100).len(), 20);
    }

    #[test]
    fn accuracy_counters_are_monotone() {
        let mut tracker = AccuracyTracker::default();
        assert!((tracker.accuracy() - 0.0).abs() < f64::EPSILON);

        let mut last_total = 0;
        for i in 0..10 {
            let outcome = if i % 2 == 0 { Outcome::Correct } else { Outcome::Other };
            tracker.record(outcome);
            assert!(tracker.total > last_total);
            assert!(tracker.correct <= tracker.total);
            last_total = tracker.total;
        }
        assert_eq!(tracker.total, 10);
        assert_eq!(tracker.correct, 5);
        assert!((tracker.accuracy() - 0.5).abs() < f64::EPSILON);
    }
}
