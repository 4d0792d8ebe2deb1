// =============================================================================
// Decision Classifier
// =============================================================================
//
// Turns (detected signals, aggregate strength, key raw values) into a trade
// action with a confidence score. Evaluation order (first match wins):
//
//   1. VETO      - VIX value > 18 forces (HOLD, 0.0) before anything else
//   2. STRONG CE - strength > 2.0 with at least 4 bullish signals
//   3. STRONG PE - strength < -2.0 with at least 4 bearish signals
//   4. MODERATE  - |strength| > 1.5 with a polarity-count advantage; the
//                  result is discarded to (HOLD, 0.0) below the 0.75
//                  conviction floor
//   5. HOLD      - everything else
//
// Polarity is keyword-based over the signal wire names. A name can match
// both sets (STRONG_RESISTANCE) and then counts on both sides; HIGH_CE_PREMIUM
// lands in the bearish count via "HIGH" even though its weight is bullish.
// Those quirks are part of the shipped policy and are covered by tests.
//
// Confidence is clamped into [0, 0.95] on every directional path; HOLD
// always carries exactly 0.0.
// =============================================================================

use serde::Serialize;

use crate::signals::SignalId;
use crate::types::{IndicatorSnapshot, TradeAction, WritersZoneSnapshot, ZoneDirection};

/// Divisor converting aggregate strength into base confidence.
pub const STRENGTH_NORMALIZER: f64 = 4.0;

/// VIX level above which no directional trade is taken.
pub const VIX_VETO_THRESHOLD: f64 = 18.0;

/// Hard ceiling on any reported confidence.
pub const MAX_CONFIDENCE: f64 = 0.95;

const WRITERS_BOOST: f64 = 0.2;
const STRONG_STRENGTH: f64 = 2.0;
const MODERATE_STRENGTH: f64 = 1.5;
const MIN_ALIGNED_SIGNALS: usize = 4;
const MODERATE_BASE_CONFIDENCE: f64 = 0.65;
const CONVICTION_FLOOR: f64 = 0.75;

const BULLISH_KEYWORDS: [&str; 9] = [
    "BULLISH", "OVERSOLD", "BUY", "UPTREND", "STRONG", "ABOVE", "CALM", "SURGE", "SUPPORT",
];
const BEARISH_KEYWORDS: [&str; 8] = [
    "BEARISH", "OVERBOUGHT", "SELL", "DOWNTREND", "WEAK", "BELOW", "HIGH", "RESISTANCE",
];

// =============================================================================
// Volatility classification
// =============================================================================

/// Volatility band derived from the VIX value, exposed for observability.
/// The classifier itself only uses the hard veto threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityLevel {
    ExtremeVolatility,
    HighVolatility,
    LowVolatility,
    NormalVolatility,
}

pub fn vix_condition(vix: f64) -> VolatilityLevel {
    if vix > 25.0 {
        VolatilityLevel::ExtremeVolatility
    } else if vix > 18.0 {
        VolatilityLevel::HighVolatility
    } else if vix < 12.0 {
        VolatilityLevel::LowVolatility
    } else {
        VolatilityLevel::NormalVolatility
    }
}

// =============================================================================
// Market regime classification
// =============================================================================

/// High-level market regime label attached to every decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketRegime {
    HighVolatility,
    LowVolatility,
    StrongBullishTrend,
    StrongBearishTrend,
    BullishTrend,
    BearishTrend,
    SidewaysRanging,
    SidewaysMarket,
}

/// Regime ladder, first match wins.
pub fn market_regime(
    snapshot: &IndicatorSnapshot,
    writers: Option<&WritersZoneSnapshot>,
) -> MarketRegime {
    let vix = snapshot.vix.value();
    let rsi = snapshot.rsi.value();
    let supertrend = snapshot.supertrend.status_or("Neutral");
    let zone = writers.map(|w| w.zone).unwrap_or_default();

    if vix > 20.0 {
        MarketRegime::HighVolatility
    } else if vix < 12.0 {
        MarketRegime::LowVolatility
    } else if supertrend == "Bullish" && rsi < 70.0 && zone == ZoneDirection::Bullish {
        MarketRegime::StrongBullishTrend
    } else if supertrend == "Bearish" && rsi > 30.0 && zone == ZoneDirection::Bearish {
        MarketRegime::StrongBearishTrend
    } else if supertrend == "Bullish" && rsi < 70.0 {
        MarketRegime::BullishTrend
    } else if supertrend == "Bearish" && rsi > 30.0 {
        MarketRegime::BearishTrend
    } else if snapshot.price_action.kind_or("Normal") == "Ranging" {
        MarketRegime::SidewaysRanging
    } else {
        MarketRegime::SidewaysMarket
    }
}

// =============================================================================
// Polarity partition
// =============================================================================

/// Count bullish and bearish signals by keyword match over the wire names.
/// A signal may count on both sides; one matching neither counts on neither.
pub fn polarity_counts(signals: &[SignalId]) -> (usize, usize) {
    let mut bullish = 0;
    let mut bearish = 0;
    for id in signals {
        let name = id.as_str();
        if BULLISH_KEYWORDS.iter().any(|kw| name.contains(kw)) {
            bullish += 1;
        }
        if BEARISH_KEYWORDS.iter().any(|kw| name.contains(kw)) {
            bearish += 1;
        }
    }
    (bullish, bearish)
}

// =============================================================================
// Classifier
// =============================================================================

pub fn classify(
    signals: &[SignalId],
    strength: f64,
    snapshot: &IndicatorSnapshot,
    writers: Option<&WritersZoneSnapshot>,
) -> (TradeAction, f64) {
    // Hard volatility veto, regardless of everything else.
    if snapshot.vix.value() > VIX_VETO_THRESHOLD {
        return (TradeAction::Hold, 0.0);
    }

    let (bullish_count, bearish_count) = polarity_counts(signals);
    let base = (strength.abs() / STRENGTH_NORMALIZER).min(1.0);

    let zone = writers.map(|w| w.zone).unwrap_or_default();
    let zone_confidence = writers.map(|w| w.confidence()).unwrap_or(0.0);
    // The boost only applies when the writers zone agrees with the trade side.
    let aligned_boost = |side: ZoneDirection| -> f64 {
        if zone == side && zone_confidence > 0.5 {
            WRITERS_BOOST
        } else {
            0.0
        }
    };

    let rsi = snapshot.rsi.value();
    let supertrend = snapshot.supertrend.status_or("Neutral");
    let aroon = snapshot.aroon.status_or("Neutral");

    if strength > STRONG_STRENGTH && bullish_count >= MIN_ALIGNED_SIGNALS {
        let boost = aligned_boost(ZoneDirection::Bullish);
        let confidence = if supertrend == "Bullish" && rsi < 60.0 && zone == ZoneDirection::Bullish
        {
            (base + boost + 0.2).min(0.95)
        } else if aroon == "Uptrend" && rsi < 65.0 {
            (base + boost + 0.1).min(0.85)
        } else {
            (base + boost).min(0.8)
        };
        return (TradeAction::BuyCe, clamp_confidence(confidence));
    }

    if strength < -STRONG_STRENGTH && bearish_count >= MIN_ALIGNED_SIGNALS {
        let boost = aligned_boost(ZoneDirection::Bearish);
        let confidence = if supertrend == "Bearish" && rsi > 40.0 && zone == ZoneDirection::Bearish
        {
            (base + boost + 0.2).min(0.95)
        } else if aroon == "Downtrend" && rsi > 35.0 {
            (base + boost + 0.1).min(0.85)
        } else {
            (base + boost).min(0.8)
        };
        return (TradeAction::BuyPe, clamp_confidence(confidence));
    }

    if strength.abs() > MODERATE_STRENGTH {
        if strength > 0.0 && bullish_count > bearish_count {
            let confidence =
                (base + aligned_boost(ZoneDirection::Bullish)).max(MODERATE_BASE_CONFIDENCE);
            if confidence >= CONVICTION_FLOOR {
                return (TradeAction::BuyCe, clamp_confidence(confidence));
            }
            // Below the conviction floor the directional call is dropped.
            return (TradeAction::Hold, 0.0);
        }
        if strength < 0.0 && bearish_count > bullish_count {
            let confidence =
                (base + aligned_boost(ZoneDirection::Bearish)).max(MODERATE_BASE_CONFIDENCE);
            if confidence >= CONVICTION_FLOOR {
                return (TradeAction::BuyPe, clamp_confidence(confidence));
            }
            return (TradeAction::Hold, 0.0);
        }
    }

    (TradeAction::Hold, 0.0)
}

fn clamp_confidence(confidence: f64) -> f64 {
    confidence.clamp(0.0, MAX_CONFIDENCE)
}
