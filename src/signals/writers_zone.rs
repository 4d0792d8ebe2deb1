// =============================================================================
// Writers-Zone Extractor
// =============================================================================
//
// Confirmatory overlay derived from option-writer positioning. Unlike the
// technical ladders, the zone direction scales its contribution by the
// zone's own confidence; a direction below the 0.3 confidence gate collapses
// to the zero-weight WRITERS_NEUTRAL marker. Support and resistance are the
// one place where two rules of the same category may fire together.
// =============================================================================

use crate::engine::weights::WeightTable;
use crate::signals::{SignalId, Tally};
use crate::types::{MarketStructure, WritersZoneSnapshot, ZoneDirection};

/// Minimum zone confidence for a directional writers signal.
const ZONE_CONFIDENCE_GATE: f64 = 0.3;

/// Premium-ratio band edges.
const PUT_HEAVY_RATIO: f64 = 1.2;
const CALL_HEAVY_RATIO: f64 = 0.8;

/// Minimum last-traded premium for the dominance rule.
const PREMIUM_DOMINANCE_FLOOR: f64 = 10.0;

pub fn extract(zone: &WritersZoneSnapshot, weights: &WeightTable) -> (Vec<SignalId>, f64) {
    let mut tally = Tally::new(weights);
    let confidence = zone.confidence();

    // Zone direction, scaled by its confidence.
    match zone.zone {
        ZoneDirection::Bullish if confidence > ZONE_CONFIDENCE_GATE => {
            tally.add_scaled(SignalId::WritersBullish, confidence);
        }
        ZoneDirection::Bearish if confidence > ZONE_CONFIDENCE_GATE => {
            tally.subtract_scaled(SignalId::WritersBearish, confidence);
        }
        _ => tally.add(SignalId::WritersNeutral),
    }

    // Put/call premium ratio. The balanced band always emits.
    let ratio = zone.put_call_premium_ratio();
    if ratio > PUT_HEAVY_RATIO {
        tally.subtract(SignalId::PremiumRatioPutHeavy);
    } else if ratio < CALL_HEAVY_RATIO {
        tally.add(SignalId::PremiumRatioCallHeavy);
    } else {
        tally.add(SignalId::PremiumRatioBalanced);
    }

    // Market structure.
    match zone.market_structure {
        MarketStructure::CallPremiumHigh => tally.add(SignalId::MarketStructureBullish),
        MarketStructure::PutPremiumHigh => tally.subtract(SignalId::MarketStructureBearish),
        MarketStructure::Balanced => {}
    }

    // Premium dominance: strictly larger side, and only above the floor.
    let max_ce = zone.max_ce_ltp();
    let max_pe = zone.max_pe_ltp();
    if max_ce > max_pe && max_ce > PREMIUM_DOMINANCE_FLOOR {
        tally.add(SignalId::HighCePremium);
    } else if max_pe > max_ce && max_pe > PREMIUM_DOMINANCE_FLOOR {
        tally.subtract(SignalId::HighPePremium);
    }

    // Support / resistance clustering; both may fire.
    if zone.support_levels.len() >= 2 {
        tally.add(SignalId::StrongSupport);
    }
    if zone.resistance_levels.len() >= 2 {
        tally.subtract(SignalId::StrongResistance);
    }

    tally.into_parts()
}
