// =============================================================================
// Weight Table: tunable per-signal weights with adaptive decay
// =============================================================================
//
// One scalar weight per recognized signal. The defaults encode the shipped
// rule policy, including its deliberate asymmetries: penalty entries
// (VIX_HIGH, VOLUME_WEAK, VOLUME_STRENGTH_WEAK, PRICE_RANGING, ATR_HIGH)
// carry negative weights that the extractors ADD, and WRITERS_NEUTRAL is a
// zero-weight placeholder so the neutral branch still surfaces a signal.
//
// Decay is `w = max(w * factor, WEIGHT_FLOOR)`. The floor applies to every
// entry, so a negative penalty weight is lifted to the floor on its first
// decay cycle. That is the documented behavior, reproduced as-is.
// =============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::signals::SignalId;

/// No weight ever decays below this value.
pub const WEIGHT_FLOOR: f64 = 0.1;

/// Mapping from signal id to its strength contribution weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    weights: HashMap<SignalId, f64>,
}

impl Default for WeightTable {
    fn default() -> Self {
        use SignalId::*;
        let weights = HashMap::from([
            // Momentum
            (RsiNeutral, 0.5),
            (RsiOversold, 0.8),
            (RsiOverbought, 0.8),
            (MacdNeutral, 0.4),
            (MacdBullish, 0.8),
            (MacdBearish, 0.8),
            (CciSell, 0.8),
            (CciBuy, 0.8),
            (MfiOversold, 0.8),
            (MfiOverbought, 0.8),
            (StochasticOversold, 0.7),
            (StochasticOverbought, 0.7),
            // Trend
            (EmaBearish, 0.7),
            (EmaBullish, 0.7),
            (SmaBearish, 0.7),
            (SmaBullish, 0.7),
            (SupertrendBullish, 0.9),
            (SupertrendBearish, 0.9),
            (AroonUptrend, 0.7),
            (AroonDowntrend, 0.7),
            (ParabolicBearish, 0.6),
            (ParabolicBullish, 0.6),
            (AdxStrongTrend, 0.6),
            (PriceRanging, -0.3),
            (PriceTrending, 0.4),
            // Volatility
            (VixCalm, 0.9),
            (VixHigh, -0.6),
            (BollingerWithin, 0.3),
            (BollingerOversold, 0.8),
            (BollingerOverbought, 0.8),
            (AtrHigh, -0.2),
            (AtrLow, 0.2),
            // Volume
            (VolumeWeak, -0.4),
            (VolumeStrong, 0.6),
            (VolumeStrengthWeak, -0.4),
            (VolumeStrengthStrong, 0.5),
            // Writers zone
            (WritersBullish, 0.9),
            (WritersBearish, 0.9),
            (WritersNeutral, 0.0),
            (PremiumRatioCallHeavy, 0.6),
            (PremiumRatioPutHeavy, 0.6),
            (PremiumRatioBalanced, 0.1),
            (HighCePremium, 0.5),
            (HighPePremium, 0.5),
            (StrongSupport, 0.4),
            (StrongResistance, 0.4),
            (MarketStructureBullish, 0.3),
            (MarketStructureBearish, 0.3),
        ]);
        Self { weights }
    }
}

impl WeightTable {
    /// Weight for `id`. Unknown ids (possible after loading a pruned
    /// persisted table) contribute nothing.
    pub fn get(&self, id: SignalId) -> f64 {
        self.weights.get(&id).copied().unwrap_or(0.0)
    }

    /// Multiply every weight by `factor`, clamping at [`WEIGHT_FLOOR`].
    pub fn decay(&mut self, factor: f64) {
        for weight in self.weights.values_mut() {
            *weight = (*weight * factor).max(WEIGHT_FLOOR);
        }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_signal() {
        let table = WeightTable::default();
        assert_eq!(table.len(), SignalId::ALL.len());
        for id in SignalId::ALL {
            // WRITERS_NEUTRAL is the only zero-weight entry.
            if id == SignalId::WritersNeutral {
                assert!((table.get(id)).abs() < f64::EPSILON);
            } else {
                assert!(table.get(id).abs() > 0.0);
            }
        }
    }

    #[test]
    fn default_table_spot_values() {
        let table = WeightTable::default();
        assert!((table.get(SignalId::RsiOversold) - 0.8).abs() < f64::EPSILON);
        assert!((table.get(SignalId::VixCalm) - 0.9).abs() < f64::EPSILON);
        assert!((table.get(SignalId::VixHigh) + 0.6).abs() < f64::EPSILON);
        assert!((table.get(SignalId::PremiumRatioBalanced) - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn decay_shrinks_weights_toward_floor() {
        let mut table = WeightTable::default();
        table.decay(0.95);
        assert!((table.get(SignalId::RsiOversold) - 0.76).abs() < 1e-9);
        // Negative penalty weights are lifted to the floor by the clamp.
        assert!((table.get(SignalId::VixHigh) - WEIGHT_FLOOR).abs() < f64::EPSILON);
    }

    #[test]
    fn repeated_decay_never_breaks_the_floor() {
        let mut table = WeightTable::default();
        for _ in 0..500 {
            table.decay(0.95);
        }
        for id in SignalId::ALL {
            assert!(table.get(id) >= WEIGHT_FLOOR - f64::EPSILON);
        }
    }

    #[test]
    fn serializes_under_wire_names() {
        let table = WeightTable::default();
        let value = serde_json::to_value(&table).unwrap();
        assert!(value.get("RSI_OVERSOLD").is_some());
        assert!(value.get("WRITERS_NEUTRAL").is_some());

        let restored: WeightTable = serde_json::from_value(value).unwrap();
        assert!((restored.get(SignalId::RsiOversold) - 0.8).abs() < f64::EPSILON);
    }
}
