// =============================================================================
// Technical Indicator Extractor
// =============================================================================
//
// One mutually-exclusive rule ladder per indicator category; first match wins
// within a category, and every category contributes independently. The
// ladders reproduce the shipped policy exactly, asymmetries included:
//
//   - CCI Sell and Buy are both additive.
//   - VIX_HIGH, VOLUME_WEAK, VOLUME_STRENGTH_WEAK, PRICE_RANGING and
//     ATR_HIGH are "added" but carry negative table weights, so they act as
//     penalties.
//   - A VIX status of "Calm Market" takes precedence over the numeric
//     high-VIX check (the hard veto in the classifier still reads the raw
//     value).
//   - MACD always emits a signal; the else-branch is MACD_NEUTRAL.
// =============================================================================

use crate::engine::weights::WeightTable;
use crate::signals::{SignalId, Tally};
use crate::types::IndicatorSnapshot;

/// Run every category ladder over `snapshot` and return the detected
/// signals with their signed aggregate strength.
pub fn extract(snapshot: &IndicatorSnapshot, weights: &WeightTable) -> (Vec<SignalId>, f64) {
    let mut tally = Tally::new(weights);

    // RSI: value thresholds first, neutral status as the fallback rung.
    let rsi = snapshot.rsi.value();
    if rsi < 30.0 {
        tally.add(SignalId::RsiOversold);
    } else if rsi > 70.0 {
        tally.subtract(SignalId::RsiOverbought);
    } else if snapshot.rsi.status() == "Neutral" {
        tally.add(SignalId::RsiNeutral);
    }

    // EMA20
    match snapshot.ema20.status_or("Neutral") {
        "Bearish" => tally.subtract(SignalId::EmaBearish),
        "Bullish" => tally.add(SignalId::EmaBullish),
        _ => {}
    }

    // SMA50
    match snapshot.sma50.status_or("Neutral") {
        "Bearish" => tally.subtract(SignalId::SmaBearish),
        "Bullish" => tally.add(SignalId::SmaBullish),
        _ => {}
    }

    // MACD
    match snapshot.macd.status() {
        "Bullish" => tally.add(SignalId::MacdBullish),
        "Bearish" => tally.subtract(SignalId::MacdBearish),
        _ => tally.add(SignalId::MacdNeutral),
    }

    // VIX
    if snapshot.vix.status() == "Calm Market" {
        tally.add(SignalId::VixCalm);
    } else if snapshot.vix.value() > 18.0 {
        tally.add(SignalId::VixHigh);
    }

    // Bollinger Bands
    match snapshot.bollinger.status_or("Within Bands") {
        "Within Bands" => tally.add(SignalId::BollingerWithin),
        "Above Upper" | "Overbought" => tally.subtract(SignalId::BollingerOverbought),
        "Below Lower" | "Oversold" => tally.add(SignalId::BollingerOversold),
        _ => {}
    }

    // CCI
    match snapshot.cci.status_or("Neutral") {
        "Sell" => tally.add(SignalId::CciSell),
        "Buy" => tally.add(SignalId::CciBuy),
        _ => {}
    }

    // SuperTrend
    match snapshot.supertrend.status_or("Neutral") {
        "Bullish" => tally.add(SignalId::SupertrendBullish),
        "Bearish" => tally.subtract(SignalId::SupertrendBearish),
        _ => {}
    }

    // Volume indicators
    match snapshot.volume.status_or("Normal") {
        "Weak" => tally.add(SignalId::VolumeWeak),
        "Strong" => tally.add(SignalId::VolumeStrong),
        _ => {}
    }

    // Volume strength
    match snapshot.volume_strength.kind_or("Normal") {
        "Weak Volume" => tally.add(SignalId::VolumeStrengthWeak),
        "Strong Volume" => tally.add(SignalId::VolumeStrengthStrong),
        _ => {}
    }

    // Aroon
    match snapshot.aroon.status_or("Neutral") {
        "Uptrend" => tally.add(SignalId::AroonUptrend),
        "Downtrend" => tally.subtract(SignalId::AroonDowntrend),
        _ => {}
    }

    // Parabolic SAR
    match snapshot.parabolic_sar.status_or("Neutral") {
        "Bearish" => tally.subtract(SignalId::ParabolicBearish),
        "Bullish" => tally.add(SignalId::ParabolicBullish),
        _ => {}
    }

    // MFI
    match snapshot.mfi.status_or("Neutral") {
        "Oversold" => tally.add(SignalId::MfiOversold),
        "Overbought" => tally.subtract(SignalId::MfiOverbought),
        _ => {}
    }

    // Price action
    match snapshot.price_action.kind_or("Normal") {
        "Ranging" => tally.add(SignalId::PriceRanging),
        "Trending" => tally.add(SignalId::PriceTrending),
        _ => {}
    }

    // ATR
    let atr = snapshot.atr.value_or(20.0);
    if atr > 25.0 {
        tally.add(SignalId::AtrHigh);
    } else if atr < 15.0 {
        tally.add(SignalId::AtrLow);
    }

    // ADX
    if snapshot.adx.value_or(20.0) > 25.0 {
        tally.add(SignalId::AdxStrongTrend);
    }

    // Stochastic
    let stochastic = snapshot.stochastic.value_or(50.0);
    if stochastic < 20.0 {
        tally.add(SignalId::StochasticOversold);
    } else if stochastic > 80.0 {
        tally.subtract(SignalId::StochasticOverbought);
    }

    tally.into_parts()
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> IndicatorSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_snapshot_emits_the_neutral_trio() {
        let weights = WeightTable::default();
        let (signals, strength) = extract(&snapshot(json!({})), &weights);
        assert_eq!(
            signals,
            vec![
                SignalId::RsiNeutral,
                SignalId::MacdNeutral,
                SignalId::BollingerWithin
            ]
        );
        // 0.5 + 0.4 + 0.3
        assert!((strength - 1.2).abs() < 1e-9);
    }

    #[test]
    fn rsi_value_thresholds_beat_status() {
        let weights = WeightTable::default();
        let (signals, strength) =
            extract(&snapshot(json!({"RSI": {"rsi": 25, "status": "Bullish"}})), &weights);
        assert!(signals.contains(&SignalId::RsiOversold));
        assert!(!signals.contains(&SignalId::RsiNeutral));
        assert!(strength > 1.0);

        let (signals, _) =
            extract(&snapshot(json!({"RSI": {"rsi": 75, "status": "Neutral"}})), &weights);
        assert!(signals.contains(&SignalId::RsiOverbought));

        // Mid-band with a non-neutral status emits nothing for RSI.
        let (signals, _) =
            extract(&snapshot(json!({"RSI": {"rsi": 55, "status": "Bullish"}})), &weights);
        assert!(!signals.iter().any(|s| matches!(
            s,
            SignalId::RsiOversold | SignalId::RsiOverbought | SignalId::RsiNeutral
        )));
    }

    #[test]
    fn calm_vix_status_preempts_high_value() {
        let weights = WeightTable::default();
        let (signals, _) = extract(
            &snapshot(json!({"VIX": {"vix": 22, "status": "Calm Market"}})),
            &weights,
        );
        assert!(signals.contains(&SignalId::VixCalm));
        assert!(!signals.contains(&SignalId::VixHigh));

        let (signals, _) =
            extract(&snapshot(json!({"VIX": {"vix": 22, "status": "Elevated"}})), &weights);
        assert!(signals.contains(&SignalId::VixHigh));
    }

    #[test]
    fn vix_high_is_a_net_penalty() {
        let weights = WeightTable::default();
        let calm = extract(&snapshot(json!({"VIX": {"vix": 15}})), &weights).1;
        let high = extract(&snapshot(json!({"VIX": {"vix": 22}})), &weights).1;
        assert!((calm - high - 0.6).abs() < 1e-9);
    }

    #[test]
    fn cci_is_additive_in_both_directions() {
        let weights = WeightTable::default();
        let sell = extract(&snapshot(json!({"CCI": {"status": "Sell"}})), &weights).1;
        let buy = extract(&snapshot(json!({"CCI": {"status": "Buy"}})), &weights).1;
        assert!((sell - buy).abs() < 1e-9);
    }

    #[test]
    fn bollinger_accepts_both_status_spellings() {
        let weights = WeightTable::default();
        for status in ["Above Upper", "Overbought"] {
            let (signals, _) =
                extract(&snapshot(json!({"BollingerBands": {"status": status}})), &weights);
            assert!(signals.contains(&SignalId::BollingerOverbought));
        }
        for status in ["Below Lower", "Oversold"] {
            let (signals, _) =
                extract(&snapshot(json!({"BollingerBands": {"status": status}})), &weights);
            assert!(signals.contains(&SignalId::BollingerOversold));
        }
    }

    #[test]
    fn atr_adx_stochastic_value_ladders() {
        let weights = WeightTable::default();
        let (signals, _) = extract(
            &snapshot(json!({
                "ATR": {"value": 30},
                "ADX": {"value": 30},
                "Stochastic": {"value": 10}
            })),
            &weights,
        );
        assert!(signals.contains(&SignalId::AtrHigh));
        assert!(signals.contains(&SignalId::AdxStrongTrend));
        assert!(signals.contains(&SignalId::StochasticOversold));

        let (signals, _) = extract(
            &snapshot(json!({
                "ATR": {"value": 10},
                "Stochastic": {"value": 90}
            })),
            &weights,
        );
        assert!(signals.contains(&SignalId::AtrLow));
        assert!(signals.contains(&SignalId::StochasticOverbought));

        // Defaults (ATR 20, ADX 20, Stochastic 50) fire nothing.
        let (signals, _) = extract(&snapshot(json!({})), &weights);
        assert!(!signals.iter().any(|s| matches!(
            s,
            SignalId::AtrHigh
                | SignalId::AtrLow
                | SignalId::AdxStrongTrend
                | SignalId::StochasticOversold
                | SignalId::StochasticOverbought
        )));
    }

    #[test]
    fn trend_categories_contribute_independently() {
        let weights = WeightTable::default();
        let (signals, strength) = extract(
            &snapshot(json!({
                "EMA20": {"status": "Bullish"},
                "SMA50": {"status": "Bullish"},
                "SuperTrend": {"status": "Bullish"},
                "Aroon": {"status": "Uptrend"},
                "ParabolicSAR": {"status": "Bullish"}
            })),
            &weights,
        );
        for expected in [
            SignalId::EmaBullish,
            SignalId::SmaBullish,
            SignalId::SupertrendBullish,
            SignalId::AroonUptrend,
            SignalId::ParabolicBullish,
        ] {
            assert!(signals.contains(&expected));
        }
        // Neutral trio (1.2) + 0.7 + 0.7 + 0.9 + 0.7 + 0.6
        assert!((strength - 4.8).abs() < 1e-9);
    }
}
