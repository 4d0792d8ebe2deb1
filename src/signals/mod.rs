// =============================================================================
// Signals Module
// =============================================================================
//
// Signal pipeline for the decision engine:
// - SignalId: the closed vocabulary of detectable market conditions
// - technical: indicator rule ladder (trend / momentum / volatility / volume)
// - writers_zone: options-writer positioning overlay
// - decision: volatility filter, market regime, tiered decision classifier

pub mod decision;
pub mod technical;
pub mod writers_zone;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::engine::weights::WeightTable;

// =============================================================================
// SignalId
// =============================================================================

/// One detected market condition. Wire names are stable SCREAMING_SNAKE_CASE
/// strings; the decision classifier partitions them by keyword, so names are
/// part of the contract, not just labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalId {
    RsiOversold,
    RsiOverbought,
    RsiNeutral,
    EmaBearish,
    EmaBullish,
    SmaBearish,
    SmaBullish,
    MacdBullish,
    MacdBearish,
    MacdNeutral,
    VixCalm,
    VixHigh,
    BollingerWithin,
    BollingerOverbought,
    BollingerOversold,
    CciSell,
    CciBuy,
    SupertrendBullish,
    SupertrendBearish,
    VolumeWeak,
    VolumeStrong,
    VolumeStrengthWeak,
    VolumeStrengthStrong,
    AroonUptrend,
    AroonDowntrend,
    ParabolicBearish,
    ParabolicBullish,
    MfiOversold,
    MfiOverbought,
    PriceRanging,
    PriceTrending,
    AtrHigh,
    AtrLow,
    AdxStrongTrend,
    StochasticOversold,
    StochasticOverbought,
    WritersBullish,
    WritersBearish,
    WritersNeutral,
    PremiumRatioPutHeavy,
    PremiumRatioCallHeavy,
    PremiumRatioBalanced,
    MarketStructureBullish,
    MarketStructureBearish,
    HighCePremium,
    HighPePremium,
    StrongSupport,
    StrongResistance,
}

impl SignalId {
    /// Every recognized signal, in rule-ladder order.
    pub const ALL: [SignalId; 48] = [
        SignalId::RsiOversold,
        SignalId::RsiOverbought,
        SignalId::RsiNeutral,
        SignalId::EmaBearish,
        SignalId::EmaBullish,
        SignalId::SmaBearish,
        SignalId::SmaBullish,
        SignalId::MacdBullish,
        SignalId::MacdBearish,
        SignalId::MacdNeutral,
        SignalId::VixCalm,
        SignalId::VixHigh,
        SignalId::BollingerWithin,
        SignalId::BollingerOverbought,
        SignalId::BollingerOversold,
        SignalId::CciSell,
        SignalId::CciBuy,
        SignalId::SupertrendBullish,
        SignalId::SupertrendBearish,
        SignalId::VolumeWeak,
        SignalId::VolumeStrong,
        SignalId::VolumeStrengthWeak,
        SignalId::VolumeStrengthStrong,
        SignalId::AroonUptrend,
        SignalId::AroonDowntrend,
        SignalId::ParabolicBearish,
        SignalId::ParabolicBullish,
        SignalId::MfiOversold,
        SignalId::MfiOverbought,
        SignalId::PriceRanging,
        SignalId::PriceTrending,
        SignalId::AtrHigh,
        SignalId::AtrLow,
        SignalId::AdxStrongTrend,
        SignalId::StochasticOversold,
        SignalId::StochasticOverbought,
        SignalId::WritersBullish,
        SignalId::WritersBearish,
        SignalId::WritersNeutral,
        SignalId::PremiumRatioPutHeavy,
        SignalId::PremiumRatioCallHeavy,
        SignalId::PremiumRatioBalanced,
        SignalId::MarketStructureBullish,
        SignalId::MarketStructureBearish,
        SignalId::HighCePremium,
        SignalId::HighPePremium,
        SignalId::StrongSupport,
        SignalId::StrongResistance,
    ];

    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RsiOversold => "RSI_OVERSOLD",
            Self::RsiOverbought => "RSI_OVERBOUGHT",
            Self::RsiNeutral => "RSI_NEUTRAL",
            Self::EmaBearish => "EMA_BEARISH",
            Self::EmaBullish => "EMA_BULLISH",
            Self::SmaBearish => "SMA_BEARISH",
            Self::SmaBullish => "SMA_BULLISH",
            Self::MacdBullish => "MACD_BULLISH",
            Self::MacdBearish => "MACD_BEARISH",
            Self::MacdNeutral => "MACD_NEUTRAL",
            Self::VixCalm => "VIX_CALM",
            Self::VixHigh => "VIX_HIGH",
            Self::BollingerWithin => "BOLLINGER_WITHIN",
            Self::BollingerOverbought => "BOLLINGER_OVERBOUGHT",
            Self::BollingerOversold => "BOLLINGER_OVERSOLD",
            Self::CciSell => "CCI_SELL",
            Self::CciBuy => "CCI_BUY",
            Self::SupertrendBullish => "SUPERTREND_BULLISH",
            Self::SupertrendBearish => "SUPERTREND_BEARISH",
            Self::VolumeWeak => "VOLUME_WEAK",
            Self::VolumeStrong => "VOLUME_STRONG",
            Self::VolumeStrengthWeak => "VOLUME_STRENGTH_WEAK",
            Self::VolumeStrengthStrong => "VOLUME_STRENGTH_STRONG",
            Self::AroonUptrend => "AROON_UPTREND",
            Self::AroonDowntrend => "AROON_DOWNTREND",
            Self::ParabolicBearish => "PARABOLIC_BEARISH",
            Self::ParabolicBullish => "PARABOLIC_BULLISH",
            Self::MfiOversold => "MFI_OVERSOLD",
            Self::MfiOverbought => "MFI_OVERBOUGHT",
            Self::PriceRanging => "PRICE_RANGING",
            Self::PriceTrending => "PRICE_TRENDING",
            Self::AtrHigh => "ATR_HIGH",
            Self::AtrLow => "ATR_LOW",
            Self::AdxStrongTrend => "ADX_STRONG_TREND",
            Self::StochasticOversold => "STOCHASTIC_OVERSOLD",
            Self::StochasticOverbought => "STOCHASTIC_OVERBOUGHT",
            Self::WritersBullish => "WRITERS_BULLISH",
            Self::WritersBearish => "WRITERS_BEARISH",
            Self::WritersNeutral => "WRITERS_NEUTRAL",
            Self::PremiumRatioPutHeavy => "PREMIUM_RATIO_PUT_HEAVY",
            Self::PremiumRatioCallHeavy => "PREMIUM_RATIO_CALL_HEAVY",
            Self::PremiumRatioBalanced => "PREMIUM_RATIO_BALANCED",
            Self::MarketStructureBullish => "MARKET_STRUCTURE_BULLISH",
            Self::MarketStructureBearish => "MARKET_STRUCTURE_BEARISH",
            Self::HighCePremium => "HIGH_CE_PREMIUM",
            Self::HighPePremium => "HIGH_PE_PREMIUM",
            Self::StrongSupport => "STRONG_SUPPORT",
            Self::StrongResistance => "STRONG_RESISTANCE",
        }
    }

    /// Parse a wire name back into an id (used when loading persisted
    /// weight tables).
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.as_str() == name)
    }
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SignalId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SignalId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_wire(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown signal id: {s}")))
    }
}

// =============================================================================
// Tally
// =============================================================================

/// Accumulates detected signals and their weighted strength contributions.
/// Both extractors feed one of these; the signed aggregate becomes the
/// classifier's strength input.
pub struct Tally<'a> {
    weights: &'a WeightTable,
    signals: Vec<SignalId>,
    strength: f64,
}

impl<'a> Tally<'a> {
    pub fn new(weights: &'a WeightTable) -> Self {
        Self {
            weights,
            signals: Vec::new(),
            strength: 0.0,
        }
    }

    /// Record `id` and add its table weight. Penalty entries carry negative
    /// table weights, so "add" can still lower strength.
    pub fn add(&mut self, id: SignalId) {
        self.strength += self.weights.get(id);
        self.signals.push(id);
    }

    /// Record `id` and subtract its table weight.
    pub fn subtract(&mut self, id: SignalId) {
        self.strength -= self.weights.get(id);
        self.signals.push(id);
    }

    /// Record `id` with its weight scaled by `factor` (writers-zone
    /// contributions scale by the zone's own confidence).
    pub fn add_scaled(&mut self, id: SignalId, factor: f64) {
        self.strength += self.weights.get(id) * factor;
        self.signals.push(id);
    }

    pub fn subtract_scaled(&mut self, id: SignalId, factor: f64) {
        self.strength -= self.weights.get(id) * factor;
        self.signals.push(id);
    }

    pub fn into_parts(self) -> (Vec<SignalId>, f64) {
        (self.signals, self.strength)
    }
}
