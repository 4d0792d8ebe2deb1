// =============================================================================
// Shared types: indicator snapshot wire model
// =============================================================================
//
// Inbound snapshots come from an upstream scanner that is loose about types:
// numeric fields may arrive as JSON numbers or as numeric strings, any
// category may be missing entirely, and the writers-zone block is embedded
// flat in the same object. Every field here is therefore optional at the
// wire level, with accessor methods applying the documented neutral default,
// so "missing" and "default" are one well-defined case.
//
// Unparseable numeric values coerce to the neutral default with a logged
// warning; unknown strings for the closed enums (zone direction, market
// structure) coerce to their neutral variant. No inbound value can fault
// deserialization short of a structurally malformed body.
// =============================================================================

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

// =============================================================================
// Lenient numeric coercion
// =============================================================================

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Deserialize a numeric field that may be a JSON number, a numeric string,
/// or absent. Unparseable values coerce to `None` with a logged warning.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        if value.is_null() {
            return None;
        }
        let parsed = coerce_f64(&value);
        if parsed.is_none() {
            warn!(value = %value, "non-numeric indicator field, using neutral default");
        }
        parsed
    }))
}

/// Deserialize a list of price levels, dropping entries that are not numeric.
fn lenient_levels<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(items)) => items.iter().filter_map(coerce_f64).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!(value = %other, "level list is not an array, treating as empty");
            Vec::new()
        }
    })
}

// =============================================================================
// Indicator readings
// =============================================================================

/// RSI reading. Neutral default: 50 / "Neutral".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RsiReading {
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RsiReading {
    pub fn value(&self) -> f64 {
        self.rsi.unwrap_or(50.0)
    }

    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("Neutral")
    }
}

/// VIX reading. Neutral default: 15 / "Normal".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VixReading {
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub vix: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl VixReading {
    pub fn value(&self) -> f64 {
        self.vix.unwrap_or(15.0)
    }

    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("Normal")
    }
}

/// MACD reading. Anything other than "Bullish" / "Bearish" counts as neutral.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacdReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl MacdReading {
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("Neutral")
    }
}

/// Status-only reading (EMA20, SMA50, BollingerBands, SuperTrend, Aroon,
/// ParabolicSAR, VolumeIndicators). The neutral default varies per category,
/// so callers supply it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl StatusReading {
    pub fn status_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.status.as_deref().unwrap_or(default)
    }
}

/// Value + status reading (CCI, MFI, ATR, ADX, Stochastic).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueReading {
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ValueReading {
    pub fn value_or(&self, default: f64) -> f64 {
        self.value.unwrap_or(default)
    }

    pub fn status_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.status.as_deref().unwrap_or(default)
    }
}

/// Readings keyed by "type" on the wire (VolumeStrength, PriceAction).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KindReading {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl KindReading {
    pub fn kind_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.kind.as_deref().unwrap_or(default)
    }
}

// =============================================================================
// IndicatorSnapshot
// =============================================================================

/// One point-in-time bundle of indicator readings submitted for a decision.
/// Immutable once parsed; every category is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    #[serde(rename = "RSI", default)]
    pub rsi: RsiReading,
    #[serde(rename = "EMA20", default)]
    pub ema20: StatusReading,
    #[serde(rename = "SMA50", default)]
    pub sma50: StatusReading,
    #[serde(rename = "MACD", default)]
    pub macd: MacdReading,
    #[serde(rename = "VIX", default)]
    pub vix: VixReading,
    #[serde(rename = "BollingerBands", default)]
    pub bollinger: StatusReading,
    #[serde(rename = "CCI", default)]
    pub cci: ValueReading,
    #[serde(rename = "SuperTrend", default)]
    pub supertrend: StatusReading,
    #[serde(rename = "VolumeIndicators", default)]
    pub volume: StatusReading,
    #[serde(rename = "VolumeStrength", default)]
    pub volume_strength: KindReading,
    #[serde(rename = "Aroon", default)]
    pub aroon: StatusReading,
    #[serde(rename = "ParabolicSAR", default)]
    pub parabolic_sar: StatusReading,
    #[serde(rename = "MFI", default)]
    pub mfi: ValueReading,
    #[serde(rename = "PriceAction", default)]
    pub price_action: KindReading,
    #[serde(rename = "ATR", default)]
    pub atr: ValueReading,
    #[serde(rename = "ADX", default)]
    pub adx: ValueReading,
    #[serde(rename = "Stochastic", default)]
    pub stochastic: ValueReading,
    /// Last traded price of the underlying, echoed back in the response.
    #[serde(
        rename = "LTP",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub ltp: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn ltp(&self) -> f64 {
        self.ltp.unwrap_or(0.0)
    }
}

// =============================================================================
// Writers-zone block
// =============================================================================

/// Direction of option-writer positioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneDirection {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl<'de> Deserialize<'de> for ZoneDirection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "BULLISH" => Self::Bullish,
            "BEARISH" => Self::Bearish,
            "NEUTRAL" => Self::Neutral,
            other => {
                warn!(value = %other, "unknown writers zone direction, treating as NEUTRAL");
                Self::Neutral
            }
        })
    }
}

/// Options market structure derived from relative premium levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStructure {
    CallPremiumHigh,
    PutPremiumHigh,
    #[default]
    Balanced,
}

impl<'de> Deserialize<'de> for MarketStructure {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "CALL_PREMIUM_HIGH" => Self::CallPremiumHigh,
            "PUT_PREMIUM_HIGH" => Self::PutPremiumHigh,
            "BALANCED" => Self::Balanced,
            other => {
                warn!(value = %other, "unknown market structure, treating as BALANCED");
                Self::Balanced
            }
        })
    }
}

/// Options-writer positioning overlay. On the wire the block is embedded
/// flat in the snapshot object and is considered present iff the
/// `writersZone` key is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WritersZoneSnapshot {
    #[serde(rename = "writersZone", default)]
    pub zone: ZoneDirection,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(
        rename = "putCallPremiumRatio",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub put_call_premium_ratio: Option<f64>,
    #[serde(rename = "marketStructure", default)]
    pub market_structure: MarketStructure,
    #[serde(
        rename = "maxCELTP",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_ce_ltp: Option<f64>,
    #[serde(
        rename = "maxPELTP",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_pe_ltp: Option<f64>,
    #[serde(rename = "supportLevels", default, deserialize_with = "lenient_levels")]
    pub support_levels: Vec<f64>,
    #[serde(rename = "resistanceLevels", default, deserialize_with = "lenient_levels")]
    pub resistance_levels: Vec<f64>,
}

impl WritersZoneSnapshot {
    pub fn confidence(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }

    pub fn put_call_premium_ratio(&self) -> f64 {
        self.put_call_premium_ratio.unwrap_or(1.0)
    }

    pub fn max_ce_ltp(&self) -> f64 {
        self.max_ce_ltp.unwrap_or(0.0)
    }

    pub fn max_pe_ltp(&self) -> f64 {
        self.max_pe_ltp.unwrap_or(0.0)
    }
}

// =============================================================================
// Actions & feedback
// =============================================================================

/// Discrete trading action produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    BuyCe,
    BuyPe,
    Hold,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuyCe => write!(f, "BUY_CE"),
            Self::BuyPe => write!(f, "BUY_PE"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Outcome reported for a past prediction. Anything other than the literal
/// string "correct" counts against accuracy; outcomes are tracked loosely
/// and never matched back to a specific history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    Correct,
    #[default]
    Other,
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(if s == "correct" { Self::Correct } else { Self::Other })
    }
}

// =============================================================================
// Predict payload decoding
// =============================================================================

/// Decode a `/predict` body into the typed snapshot plus the optional
/// writers-zone block. The body may be a single snapshot object or a
/// non-empty array of them (first element wins).
pub fn decode_predict_payload(
    payload: &Value,
) -> Result<(IndicatorSnapshot, Option<WritersZoneSnapshot>)> {
    let object = match payload {
        Value::Array(items) => items.first().context("empty snapshot array")?,
        other => other,
    };

    if !object.is_object() {
        bail!("snapshot payload must be a JSON object");
    }

    let snapshot: IndicatorSnapshot =
        serde_json::from_value(object.clone()).context("failed to decode indicator snapshot")?;

    // The writers overlay shares the snapshot object; its presence is keyed
    // on `writersZone` alone.
    let writers = if object.get("writersZone").is_some() {
        Some(
            serde_json::from_value::<WritersZoneSnapshot>(object.clone())
                .context("failed to decode writers zone block")?,
        )
    } else {
        None
    };

    Ok((snapshot, writers))
}
