use crate::types::{Confidence, Signal};
use serde::{Deserialize, Serialize};

/// How a secondary series is folded into the primary before computing MFI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CombinationMethod {
    /// Mean of high/low/close, summed volume.
    Average,
    /// 60/40 weighted high/low/close, summed volume.
    #[default]
    Weighted,
    /// Primary point verbatim.
    SpotPriority,
}

impl CombinationMethod {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "average" | "avg" => Some(Self::Average),
            "weighted" => Some(Self::Weighted),
            "spot-priority" | "spot_priority" | "spot" => Some(Self::SpotPriority),
            _ => None,
        }
    }
}

/// MFI engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfiOptions {
    pub period: usize,
    pub combination: CombinationMethod,
    /// Maximum distance (ms) between matched primary and secondary points.
    pub timestamp_tolerance_ms: i64,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for MfiOptions {
    fn default() -> Self {
        Self {
            period: 14,
            combination: CombinationMethod::Weighted,
            timestamp_tolerance_ms: 60_000,
            overbought: 80.0,
            oversold: 20.0,
        }
    }
}

impl MfiOptions {
    pub fn with_combination(&self, combination: CombinationMethod) -> Self {
        Self {
            combination,
            ..self.clone()
        }
    }
}

/// Pattern flags derived from the MFI series at one index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfiFlags {
    pub is_overbought: bool,
    pub is_oversold: bool,
    pub long_signal: bool,
    pub short_signal: bool,
    pub dropping_in_overbought: bool,
    pub rising_in_oversold: bool,
    pub consistent_uptrend: bool,
    pub consistent_downtrend: bool,
    pub dropping_from_high: bool,
    pub rising_from_low: bool,
    pub extremely_overbought: bool,
    pub extremely_oversold: bool,
    pub bullish_divergence: bool,
    pub bearish_divergence: bool,
    pub divergence_strength: Option<f64>,
}

/// Money flow values for one point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfiPoint {
    pub typical_price: f64,
    pub raw_money_flow: f64,
    pub positive_money_flow: f64,
    pub negative_money_flow: f64,
    /// Defined only from index `period` onwards.
    pub mfi: Option<f64>,
    pub flags: MfiFlags,
}

/// Price/volume point fed to the MFI engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceVolume {
    pub timestamp: i64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Output row of the MFI engine: the (possibly fused) input point and its MFI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfiBar {
    pub input: PriceVolume,
    pub point: MfiPoint,
}

impl MfiBar {
    pub fn mfi(&self) -> Option<f64> {
        self.point.mfi
    }
}

/// Dominant MFI sub-signal for the latest point of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfiSignal {
    pub signal: Signal,
    pub confidence: Confidence,
    pub current_mfi: f64,
    pub long_strength: f64,
    pub short_strength: f64,
    /// `None` when no pattern fired.
    pub reasoning: Option<String>,
    pub is_overbought: bool,
    pub is_oversold: bool,
}

impl MfiSignal {
    pub fn neutral(reasoning: Option<String>) -> Self {
        Self {
            signal: Signal::Neutral,
            confidence: Confidence::Baja,
            current_mfi: 50.0,
            long_strength: 0.0,
            short_strength: 0.0,
            reasoning,
            is_overbought: false,
            is_oversold: false,
        }
    }

    /// Points this signal contributes to its side.
    pub fn strength(&self) -> f64 {
        match self.signal {
            Signal::Long => self.long_strength,
            Signal::Short => self.short_strength,
            Signal::Neutral => 0.0,
        }
    }
}
