use crate::types::{Candle, Market, MfiSignal, TrendDirection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared read-only candle sequence.
pub type CandleSeries = Arc<Vec<Candle>>;

/// Scan mode: which markets are analysed and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketMode {
    Spot,
    Futures,
    /// Spot and futures fused per base asset.
    #[default]
    Combined,
}

impl MarketMode {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "spot" => Some(Self::Spot),
            "futures" => Some(Self::Futures),
            "combined" | "both" => Some(Self::Combined),
            _ => None,
        }
    }

    /// Markets that must be loaded for this mode.
    pub fn markets(&self) -> Vec<Market> {
        match self {
            MarketMode::Spot => vec![Market::Spot],
            MarketMode::Futures => vec![Market::Futures],
            MarketMode::Combined => vec![Market::Spot, Market::Futures],
        }
    }

    /// The single market scanned in spot/futures mode.
    pub fn single_market(&self) -> Option<Market> {
        match self {
            MarketMode::Spot => Some(Market::Spot),
            MarketMode::Futures => Some(Market::Futures),
            MarketMode::Combined => None,
        }
    }
}

/// Latest-point view of one market sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// Series key, `"{SYMBOL}_{market}"`.
    pub symbol: String,
    pub market: Market,
    pub price: f64,
    pub change_pct: f64,
    pub capital_flow: f64,
    pub directional_force: f64,
    pub concentration: f64,
    pub impulse: f64,
    /// Invisible divergence in percent.
    pub divergence: f64,
    pub trend: TrendDirection,
    pub volume_ratio: f64,
    pub mfi: Option<f64>,
    /// Dominant MFI sub-signal of the sequence.
    pub mfi_signal: Option<MfiSignal>,
}

/// Spot and futures view of one base asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedMetric {
    /// `"{BASE}_combined"`.
    pub symbol: String,
    pub base_symbol: String,
    pub price_spot: f64,
    pub price_futures: f64,
    pub price: f64,
    /// Futures premium over spot, percent.
    pub basis: f64,
    pub change_pct: f64,

    pub capital_flow: f64,
    pub capital_flow_spot: f64,
    pub capital_flow_futures: f64,

    pub directional_force: f64,
    pub directional_force_spot: f64,
    pub directional_force_futures: f64,

    pub impulse: f64,
    pub impulse_spot: f64,
    pub impulse_futures: f64,

    pub concentration: f64,
    pub concentration_spot: f64,
    pub concentration_futures: f64,

    pub divergence: f64,
    pub divergence_spot: f64,
    pub divergence_futures: f64,

    pub volume_ratio: f64,
    pub trend: TrendDirection,
    pub markets_agreement: bool,

    pub mfi: Option<f64>,
    pub mfi_spot: Option<f64>,
    pub mfi_futures: Option<f64>,
    /// Dominant sub-signal of the fused MFI series.
    pub mfi_signal: Option<MfiSignal>,

    #[serde(skip)]
    pub spot_data: CandleSeries,
    #[serde(skip)]
    pub futures_data: CandleSeries,
}
