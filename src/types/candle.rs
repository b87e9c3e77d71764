use crate::error::{AppError, Result};
use crate::types::MfiPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Market a candle sequence was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Spot,
    Futures,
}

impl Market {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "spot" => Some(Self::Spot),
            "futures" | "perp" | "perpetual" => Some(Self::Futures),
            _ => None,
        }
    }

    /// Lowercase wire name, as used in series keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Spot => "spot",
            Market::Futures => "futures",
        }
    }

    pub fn all() -> [Market; 2] {
        [Market::Spot, Market::Futures]
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of one candle sequence: `"{SYMBOL}_{market}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub symbol: String,
    pub market: Market,
}

impl SeriesKey {
    pub fn new(symbol: &str, market: Market) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            market,
        }
    }

    /// Parse a `"{SYMBOL}_{market}"` key.
    pub fn parse(key: &str) -> Result<Self> {
        let (symbol, market) = key
            .rsplit_once('_')
            .ok_or_else(|| AppError::InvalidSeriesKey(key.to_string()))?;
        if symbol.is_empty() {
            return Err(AppError::InvalidSeriesKey(key.to_string()));
        }
        let market =
            Market::from_str(market).ok_or_else(|| AppError::InvalidMarket(market.to_string()))?;
        Ok(Self::new(symbol, market))
    }

    /// Symbol with a leading `1000` scale prefix removed.
    pub fn base_symbol(&self) -> &str {
        base_symbol(&self.symbol)
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.symbol, self.market)
    }
}

/// Prefix futures venues use for contracts quoted per 1000 units.
pub const SCALE_PREFIX: &str = "1000";

/// Strip the `1000` scale prefix from a symbol, if present.
pub fn base_symbol(symbol: &str) -> &str {
    match symbol.strip_prefix(SCALE_PREFIX) {
        Some(rest) if !rest.is_empty() => rest,
        _ => symbol,
    }
}

/// One raw kline row as supplied by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawKline {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
    pub quote_volume: f64,
    pub num_trades: u64,
    pub taker_buy_base_volume: f64,
    pub taker_buy_quote_volume: f64,
}

/// Trend of the 20-period close average against the 50-period one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Neutral,
}

impl TrendDirection {
    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Up => "UP",
            TrendDirection::Down => "DOWN",
            TrendDirection::Neutral => "NEUTRAL",
        }
    }
}

/// Rolling-window fields attached to a candle.
///
/// Window means are `None` until the window is full; consumers treat `None`
/// as "feature unavailable", never as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingMetrics {
    pub capital_flow_ma: Option<f64>,
    pub price_ma: Option<f64>,
    pub volume_ma10: Option<f64>,
    pub volume_ma20: Option<f64>,
    pub impulse: f64,
    pub avg_trade_size: f64,
    pub trade_concentration: f64,
    pub invisible_divergence: Option<f64>,
    pub volume_ratio: f64,
    pub trend_direction: TrendDirection,
}

impl Default for RollingMetrics {
    fn default() -> Self {
        Self {
            capital_flow_ma: None,
            price_ma: None,
            volume_ma10: None,
            volume_ma20: None,
            impulse: 0.0,
            avg_trade_size: 0.0,
            trade_concentration: 1.0,
            invisible_divergence: None,
            volume_ratio: 1.0,
            trend_direction: TrendDirection::Neutral,
        }
    }
}

/// Normalized candle for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    /// Open time (unix ms).
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Close time (unix ms).
    pub close_time: i64,
    pub quote_volume: f64,
    pub trades: u64,
    pub taker_buy_base: f64,
    pub taker_buy_quote: f64,
    pub market: Market,
    /// `close - open`.
    pub price_change: f64,
    /// Taker buy share of quote volume mapped onto [-1, 1].
    pub directional_force: f64,
    /// `quote_volume * directional_force`.
    pub capital_flow: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RollingMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfi: Option<MfiPoint>,
}

impl Candle {
    /// Rolling metrics, or the empty defaults when the engine has not run.
    pub fn metrics_or_default(&self) -> RollingMetrics {
        self.metrics.clone().unwrap_or_default()
    }

    /// MFI value attached to this candle, if computed.
    pub fn mfi_value(&self) -> Option<f64> {
        self.mfi.as_ref().and_then(|p| p.mfi)
    }
}
