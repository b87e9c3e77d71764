//! Bitcoin trend reference for the combined scorer.

use crate::services::sequence_store::SequenceStore;
use crate::types::{Candle, CandleSeries, Market, MarketTrend, SeriesKey};

/// Symbol whose trend is used as the market reference.
pub const REFERENCE_SYMBOL: &str = "BTCUSDT";
/// Candles spanned by the reference return.
pub const TREND_LOOKBACK: usize = 24;
/// Average return (percent) past which the market trends.
pub const TREND_THRESHOLD_PCT: f64 = 2.0;

/// Spot and futures sequences of the reference symbol.
#[derive(Debug, Clone)]
pub struct BtcReference {
    pub spot: CandleSeries,
    pub futures: CandleSeries,
}

impl BtcReference {
    pub fn new(spot: CandleSeries, futures: CandleSeries) -> Self {
        Self { spot, futures }
    }

    /// Look up both reference sequences. `None` if either is missing.
    pub fn from_store(store: &SequenceStore) -> Option<Self> {
        let spot = store.get(&SeriesKey::new(REFERENCE_SYMBOL, Market::Spot))?;
        let futures = store.get(&SeriesKey::new(REFERENCE_SYMBOL, Market::Futures))?;
        Some(Self::new(spot, futures))
    }

    pub fn trend(&self) -> MarketTrend {
        MarketTrend::from_reference(&self.spot, &self.futures)
    }
}

/// Percent change of the close over the last [`TREND_LOOKBACK`] candles.
fn lookback_return(candles: &[Candle]) -> Option<f64> {
    if candles.len() < TREND_LOOKBACK {
        return None;
    }
    let last = candles.last()?.close;
    let base = candles[candles.len() - TREND_LOOKBACK].close;
    if base == 0.0 {
        return None;
    }
    Some((last - base) / base * 100.0)
}

impl MarketTrend {
    /// Classify the average lookback return of both reference markets.
    ///
    /// NEUTRAL when either market lacks history.
    pub fn from_reference(spot: &[Candle], futures: &[Candle]) -> Self {
        let (Some(spot), Some(futures)) = (lookback_return(spot), lookback_return(futures)) else {
            return MarketTrend::Neutral;
        };
        let average = (spot + futures) / 2.0;
        if average > TREND_THRESHOLD_PCT {
            MarketTrend::Bullish
        } else if average < -TREND_THRESHOLD_PCT {
            MarketTrend::Bearish
        } else {
            MarketTrend::Neutral
        }
    }
}
