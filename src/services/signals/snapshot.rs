//! Latest-point view of one market sequence.

use super::indicators::{bars_from_candles, detect_signals};
use crate::types::{Candle, MarketSnapshot, MfiOptions, SeriesKey, TrendDirection};

/// Sequences shorter than this report a NEUTRAL trend and unit volume ratio.
const MIN_TREND_CANDLES: usize = 20;

/// Percent change between two closes, 0 on a zero base.
pub fn change_pct(previous: f64, current: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Build the snapshot the single-market scorer reads.
///
/// Expects metrics and MFI already attached. `None` below two candles.
pub fn market_snapshot(
    key: &SeriesKey,
    candles: &[Candle],
    options: &MfiOptions,
) -> Option<MarketSnapshot> {
    if candles.len() < 2 {
        return None;
    }
    let last = &candles[candles.len() - 1];
    let previous = &candles[candles.len() - 2];
    let metrics = last.metrics_or_default();
    let mature = candles.len() >= MIN_TREND_CANDLES;

    let mfi_signal = bars_from_candles(candles).map(|bars| detect_signals(&bars, options));

    Some(MarketSnapshot {
        symbol: key.to_string(),
        market: key.market,
        price: last.close,
        change_pct: change_pct(previous.close, last.close),
        capital_flow: last.capital_flow,
        directional_force: last.directional_force,
        concentration: metrics.trade_concentration,
        impulse: metrics.impulse,
        divergence: metrics.invisible_divergence.unwrap_or(0.0) * 100.0,
        trend: if mature {
            metrics.trend_direction
        } else {
            TrendDirection::Neutral
        },
        volume_ratio: if mature { metrics.volume_ratio } else { 1.0 },
        mfi: last.mfi_value(),
        mfi_signal,
    })
}
