//! Spot/futures fusion.

use super::indicators::MfiEngine;
use super::snapshot::change_pct;
use crate::services::sequence_store::SequenceStore;
use crate::types::{
    Candle, CandleSeries, CombinationMethod, CombinedMetric, Market, MfiOptions, SeriesKey,
    TrendDirection, SCALE_PREFIX,
};
use tracing::debug;

/// Price multiplier for contracts quoted per 1000 units.
const SCALE_FACTOR: f64 = 1000.0;

/// Spot and futures sequences selected for one base symbol.
struct Pair {
    base: String,
    spot: CandleSeries,
    futures: CandleSeries,
    spot_scale: f64,
}

fn select_pair(store: &SequenceStore, base: &str) -> Option<Pair> {
    let scaled = format!("{}{}", SCALE_PREFIX, base);
    let scaled_exists = store.contains(&scaled, Market::Spot) || store.contains(&scaled, Market::Futures);

    let spot_plain = store.get_non_empty(&SeriesKey::new(base, Market::Spot));
    let spot_scale = if spot_plain.is_some() && scaled_exists {
        SCALE_FACTOR
    } else {
        1.0
    };
    let spot = spot_plain.or_else(|| store.get_non_empty(&SeriesKey::new(&scaled, Market::Spot)))?;

    let futures = store
        .get_non_empty(&SeriesKey::new(&scaled, Market::Futures))
        .or_else(|| store.get_non_empty(&SeriesKey::new(base, Market::Futures)))?;

    Some(Pair {
        base: base.to_string(),
        spot,
        futures,
        spot_scale,
    })
}

fn combined_trend(spot: TrendDirection, futures: TrendDirection) -> TrendDirection {
    match (spot, futures) {
        (TrendDirection::Up, TrendDirection::Up) => TrendDirection::Up,
        (TrendDirection::Down, TrendDirection::Down) => TrendDirection::Down,
        _ => TrendDirection::Neutral,
    }
}

fn mean_of(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        _ => None,
    }
}

fn previous_close(candles: &[Candle]) -> f64 {
    if candles.len() >= 2 {
        candles[candles.len() - 2].close
    } else {
        0.0
    }
}

fn fuse_pair(pair: Pair, options: &MfiOptions) -> Option<CombinedMetric> {
    let spot_last = pair.spot.last()?;
    let futures_last = pair.futures.last()?;
    let spot_metrics = spot_last.metrics_or_default();
    let futures_metrics = futures_last.metrics_or_default();

    let price_spot = spot_last.close * pair.spot_scale;
    let price_futures = futures_last.close;
    let basis = if price_spot != 0.0 {
        (price_futures / price_spot - 1.0) * 100.0
    } else {
        0.0
    };
    let change = change_pct(previous_close(&pair.spot) * pair.spot_scale, price_spot);

    let force_spot = spot_last.directional_force;
    let force_futures = futures_last.directional_force;
    let markets_agreement =
        (force_spot > 0.0 && force_futures > 0.0) || (force_spot < 0.0 && force_futures < 0.0);

    let divergence_spot = spot_metrics.invisible_divergence.unwrap_or(0.0) * 100.0;
    let divergence_futures = futures_metrics.invisible_divergence.unwrap_or(0.0) * 100.0;

    let mfi_spot = spot_last.mfi_value();
    let mfi_futures = futures_last.mfi_value();
    let (fused_mfi, mfi_signal) =
        if pair.spot.len() > options.period && pair.futures.len() > options.period {
            let engine = MfiEngine::new(options.with_combination(CombinationMethod::Weighted));
            let bars = engine.calculate_candles(&pair.spot, Some(&pair.futures));
            let mfi = bars.last().and_then(|b| b.mfi());
            (mfi, Some(engine.detect_signals(&bars)))
        } else {
            (None, None)
        };

    Some(CombinedMetric {
        symbol: format!("{}_combined", pair.base),
        base_symbol: pair.base,
        price_spot,
        price_futures,
        price: (price_spot + price_futures) / 2.0,
        basis,
        change_pct: change,

        capital_flow: spot_last.capital_flow + futures_last.capital_flow,
        capital_flow_spot: spot_last.capital_flow,
        capital_flow_futures: futures_last.capital_flow,

        directional_force: (force_spot + force_futures) / 2.0,
        directional_force_spot: force_spot,
        directional_force_futures: force_futures,

        impulse: spot_metrics.impulse + futures_metrics.impulse,
        impulse_spot: spot_metrics.impulse,
        impulse_futures: futures_metrics.impulse,

        concentration: spot_metrics
            .trade_concentration
            .max(futures_metrics.trade_concentration),
        concentration_spot: spot_metrics.trade_concentration,
        concentration_futures: futures_metrics.trade_concentration,

        divergence: divergence_spot,
        divergence_spot,
        divergence_futures,

        volume_ratio: spot_metrics.volume_ratio.max(futures_metrics.volume_ratio),
        trend: combined_trend(spot_metrics.trend_direction, futures_metrics.trend_direction),
        markets_agreement,

        mfi: fused_mfi.or_else(|| mean_of(mfi_spot, mfi_futures)),
        mfi_spot,
        mfi_futures,
        mfi_signal,

        spot_data: pair.spot,
        futures_data: pair.futures,
    })
}

/// Fuse every base symbol that has both a spot and a futures sequence.
///
/// Bases present in only one market are skipped. Output is ordered by base
/// symbol.
pub fn fuse_markets(store: &SequenceStore, options: &MfiOptions) -> Vec<CombinedMetric> {
    store
        .base_symbols()
        .into_iter()
        .filter_map(|base| {
            let Some(pair) = select_pair(store, &base) else {
                debug!(base = %base, "No spot/futures pair, skipping fusion");
                return None;
            };
            fuse_pair(pair, options)
        })
        .collect()
}
