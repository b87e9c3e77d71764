//! Rolling capital-flow metrics.

use super::window::{is_ascending, pct_change, window_mean};
use crate::types::{Candle, RollingMetrics, TrendDirection};

/// Rolling metrics engine.
///
/// Derives moving averages, impulse, trade concentration, the price/flow
/// "invisible" divergence, volume ratio and trend direction for every candle
/// of one market sequence. Results are written to `Candle::metrics`.
pub struct FlowMetrics {
    /// Window of the capital-flow, price and short volume averages.
    ma_window: usize,
    /// Window of the long volume and trade-size averages.
    long_window: usize,
    /// Lag of the divergence percent changes.
    divergence_lag: usize,
    trend_fast: usize,
    trend_slow: usize,
}

impl Default for FlowMetrics {
    fn default() -> Self {
        Self {
            ma_window: 10,
            long_window: 20,
            divergence_lag: 5,
            trend_fast: 20,
            trend_slow: 50,
        }
    }
}

impl FlowMetrics {
    /// Compute metrics in place. Sequences shorter than two candles are left
    /// untouched.
    pub fn compute(&self, candles: &mut [Candle]) {
        if candles.len() < 2 {
            return;
        }
        debug_assert!(
            is_ascending(candles, |c| c.timestamp),
            "candle sequence must be strictly ascending"
        );

        let len = candles.len();
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        let flows: Vec<f64> = candles.iter().map(|c| c.capital_flow).collect();
        let trade_sizes: Vec<f64> = candles
            .iter()
            .map(|c| {
                if c.trades > 0 {
                    c.volume / c.trades as f64
                } else {
                    0.0
                }
            })
            .collect();

        let price_ma: Vec<Option<f64>> = (0..len)
            .map(|i| window_mean(&closes, i, self.ma_window))
            .collect();
        let flow_ma: Vec<Option<f64>> = (0..len)
            .map(|i| window_mean(&flows, i, self.ma_window))
            .collect();

        for (i, candle) in candles.iter_mut().enumerate() {
            let volume_ma10 = window_mean(&volumes, i, self.ma_window);
            let volume_ma20 = window_mean(&volumes, i, self.long_window);

            let impulse = match volume_ma10 {
                Some(ma) if ma > 0.0 => candle.price_change * (candle.volume / ma),
                _ => 0.0,
            };

            let avg_trade_size = trade_sizes[i];
            let trade_concentration = if candle.trades > 0 {
                match window_mean(&trade_sizes, i, self.long_window) {
                    Some(ma) if ma > 0.0 => avg_trade_size / ma,
                    _ => 1.0,
                }
            } else {
                1.0
            };

            let invisible_divergence = if i >= self.divergence_lag
                && price_ma[i].is_some()
                && flow_ma[i].is_some()
            {
                match (
                    pct_change(&price_ma, i, self.divergence_lag),
                    pct_change(&flow_ma, i, self.divergence_lag),
                ) {
                    (Some(price), Some(flow)) => Some(price - flow),
                    _ => None,
                }
            } else {
                None
            };

            let volume_ratio = match volume_ma20 {
                Some(ma) if ma > 0.0 => candle.volume / ma,
                _ => 1.0,
            };

            candle.metrics = Some(RollingMetrics {
                capital_flow_ma: flow_ma[i],
                price_ma: price_ma[i],
                volume_ma10,
                volume_ma20,
                impulse,
                avg_trade_size,
                trade_concentration,
                invisible_divergence,
                volume_ratio,
                trend_direction: self.trend_at(&closes, i),
            });
        }
    }

    fn trend_at(&self, closes: &[f64], index: usize) -> TrendDirection {
        if closes.len() < self.trend_fast {
            return TrendDirection::Neutral;
        }
        match (
            window_mean(closes, index, self.trend_fast),
            window_mean(closes, index, self.trend_slow),
        ) {
            (Some(fast), Some(slow)) if fast > slow => TrendDirection::Up,
            (Some(fast), Some(slow)) if fast < slow => TrendDirection::Down,
            _ => TrendDirection::Neutral,
        }
    }
}

/// Compute rolling metrics with the default windows.
pub fn compute_metrics(candles: &mut [Candle]) {
    FlowMetrics::default().compute(candles);
}
