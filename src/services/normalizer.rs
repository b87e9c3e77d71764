//! Candle normalizer: raw kline rows into tagged candles.

use crate::error::{AppError, Result};
use crate::types::{Candle, Market, RawKline};
use serde_json::Value;

/// Parse a Binance kline payload (array of arrays, numbers or numeric strings).
pub fn parse_klines(body: &str) -> Result<Vec<RawKline>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    rows.iter()
        .enumerate()
        .map(|(row, values)| parse_row(row, values))
        .collect()
}

fn parse_row(row: usize, values: &[Value]) -> Result<RawKline> {
    let num = |idx: usize, field: &'static str| -> Result<f64> {
        values
            .get(idx)
            .and_then(value_as_f64)
            .filter(|v| v.is_finite())
            .ok_or(AppError::MalformedKline { row, field })
    };

    Ok(RawKline {
        open_time: num(0, "open_time")? as i64,
        open: num(1, "open")?,
        high: num(2, "high")?,
        low: num(3, "low")?,
        close: num(4, "close")?,
        volume: num(5, "volume")?,
        close_time: num(6, "close_time")? as i64,
        quote_volume: num(7, "quote_volume")?,
        num_trades: num(8, "num_trades")?.max(0.0) as u64,
        taker_buy_base_volume: num(9, "taker_buy_base_volume")?,
        taker_buy_quote_volume: num(10, "taker_buy_quote_volume")?,
    })
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Directional force from taker buy quote volume, in [-1, 1].
///
/// Zero quote volume carries no pressure either way.
pub fn directional_force(taker_buy_quote: f64, quote_volume: f64) -> f64 {
    if quote_volume == 0.0 {
        return 0.0;
    }
    (taker_buy_quote / quote_volume * 2.0 - 1.0).clamp(-1.0, 1.0)
}

/// Convert one raw row into a candle for `market`.
pub fn to_candle(raw: &RawKline, market: Market) -> Candle {
    let force = directional_force(raw.taker_buy_quote_volume, raw.quote_volume);
    Candle {
        timestamp: raw.open_time,
        open: raw.open,
        high: raw.high,
        low: raw.low,
        close: raw.close,
        volume: raw.volume,
        close_time: raw.close_time,
        quote_volume: raw.quote_volume,
        trades: raw.num_trades,
        taker_buy_base: raw.taker_buy_base_volume,
        taker_buy_quote: raw.taker_buy_quote_volume,
        market,
        price_change: raw.close - raw.open,
        directional_force: force,
        capital_flow: raw.quote_volume * force,
        metrics: None,
        mfi: None,
    }
}

/// Normalize a raw sequence, rejecting out-of-order or duplicate timestamps.
///
/// An empty input is "no data" and yields an empty sequence.
pub fn normalize(symbol: &str, market: Market, rows: &[RawKline]) -> Result<Vec<Candle>> {
    if let Some(row) = rows
        .windows(2)
        .position(|pair| pair[1].open_time <= pair[0].open_time)
    {
        return Err(AppError::UnorderedSequence {
            symbol: symbol.to_string(),
            row: row + 1,
            timestamp: rows[row + 1].open_time,
        });
    }

    Ok(rows.iter().map(|raw| to_candle(raw, market)).collect())
}
