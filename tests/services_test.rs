//! Unit tests for services module

use flowscan::config::Config;
use flowscan::services::normalizer::{normalize, parse_klines};
use flowscan::services::{load_into, ScanEntry, Scanner, SequenceStore};
use flowscan::sources::FileKlineSource;
use flowscan::types::*;
use std::path::Path;
use std::sync::Arc;

/// Binance-style kline payload: rising closes, buyers dominating.
fn kline_payload(count: usize, start: f64, step: f64, quote_volume: f64, buy_share: f64) -> String {
    let rows: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            let open_time = 1_700_000_000_000i64 + i as i64 * 900_000;
            let open = start + i as f64 * step;
            let close = open + step;
            serde_json::json!([
                open_time,
                format!("{}", open),
                format!("{}", open.max(close) + 0.5),
                format!("{}", open.min(close) - 0.5),
                format!("{}", close),
                format!("{}", quote_volume / close),
                open_time + 899_999,
                format!("{}", quote_volume),
                150,
                format!("{}", quote_volume / close * buy_share),
                format!("{}", quote_volume * buy_share),
                "0"
            ])
        })
        .collect();
    serde_json::to_string(&rows).unwrap()
}

fn write_dump(dir: &Path, market: Market, symbol: &str, body: &str) {
    let market_dir = dir.join(market.as_str());
    std::fs::create_dir_all(&market_dir).unwrap();
    std::fs::write(market_dir.join(format!("{}_15m.json", symbol)), body).unwrap();
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_parse_and_normalize_payload() {
    let body = kline_payload(5, 100.0, 1.0, 10_000.0, 0.75);
    let rows = parse_klines(&body).unwrap();
    let candles = normalize("ETHUSDT", Market::Spot, &rows).unwrap();
    assert_eq!(candles.len(), 5);
    assert!((candles[0].directional_force - 0.5).abs() < 1e-9);
    assert!((candles[0].capital_flow - 5_000.0).abs() < 1e-6);
    assert_eq!(candles[4].close, 105.0);
}

#[tokio::test]
async fn test_load_into_store() {
    let dir = tempfile::tempdir().unwrap();
    write_dump(dir.path(), Market::Spot, "ETHUSDT", &kline_payload(120, 2000.0, 2.0, 50_000.0, 0.7));
    write_dump(dir.path(), Market::Futures, "ETHUSDT", &kline_payload(120, 2001.0, 2.0, 80_000.0, 0.65));
    write_dump(dir.path(), Market::Spot, "BADUSDT", "[[1, \"x\"]]");

    let store = SequenceStore::new();
    let source = Arc::new(FileKlineSource::new(dir.path(), "15m"));
    let summary = load_into(
        &store,
        source,
        &symbols(&["ETHUSDT", "BADUSDT", "SOLUSDT"]),
        &[Market::Spot, Market::Futures],
        100,
        &MfiOptions::default(),
    )
    .await;

    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures, vec![SeriesKey::new("BADUSDT", Market::Spot)]);
    // BADUSDT futures, SOLUSDT spot and futures
    assert_eq!(summary.empty, 3);

    let spot = store.get(&SeriesKey::new("ETHUSDT", Market::Spot)).unwrap();
    assert_eq!(spot.len(), 100);
    assert!(spot.iter().all(|c| c.metrics.is_some() && c.mfi.is_some()));
    // truncated to the latest 100 candles
    assert_eq!(spot[0].timestamp, 1_700_000_000_000 + 20 * 900_000);
    assert!(store.get(&SeriesKey::new("SOLUSDT", Market::Spot)).is_none());
}

#[tokio::test]
async fn test_end_to_end_combined_scan() {
    let dir = tempfile::tempdir().unwrap();
    write_dump(dir.path(), Market::Spot, "ETHUSDT", &kline_payload(100, 2000.0, 3.0, 60_000.0, 0.85));
    write_dump(dir.path(), Market::Futures, "ETHUSDT", &kline_payload(100, 2002.0, 3.0, 90_000.0, 0.85));
    write_dump(dir.path(), Market::Spot, "PEPEUSDT", &kline_payload(100, 0.001, 0.0, 4_000.0, 0.3));
    write_dump(dir.path(), Market::Futures, "1000PEPEUSDT", &kline_payload(100, 1.0, 0.0, 6_000.0, 0.3));
    write_dump(dir.path(), Market::Spot, "SOLUSDT", &kline_payload(100, 150.0, 0.1, 9_000.0, 0.5));
    write_dump(dir.path(), Market::Spot, "BTCUSDT", &kline_payload(100, 60_000.0, 60.0, 900_000.0, 0.6));
    write_dump(dir.path(), Market::Futures, "BTCUSDT", &kline_payload(100, 60_000.0, 60.0, 900_000.0, 0.6));

    let config = Config {
        data_dir: dir.path().to_path_buf(),
        symbols: symbols(&["ETHUSDT", "PEPEUSDT", "1000PEPEUSDT", "SOLUSDT", "BTCUSDT"]),
        ..Config::default()
    };
    let store = SequenceStore::new();
    let source = Arc::new(FileKlineSource::new(&config.data_dir, &config.interval));
    load_into(
        &store,
        source,
        &config.symbols,
        &config.market_mode.markets(),
        config.candle_limit,
        &config.mfi,
    )
    .await;

    let report = Scanner::new(config.mfi.clone()).scan(&store, MarketMode::Combined);
    // 64620 -> 66000 over the lookback, above 2%
    assert_eq!(report.btc_trend, MarketTrend::Bullish);

    let symbols: Vec<&str> = report.entries.iter().map(|e| e.symbol()).collect();
    assert!(symbols.contains(&"ETHUSDT_combined"));
    assert!(symbols.contains(&"PEPEUSDT_combined"));
    assert!(!symbols.iter().any(|s| s.starts_with("SOLUSDT")));

    let flows: Vec<f64> = report.entries.iter().map(|e| e.capital_flow().abs()).collect();
    assert!(flows.windows(2).all(|w| w[0] >= w[1]));

    let eth = report
        .entries
        .iter()
        .find_map(|e| match e {
            ScanEntry::Combined { metric, result } if metric.base_symbol == "ETHUSDT" => {
                Some((metric, result))
            }
            _ => None,
        })
        .unwrap();
    assert!(eth.0.markets_agreement);
    assert_eq!(eth.0.spot_data.len(), 100);
    assert!(eth
        .1
        .reasoning
        .contains(&"Aligned with bullish BTC trend (+1.5)".to_string()));

    let pepe = report
        .entries
        .iter()
        .find_map(|e| match e {
            ScanEntry::Combined { metric, .. } if metric.base_symbol == "PEPEUSDT" => Some(metric),
            _ => None,
        })
        .unwrap();
    assert!((pepe.price_spot - 1.0).abs() < 1e-9);
    assert!(pepe.basis.abs() < 1e-6);
}

#[tokio::test]
async fn test_single_market_scan() {
    let dir = tempfile::tempdir().unwrap();
    write_dump(dir.path(), Market::Futures, "ETHUSDT", &kline_payload(50, 2000.0, -2.0, 70_000.0, 0.2));
    write_dump(dir.path(), Market::Futures, "XRPUSDT", &kline_payload(50, 0.5, 0.001, 3_000.0, 0.55));

    let store = SequenceStore::new();
    let source = Arc::new(FileKlineSource::new(dir.path(), "15m"));
    load_into(
        &store,
        source,
        &symbols(&["ETHUSDT", "XRPUSDT"]),
        &[Market::Futures],
        100,
        &MfiOptions::default(),
    )
    .await;

    let report = Scanner::default().scan(&store, MarketMode::Futures);
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].symbol(), "ETHUSDT_futures");
    let eth = report.entries[0].result();
    assert_eq!(eth.signal, Signal::Short);
    assert_eq!(eth.confidence, Confidence::Basica);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["entries"][0]["kind"], "single");
    assert_eq!(json["entries"][0]["snapshot"]["market"], "futures");
}
