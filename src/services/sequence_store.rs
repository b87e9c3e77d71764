use crate::types::{Candle, CandleSeries, Market, SeriesKey};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Finished candle sequences keyed by symbol and market.
///
/// Sequences are inserted once their metrics and MFI are attached and are
/// shared read-only afterwards.
#[derive(Debug, Default)]
pub struct SequenceStore {
    series: DashMap<SeriesKey, CandleSeries>,
}

impl SequenceStore {
    /// Create a new, empty store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store a finished sequence, replacing any previous one.
    pub fn insert(&self, key: SeriesKey, candles: Vec<Candle>) -> CandleSeries {
        let series = Arc::new(candles);
        self.series.insert(key, series.clone());
        series
    }

    pub fn get(&self, key: &SeriesKey) -> Option<CandleSeries> {
        self.series.get(key).map(|entry| entry.value().clone())
    }

    /// Non-empty sequence for `key`.
    pub fn get_non_empty(&self, key: &SeriesKey) -> Option<CandleSeries> {
        self.get(key).filter(|series| !series.is_empty())
    }

    /// Whether any sequence exists for `symbol` in `market`.
    pub fn contains(&self, symbol: &str, market: Market) -> bool {
        self.series.contains_key(&SeriesKey::new(symbol, market))
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<SeriesKey> {
        let mut keys: Vec<SeriesKey> = self.series.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Keys of one market, sorted.
    pub fn keys_for(&self, market: Market) -> Vec<SeriesKey> {
        self.keys().into_iter().filter(|k| k.market == market).collect()
    }

    /// Base symbols present in any market, sorted.
    pub fn base_symbols(&self) -> BTreeSet<String> {
        self.series
            .iter()
            .map(|e| e.key().base_symbol().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
