use crate::error::Result;
use crate::services::normalizer::normalize;
use crate::services::sequence_store::SequenceStore;
use crate::services::signals::indicators::{attach_mfi, compute_metrics};
use crate::sources::FileKlineSource;
use crate::types::{Candle, Market, MfiOptions, RawKline, SeriesKey};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome counts of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub empty: usize,
    pub failed: usize,
    /// Series whose dump could not be read or prepared, sorted.
    pub failures: Vec<SeriesKey>,
}

/// Normalize raw rows and run both engines over the sequence.
pub fn prepare_sequence(key: &SeriesKey, rows: &[RawKline], options: &MfiOptions) -> Result<Vec<Candle>> {
    let mut candles = normalize(&key.symbol, key.market, rows)?;
    compute_metrics(&mut candles);
    attach_mfi(&mut candles, options);
    Ok(candles)
}

/// Fetch, prepare and store one series. Returns the stored length, 0 for no data.
async fn load_series(
    source: &FileKlineSource,
    store: &SequenceStore,
    key: &SeriesKey,
    limit: usize,
    options: &MfiOptions,
) -> Result<usize> {
    let rows = source.fetch(&key.symbol, key.market, limit).await?;
    if rows.is_empty() {
        return Ok(0);
    }
    let candles = prepare_sequence(key, &rows, options)?;
    let len = candles.len();
    store.insert(key.clone(), candles);
    Ok(len)
}

/// Fetch and prepare every symbol x market concurrently into `store`.
///
/// Empty sequences are not stored. A failing series is logged and skipped.
pub async fn load_into(
    store: &Arc<SequenceStore>,
    source: Arc<FileKlineSource>,
    symbols: &[String],
    markets: &[Market],
    limit: usize,
    options: &MfiOptions,
) -> LoadSummary {
    let mut tasks = JoinSet::new();
    for symbol in symbols {
        for &market in markets {
            let key = SeriesKey::new(symbol, market);
            let source = source.clone();
            let store = store.clone();
            let options = options.clone();
            tasks.spawn(async move {
                match load_series(&source, &store, &key, limit, &options).await {
                    Ok(len) => Ok((key, len)),
                    Err(e) => Err((key, e)),
                }
            });
        }
    }

    let mut summary = LoadSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok((key, 0))) => {
                debug!(series = %key, "No data");
                summary.empty += 1;
            }
            Ok(Ok((key, len))) => {
                debug!(series = %key, candles = len, "Series ready");
                summary.loaded += 1;
            }
            Ok(Err((key, e))) => {
                warn!(series = %key, "Failed to load series: {}", e);
                summary.failed += 1;
                summary.failures.push(key);
            }
            Err(e) => {
                warn!("Load task panicked: {}", e);
                summary.failed += 1;
            }
        }
    }

    summary.failures.sort();
    info!(
        data_dir = %source.data_dir().display(),
        interval = source.interval(),
        loaded = summary.loaded,
        empty = summary.empty,
        failed = summary.failed,
        "Loaded candle sequences"
    );
    summary
}
