use crate::error::Result;
use crate::services::normalizer::parse_klines;
use crate::types::{Market, RawKline};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads Binance-format kline dumps from disk.
///
/// Layout: `{data_dir}/{market}/{SYMBOL}_{interval}.json`, each file holding
/// the JSON array the exchange's kline endpoint returns.
#[derive(Debug, Clone)]
pub struct FileKlineSource {
    data_dir: PathBuf,
    interval: String,
}

impl FileKlineSource {
    /// Create a new file source.
    pub fn new(data_dir: impl Into<PathBuf>, interval: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            interval: interval.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    /// Path of the dump for `symbol` in `market`.
    pub fn path(&self, symbol: &str, market: Market) -> PathBuf {
        self.data_dir
            .join(market.as_str())
            .join(format!("{}_{}.json", symbol.to_uppercase(), self.interval))
    }

    /// Fetch the most recent `limit` rows for `symbol` in `market`.
    ///
    /// A missing file is "no data" and yields an empty sequence.
    pub async fn fetch(&self, symbol: &str, market: Market, limit: usize) -> Result<Vec<RawKline>> {
        let path = self.path(symbol, market);
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No kline dump, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(path = %path.display(), "Failed to read kline dump: {}", e);
                return Err(e.into());
            }
        };

        let mut rows = parse_klines(&body)?;
        if rows.len() > limit {
            rows.drain(..rows.len() - limit);
        }
        debug!(symbol, market = %market, rows = rows.len(), "Loaded klines");
        Ok(rows)
    }
}
