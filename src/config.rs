use crate::error::{AppError, Result};
use crate::services::signals::trend::REFERENCE_SYMBOL;
use crate::types::{CombinationMethod, MarketMode, MfiOptions};
use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Quote asset every watched pair must trade against.
pub const QUOTE_ASSET: &str = "USDT";

/// Pairs watched when `SYMBOLS` is not set.
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "ADAUSDT",
    "XRPUSDT",
    "WLDUSDT",
    "FILUSDT",
    "XLMUSDT",
    "SXPUSDT",
    "DOGEUSDT",
    "TRUMPUSDT",
    "VETUSDT",
    "ALGOUSDT",
    "SANDUSDT",
    "MANAUSDT",
    "TRXUSDT",
    "1000LUNCUSDT",
    "LUNCUSDT",
    "1000PEPEUSDT",
    "PEPEUSDT",
    "BTCUSDT",
];

/// How the scan report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Summary,
}

impl OutputFormat {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "summary" | "table" | "text" => Some(Self::Summary),
            _ => None,
        }
    }
}

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the kline dumps.
    pub data_dir: PathBuf,
    /// Watched pairs, uppercased, always including the BTC reference.
    pub symbols: Vec<String>,
    /// Candle interval, e.g. `15m`.
    pub interval: String,
    pub market_mode: MarketMode,
    /// Most recent candles kept per sequence.
    pub candle_limit: usize,
    pub mfi: MfiOptions,
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            interval: "15m".to_string(),
            market_mode: MarketMode::Combined,
            candle_limit: 100,
            mfi: MfiOptions::default(),
            output_format: OutputFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// unset or unparseable numbers.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let market_mode = match lookup("MARKET_MODE") {
            Some(v) => MarketMode::from_str(&v)
                .ok_or_else(|| AppError::Config(format!("unknown MARKET_MODE '{}'", v)))?,
            None => defaults.market_mode,
        };
        let combination = match lookup("MFI_COMBINATION") {
            Some(v) => CombinationMethod::from_str(&v)
                .ok_or_else(|| AppError::Config(format!("unknown MFI_COMBINATION '{}'", v)))?,
            None => defaults.mfi.combination,
        };
        let output_format = match lookup("OUTPUT_FORMAT") {
            Some(v) => OutputFormat::from_str(&v)
                .ok_or_else(|| AppError::Config(format!("unknown OUTPUT_FORMAT '{}'", v)))?,
            None => defaults.output_format,
        };

        let period: usize = lookup("MFI_PERIOD")
            .and_then(|v| v.parse().ok())
            .filter(|p| *p > 0)
            .unwrap_or(defaults.mfi.period);

        let symbols = lookup("SYMBOLS")
            .map(|raw| parse_watchlist(&raw))
            .unwrap_or(defaults.symbols);

        Ok(Self {
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            symbols: ensure_reference(symbols),
            interval: lookup("INTERVAL").unwrap_or(defaults.interval),
            market_mode,
            candle_limit: lookup("CANDLE_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.candle_limit),
            mfi: MfiOptions {
                period,
                combination,
                timestamp_tolerance_ms: lookup("MFI_TIMESTAMP_TOLERANCE_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.mfi.timestamp_tolerance_ms),
                ..defaults.mfi
            },
            output_format,
        })
    }
}

/// Parse a comma-separated watchlist.
///
/// Entries are trimmed and uppercased; entries not quoted in USDT are dropped
/// with a warning, duplicates keep their first position.
pub fn parse_watchlist(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for entry in raw.split(',') {
        let symbol = entry.trim().to_uppercase();
        if symbol.is_empty() {
            continue;
        }
        if symbol.len() <= QUOTE_ASSET.len() || !symbol.ends_with(QUOTE_ASSET) {
            warn!("Ignoring watchlist entry '{}': not a {} pair", symbol, QUOTE_ASSET);
            continue;
        }
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

/// Append the BTC reference pair when missing.
fn ensure_reference(mut symbols: Vec<String>) -> Vec<String> {
    if !symbols.iter().any(|s| s == REFERENCE_SYMBOL) {
        symbols.push(REFERENCE_SYMBOL.to_string());
    }
    symbols
}
