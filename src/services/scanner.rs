use crate::services::sequence_store::SequenceStore;
use crate::services::signals::{
    fuse_markets, market_snapshot, score_combined_with_trend, score_single_market, BtcReference,
};
use crate::types::{
    CombinedMetric, MarketMode, MarketSnapshot, MarketTrend, MfiOptions, Signal, SignalResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// One scored asset.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScanEntry {
    Single {
        snapshot: MarketSnapshot,
        result: SignalResult,
    },
    Combined {
        metric: CombinedMetric,
        result: SignalResult,
    },
}

impl ScanEntry {
    pub fn symbol(&self) -> &str {
        match self {
            ScanEntry::Single { snapshot, .. } => &snapshot.symbol,
            ScanEntry::Combined { metric, .. } => &metric.symbol,
        }
    }

    pub fn price(&self) -> f64 {
        match self {
            ScanEntry::Single { snapshot, .. } => snapshot.price,
            ScanEntry::Combined { metric, .. } => metric.price,
        }
    }

    pub fn capital_flow(&self) -> f64 {
        match self {
            ScanEntry::Single { snapshot, .. } => snapshot.capital_flow,
            ScanEntry::Combined { metric, .. } => metric.capital_flow,
        }
    }

    pub fn mfi(&self) -> Option<f64> {
        match self {
            ScanEntry::Single { snapshot, .. } => snapshot.mfi,
            ScanEntry::Combined { metric, .. } => metric.mfi,
        }
    }

    pub fn result(&self) -> &SignalResult {
        match self {
            ScanEntry::Single { result, .. } | ScanEntry::Combined { result, .. } => result,
        }
    }
}

/// Outcome of one scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub mode: MarketMode,
    pub btc_trend: MarketTrend,
    /// Sorted by absolute capital flow, largest first.
    pub entries: Vec<ScanEntry>,
}

/// Signal counts of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalCounts {
    pub long: usize,
    pub short: usize,
    pub neutral: usize,
}

impl ScanReport {
    pub fn counts(&self) -> SignalCounts {
        self.entries
            .iter()
            .fold(SignalCounts::default(), |mut counts, entry| {
                match entry.result().signal {
                    Signal::Long => counts.long += 1,
                    Signal::Short => counts.short += 1,
                    Signal::Neutral => counts.neutral += 1,
                }
                counts
            })
    }

    /// Entries with a LONG or SHORT signal.
    pub fn actionable(&self) -> impl Iterator<Item = &ScanEntry> {
        self.entries
            .iter()
            .filter(|e| e.result().signal != Signal::Neutral)
    }

    /// Plain-text table for terminal output.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.counts();
        writeln!(
            f,
            "Scan {} | mode {:?} | BTC {:?} | {} long, {} short, {} neutral",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.mode,
            self.btc_trend,
            counts.long,
            counts.short,
            counts.neutral
        )?;
        writeln!(
            f,
            "{:<22} {:>14} {:>16} {:>6} {:>8} {:>9} {:>7}",
            "SYMBOL", "PRICE", "CAPITAL FLOW", "MFI", "SIGNAL", "STRENGTH", "CONF"
        )?;
        for entry in &self.entries {
            let result = entry.result();
            let mfi = entry
                .mfi()
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{:<22} {:>14.6} {:>16.0} {:>6} {:>8} {:>9.2} {:>7}",
                entry.symbol(),
                entry.price(),
                entry.capital_flow(),
                mfi,
                result.signal.label(),
                result.strength,
                result.confidence.label()
            )?;
            if result.signal != Signal::Neutral {
                for reason in &result.reasoning {
                    writeln!(f, "    - {}", reason)?;
                }
            }
        }
        Ok(())
    }
}

/// Scores every sequence in a store for one market mode.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    mfi_options: MfiOptions,
}

impl Scanner {
    pub fn new(mfi_options: MfiOptions) -> Self {
        Self { mfi_options }
    }

    pub fn scan(&self, store: &SequenceStore, mode: MarketMode) -> ScanReport {
        let btc_trend = BtcReference::from_store(store)
            .map(|reference| reference.trend())
            .unwrap_or_default();

        let mut entries = match mode.single_market() {
            Some(market) => store
                .keys_for(market)
                .into_iter()
                .filter_map(|key| {
                    let candles = store.get(&key)?;
                    let Some(snapshot) = market_snapshot(&key, &candles, &self.mfi_options) else {
                        debug!(series = %key, len = candles.len(), "Not enough candles to score");
                        return None;
                    };
                    let result = score_single_market(&snapshot);
                    Some(ScanEntry::Single { snapshot, result })
                })
                .collect::<Vec<_>>(),
            None => fuse_markets(store, &self.mfi_options)
                .into_iter()
                .map(|metric| {
                    let result = score_combined_with_trend(&metric, btc_trend);
                    ScanEntry::Combined { metric, result }
                })
                .collect(),
        };

        entries.sort_by(|a, b| b.capital_flow().abs().total_cmp(&a.capital_flow().abs()));

        let report = ScanReport {
            generated_at: Utc::now(),
            mode,
            btc_trend,
            entries,
        };
        let counts = report.counts();
        info!(
            mode = ?mode,
            btc_trend = ?btc_trend,
            entries = report.entries.len(),
            long = counts.long,
            short = counts.short,
            "Scan complete"
        );
        report
    }
}
