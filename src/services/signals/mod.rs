//! Flow and money-flow signal engine.
//!
//! Provides the rolling-metric and MFI indicators, spot/futures fusion, and
//! the two rule-based scorers that turn them into a directional signal.

pub mod combined;
pub mod fusion;
pub mod indicators;
pub mod rules;
pub mod single;
pub mod snapshot;
pub mod trend;

pub use combined::{combined_rules, score_combined, score_combined_with_trend};
pub use fusion::fuse_markets;
pub use rules::{evaluate_rules, Tally};
pub use single::{score_single_market, single_market_rules};
pub use snapshot::market_snapshot;
pub use trend::BtcReference;

use crate::types::Side;

/// Where an adjustment's reason lands in the final trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Flow, force, impulse, basis and MFI rules.
    Primary,
    /// Volume and trend context, listed after the primary reasons.
    Advisory,
}

/// Points added to (or, when negative, removed from) one side.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub side: Side,
    pub points: f64,
    pub reason: String,
    pub section: Section,
}

impl Adjustment {
    pub fn primary(side: Side, points: f64, reason: String) -> Self {
        Self {
            side,
            points,
            reason,
            section: Section::Primary,
        }
    }

    pub fn advisory(side: Side, points: f64, reason: String) -> Self {
        Self {
            side,
            points,
            reason,
            section: Section::Advisory,
        }
    }
}

/// Trait for implementing scoring rules over a context `C`.
pub trait ScoringRule<C>: Send + Sync {
    /// Unique identifier for this rule.
    fn id(&self) -> &str;

    /// Adjustments this rule makes given the context and the points
    /// accumulated by the rules before it. Empty when the rule does not fire.
    fn evaluate(&self, ctx: &C, tally: &Tally) -> Vec<Adjustment>;
}

/// Render a point value with at most two decimals, trailing zeros trimmed.
pub fn format_points(points: f64) -> String {
    let text = format!("{:.2}", points.abs());
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Signed point delta suffix, e.g. `(+2.5)` or `(-2)`.
pub fn format_delta(points: f64) -> String {
    let sign = if points < 0.0 { '-' } else { '+' };
    format!("({}{})", sign, format_points(points))
}
