//! Single-market scorer.

use super::rules::{evaluate_rules, FlowRule, MfiRule, TieredRule};
use super::{format_delta, Adjustment, ScoringRule, Tally};
use crate::types::{Confidence, MarketSnapshot, Side, SignalResult};
use tracing::debug;

/// Points the winning side needs before a signal fires.
pub const MIN_POINTS: f64 = 3.0;
/// Divergence (percent) past which the price/flow gap counts.
const DIVERGENCE_THRESHOLD: f64 = 100.0;
const DIVERGENCE_POINTS: f64 = 2.0;

/// Price/flow divergence while price rises.
///
/// Flow outpacing price (negative divergence) is accumulation and favours
/// long; price outpacing flow is distribution and favours short.
pub struct DivergenceRule {
    side: Side,
}

impl ScoringRule<MarketSnapshot> for DivergenceRule {
    fn id(&self) -> &str {
        match self.side {
            Side::Long => "divergence_long",
            Side::Short => "divergence_short",
        }
    }

    fn evaluate(&self, ctx: &MarketSnapshot, _tally: &Tally) -> Vec<Adjustment> {
        if ctx.change_pct <= 0.0 {
            return Vec::new();
        }
        let (fired, label) = match self.side {
            Side::Long => (
                ctx.divergence < -DIVERGENCE_THRESHOLD,
                "Capital flow leading price (accumulation)",
            ),
            Side::Short => (
                ctx.divergence > DIVERGENCE_THRESHOLD,
                "Price leading capital flow (distribution)",
            ),
        };
        if !fired {
            return Vec::new();
        }
        vec![Adjustment::primary(
            self.side,
            DIVERGENCE_POINTS,
            format!("{} {}", label, format_delta(DIVERGENCE_POINTS)),
        )]
    }
}

fn capital_flow_rule(side: Side) -> FlowRule<MarketSnapshot> {
    FlowRule {
        id: match side {
            Side::Long => "capital_flow_long",
            Side::Short => "capital_flow_short",
        },
        side,
        source: |s| s.capital_flow,
        base: 1.0,
        scale: 0.5,
        cap: 3.0,
        divisor: 10_000.0,
        label: match side {
            Side::Long => "Positive capital flow",
            Side::Short => "Negative capital flow",
        },
    }
}

fn force_rule(side: Side) -> TieredRule<MarketSnapshot> {
    let tiers = match side {
        Side::Long => vec![
            (0.5, 2.0, "Strong buying force"),
            (0.2, 1.5, "Moderate buying force"),
            (0.0, 1.0, "Light buying force"),
        ],
        Side::Short => vec![
            (0.5, 2.0, "Strong selling force"),
            (0.2, 1.5, "Moderate selling force"),
            (0.0, 1.0, "Light selling force"),
        ],
    };
    TieredRule {
        id: match side {
            Side::Long => "force_long",
            Side::Short => "force_short",
        },
        side,
        source: |s| s.directional_force,
        tiers,
    }
}

fn impulse_rule(side: Side) -> TieredRule<MarketSnapshot> {
    TieredRule {
        id: match side {
            Side::Long => "impulse_long",
            Side::Short => "impulse_short",
        },
        side,
        source: |s| s.impulse,
        tiers: vec![match side {
            Side::Long => (0.0, 1.0, "Positive impulse"),
            Side::Short => (0.0, 1.0, "Negative impulse"),
        }],
    }
}

/// Rule set of the single-market scorer, in evaluation order.
pub fn single_market_rules() -> Vec<Box<dyn ScoringRule<MarketSnapshot>>> {
    vec![
        Box::new(capital_flow_rule(Side::Long)),
        Box::new(capital_flow_rule(Side::Short)),
        Box::new(force_rule(Side::Long)),
        Box::new(force_rule(Side::Short)),
        Box::new(impulse_rule(Side::Long)),
        Box::new(impulse_rule(Side::Short)),
        Box::new(DivergenceRule { side: Side::Long }),
        Box::new(DivergenceRule { side: Side::Short }),
        Box::new(MfiRule),
    ]
}

/// Score the latest point of one market.
///
/// Fires when one side strictly leads with at least [`MIN_POINTS`].
/// Confidence is always [`Confidence::Basica`].
pub fn score_single_market(snapshot: &MarketSnapshot) -> SignalResult {
    let tally = evaluate_rules(&single_market_rules(), snapshot);
    let (signal, strength) = tally.verdict(MIN_POINTS);
    debug!(
        symbol = %snapshot.symbol,
        long = tally.long_points,
        short = tally.short_points,
        signal = signal.label(),
        "Scored single market"
    );

    let mut reasoning = tally.into_reasoning();
    if reasoning.is_empty() {
        reasoning.push("No scoring rule fired".to_string());
    }
    SignalResult {
        signal,
        strength,
        confidence: Confidence::Basica,
        reasoning,
    }
}
