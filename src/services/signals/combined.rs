//! Combined spot/futures scorer.

use super::rules::{evaluate_rules, FlowRule, MfiRule, TieredRule};
use super::trend::BtcReference;
use super::{format_delta, Adjustment, ScoringRule, Tally};
use crate::types::{
    CombinedMetric, Confidence, MarketTrend, Side, Signal, SignalResult, TrendDirection,
};
use tracing::debug;

/// Points the winning side needs before a signal fires.
pub const MIN_POINTS: f64 = 8.0;
pub const HIGH_CONFIDENCE_POINTS: f64 = 12.0;
pub const MEDIUM_CONFIDENCE_POINTS: f64 = 10.0;

const AGREEMENT_BONUS: f64 = 2.0;
const PREMIUM_THRESHOLD: f64 = 0.5;
const DISCOUNT_THRESHOLD: f64 = 0.2;
const MAX_BASIS_POINTS: f64 = 2.0;
const VOLUME_SPIKE_RATIO: f64 = 3.0;
const VOLUME_SPIKE_POINTS: f64 = 2.0;
const TREND_BONUS: f64 = 1.5;
const BTC_PENALTY: f64 = 2.0;

/// Spot and futures pushing the same way, confirmed by spot force.
pub struct AgreementRule {
    side: Side,
}

impl ScoringRule<CombinedMetric> for AgreementRule {
    fn id(&self) -> &str {
        "markets_agreement"
    }

    fn evaluate(&self, ctx: &CombinedMetric, _tally: &Tally) -> Vec<Adjustment> {
        if !ctx.markets_agreement || ctx.directional_force_spot * self.side.sign() <= 0.0 {
            return Vec::new();
        }
        vec![Adjustment::primary(
            self.side,
            AGREEMENT_BONUS,
            format!("Spot and futures agree {}", format_delta(AGREEMENT_BONUS)),
        )]
    }
}

/// Futures premium favours long, discount favours short.
pub struct BasisRule {
    side: Side,
}

impl ScoringRule<CombinedMetric> for BasisRule {
    fn id(&self) -> &str {
        match self.side {
            Side::Long => "basis_premium",
            Side::Short => "basis_discount",
        }
    }

    fn evaluate(&self, ctx: &CombinedMetric, _tally: &Tally) -> Vec<Adjustment> {
        let (points, label) = match self.side {
            Side::Long if ctx.basis > PREMIUM_THRESHOLD => (
                (ctx.basis / PREMIUM_THRESHOLD).min(MAX_BASIS_POINTS),
                "Futures premium",
            ),
            Side::Short if ctx.basis < -DISCOUNT_THRESHOLD => (
                (ctx.basis.abs() / DISCOUNT_THRESHOLD).min(MAX_BASIS_POINTS),
                "Futures discount",
            ),
            _ => return Vec::new(),
        };
        vec![Adjustment::primary(
            self.side,
            points,
            format!("{} ({:.2}%) {}", label, ctx.basis, format_delta(points)),
        )]
    }
}

/// Abnormal volume, credited to the side the combined force points to.
pub struct VolumeSpikeRule;

impl ScoringRule<CombinedMetric> for VolumeSpikeRule {
    fn id(&self) -> &str {
        "volume_spike"
    }

    fn evaluate(&self, ctx: &CombinedMetric, _tally: &Tally) -> Vec<Adjustment> {
        if ctx.volume_ratio <= VOLUME_SPIKE_RATIO {
            return Vec::new();
        }
        let side = if ctx.directional_force > 0.0 {
            Side::Long
        } else if ctx.directional_force < 0.0 {
            Side::Short
        } else {
            return Vec::new();
        };
        vec![Adjustment::advisory(
            side,
            VOLUME_SPIKE_POINTS,
            format!(
                "Abnormal volume ({:.1}x) {}",
                ctx.volume_ratio,
                format_delta(VOLUME_SPIKE_POINTS)
            ),
        )]
    }
}

/// Bitcoin trend: bonus to the aligned side, penalty to the other side if
/// it still leads after the bonus.
pub struct BtcTrendRule {
    trend: MarketTrend,
}

impl ScoringRule<CombinedMetric> for BtcTrendRule {
    fn id(&self) -> &str {
        "btc_trend"
    }

    fn evaluate(&self, _ctx: &CombinedMetric, tally: &Tally) -> Vec<Adjustment> {
        let (aligned, label) = match self.trend {
            MarketTrend::Bullish => (Side::Long, "bullish"),
            MarketTrend::Bearish => (Side::Short, "bearish"),
            MarketTrend::Neutral => return Vec::new(),
        };
        let mut adjustments = vec![Adjustment::advisory(
            aligned,
            TREND_BONUS,
            format!("Aligned with {} BTC trend {}", label, format_delta(TREND_BONUS)),
        )];

        let opposite = aligned.opposite();
        if tally.points(opposite) > tally.points(aligned) + TREND_BONUS {
            adjustments.push(Adjustment::advisory(
                opposite,
                -BTC_PENALTY,
                format!("Against {} BTC trend {}", label, format_delta(-BTC_PENALTY)),
            ));
        }
        adjustments
    }
}

/// The asset's own MA trend backs or contradicts the leading side.
pub struct AssetTrendRule;

impl ScoringRule<CombinedMetric> for AssetTrendRule {
    fn id(&self) -> &str {
        "asset_trend"
    }

    fn evaluate(&self, ctx: &CombinedMetric, tally: &Tally) -> Vec<Adjustment> {
        let Some(leader) = tally.leader() else {
            return Vec::new();
        };
        let trend_side = match ctx.trend {
            TrendDirection::Up => Side::Long,
            TrendDirection::Down => Side::Short,
            TrendDirection::Neutral => return Vec::new(),
        };
        let trend = ctx.trend.label();
        if leader == trend_side {
            vec![Adjustment::advisory(
                leader,
                TREND_BONUS,
                format!("Aligned with asset trend {} {}", trend, format_delta(TREND_BONUS)),
            )]
        } else {
            vec![Adjustment::advisory(
                leader,
                -TREND_BONUS,
                format!("Against asset trend {} {}", trend, format_delta(-TREND_BONUS)),
            )]
        }
    }
}

fn flow_rules(side: Side) -> Vec<Box<dyn ScoringRule<CombinedMetric>>> {
    let long = side == Side::Long;
    vec![
        Box::new(FlowRule::<CombinedMetric> {
            id: "combined_flow",
            side,
            source: |m| m.capital_flow,
            base: 1.5,
            scale: 0.5,
            cap: 5.0,
            divisor: 10_000.0,
            label: if long {
                "Positive combined capital flow"
            } else {
                "Negative combined capital flow"
            },
        }),
        Box::new(FlowRule::<CombinedMetric> {
            id: "spot_flow",
            side,
            source: |m| m.capital_flow_spot,
            base: 0.5,
            scale: 0.3,
            cap: 3.0,
            divisor: 5_000.0,
            label: if long { "Spot buying flow" } else { "Spot selling flow" },
        }),
        Box::new(FlowRule::<CombinedMetric> {
            id: "futures_flow",
            side,
            source: |m| m.capital_flow_futures,
            base: 0.5,
            scale: 0.3,
            cap: 3.0,
            divisor: 5_000.0,
            label: if long {
                "Futures buying flow"
            } else {
                "Futures selling flow"
            },
        }),
    ]
}

fn side_rules(side: Side) -> Vec<Box<dyn ScoringRule<CombinedMetric>>> {
    let long = side == Side::Long;
    let mut rules = flow_rules(side);
    rules.push(Box::new(TieredRule::<CombinedMetric> {
        id: "combined_force",
        side,
        source: |m| m.directional_force,
        tiers: if long {
            vec![
                (0.5, 2.5, "Strong combined buying force"),
                (0.2, 1.5, "Moderate combined buying force"),
                (0.0, 0.5, "Light combined buying force"),
            ]
        } else {
            vec![
                (0.5, 2.5, "Strong combined selling force"),
                (0.2, 1.5, "Moderate combined selling force"),
                (0.0, 0.5, "Light combined selling force"),
            ]
        },
    }));
    rules.push(Box::new(AgreementRule { side }));
    rules.push(Box::new(TieredRule::<CombinedMetric> {
        id: "combined_impulse",
        side,
        source: |m| m.impulse,
        tiers: if long {
            vec![(2.0, 2.0, "Strong positive impulse"), (0.0, 1.0, "Positive impulse")]
        } else {
            vec![(2.0, 2.0, "Strong negative impulse"), (0.0, 1.0, "Negative impulse")]
        },
    }));
    rules.push(Box::new(BasisRule { side }));
    rules
}

/// Rule set of the combined scorer, in evaluation order.
pub fn combined_rules(btc_trend: MarketTrend) -> Vec<Box<dyn ScoringRule<CombinedMetric>>> {
    let mut rules = side_rules(Side::Long);
    rules.extend(side_rules(Side::Short));
    rules.push(Box::new(VolumeSpikeRule));
    rules.push(Box::new(BtcTrendRule { trend: btc_trend }));
    rules.push(Box::new(AssetTrendRule));
    rules.push(Box::new(MfiRule));
    rules
}

fn confidence_for(strength: f64) -> Confidence {
    if strength >= HIGH_CONFIDENCE_POINTS {
        Confidence::Alta
    } else if strength >= MEDIUM_CONFIDENCE_POINTS {
        Confidence::Media
    } else {
        Confidence::Baja
    }
}

/// Score a fused asset against the Bitcoin reference.
///
/// A missing reference counts as a NEUTRAL market trend.
pub fn score_combined(metric: &CombinedMetric, reference: Option<&BtcReference>) -> SignalResult {
    let trend = reference.map(BtcReference::trend).unwrap_or_default();
    score_combined_with_trend(metric, trend)
}

/// Score a fused asset against an already classified market trend.
pub fn score_combined_with_trend(metric: &CombinedMetric, btc_trend: MarketTrend) -> SignalResult {
    let tally = evaluate_rules(&combined_rules(btc_trend), metric);
    let (signal, strength) = tally.verdict(MIN_POINTS);
    debug!(
        symbol = %metric.symbol,
        long = tally.long_points,
        short = tally.short_points,
        btc_trend = ?btc_trend,
        signal = signal.label(),
        "Scored combined market"
    );

    let confidence = match signal {
        Signal::Neutral => Confidence::Baja,
        _ => confidence_for(strength),
    };
    let mut reasoning = tally.into_reasoning();
    if reasoning.is_empty() {
        reasoning.push("No scoring rule fired".to_string());
    }
    SignalResult {
        signal,
        strength,
        confidence,
        reasoning,
    }
}
