//! Rule fold shared by both scorers, plus the rule families they reuse.

use super::{format_delta, format_points, Adjustment, ScoringRule, Section};
use crate::types::{CombinedMetric, MarketSnapshot, MfiSignal, Side, Signal};
use tracing::trace;

/// Running long/short totals and the reasoning trail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    pub long_points: f64,
    pub short_points: f64,
    pub reasoning: Vec<String>,
    pub advisories: Vec<String>,
}

impl Tally {
    pub fn points(&self, side: Side) -> f64 {
        match side {
            Side::Long => self.long_points,
            Side::Short => self.short_points,
        }
    }

    /// Side strictly ahead, if any.
    pub fn leader(&self) -> Option<Side> {
        if self.long_points > self.short_points {
            Some(Side::Long)
        } else if self.short_points > self.long_points {
            Some(Side::Short)
        } else {
            None
        }
    }

    pub fn apply(mut self, adjustment: Adjustment) -> Self {
        match adjustment.side {
            Side::Long => self.long_points += adjustment.points,
            Side::Short => self.short_points += adjustment.points,
        }
        match adjustment.section {
            Section::Primary => self.reasoning.push(adjustment.reason),
            Section::Advisory => self.advisories.push(adjustment.reason),
        }
        self
    }

    /// Winning signal and its points, when the leader reaches `min_points`.
    pub fn verdict(&self, min_points: f64) -> (Signal, f64) {
        match self.leader() {
            Some(side) if self.points(side) >= min_points => (side.signal(), self.points(side)),
            _ => (Signal::Neutral, 0.0),
        }
    }

    /// Primary reasons followed by advisories.
    pub fn into_reasoning(self) -> Vec<String> {
        let mut reasons = self.reasoning;
        reasons.extend(self.advisories);
        reasons
    }
}

/// Fold `rules` in order over an empty tally.
pub fn evaluate_rules<C>(rules: &[Box<dyn ScoringRule<C>>], ctx: &C) -> Tally {
    rules.iter().fold(Tally::default(), |tally, rule| {
        let adjustments = rule.evaluate(ctx, &tally);
        if !adjustments.is_empty() {
            trace!(rule = rule.id(), count = adjustments.len(), "rule fired");
        }
        adjustments.into_iter().fold(tally, Tally::apply)
    })
}

/// Contexts that carry a dominant MFI sub-signal.
pub trait HasMfiSignal {
    fn mfi_signal(&self) -> Option<&MfiSignal>;
}

impl HasMfiSignal for MarketSnapshot {
    fn mfi_signal(&self) -> Option<&MfiSignal> {
        self.mfi_signal.as_ref()
    }
}

impl HasMfiSignal for CombinedMetric {
    fn mfi_signal(&self) -> Option<&MfiSignal> {
        self.mfi_signal.as_ref()
    }
}

/// Signed capital flow: `base + min(cap, |flow| / divisor) * scale` points to
/// the side matching the flow's sign.
pub struct FlowRule<C> {
    pub id: &'static str,
    pub side: Side,
    pub source: fn(&C) -> f64,
    pub base: f64,
    pub scale: f64,
    pub cap: f64,
    pub divisor: f64,
    pub label: &'static str,
}

impl<C> ScoringRule<C> for FlowRule<C> {
    fn id(&self) -> &str {
        self.id
    }

    fn evaluate(&self, ctx: &C, _tally: &Tally) -> Vec<Adjustment> {
        let flow = (self.source)(ctx);
        if flow * self.side.sign() <= 0.0 {
            return Vec::new();
        }
        let factor = (flow.abs() / self.divisor).min(self.cap);
        let points = self.base + factor * self.scale;
        vec![Adjustment::primary(
            self.side,
            points,
            format!("{} {}", self.label, format_delta(points)),
        )]
    }
}

/// Stepped thresholds on a signed value; the first tier passed wins.
///
/// Long fires on `value > threshold`, short on `value < -threshold`.
pub struct TieredRule<C> {
    pub id: &'static str,
    pub side: Side,
    pub source: fn(&C) -> f64,
    /// `(threshold, points, label)`, strongest first.
    pub tiers: Vec<(f64, f64, &'static str)>,
}

impl<C> ScoringRule<C> for TieredRule<C> {
    fn id(&self) -> &str {
        self.id
    }

    fn evaluate(&self, ctx: &C, _tally: &Tally) -> Vec<Adjustment> {
        let value = (self.source)(ctx) * self.side.sign();
        self.tiers
            .iter()
            .find(|(threshold, ..)| value > *threshold)
            .map(|&(_, points, label)| {
                vec![Adjustment::primary(
                    self.side,
                    points,
                    format!("{} {}", label, format_delta(points)),
                )]
            })
            .unwrap_or_default()
    }
}

/// Adds the dominant MFI sub-signal's strength to its side.
pub struct MfiRule;

impl<C: HasMfiSignal> ScoringRule<C> for MfiRule {
    fn id(&self) -> &str {
        "mfi"
    }

    fn evaluate(&self, ctx: &C, _tally: &Tally) -> Vec<Adjustment> {
        let Some(mfi) = ctx.mfi_signal() else {
            return Vec::new();
        };
        let side = match mfi.signal {
            Signal::Long => Side::Long,
            Signal::Short => Side::Short,
            Signal::Neutral => return Vec::new(),
        };
        let reason = mfi.reasoning.clone().unwrap_or_else(|| {
            format!("MFI {} signal (+{})", side.signal().label(), format_points(mfi.strength()))
        });
        vec![Adjustment::primary(side, mfi.strength(), reason)]
    }
}
