//! Money Flow Index (MFI) indicator.

use super::window::is_ascending;
use crate::services::signals::format_points;
use crate::types::{
    Candle, CombinationMethod, Confidence, MfiBar, MfiFlags, MfiOptions, MfiPoint, MfiSignal,
    PriceVolume, Side,
};

/// Weight of the primary series in [`CombinationMethod::Weighted`] fusion.
pub const PRIMARY_WEIGHT: f64 = 0.6;
/// Weight of the secondary series in [`CombinationMethod::Weighted`] fusion.
pub const SECONDARY_WEIGHT: f64 = 0.4;

const EXTREME_OVERBOUGHT: f64 = 90.0;
const EXTREME_OVERSOLD: f64 = 10.0;
const MIDLINE: f64 = 50.0;
/// Minimum one-step move inside a zone.
const ZONE_MOVE: f64 = 3.0;
/// Minimum retrace from a recent extreme.
const EXTREME_RETRACE: f64 = 8.0;
const LOOKBACK: usize = 5;
const DIVERGENCE_PRICE_PCT: f64 = 1.0;
const DIVERGENCE_MFI_POINTS: f64 = 5.0;
const MAX_DIVERGENCE_STRENGTH: f64 = 5.0;

impl From<&Candle> for PriceVolume {
    fn from(candle: &Candle) -> Self {
        Self {
            timestamp: candle.timestamp,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        }
    }
}

/// MFI (Money Flow Index) engine.
///
/// Volume-weighted RSI. Measures buying and selling pressure:
/// MFI = 100 - (100 / (1 + Money Flow Ratio))
///
/// Optionally fuses a secondary series (futures) into the primary one (spot)
/// before computing, then flags the MFI patterns the scorers consume:
/// - Below 20: Oversold (bullish)
/// - Above 80: Overbought (bearish)
#[derive(Debug, Clone, Default)]
pub struct MfiEngine {
    options: MfiOptions,
}

impl MfiEngine {
    pub fn new(options: MfiOptions) -> Self {
        Self { options }
    }

    /// Calculate MFI over `primary`, fused with `secondary` when given.
    ///
    /// Returns one bar per primary point. `mfi` is defined from index
    /// `period` onwards.
    pub fn calculate(&self, primary: &[PriceVolume], secondary: Option<&[PriceVolume]>) -> Vec<MfiBar> {
        let inputs = match secondary {
            Some(secondary) if !secondary.is_empty() => self.fuse(primary, secondary),
            _ => primary.to_vec(),
        };

        let mut bars: Vec<MfiBar> = inputs
            .into_iter()
            .map(|input| {
                let typical_price = Self::typical_price(&input);
                MfiBar {
                    input,
                    point: MfiPoint {
                        typical_price,
                        raw_money_flow: typical_price * input.volume,
                        ..MfiPoint::default()
                    },
                }
            })
            .collect();

        self.classify_flow(&mut bars);
        self.compute_index(&mut bars);
        self.flag_patterns(&mut bars);
        bars
    }

    /// Calculate MFI over candle sequences.
    pub fn calculate_candles(&self, primary: &[Candle], secondary: Option<&[Candle]>) -> Vec<MfiBar> {
        debug_assert!(is_ascending(primary, |c| c.timestamp));
        let primary: Vec<PriceVolume> = primary.iter().map(PriceVolume::from).collect();
        let secondary: Option<Vec<PriceVolume>> =
            secondary.map(|s| s.iter().map(PriceVolume::from).collect());
        self.calculate(&primary, secondary.as_deref())
    }

    /// Compute MFI for one market and store each point on its candle.
    pub fn attach(&self, candles: &mut [Candle]) {
        let bars = self.calculate_candles(candles, None);
        for (candle, bar) in candles.iter_mut().zip(bars) {
            candle.mfi = Some(bar.point);
        }
    }

    /// Calculate typical price.
    fn typical_price(point: &PriceVolume) -> f64 {
        (point.high + point.low + point.close) / 3.0
    }

    /// Match each primary point with the first secondary point within the
    /// timestamp tolerance and merge them. Unmatched points pass through.
    fn fuse(&self, primary: &[PriceVolume], secondary: &[PriceVolume]) -> Vec<PriceVolume> {
        let mut index: Vec<(i64, usize)> = secondary
            .iter()
            .enumerate()
            .map(|(i, p)| (p.timestamp, i))
            .collect();
        index.sort_by_key(|(ts, _)| *ts);

        let tolerance = self.options.timestamp_tolerance_ms;
        primary
            .iter()
            .map(|p| {
                let lower = p.timestamp.saturating_sub(tolerance);
                let upper = p.timestamp.saturating_add(tolerance);
                let first = index.partition_point(|(ts, _)| *ts < lower);
                match index.get(first) {
                    Some(&(ts, i)) if ts <= upper => self.merge(p, &secondary[i]),
                    _ => *p,
                }
            })
            .collect()
    }

    fn merge(&self, primary: &PriceVolume, secondary: &PriceVolume) -> PriceVolume {
        let (wp, ws) = match self.options.combination {
            CombinationMethod::SpotPriority => return *primary,
            CombinationMethod::Average => (0.5, 0.5),
            CombinationMethod::Weighted => (PRIMARY_WEIGHT, SECONDARY_WEIGHT),
        };
        PriceVolume {
            timestamp: primary.timestamp,
            high: primary.high * wp + secondary.high * ws,
            low: primary.low * wp + secondary.low * ws,
            close: primary.close * wp + secondary.close * ws,
            volume: primary.volume + secondary.volume,
        }
    }

    fn classify_flow(&self, bars: &mut [MfiBar]) {
        for i in 1..bars.len() {
            let prev = bars[i - 1].point.typical_price;
            let point = &mut bars[i].point;
            if point.typical_price > prev {
                point.positive_money_flow = point.raw_money_flow;
            } else if point.typical_price < prev {
                point.negative_money_flow = point.raw_money_flow;
            }
        }
    }

    fn compute_index(&self, bars: &mut [MfiBar]) {
        let period = self.options.period;
        if period == 0 {
            return;
        }
        for i in period..bars.len() {
            let window = &bars[i + 1 - period..=i];
            let positive: f64 = window.iter().map(|b| b.point.positive_money_flow).sum();
            let negative: f64 = window.iter().map(|b| b.point.negative_money_flow).sum();

            let mfi = if negative == 0.0 {
                100.0
            } else {
                let money_flow_ratio = positive / negative;
                100.0 - (100.0 / (1.0 + money_flow_ratio))
            };
            bars[i].point.mfi = Some(mfi.clamp(0.0, 100.0));
        }
    }

    fn flag_patterns(&self, bars: &mut [MfiBar]) {
        let overbought = self.options.overbought;
        let oversold = self.options.oversold;
        let mfi: Vec<Option<f64>> = bars.iter().map(|b| b.point.mfi).collect();
        let closes: Vec<f64> = bars.iter().map(|b| b.input.close).collect();

        for i in 1..bars.len() {
            let (Some(current), Some(prev)) = (mfi[i], mfi[i - 1]) else {
                continue;
            };

            let mut flags = MfiFlags {
                is_overbought: current >= overbought,
                is_oversold: current <= oversold,
                long_signal: prev <= oversold && current > oversold,
                short_signal: prev >= overbought && current < overbought,
                dropping_in_overbought: current >= overbought && prev - current >= ZONE_MOVE,
                rising_in_oversold: current <= oversold && current - prev >= ZONE_MOVE,
                ..MfiFlags::default()
            };

            if i >= LOOKBACK {
                let start = i + 1 - LOOKBACK;
                flags.consistent_downtrend = (start..=i)
                    .all(|j| matches!((mfi[j], mfi[j - 1]), (Some(a), Some(b)) if a < b));
                flags.consistent_uptrend =
                    (start..=i).all(|j| matches!((mfi[j], mfi[j - 1]), (Some(a), Some(b)) if a > b));

                let prior: Vec<f64> = mfi[i - LOOKBACK..i].iter().flatten().copied().collect();
                if let Some(max) = prior.iter().copied().reduce(f64::max) {
                    flags.dropping_from_high =
                        max >= overbought && current < prev && max - current >= EXTREME_RETRACE;
                }
                if let Some(min) = prior.iter().copied().reduce(f64::min) {
                    flags.rising_from_low =
                        min <= oversold && current > prev && current - min >= EXTREME_RETRACE;
                }

                flags.extremely_overbought = current >= EXTREME_OVERBOUGHT;
                flags.extremely_oversold = current <= EXTREME_OVERSOLD;

                let base = closes[i - LOOKBACK];
                if let (true, Some(past_mfi)) = (base != 0.0, mfi[i - LOOKBACK]) {
                    let price_change = (closes[i] - base) / base * 100.0;
                    let mfi_change = current - past_mfi;
                    let strength = (price_change.abs() / 2.0).min(MAX_DIVERGENCE_STRENGTH);

                    if price_change < -DIVERGENCE_PRICE_PCT && mfi_change > DIVERGENCE_MFI_POINTS {
                        flags.bullish_divergence = true;
                        flags.divergence_strength = Some(strength);
                    }
                    if price_change > DIVERGENCE_PRICE_PCT && mfi_change < -DIVERGENCE_MFI_POINTS {
                        flags.bearish_divergence = true;
                        flags.divergence_strength = Some(strength);
                    }
                }
            }

            bars[i].point.flags = flags;
        }
    }

    /// Dominant sub-signal of the latest bar, by fixed priority.
    pub fn detect_signals(&self, bars: &[MfiBar]) -> MfiSignal {
        let Some(last) = bars.last() else {
            return MfiSignal::neutral(Some("Insufficient data for MFI".to_string()));
        };
        if bars.len() - 1 < self.options.period {
            return MfiSignal::neutral(Some("Insufficient data for MFI".to_string()));
        }
        let Some(current) = last.mfi().filter(|v| !v.is_nan()) else {
            return MfiSignal::neutral(Some("MFI not computable".to_string()));
        };

        let f = &last.point.flags;
        let divergence = 4.0 + f.divergence_strength.unwrap_or(1.0);
        let candidates = [
            (f.bullish_divergence, Side::Long, Confidence::Alta, divergence, "Bullish MFI divergence"),
            (f.bearish_divergence, Side::Short, Confidence::Alta, divergence, "Bearish MFI divergence"),
            (f.extremely_overbought, Side::Short, Confidence::Alta, 4.0, "MFI extremely overbought"),
            (f.extremely_oversold, Side::Long, Confidence::Alta, 4.0, "MFI extremely oversold"),
            (f.long_signal, Side::Long, Confidence::Media, 3.0, "MFI left the oversold zone"),
            (f.short_signal, Side::Short, Confidence::Media, 3.0, "MFI left the overbought zone"),
            (f.dropping_in_overbought, Side::Short, Confidence::Media, 2.5, "MFI falling inside the overbought zone"),
            (f.rising_in_oversold, Side::Long, Confidence::Media, 2.5, "MFI rising inside the oversold zone"),
            (f.dropping_from_high, Side::Short, Confidence::Media, 2.0, "MFI falling from a recent high"),
            (f.rising_from_low, Side::Long, Confidence::Media, 2.0, "MFI rising from a recent low"),
            (f.consistent_downtrend && current > MIDLINE, Side::Short, Confidence::Baja, 1.5, "Consistent MFI downtrend"),
            (f.consistent_uptrend && current < MIDLINE, Side::Long, Confidence::Baja, 1.5, "Consistent MFI uptrend"),
            (current >= self.options.overbought, Side::Short, Confidence::Baja, 1.0, "MFI in the overbought zone"),
            (current <= self.options.oversold, Side::Long, Confidence::Baja, 1.0, "MFI in the oversold zone"),
        ];

        let mut signal = MfiSignal {
            current_mfi: current,
            is_overbought: current >= self.options.overbought,
            is_oversold: current <= self.options.oversold,
            ..MfiSignal::neutral(None)
        };

        if let Some(&(_, side, confidence, strength, label)) =
            candidates.iter().find(|(fired, ..)| *fired)
        {
            signal.signal = side.signal();
            signal.confidence = confidence;
            match side {
                Side::Long => signal.long_strength = strength,
                Side::Short => signal.short_strength = strength,
            }
            signal.reasoning = Some(format!(
                "{} ({:.1}) (+{})",
                label,
                current,
                format_points(strength)
            ));
        }

        signal
    }
}

/// Calculate MFI with the given options.
pub fn calculate_mfi(primary: &[Candle], secondary: Option<&[Candle]>, options: &MfiOptions) -> Vec<MfiBar> {
    MfiEngine::new(options.clone()).calculate_candles(primary, secondary)
}

/// Compute and attach MFI to one market sequence.
pub fn attach_mfi(candles: &mut [Candle], options: &MfiOptions) {
    MfiEngine::new(options.clone()).attach(candles);
}

/// Dominant MFI sub-signal of the latest bar.
pub fn detect_signals(bars: &[MfiBar], options: &MfiOptions) -> MfiSignal {
    MfiEngine::new(options.clone()).detect_signals(bars)
}

/// Rebuild MFI bars from candles carrying attached points.
///
/// `None` if any candle has no MFI point.
pub fn bars_from_candles(candles: &[Candle]) -> Option<Vec<MfiBar>> {
    candles
        .iter()
        .map(|c| {
            c.mfi.clone().map(|point| MfiBar {
                input: PriceVolume::from(c),
                point,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Signal;

    fn point(i: usize, price: f64, volume: f64) -> PriceVolume {
        PriceVolume {
            timestamp: 1_000_000 + i as i64 * 60_000,
            high: price + 1.0,
            low: price - 1.0,
            close: price,
            volume,
        }
    }

    fn uptrend(count: usize) -> Vec<PriceVolume> {
        (0..count).map(|i| point(i, 100.0 + i as f64, 1000.0)).collect()
    }

    fn zigzag(count: usize) -> Vec<PriceVolume> {
        (0..count)
            .map(|i| {
                let swing = if i % 2 == 0 { 3.0 } else { -2.0 };
                point(i, 100.0 + i as f64 * 0.2 + swing, 500.0 + (i % 7) as f64 * 90.0)
            })
            .collect()
    }

    /// Bars with hand-set MFI values and closes, flags cleared.
    fn bars_from(mfis: &[Option<f64>], closes: &[f64]) -> Vec<MfiBar> {
        mfis.iter()
            .zip(closes)
            .enumerate()
            .map(|(i, (mfi, close))| MfiBar {
                input: point(i, *close, 1.0),
                point: MfiPoint {
                    mfi: *mfi,
                    ..MfiPoint::default()
                },
            })
            .collect()
    }

    #[test]
    fn test_insufficient_history_has_no_mfi() {
        let bars = MfiEngine::default().calculate(&uptrend(10), None);
        assert_eq!(bars.len(), 10);
        assert!(bars.iter().all(|b| b.mfi().is_none()));
    }

    #[test]
    fn test_all_positive_flow_is_100() {
        let bars = MfiEngine::default().calculate(&uptrend(30), None);
        for (i, bar) in bars.iter().enumerate() {
            if i < 14 {
                assert!(bar.mfi().is_none());
            } else {
                assert_eq!(bar.mfi(), Some(100.0));
            }
        }
    }

    #[test]
    fn test_all_negative_flow_is_0() {
        let data: Vec<PriceVolume> = (0..20).map(|i| point(i, 200.0 - i as f64, 10.0)).collect();
        let bars = MfiEngine::default().calculate(&data, None);
        assert_eq!(bars[19].mfi(), Some(0.0));
    }

    #[test]
    fn test_mfi_bounded() {
        let bars = MfiEngine::default().calculate(&zigzag(80), None);
        for bar in bars.iter().filter_map(|b| b.mfi()) {
            assert!((0.0..=100.0).contains(&bar), "mfi out of range: {}", bar);
        }
    }

    #[test]
    fn test_flow_classification() {
        let data = vec![point(0, 10.0, 2.0), point(1, 11.0, 2.0), point(2, 11.0, 2.0), point(3, 9.0, 2.0)];
        let bars = MfiEngine::default().calculate(&data, None);
        assert_eq!(bars[0].point.positive_money_flow, 0.0);
        assert_eq!(bars[1].point.positive_money_flow, 22.0);
        assert_eq!(bars[2].point.positive_money_flow, 0.0);
        assert_eq!(bars[2].point.negative_money_flow, 0.0);
        assert_eq!(bars[3].point.negative_money_flow, 18.0);
    }

    #[test]
    fn test_spot_priority_keeps_primary() {
        let primary = zigzag(20);
        let secondary: Vec<PriceVolume> = primary
            .iter()
            .map(|p| PriceVolume {
                timestamp: p.timestamp + 1_000,
                high: p.high * 2.0,
                low: p.low * 2.0,
                close: p.close * 2.0,
                volume: p.volume * 3.0,
            })
            .collect();
        let engine = MfiEngine::new(MfiOptions::default().with_combination(CombinationMethod::SpotPriority));
        let bars = engine.calculate(&primary, Some(&secondary));
        for (bar, p) in bars.iter().zip(&primary) {
            assert_eq!(&bar.input, p);
        }
    }

    #[test]
    fn test_weighted_and_average_fusion() {
        let primary = vec![point(0, 100.0, 10.0)];
        let secondary = vec![point(0, 110.0, 5.0)];

        let weighted = MfiEngine::default().calculate(&primary, Some(&secondary));
        assert!((weighted[0].input.close - 104.0).abs() < 1e-9);
        assert!((weighted[0].input.high - 105.0).abs() < 1e-9);
        assert_eq!(weighted[0].input.volume, 15.0);
        assert!((weighted[0].point.typical_price - 104.0).abs() < 1e-9);

        let average = MfiEngine::new(MfiOptions::default().with_combination(CombinationMethod::Average))
            .calculate(&primary, Some(&secondary));
        assert!((average[0].input.close - 105.0).abs() < 1e-9);
        assert_eq!(average[0].input.volume, 15.0);
    }

    #[test]
    fn test_unmatched_point_passes_through() {
        let mut later = point(1, 101.0, 10.0);
        later.timestamp += 300_000;
        let primary = vec![point(0, 100.0, 10.0), later];
        // nearest secondary point is 2 minutes away from primary[1]
        let mut far = later;
        far.timestamp += 120_000;
        let secondary = vec![point(0, 110.0, 5.0), far];

        let bars = MfiEngine::default().calculate(&primary, Some(&secondary));
        assert_eq!(bars[1].input, primary[1]);
        assert_ne!(bars[0].input, primary[0]);
    }

    #[test]
    fn test_fusion_takes_first_match_in_tolerance() {
        let primary = vec![point(0, 100.0, 10.0)];
        let mut early = point(0, 110.0, 1.0);
        early.timestamp -= 30_000;
        let mut late = point(0, 120.0, 2.0);
        late.timestamp += 10_000;
        // out of order on purpose: the sorted index still finds `early` first
        let secondary = vec![late, early];

        let bars = MfiEngine::default().calculate(&primary, Some(&secondary));
        assert_eq!(bars[0].input.volume, 11.0);
    }

    #[test]
    fn test_fusion_tolerance_is_inclusive() {
        let primary = vec![point(0, 100.0, 10.0)];

        let mut edge = point(0, 110.0, 5.0);
        edge.timestamp += 60_000;
        let bars = MfiEngine::default().calculate(&primary, Some(&[edge]));
        assert!((bars[0].input.close - 104.0).abs() < 1e-9);

        let mut beyond = point(0, 110.0, 5.0);
        beyond.timestamp += 60_001;
        let bars = MfiEngine::default().calculate(&primary, Some(&[beyond]));
        assert_eq!(bars[0].input, primary[0]);
    }

    #[test]
    fn test_calculate_is_idempotent() {
        let data = zigzag(50);
        let engine = MfiEngine::default();
        assert_eq!(engine.calculate(&data, None), engine.calculate(&data, None));
    }

    #[test]
    fn test_zone_and_crossing_flags() {
        let mfis = [Some(15.0), Some(25.0), Some(85.0), Some(75.0), Some(90.0), Some(86.0)];
        let closes = [1.0; 6];
        let mut bars = bars_from(&mfis, &closes);
        MfiEngine::default().flag_patterns(&mut bars);

        assert!(bars[1].point.flags.long_signal);
        assert!(bars[2].point.flags.is_overbought);
        assert!(bars[3].point.flags.short_signal);
        assert!(bars[5].point.flags.dropping_in_overbought);
        assert!(!bars[4].point.flags.dropping_in_overbought);
    }

    #[test]
    fn test_trend_and_retrace_flags() {
        let mfis = [Some(85.0), Some(60.0), Some(55.0), Some(50.0), Some(45.0), Some(40.0), Some(35.0)];
        let closes = [100.0; 7];
        let mut bars = bars_from(&mfis, &closes);
        MfiEngine::default().flag_patterns(&mut bars);

        let f = &bars[5].point.flags;
        assert!(f.consistent_downtrend);
        assert!(!f.consistent_uptrend);
        // max of the 5 prior (85) is overbought and we are 45 points below it
        assert!(f.dropping_from_high);
        assert!(!bars[6].point.flags.dropping_from_high); // 85 left the lookback
    }

    #[test]
    fn test_divergence_flags() {
        // price down 4% over 5 candles while MFI climbs 20 points
        let mfis = [Some(30.0), Some(32.0), Some(35.0), Some(40.0), Some(45.0), Some(50.0)];
        let closes = [100.0, 99.0, 98.0, 97.0, 96.5, 96.0];
        let mut bars = bars_from(&mfis, &closes);
        MfiEngine::default().flag_patterns(&mut bars);

        let f = &bars[5].point.flags;
        assert!(f.bullish_divergence);
        assert!(!f.bearish_divergence);
        assert!((f.divergence_strength.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearish_divergence_flag() {
        // price up 4% over 5 candles while MFI falls 20 points
        let mfis = [Some(70.0), Some(68.0), Some(65.0), Some(60.0), Some(55.0), Some(50.0)];
        let closes = [100.0, 101.0, 102.0, 103.0, 103.5, 104.0];
        let mut bars = bars_from(&mfis, &closes);
        MfiEngine::default().flag_patterns(&mut bars);

        let f = &bars[5].point.flags;
        assert!(f.bearish_divergence);
        assert!(!f.bullish_divergence);
        assert!((f.divergence_strength.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rising_in_oversold_flag() {
        // a rise of exactly 3 points still counts
        let mut bars = bars_from(&[Some(10.0), Some(13.0)], &[1.0; 2]);
        MfiEngine::default().flag_patterns(&mut bars);
        assert!(bars[1].point.flags.rising_in_oversold);
        assert!(bars[1].point.flags.is_oversold);

        let mut bars = bars_from(&[Some(10.0), Some(12.0)], &[1.0; 2]);
        MfiEngine::default().flag_patterns(&mut bars);
        assert!(!bars[1].point.flags.rising_in_oversold);
    }

    #[test]
    fn test_rising_from_low_flag() {
        let mfis = [Some(15.0), Some(30.0), Some(35.0), Some(40.0), Some(45.0), Some(50.0)];
        let mut bars = bars_from(&mfis, &[100.0; 6]);
        MfiEngine::default().flag_patterns(&mut bars);

        let f = &bars[5].point.flags;
        // min of the 5 prior (15) is oversold and we are 35 points above it
        assert!(f.rising_from_low);
        assert!(!f.dropping_from_high);
        assert!(f.consistent_uptrend);
    }

    #[test]
    fn test_patterns_skip_undefined_mfi() {
        let mfis = [None, Some(10.0), None, Some(95.0)];
        let mut bars = bars_from(&mfis, &[1.0; 4]);
        MfiEngine::default().flag_patterns(&mut bars);
        assert_eq!(bars[1].point.flags, MfiFlags::default());
        assert_eq!(bars[3].point.flags, MfiFlags::default());
    }

    #[test]
    fn test_detect_insufficient_data() {
        let bars = MfiEngine::default().calculate(&uptrend(10), None);
        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Neutral);
        assert_eq!(signal.confidence, Confidence::Baja);
        assert_eq!(signal.current_mfi, 50.0);
        assert!(signal.reasoning.unwrap().contains("Insufficient"));
    }

    #[test]
    fn test_detect_extreme_overbought() {
        let bars = MfiEngine::default().calculate(&uptrend(30), None);
        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Short);
        assert_eq!(signal.confidence, Confidence::Alta);
        assert_eq!(signal.short_strength, 4.0);
        assert_eq!(signal.strength(), 4.0);
        assert!(signal.is_overbought);
        assert_eq!(signal.reasoning.as_deref(), Some("MFI extremely overbought (100.0) (+4)"));
    }

    #[test]
    fn test_detect_priority_divergence_first() {
        let mut bars = bars_from(&[Some(50.0); 16], &[1.0; 16]);
        let flags = &mut bars[15].point.flags;
        flags.bullish_divergence = true;
        flags.divergence_strength = Some(1.5);
        flags.long_signal = true;
        flags.extremely_oversold = true;

        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Long);
        assert_eq!(signal.long_strength, 5.5);
        assert_eq!(signal.confidence, Confidence::Alta);
    }

    #[test]
    fn test_detect_crossing_and_zone() {
        let mut bars = bars_from(&[Some(22.0); 16], &[1.0; 16]);
        bars[15].point.flags.long_signal = true;
        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Long);
        assert_eq!(signal.confidence, Confidence::Media);
        assert_eq!(signal.long_strength, 3.0);

        let bars = bars_from(&[Some(82.0); 16], &[1.0; 16]);
        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Short);
        assert_eq!(signal.confidence, Confidence::Baja);
        assert_eq!(signal.short_strength, 1.0);
    }

    #[test]
    fn test_detect_bearish_divergence() {
        let mut mfis = vec![Some(70.0); 10];
        mfis.extend([Some(70.0), Some(68.0), Some(65.0), Some(60.0), Some(55.0), Some(50.0)]);
        let mut closes = vec![100.0; 10];
        closes.extend([100.0, 101.0, 102.0, 103.0, 103.5, 104.0]);
        let mut bars = bars_from(&mfis, &closes);
        let engine = MfiEngine::default();
        engine.flag_patterns(&mut bars);

        let signal = engine.detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Short);
        assert_eq!(signal.confidence, Confidence::Alta);
        assert!((signal.short_strength - 6.0).abs() < 1e-9);
        assert_eq!(signal.long_strength, 0.0);
    }

    #[test]
    fn test_detect_move_inside_zone() {
        let mut bars = bars_from(&[Some(85.0); 16], &[1.0; 16]);
        bars[15].point.flags.dropping_in_overbought = true;
        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Short);
        assert_eq!(signal.confidence, Confidence::Media);
        assert_eq!(signal.short_strength, 2.5);

        let mut bars = bars_from(&[Some(15.0); 16], &[1.0; 16]);
        bars[15].point.flags.rising_in_oversold = true;
        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Long);
        assert_eq!(signal.confidence, Confidence::Media);
        assert_eq!(signal.long_strength, 2.5);
    }

    #[test]
    fn test_detect_retrace_from_extreme() {
        let mut bars = bars_from(&[Some(60.0); 16], &[1.0; 16]);
        bars[15].point.flags.dropping_from_high = true;
        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Short);
        assert_eq!(signal.confidence, Confidence::Media);
        assert_eq!(signal.short_strength, 2.0);

        let mut bars = bars_from(&[Some(40.0); 16], &[1.0; 16]);
        bars[15].point.flags.rising_from_low = true;
        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Long);
        assert_eq!(signal.confidence, Confidence::Media);
        assert_eq!(signal.long_strength, 2.0);
    }

    #[test]
    fn test_detect_trend_counter_to_midline() {
        let mut bars = bars_from(&[Some(45.0); 16], &[1.0; 16]);
        bars[15].point.flags.consistent_downtrend = true;
        // downtrend below the midline is not a short signal
        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Neutral);
        assert_eq!(signal.reasoning, None);

        bars[15].point.flags.consistent_uptrend = true;
        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Long);
        assert_eq!(signal.long_strength, 1.5);
    }

    #[test]
    fn test_detect_undefined_current() {
        let mut mfis = vec![Some(50.0); 15];
        mfis.push(None);
        let bars = bars_from(&mfis, &[1.0; 16]);
        let signal = MfiEngine::default().detect_signals(&bars);
        assert_eq!(signal.signal, Signal::Neutral);
        assert_eq!(signal.reasoning.as_deref(), Some("MFI not computable"));
    }

    #[test]
    fn test_attach_writes_points() {
        let mut candles: Vec<Candle> = Vec::new();
        for (i, p) in uptrend(20).iter().enumerate() {
            candles.push(Candle {
                timestamp: p.timestamp,
                open: p.close,
                high: p.high,
                low: p.low,
                close: p.close,
                volume: p.volume,
                close_time: p.timestamp + 59_999,
                quote_volume: p.close * p.volume,
                trades: 10 + i as u64,
                taker_buy_base: p.volume / 2.0,
                taker_buy_quote: p.close * p.volume / 2.0,
                market: crate::types::Market::Spot,
                price_change: 0.0,
                directional_force: 0.0,
                capital_flow: 0.0,
                metrics: None,
                mfi: None,
            });
        }
        attach_mfi(&mut candles, &MfiOptions::default());
        assert!(candles.iter().all(|c| c.mfi.is_some()));
        assert_eq!(candles[19].mfi_value(), Some(100.0));
        assert_eq!(candles[5].mfi_value(), None);
    }
}
