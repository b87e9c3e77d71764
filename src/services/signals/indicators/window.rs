//! Trailing-window helpers shared by the indicators.

/// Mean of `values[index + 1 - window..=index]`.
///
/// `None` while the window is not yet full.
pub fn window_mean(values: &[f64], index: usize, window: usize) -> Option<f64> {
    if window == 0 || index + 1 < window || index >= values.len() {
        return None;
    }
    let slice = &values[index + 1 - window..=index];
    Some(slice.iter().sum::<f64>() / slice.len() as f64)
}

/// `series[index] / series[index - lag] - 1`.
///
/// `None` when either side is undefined or the base is zero.
pub fn pct_change(series: &[Option<f64>], index: usize, lag: usize) -> Option<f64> {
    if index < lag || index >= series.len() {
        return None;
    }
    let current = series[index]?;
    let previous = series[index - lag]?;
    if previous == 0.0 {
        return None;
    }
    Some(current / previous - 1.0)
}

/// Whether timestamps strictly increase.
pub fn is_ascending<T>(items: &[T], timestamp: impl Fn(&T) -> i64) -> bool {
    items.windows(2).all(|w| timestamp(&w[0]) < timestamp(&w[1]))
}
