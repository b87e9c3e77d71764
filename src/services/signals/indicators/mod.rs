//! Indicator implementations.

pub mod flow;
pub mod mfi;
pub mod window;

pub use flow::{compute_metrics, FlowMetrics};
pub use mfi::{attach_mfi, bars_from_candles, calculate_mfi, detect_signals, MfiEngine};
