//! Flowscan - spot/futures capital-flow and money-flow signal scanner

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use services::signals::indicators::{attach_mfi, compute_metrics, MfiEngine};
pub use services::signals::{fuse_markets, score_combined, score_single_market, BtcReference};
pub use services::{ScanReport, Scanner, SequenceStore};
pub use types::*;
