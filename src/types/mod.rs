pub mod candle;
pub mod market;
pub mod mfi;
pub mod signals;

pub use candle::*;
pub use market::*;
pub use mfi::*;
pub use signals::*;
