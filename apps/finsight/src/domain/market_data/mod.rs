//! Market Data Bounded Context
//!
//! Historical OHLCV candles and the intervals they are aggregated over.

mod candle;
mod candle_interval;

pub use candle::Candle;
pub use candle_interval::CandleInterval;
