//! Quote sources: Alpha Vantage over HTTP and a deterministic synthetic walk.

pub mod alpha_vantage;
pub mod circuit_breaker;
pub mod provider;
pub mod synthetic;

pub use alpha_vantage::AlphaVantageSource;
pub use circuit_breaker::CircuitBreaker;
pub use provider::{
    apply_date_window, apply_period_window, DataError, Interval, Period, QuoteSource, RangeSpec,
};
pub use synthetic::SyntheticSource;
