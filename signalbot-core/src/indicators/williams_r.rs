//! Williams %R: -100 * (highest_high - close) / (highest_high - lowest_low).
//!
//! Ranges from -100 (close at the low) to 0 (close at the high). Equivalent to %K - 100.
//! Lookback: period - 1.

use super::indicator::Indicator;
use super::stochastic::percent_k;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct WilliamsR {
    period: usize,
}

impl WilliamsR {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Williams %R period must be >= 1");
        Self { period }
    }
}

impl Indicator for WilliamsR {
    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        percent_k(bars, self.period)
            .into_iter()
            .map(|k| k - 100.0)
            .collect()
    }
}
