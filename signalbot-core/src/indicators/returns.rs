//! Close-to-close percentage returns over a fixed lag.
//!
//! returns[t] = close[t] / close[t - lag] - 1. Lookback: lag.

use super::indicator::{closes, Indicator};
use super::rolling::{pct_change, rolling_std};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Returns {
    lag: usize,
}

impl Returns {
    pub fn new(lag: usize) -> Self {
        assert!(lag >= 1, "Returns lag must be >= 1");
        Self { lag }
    }
}

impl Indicator for Returns {
    fn lookback(&self) -> usize {
        self.lag
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes = closes(bars);
        pct_change(&closes, self.lag)
    }
}

/// Rolling sample standard deviation of one-bar returns.
///
/// Lookback: period (one bar for the first return, then period - 1 for the window).
#[derive(Debug, Clone)]
pub struct Volatility {
    period: usize,
}

impl Volatility {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "Volatility period must be >= 2");
        Self { period }
    }
}

impl Indicator for Volatility {
    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes = closes(bars);
        rolling_std(&pct_change(&closes, 1), self.period)
    }
}
