//! Stochastic oscillator.
//!
//! %K = 100 * (close - lowest_low(period)) / (highest_high(period) - lowest_low(period))
//! %D = SMA(%K, smooth)
//! A flat range (highest == lowest) reads 50.
//! Lookback: period - 1 for %K, period + smooth - 2 for %D.

use super::indicator::Indicator;
use super::rolling::{rolling_max, rolling_mean, rolling_min};
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochasticLine {
    K,
    D,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    period: usize,
    smooth: usize,
    line: StochasticLine,
}

impl Stochastic {
    pub fn k(period: usize, smooth: usize) -> Self {
        Self::new(period, smooth, StochasticLine::K)
    }

    pub fn d(period: usize, smooth: usize) -> Self {
        Self::new(period, smooth, StochasticLine::D)
    }

    fn new(period: usize, smooth: usize, line: StochasticLine) -> Self {
        assert!(period >= 1 && smooth >= 1, "Stochastic periods must be >= 1");
        Self {
            period,
            smooth,
            line,
        }
    }
}

impl Indicator for Stochastic {
    fn lookback(&self) -> usize {
        match self.line {
            StochasticLine::K => self.period - 1,
            StochasticLine::D => self.period + self.smooth - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let k = percent_k(bars, self.period);
        match self.line {
            StochasticLine::K => k,
            StochasticLine::D => rolling_mean(&k, self.smooth),
        }
    }
}

/// Position of close inside the high/low range, on a 0..=100 scale.
pub(crate) fn percent_k(bars: &[Bar], period: usize) -> Vec<f64> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let hh = rolling_max(&highs, period);
    let ll = rolling_min(&lows, period);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if hh[i].is_nan() || ll[i].is_nan() || bar.close.is_nan() {
                f64::NAN
            } else if hh[i] == ll[i] {
                50.0
            } else {
                100.0 * (bar.close - ll[i]) / (hh[i] - ll[i])
            }
        })
        .collect()
}
