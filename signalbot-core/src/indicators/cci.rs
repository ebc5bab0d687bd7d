//! Commodity Channel Index.
//!
//! tp = (high + low + close) / 3
//! CCI = (tp - SMA(tp, period)) / (constant * mean_abs_dev(tp, period))
//! Zero deviation reads 0. Lookback: period - 1.

use super::indicator::Indicator;
use super::rolling::{rolling_mad, rolling_mean};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Cci {
    period: usize,
    constant: f64,
}

impl Cci {
    pub fn new(period: usize, constant: f64) -> Self {
        assert!(period >= 1, "CCI period must be >= 1");
        Self {
            period,
            constant,
        }
    }
}

impl Indicator for Cci {
    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let tp: Vec<f64> = bars
            .iter()
            .map(|b| (b.high + b.low + b.close) / 3.0)
            .collect();
        let mean = rolling_mean(&tp, self.period);
        let mad = rolling_mad(&tp, self.period);

        (0..tp.len())
            .map(|i| {
                if mean[i].is_nan() || mad[i].is_nan() {
                    f64::NAN
                } else if mad[i] == 0.0 {
                    0.0
                } else {
                    (tp[i] - mean[i]) / (self.constant * mad[i])
                }
            })
            .collect()
    }
}
