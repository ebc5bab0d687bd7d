//! Moving averages of the close: simple (`sma_20`, `sma_50`) and exponential
//! (`ema_12`, `ema_26`).
//!
//! The EMA uses alpha = 2 / (period + 1) and is seeded with the SMA of its
//! first `period` defined inputs. Both have lookback `period - 1`.

use super::indicator::{closes, Indicator};
use super::rolling::rolling_mean;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self { period }
    }
}

impl Indicator for Sma {
    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean(&closes(bars), self.period)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self { period }
    }
}

impl Indicator for Ema {
    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        ema_of_series(&closes(bars), self.period)
    }
}

/// EMA over any series, starting at its first defined value.
///
/// Leading NaNs shift the seed window, which lets the MACD signal line run on
/// the MACD line. A NaN once the average is running ends it.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    let Some(first) = values.iter().position(|v| !v.is_nan()) else {
        return out;
    };
    if period == 0 || first + period > values.len() {
        return out;
    }

    let seed = &values[first..first + period];
    if seed.iter().any(|v| v.is_nan()) {
        return out;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut ema = seed.iter().sum::<f64>() / period as f64;
    out[first + period - 1] = ema;

    for (slot, &v) in out.iter_mut().zip(values).skip(first + period) {
        if v.is_nan() {
            break;
        }
        ema += alpha * (v - ema);
        *slot = ema;
    }
    out
}
