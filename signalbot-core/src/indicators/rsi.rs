//! RSI with Wilder-smoothed average gain and loss over close-to-close changes.
//!
//! RSI = 100 - 100 / (1 + gain / loss). No losses reads 100, no gains reads 0,
//! and a flat window reads 50. Lookback: period (one change per bar after the first).

use super::adx::wilder_smooth;
use super::indicator::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self { period }
    }
}

impl Indicator for Rsi {
    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let c = closes(bars);
        // Index i holds the change into bar i; bar 0 has none.
        let changes: Vec<f64> = (0..c.len())
            .map(|i| if i == 0 { f64::NAN } else { c[i] - c[i - 1] })
            .collect();
        let side = |sign: f64| -> Vec<f64> {
            changes
                .iter()
                .map(|&d| if d.is_nan() { d } else { (sign * d).max(0.0) })
                .collect()
        };

        let gains = wilder_smooth(&side(1.0), self.period);
        let losses = wilder_smooth(&side(-1.0), self.period);
        gains
            .into_iter()
            .zip(losses)
            .map(|(g, l)| if g.is_nan() || l.is_nan() { f64::NAN } else { rsi_value(g, l) })
            .collect()
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    match (avg_gain > 0.0, avg_loss > 0.0) {
        (false, false) => 50.0,
        (true, false) => 100.0,
        (false, true) => 0.0,
        (true, true) => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    }
}
