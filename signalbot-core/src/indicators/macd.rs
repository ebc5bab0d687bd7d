//! MACD: moving average convergence/divergence.
//!
//! Three lines (separate Indicator instances, like the Bollinger bands):
//! - Macd: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(macd, signal)
//! - Histogram: macd - signal
//!
//! Lookback: slow - 1 for the MACD line, slow + signal - 2 for signal/histogram.

use super::average::ema_of_series;
use super::indicator::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && slow > fast, "MACD requires 1 <= fast < slow");
        assert!(signal >= 1, "MACD signal period must be >= 1");
        Self {
            fast,
            slow,
            signal,
            line,
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Macd)
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Signal)
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Histogram)
    }
}

impl Indicator for Macd {
    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes = closes(bars);
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        if self.line == MacdLine::Macd {
            return macd;
        }

        let signal = ema_of_series(&macd, self.signal);
        match self.line {
            MacdLine::Signal => signal,
            _ => macd.iter().zip(&signal).map(|(m, s)| m - s).collect(),
        }
    }
}
