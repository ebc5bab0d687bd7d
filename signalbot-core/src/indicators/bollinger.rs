//! Bollinger bands around the 20-bar close SMA (`bb_upper`, `bb_middle`,
//! `bb_lower`). Band width is `multiplier` population standard deviations.
//! Lookback: period - 1.

use super::indicator::{closes, Indicator};
use super::rolling::{rolling_mean, rolling_pstd};
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

impl BollingerBand {
    fn sign(self) -> f64 {
        match self {
            BollingerBand::Upper => 1.0,
            BollingerBand::Middle => 0.0,
            BollingerBand::Lower => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 1, "band period must be >= 1");
        Self {
            period,
            multiplier,
            band,
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Lower)
    }
}

impl Indicator for Bollinger {
    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes = closes(bars);
        let mean = rolling_mean(&closes, self.period);
        if self.band == BollingerBand::Middle {
            return mean;
        }
        let offset = self.band.sign() * self.multiplier;
        mean.into_iter()
            .zip(rolling_pstd(&closes, self.period))
            .map(|(m, sd)| m + offset * sd)
            .collect()
    }
}
