//! Volume indicators: rolling mean volume and volume relative to that mean.
//!
//! Lookback: period - 1 for both. A zero mean volume yields NaN ratio.

use super::indicator::Indicator;
use super::rolling::rolling_mean;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct VolumeSma {
    period: usize,
}

impl VolumeSma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume SMA period must be >= 1");
        Self { period }
    }
}

impl Indicator for VolumeSma {
    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        rolling_mean(&volumes, self.period)
    }
}

/// volume[t] / SMA(volume, period)[t]
#[derive(Debug, Clone)]
pub struct VolumeRatio {
    sma: VolumeSma,
}

impl VolumeRatio {
    pub fn new(period: usize) -> Self {
        Self {
            sma: VolumeSma::new(period),
        }
    }
}

impl Indicator for VolumeRatio {
    fn lookback(&self) -> usize {
        self.sma.lookback()
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        self.sma
            .compute(bars)
            .into_iter()
            .zip(bars)
            .map(|(avg, bar)| {
                if avg.is_nan() || avg == 0.0 {
                    f64::NAN
                } else {
                    bar.volume / avg
                }
            })
            .collect()
    }
}
