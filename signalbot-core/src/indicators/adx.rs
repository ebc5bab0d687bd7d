//! ADX (`adx`): Wilder's average directional index, 0..=100.
//!
//! Directional movement and true range are Wilder-smoothed over `period`,
//! giving +DI and -DI; DX = 100 * |+DI - -DI| / (+DI + -DI) is smoothed again.
//! Lookback: 2 * period - 1.

use super::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self { period }
    }
}

impl Indicator for Adx {
    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];

        for i in 1..n {
            let up = bars[i].high - bars[i - 1].high;
            let down = bars[i - 1].low - bars[i].low;
            if up.is_nan() || down.is_nan() {
                continue;
            }
            plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
            minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
        }

        let tr = wilder_smooth(&true_range(bars), self.period);
        let plus = wilder_smooth(&plus_dm, self.period);
        let minus = wilder_smooth(&minus_dm, self.period);

        let dx: Vec<f64> = (0..n)
            .map(|i| {
                if tr[i].is_nan() || plus[i].is_nan() || minus[i].is_nan() || tr[i] == 0.0 {
                    return f64::NAN;
                }
                let plus_di = 100.0 * plus[i] / tr[i];
                let minus_di = 100.0 * minus[i] / tr[i];
                let sum = plus_di + minus_di;
                if sum == 0.0 {
                    0.0
                } else {
                    100.0 * (plus_di - minus_di).abs() / sum
                }
            })
            .collect();

        wilder_smooth(&dx, self.period)
    }
}

/// True range: max(high - low, |high - prev_close|, |low - prev_close|).
///
/// The first bar has no previous close and is NaN.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; bars.len()];
    for i in 1..bars.len() {
        let (h, l, pc) = (bars[i].high, bars[i].low, bars[i - 1].close);
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            continue;
        }
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }
    tr
}

/// Wilder smoothing with alpha = 1/period.
///
/// Seeded with the mean of the first `period` consecutive non-NaN values; the seed
/// lands on the last index of that window. A NaN after the seed ends the series.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }

    let mut run = 0;
    let mut seed_end = None;
    for (i, v) in values.iter().enumerate() {
        run = if v.is_nan() { 0 } else { run + 1 };
        if run == period {
            seed_end = Some(i);
            break;
        }
    }
    let Some(seed_end) = seed_end else {
        return result;
    };

    let p = period as f64;
    let mut prev = values[(seed_end + 1 - period)..=seed_end].iter().sum::<f64>() / p;
    result[seed_end] = prev;
    for i in (seed_end + 1)..n {
        if values[i].is_nan() {
            break;
        }
        prev = (prev * (p - 1.0) + values[i]) / p;
        result[i] = prev;
    }
    result
}
