//! Rolling-window helpers over raw `f64` series.
//!
//! A window that contains a NaN yields NaN. Output length always equals input length,
//! and the value at index i only reads `values[..=i]`.

/// Rolling arithmetic mean. First valid value at `period - 1`.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Rolling sample standard deviation (divide by N-1).
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    if period < 2 {
        return vec![f64::NAN; values.len()];
    }
    rolling(values, period, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
        var.sqrt()
    })
}

/// Rolling population standard deviation (divide by N).
pub fn rolling_pstd(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / w.len() as f64;
        var.sqrt()
    })
}

/// Rolling mean absolute deviation around the window mean.
pub fn rolling_mad(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        w.iter().map(|v| (v - mean).abs()).sum::<f64>() / w.len() as f64
    })
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().copied().fold(f64::MIN, f64::max))
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().copied().fold(f64::MAX, f64::min))
}

/// Percentage change over `lag` steps: `values[i] / values[i - lag] - 1`.
pub fn pct_change(values: &[f64], lag: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if lag == 0 {
        return result;
    }
    for i in lag..n {
        let prev = values[i - lag];
        if prev.is_nan() || values[i].is_nan() || prev == 0.0 {
            continue;
        }
        result[i] = values[i] / prev - 1.0;
    }
    result
}

fn rolling(values: &[f64], period: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }
    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = f(window);
    }
    result
}
