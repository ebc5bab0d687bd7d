//! Indicator engine: moving averages, oscillators, trend strength, returns
//! and volume columns over a bar series.
//!
//! Indicators with several output lines (MACD, Bollinger, Stochastic) are one
//! instance per line, so each schema column maps to exactly one `Indicator`.

pub mod adx;
pub mod average;
pub mod bollinger;
pub mod cci;
pub mod indicator;
pub mod macd;
pub mod returns;
pub mod rolling;
pub mod rsi;
pub mod stochastic;
pub mod volume;
pub mod williams_r;

pub use adx::Adx;
pub use average::{ema_of_series, Ema, Sma};
pub use bollinger::{Bollinger, BollingerBand};
pub use cci::Cci;
pub use indicator::{Indicator, IndicatorValues};
pub use macd::{Macd, MacdLine};
pub use returns::{Returns, Volatility};
pub use rsi::Rsi;
pub use stochastic::{Stochastic, StochasticLine};
pub use volume::{VolumeRatio, VolumeSma};
pub use williams_r::WilliamsR;

/// Daily test bars from closes: open is the previous close, the range is one
/// point beyond the body on each side.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    let ohlc: Vec<_> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_bars(&ohlc)
}

/// Daily test bars from `(open, high, low, close)` with volume 1000.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    data.iter()
        .zip(0i64..)
        .map(|(&(open, high, low, close), day)| crate::domain::Bar {
            timestamp: start + chrono::Duration::days(day),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
