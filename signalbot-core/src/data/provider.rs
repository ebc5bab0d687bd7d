//! Quote source trait, range requests and structured error types.
//!
//! The QuoteSource trait abstracts over data sources (Alpha Vantage, synthetic)
//! so we can swap implementations and script them in tests.

use crate::domain::{Quote, Series, SeriesError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("no data for {symbol} between {start} and {end}")]
    EmptyRange {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("unknown {kind} '{value}' (valid: {valid})")]
    InvalidRequest {
        kind: &'static str,
        value: String,
        valid: &'static str,
    },

    #[error("data error: {0}")]
    Other(String),
}

/// Named look-back windows for daily history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
        }
    }

    /// Whether the provider's full history is needed (otherwise the ~100 most recent bars).
    pub fn needs_full_history(self) -> bool {
        matches!(self, Period::TwoYears | Period::FiveYears)
    }

    /// Calendar days kept for multi-year windows. Shorter periods keep every bar returned.
    pub fn trim_days(self) -> Option<i64> {
        match self {
            Period::OneYear => Some(365),
            Period::TwoYears => Some(730),
            Period::FiveYears => Some(1825),
            _ => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DataError::InvalidRequest {
                kind: "period",
                value: s.to_string(),
                valid: "1mo, 3mo, 6mo, 1y, 2y, 5y",
            })
    }
}

/// Intraday bar spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1min")]
    OneMinute,
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "60min")]
    SixtyMinutes,
}

impl Interval {
    pub const ALL: [Interval; 5] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::SixtyMinutes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Interval::OneMinute => "1min",
            Interval::FiveMinutes => "5min",
            Interval::FifteenMinutes => "15min",
            Interval::ThirtyMinutes => "30min",
            Interval::SixtyMinutes => "60min",
        }
    }

    pub fn minutes(self) -> i64 {
        match self {
            Interval::OneMinute => 1,
            Interval::FiveMinutes => 5,
            Interval::FifteenMinutes => 15,
            Interval::ThirtyMinutes => 30,
            Interval::SixtyMinutes => 60,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| DataError::InvalidRequest {
                kind: "interval",
                value: s.to_string(),
                valid: "1min, 5min, 15min, 30min, 60min",
            })
    }
}

/// What slice of history to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// Daily bars over a named look-back window ending now.
    Period(Period),
    /// Daily bars with `start <= date <= end`.
    Dates { start: NaiveDate, end: NaiveDate },
    /// The provider's most recent intraday bars.
    Intraday(Interval),
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeSpec::Period(p) => write!(f, "{p}"),
            RangeSpec::Dates { start, end } => write!(f, "{start}..={end}"),
            RangeSpec::Intraday(i) => write!(f, "intraday {i}"),
        }
    }
}

/// Drop future bars and, for multi-year periods, bars older than the window.
pub fn apply_period_window(series: Series, period: Period, now: NaiveDateTime) -> Series {
    let cutoff = period.trim_days().map(|d| now - chrono::Duration::days(d));
    series.retain(|b| b.timestamp <= now && cutoff.map_or(true, |c| b.timestamp >= c))
}

/// Keep bars dated within `[start, end]`; an empty result is an error.
pub fn apply_date_window(
    series: Series,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Series, DataError> {
    let symbol = series.symbol().to_string();
    let window = series.retain(|b| {
        let d = b.timestamp.date();
        d >= start && d <= end
    });
    if window.is_empty() {
        return Err(DataError::EmptyRange { symbol, start, end });
    }
    Ok(window)
}

/// Trait for quote sources (Alpha Vantage, synthetic, test doubles).
pub trait QuoteSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Ascending bars for `symbol`, never dated in the future.
    fn fetch_series(&self, symbol: &str, range: RangeSpec) -> Result<Series, DataError>;

    /// The latest single-point quote.
    fn fetch_latest_quote(&self, symbol: &str) -> Result<Quote, DataError>;

    /// Check if the source is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn series(days: &[NaiveDateTime]) -> Series {
        let bars = days
            .iter()
            .map(|&timestamp| Bar {
                timestamp,
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 1.0,
            })
            .collect();
        Series::new("T", bars).unwrap()
    }

    #[test]
    fn period_parses_and_displays() {
        for p in Period::ALL {
            assert_eq!(p.as_str().parse::<Period>().unwrap(), p);
        }
        assert!(matches!(
            "10y".parse::<Period>(),
            Err(DataError::InvalidRequest { kind: "period", .. })
        ));
    }

    #[test]
    fn interval_parses() {
        assert_eq!("5min".parse::<Interval>().unwrap(), Interval::FiveMinutes);
        assert_eq!(Interval::SixtyMinutes.minutes(), 60);
        assert!("2min".parse::<Interval>().is_err());
    }

    #[test]
    fn output_size_by_period() {
        assert!(!Period::OneYear.needs_full_history());
        assert!(Period::TwoYears.needs_full_history());
        assert_eq!(Period::SixMonths.trim_days(), None);
        assert_eq!(Period::FiveYears.trim_days(), Some(1825));
    }

    #[test]
    fn period_window_drops_future_and_old_bars() {
        let now = day(2024, 6, 1);
        let s = series(&[day(2023, 1, 1), day(2023, 7, 1), day(2024, 5, 31), day(2024, 6, 2)]);
        let kept = apply_period_window(s, Period::OneYear, now);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.first().unwrap().timestamp, day(2023, 7, 1));
    }

    #[test]
    fn short_period_keeps_all_past_bars() {
        let now = day(2024, 6, 1);
        let s = series(&[day(2020, 1, 1), day(2024, 5, 31), day(2024, 6, 2)]);
        assert_eq!(apply_period_window(s, Period::OneMonth, now).len(), 2);
    }

    #[test]
    fn date_window_is_inclusive() {
        let s = series(&[day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 3)]);
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(apply_date_window(s, start, end).unwrap().len(), 2);
    }

    #[test]
    fn empty_date_window_is_error() {
        let s = series(&[day(2024, 1, 1)]);
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(matches!(
            apply_date_window(s, start, start),
            Err(DataError::EmptyRange { .. })
        ));
    }
}
