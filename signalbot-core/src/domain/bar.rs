//! Bar and Series: the fundamental market data units.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single symbol at a single timestamp.
///
/// Daily bars carry a midnight timestamp; intraday bars carry the bar open time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLCV sanity check: non-negative prices and volume, high/low bracket open/close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low >= 0.0
            && self.volume >= 0.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("bar {index} at {timestamp} is not after the previous bar")]
    OutOfOrder {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("bar {index} has a negative or NaN field")]
    InvalidBar { index: usize },
}

/// Chronologically ordered bars for one symbol.
///
/// Timestamps are strictly increasing: no duplicates, no reordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

impl Series {
    /// Build a series, rejecting out-of-order or duplicate timestamps and negative fields.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            let negative = bar.open < 0.0
                || bar.high < 0.0
                || bar.low < 0.0
                || bar.close < 0.0
                || bar.volume < 0.0;
            if bar.is_void() || negative {
                return Err(SeriesError::InvalidBar { index });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(SeriesError::OutOfOrder {
                    index,
                    timestamp: bar.timestamp,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Sort by timestamp and drop duplicate timestamps (first occurrence wins).
    ///
    /// Provider payloads arrive as maps keyed by timestamp, newest first.
    pub fn from_unsorted(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Result<Self, SeriesError> {
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Keep only bars whose timestamp satisfies `keep`. Order is preserved.
    pub fn retain(self, keep: impl Fn(&Bar) -> bool) -> Self {
        Self {
            symbol: self.symbol,
            bars: self.bars.into_iter().filter(|b| keep(b)).collect(),
        }
    }

    /// The first `n` bars (or all of them if shorter).
    pub fn truncated(&self, n: usize) -> Self {
        Self {
            symbol: self.symbol.clone(),
            bars: self.bars[..n.min(self.bars.len())].to_vec(),
        }
    }

    /// The last `n` bars (or all of them if shorter).
    pub fn last_n(&self, n: usize) -> Self {
        Self {
            symbol: self.symbol.clone(),
            bars: self.bars[self.bars.len().saturating_sub(n)..].to_vec(),
        }
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: ts(day),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(bar(2, 100.0).is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut b = bar(2, 100.0);
        b.open = f64::NAN;
        assert!(b.is_void());
        assert!(!b.is_sane());
    }

    #[test]
    fn series_accepts_increasing_timestamps() {
        let s = Series::new("AAPL", vec![bar(2, 1.0), bar(3, 2.0), bar(4, 3.0)]).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.symbol(), "AAPL");
        assert_eq!(s.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn series_rejects_duplicate_timestamp() {
        let err = Series::new("AAPL", vec![bar(2, 1.0), bar(2, 2.0)]).unwrap_err();
        assert_eq!(
            err,
            SeriesError::OutOfOrder {
                index: 1,
                timestamp: ts(2)
            }
        );
    }

    #[test]
    fn series_rejects_out_of_order() {
        assert!(Series::new("AAPL", vec![bar(3, 1.0), bar(2, 2.0)]).is_err());
    }

    #[test]
    fn series_rejects_negative_volume() {
        let mut b = bar(2, 1.0);
        b.volume = -1.0;
        assert_eq!(
            Series::new("AAPL", vec![b]).unwrap_err(),
            SeriesError::InvalidBar { index: 0 }
        );
    }

    #[test]
    fn from_unsorted_sorts_and_dedups() {
        let s = Series::from_unsorted("X", vec![bar(4, 3.0), bar(2, 1.0), bar(3, 2.0), bar(2, 9.0)])
            .unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.closes()[0], 1.0);
        assert_eq!(s.last().unwrap().timestamp, ts(4));
    }

    #[test]
    fn truncated_keeps_prefix() {
        let s = Series::new("X", vec![bar(2, 1.0), bar(3, 2.0), bar(4, 3.0)]).unwrap();
        assert_eq!(s.truncated(2).len(), 2);
        assert_eq!(s.truncated(10).len(), 3);
    }
}
