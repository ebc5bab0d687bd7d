//! Deterministic synthetic quote source for offline runs and tests.
//!
//! Produces a uniform random walk from a starting price of 100.0, seeded from the
//! symbol name. Daily bars fall on weekdays; intraday bars step by the interval.

use super::provider::{
    apply_date_window, apply_period_window, DataError, Interval, Period, QuoteSource, RangeSpec,
};
use crate::domain::{Bar, Quote, Series};
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bars returned for compact requests, matching the provider's compact size.
pub const COMPACT_BARS: usize = 100;

/// Synthetic source. Without an anchor, series end at the current local time.
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    anchor: Option<NaiveDateTime>,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin "now" so output is fully reproducible.
    pub fn anchored(anchor: NaiveDateTime) -> Self {
        Self {
            anchor: Some(anchor),
        }
    }

    fn now(&self) -> NaiveDateTime {
        self.anchor
            .unwrap_or_else(|| chrono::Local::now().naive_local())
    }

    /// Five years of weekday bars ending on `now`'s date.
    fn daily_history(&self, symbol: &str, now: NaiveDateTime) -> Result<Series, DataError> {
        let mut rng = rng_for(&[symbol.as_bytes()]);
        let end = now.date();
        let mut day = end - Duration::days(Period::FiveYears.trim_days().unwrap_or(1825));
        let mut price = 100.0;
        let mut bars = Vec::new();

        while day <= end {
            if day.weekday().number_from_monday() <= 5 {
                let bar = step(&mut rng, day.and_time(NaiveTime::MIN), price);
                price = bar.close;
                bars.push(bar);
            }
            day += Duration::days(1);
        }
        Ok(Series::new(symbol, bars)?)
    }

    fn intraday(&self, symbol: &str, interval: Interval, now: NaiveDateTime) -> Result<Series, DataError> {
        let step_minutes = interval.minutes();
        let minute_of_day = i64::from(now.hour()) * 60 + i64::from(now.minute());
        let last = now.date().and_time(NaiveTime::MIN)
            + Duration::minutes(minute_of_day - minute_of_day % step_minutes);
        let stamp = last.format("%Y-%m-%d %H:%M").to_string();
        let mut rng = rng_for(&[symbol.as_bytes(), interval.as_str().as_bytes(), stamp.as_bytes()]);

        let mut price = 100.0;
        let first = last - Duration::minutes(step_minutes * (COMPACT_BARS as i64 - 1));
        let bars = (0..COMPACT_BARS as i64)
            .map(|i| {
                let bar = step(&mut rng, first + Duration::minutes(step_minutes * i), price);
                price = bar.close;
                bar
            })
            .collect();
        Ok(Series::new(symbol, bars)?)
    }
}

impl QuoteSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_series(&self, symbol: &str, range: RangeSpec) -> Result<Series, DataError> {
        let now = self.now();
        match range {
            RangeSpec::Period(period) => {
                let history = apply_period_window(self.daily_history(symbol, now)?, period, now);
                if period.needs_full_history() {
                    Ok(history)
                } else {
                    Ok(history.last_n(COMPACT_BARS))
                }
            }
            RangeSpec::Dates { start, end } => {
                apply_date_window(self.daily_history(symbol, now)?, start, end)
            }
            RangeSpec::Intraday(interval) => self.intraday(symbol, interval, now),
        }
    }

    fn fetch_latest_quote(&self, symbol: &str) -> Result<Quote, DataError> {
        let now = self.now();
        let series = self.intraday(symbol, Interval::OneMinute, now)?;
        let bars = series.bars();
        let (prev, last) = match bars {
            [.., prev, last] => (prev.close, last.close),
            _ => return Err(DataError::SymbolNotFound { symbol: symbol.to_string() }),
        };
        let change = last - prev;
        Ok(Quote {
            symbol: symbol.to_string(),
            price: last,
            change,
            change_percent: change / prev * 100.0,
            timestamp: now,
        })
    }
}

fn rng_for(parts: &[&[u8]]) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

fn step(rng: &mut StdRng, timestamp: NaiveDateTime, price: f64) -> Bar {
    let ret: f64 = rng.gen_range(-0.03..0.03);
    let open = price;
    let close = price * (1.0 + ret);
    Bar {
        timestamp,
        open,
        high: open.max(close) * (1.0 + rng.gen_range(0.0..0.01)),
        low: open.min(close) * (1.0 - rng.gen_range(0.0..0.01)),
        close,
        volume: rng.gen_range(500_000..5_000_000u64) as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn anchor() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 14)
            .unwrap()
            .and_hms_opt(10, 7, 0)
            .unwrap()
    }

    #[test]
    fn same_symbol_same_series() {
        let source = SyntheticSource::anchored(anchor());
        let a = source.fetch_series("SPY", RangeSpec::Period(Period::OneYear)).unwrap();
        let b = source.fetch_series("SPY", RangeSpec::Period(Period::OneYear)).unwrap();
        assert_eq!(a, b);
        let c = source.fetch_series("QQQ", RangeSpec::Period(Period::OneYear)).unwrap();
        assert_ne!(a.closes(), c.closes());
    }

    #[test]
    fn daily_bars_skip_weekends_and_are_sane() {
        let source = SyntheticSource::anchored(anchor());
        let series = source.fetch_series("SPY", RangeSpec::Period(Period::TwoYears)).unwrap();
        assert!(series.len() > 500);
        for bar in series.bars() {
            assert!(bar.timestamp.weekday().number_from_monday() <= 5);
            assert!(bar.is_sane());
            assert!(bar.timestamp <= anchor());
        }
    }

    #[test]
    fn compact_period_returns_compact_size() {
        let source = SyntheticSource::anchored(anchor());
        for period in [Period::OneMonth, Period::OneYear] {
            let series = source.fetch_series("SPY", RangeSpec::Period(period)).unwrap();
            assert_eq!(series.len(), COMPACT_BARS);
        }
    }

    #[test]
    fn intraday_steps_by_interval() {
        let source = SyntheticSource::anchored(anchor());
        let series = source
            .fetch_series("SPY", RangeSpec::Intraday(Interval::FiveMinutes))
            .unwrap();
        assert_eq!(series.len(), COMPACT_BARS);
        let bars = series.bars();
        assert_eq!(bars[1].timestamp - bars[0].timestamp, Duration::minutes(5));
        assert_eq!(series.last().unwrap().timestamp.minute(), 5);
    }

    #[test]
    fn quote_matches_change() {
        let quote = SyntheticSource::anchored(anchor()).fetch_latest_quote("SPY").unwrap();
        assert!(quote.price > 0.0);
        assert!((quote.price - quote.change) > 0.0);
        assert_eq!(quote.timestamp, anchor());
    }

    #[test]
    fn date_window_outside_history_is_error() {
        let source = SyntheticSource::anchored(anchor());
        let start = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(matches!(
            source.fetch_series("SPY", RangeSpec::Dates { start, end: start }),
            Err(DataError::EmptyRange { .. })
        ));
    }
}
