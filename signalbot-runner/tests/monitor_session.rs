//! Live monitor sessions driven by a scripted quote source and a manual clock.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{NaiveDate, NaiveDateTime};
use signalbot_core::data::{DataError, Interval, QuoteSource, RangeSpec, SyntheticSource};
use signalbot_core::domain::{Direction, Prediction, Quote, Series, Signal};
use signalbot_core::model::{ModelError, SignalPredictor};
use signalbot_core::schema::default_columns;
use signalbot_runner::{
    Clock, LiveMonitor, ManualClock, MonitorError, MonitorSettings, MonitorSink, SessionSummary,
    SignalEntry, Trend,
};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 14)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// Synthetic bars, except that listed polls fail.
struct FlakySource {
    inner: SyntheticSource,
    calls: AtomicUsize,
    fail_on: Vec<usize>,
    bars: Option<usize>,
}

impl FlakySource {
    fn new(fail_on: Vec<usize>) -> Self {
        Self {
            inner: SyntheticSource::anchored(start()),
            calls: AtomicUsize::new(0),
            fail_on,
            bars: None,
        }
    }
}

impl QuoteSource for FlakySource {
    fn name(&self) -> &str {
        "flaky"
    }

    fn fetch_series(&self, symbol: &str, range: RangeSpec) -> Result<Series, DataError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&call) {
            return Err(DataError::RateLimited("quota".into()));
        }
        let series = self.inner.fetch_series(symbol, range)?;
        Ok(match self.bars {
            Some(n) => series.last_n(n),
            None => series,
        })
    }

    fn fetch_latest_quote(&self, symbol: &str) -> Result<Quote, DataError> {
        self.inner.fetch_latest_quote(symbol)
    }
}

/// Alternates BUY and SELL with fixed confidence.
struct Alternating {
    calls: AtomicUsize,
}

impl SignalPredictor for Alternating {
    fn is_trained(&self) -> bool {
        true
    }

    fn feature_columns(&self) -> Vec<String> {
        default_columns()
    }

    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<Prediction>, ModelError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let direction = if n % 2 == 0 { Direction::Up } else { Direction::Down };
        Ok(vec![Prediction::new(direction, 0.75); rows.len()])
    }
}

#[derive(Default)]
struct Recorder {
    entries: Vec<(SignalEntry, Option<Trend>)>,
    errors: Vec<usize>,
    finished: bool,
}

impl MonitorSink for Recorder {
    fn on_entry(&mut self, entry: &SignalEntry, trend: Option<Trend>) {
        self.entries.push((entry.clone(), trend));
    }

    fn on_error(&mut self, poll: usize, _error: &MonitorError) {
        self.errors.push(poll);
    }

    fn on_finish(&mut self, _summary: &SessionSummary) {
        self.finished = true;
    }
}

fn settings() -> MonitorSettings {
    MonitorSettings {
        duration_minutes: 10,
        poll_minutes: 2,
        interval: Interval::FiveMinutes,
        ..Default::default()
    }
}

#[test]
fn session_polls_until_deadline() {
    let source = FlakySource::new(vec![]);
    let model = Alternating { calls: AtomicUsize::new(0) };
    let clock = ManualClock::new(start());
    let mut sink = Recorder::default();

    let summary = LiveMonitor::new(&source, &model, &clock, settings()).run("SPY", &mut sink);

    // Polls at minute 0, 2, 4, 6, 8; the clock stops at the deadline.
    assert_eq!(summary.polls, 5);
    assert_eq!(summary.entries.len(), 5);
    assert_eq!(summary.buys(), 3);
    assert_eq!(summary.sells(), 2);
    assert_eq!(clock.now(), start() + chrono::Duration::minutes(10));
    assert!(sink.finished);

    assert_eq!(sink.entries[0].1, None);
    assert_eq!(sink.entries[1].1, Some(Trend { buys: 1, sells: 1 }));
    assert_eq!(sink.entries[0].0.signal, Signal::Buy);
    assert_eq!(sink.entries[0].0.timestamp, start());
    assert!(sink.entries[0].0.price > 0.0);
}

#[test]
fn failed_polls_are_skipped_not_fatal() {
    let source = FlakySource::new(vec![1, 3]);
    let model = Alternating { calls: AtomicUsize::new(0) };
    let clock = ManualClock::new(start());
    let mut sink = Recorder::default();

    let summary = LiveMonitor::new(&source, &model, &clock, settings()).run("SPY", &mut sink);
    assert_eq!(summary.polls, 5);
    assert_eq!(summary.failures, 2);
    assert_eq!(summary.entries.len(), 3);
    assert_eq!(sink.errors, vec![2, 4]);
}

#[test]
fn short_intraday_window_is_reported() {
    let mut source = FlakySource::new(vec![]);
    source.bars = Some(20);
    let model = Alternating { calls: AtomicUsize::new(0) };
    let clock = ManualClock::new(start());
    let monitor = LiveMonitor::new(&source, &model, &clock, settings());

    assert!(matches!(
        monitor.poll_once("SPY"),
        Err(MonitorError::InsufficientBars { found: 20, required: 20 })
    ));
}

#[test]
fn expired_session_never_sleeps() {
    let source = FlakySource::new(vec![]);
    let model = Alternating { calls: AtomicUsize::new(0) };
    let clock = ManualClock::new(start());
    let mut sink = Recorder::default();
    let settings = MonitorSettings {
        duration_minutes: 0,
        ..settings()
    };

    let summary = LiveMonitor::new(&source, &model, &clock, settings).run("SPY", &mut sink);
    assert_eq!(summary.polls, 0);
    assert_eq!(clock.now(), start());
    assert!(sink.finished);
}

#[test]
fn final_sleep_may_cross_deadline() {
    let source = FlakySource::new(vec![]);
    let model = Alternating { calls: AtomicUsize::new(0) };
    let clock = ManualClock::new(start());
    let mut sink = Recorder::default();
    let settings = MonitorSettings {
        duration_minutes: 3,
        poll_minutes: 2,
        ..settings()
    };

    let summary = LiveMonitor::new(&source, &model, &clock, settings).run("SPY", &mut sink);
    assert_eq!(summary.polls, 2);
    assert_eq!(clock.now(), start() + chrono::Duration::minutes(4));
}
