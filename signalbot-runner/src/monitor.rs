//! Live monitor: polls a quote source on a fixed interval and records one
//! model signal per poll until the session deadline.
//!
//! Each iteration: fetch intraday bars → annotate → predict latest bar →
//! fetch the current quote → record the entry. Failures are logged and the
//! loop moves on to the next poll. No sleep is taken once the deadline is past.

use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use signalbot_core::data::{DataError, Interval, QuoteSource, RangeSpec};
use signalbot_core::domain::Signal;
use signalbot_core::features::FeatureFrame;
use signalbot_core::model::{ModelError, SignalPredictor};

use crate::report::session_summary;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("only {found} intraday bars, need more than {required}")]
    InsufficientBars { found: usize, required: usize },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Longest accepted session: one week.
pub const MAX_SESSION_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub duration_minutes: u64,
    pub poll_minutes: u64,
    pub interval: Interval,
    /// A poll needs strictly more intraday bars than this.
    pub min_bars: usize,
    /// Entries considered for the rolling trend.
    pub trend_window: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            duration_minutes: 15,
            poll_minutes: 2,
            interval: Interval::FiveMinutes,
            min_bars: 20,
            trend_window: 5,
        }
    }
}

impl MonitorSettings {
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.duration_minutes > MAX_SESSION_MINUTES {
            return Err(MonitorError::InvalidSettings(format!(
                "duration_minutes must be at most {MAX_SESSION_MINUTES}, got {}",
                self.duration_minutes
            )));
        }
        if !(1..=MAX_SESSION_MINUTES).contains(&self.poll_minutes) {
            return Err(MonitorError::InvalidSettings(format!(
                "poll_minutes must be in 1..={MAX_SESSION_MINUTES}, got {}",
                self.poll_minutes
            )));
        }
        Ok(())
    }

    fn session_length(&self) -> chrono::Duration {
        i64::try_from(self.duration_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .unwrap_or(chrono::Duration::MAX)
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_minutes.saturating_mul(60))
    }
}

/// Wall-clock source for the poll loop.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that only moves when slept on.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX);
        let mut now = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *now = now.checked_add_signed(step).unwrap_or(NaiveDateTime::MAX);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// One recorded poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEntry {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub signal: Signal,
    pub confidence: f64,
    pub price: f64,
    pub change_percent: f64,
}

/// Buy/sell counts over the most recent entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trend {
    pub buys: usize,
    pub sells: usize,
}

impl Trend {
    /// Trend over the last `window` entries; `None` until two entries exist.
    pub fn over(entries: &[SignalEntry], window: usize) -> Option<Self> {
        if entries.len() < 2 {
            return None;
        }
        let recent = &entries[entries.len().saturating_sub(window)..];
        let buys = recent.iter().filter(|e| e.signal == Signal::Buy).count();
        Some(Self {
            buys,
            sells: recent.len() - buys,
        })
    }
}

/// End-of-session aggregate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSummary {
    pub symbol: String,
    pub polls: usize,
    pub failures: usize,
    pub entries: Vec<SignalEntry>,
}

impl SessionSummary {
    pub fn buys(&self) -> usize {
        self.entries.iter().filter(|e| e.signal == Signal::Buy).count()
    }

    pub fn sells(&self) -> usize {
        self.entries.len() - self.buys()
    }

    pub fn last(&self) -> Option<&SignalEntry> {
        self.entries.last()
    }
}

/// Receives monitor events as they happen.
pub trait MonitorSink {
    fn on_entry(&mut self, entry: &SignalEntry, trend: Option<Trend>);

    fn on_error(&mut self, poll: usize, error: &MonitorError);

    fn on_finish(&mut self, summary: &SessionSummary);
}

/// Sink that prints to stdout.
pub struct StdoutMonitor;

impl MonitorSink for StdoutMonitor {
    fn on_entry(&mut self, entry: &SignalEntry, trend: Option<Trend>) {
        println!(
            "[{}] {} {:<4} confidence {:>6.2}%  price ${:.2} ({:+.2}%)",
            entry.timestamp.format("%H:%M:%S"),
            entry.symbol,
            entry.signal,
            entry.confidence * 100.0,
            entry.price,
            entry.change_percent
        );
        if let Some(t) = trend {
            println!("    trend: {} buy / {} sell", t.buys, t.sells);
        }
    }

    fn on_error(&mut self, poll: usize, error: &MonitorError) {
        println!("    poll {poll} failed: {error}");
    }

    fn on_finish(&mut self, summary: &SessionSummary) {
        println!();
        print!("{}", session_summary(summary));
    }
}

pub struct LiveMonitor<'a> {
    source: &'a dyn QuoteSource,
    model: &'a dyn SignalPredictor,
    clock: &'a dyn Clock,
    settings: MonitorSettings,
}

impl<'a> LiveMonitor<'a> {
    pub fn new(
        source: &'a dyn QuoteSource,
        model: &'a dyn SignalPredictor,
        clock: &'a dyn Clock,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            source,
            model,
            clock,
            settings,
        }
    }

    /// One poll: intraday bars → features → prediction → current quote.
    pub fn poll_once(&self, symbol: &str) -> Result<SignalEntry, MonitorError> {
        let series = self
            .source
            .fetch_series(symbol, RangeSpec::Intraday(self.settings.interval))?;
        if series.len() <= self.settings.min_bars {
            return Err(MonitorError::InsufficientBars {
                found: series.len(),
                required: self.settings.min_bars,
            });
        }

        let frame = FeatureFrame::annotate(series);
        let (_, prediction) = self.model.predict_latest(&frame)?;
        let quote = self.source.fetch_latest_quote(symbol)?;

        Ok(SignalEntry {
            timestamp: self.clock.now(),
            symbol: symbol.to_string(),
            signal: prediction.signal(),
            confidence: prediction.confidence,
            price: quote.price,
            change_percent: quote.change_percent,
        })
    }

    /// Poll until the session deadline, reporting to `sink`.
    pub fn run(&self, symbol: &str, sink: &mut dyn MonitorSink) -> SessionSummary {
        let poll = self.settings.poll_interval();
        let deadline = self
            .clock
            .now()
            .checked_add_signed(self.settings.session_length())
            .unwrap_or(NaiveDateTime::MAX);
        let mut summary = SessionSummary {
            symbol: symbol.to_string(),
            ..Default::default()
        };

        info!(symbol, %deadline, interval = %self.settings.interval, "monitor session started");
        while self.clock.now() < deadline {
            summary.polls += 1;
            match self.poll_once(symbol) {
                Ok(entry) => {
                    summary.entries.push(entry);
                    let trend = Trend::over(&summary.entries, self.settings.trend_window);
                    if let Some(entry) = summary.entries.last() {
                        sink.on_entry(entry, trend);
                    }
                }
                Err(error) => {
                    warn!(symbol, poll = summary.polls, %error, "monitor poll failed");
                    summary.failures += 1;
                    sink.on_error(summary.polls, &error);
                }
            }
            if self.clock.now() < deadline {
                self.clock.sleep(poll);
            }
        }

        info!(
            symbol,
            polls = summary.polls,
            entries = summary.entries.len(),
            "monitor session finished"
        );
        sink.on_finish(&summary);
        summary
    }
}
