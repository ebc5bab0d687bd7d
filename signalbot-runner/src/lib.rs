//! Signalbot runner: backtest simulation, metrics, artifact export and the
//! live signal monitor.
//!
//! This crate builds on `signalbot-core` to provide:
//! - The single-position backtest engine and its metrics
//! - JSON/CSV/Markdown artifact export
//! - The polling live monitor
//! - TOML configuration and pipeline helpers used by the CLI

pub mod backtest;
pub mod config;
pub mod export;
pub mod metrics;
pub mod monitor;
pub mod pipeline;
pub mod report;

pub use backtest::{BacktestError, BacktestResult, BacktestSettings, Backtester, SCHEMA_VERSION};
pub use config::{AppConfig, ConfigError};
pub use metrics::TradeSummary;
pub use monitor::{
    Clock, LiveMonitor, ManualClock, MonitorError, MonitorSettings, MonitorSink, SessionSummary,
    SignalEntry, StdoutMonitor, SystemClock, Trend,
};
pub use pipeline::{load_or_train, ModelOrigin, PipelineError};
