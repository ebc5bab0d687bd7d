//! Backtest engine: replays predictions over a feature frame with a single
//! long-or-flat position.
//!
//! Per clean bar, in order:
//! 1. FLAT, prediction up, confidence above threshold → BUY all-in at the close
//! 2. LONG, prediction down, confidence above threshold → SELL everything at the close
//! 3. Append the bar's valuation to the portfolio curve
//!
//! A position still open after the last bar is marked to market, never closed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use signalbot_core::domain::{Direction, Position, Prediction, Trade, TradeAction};
use signalbot_core::features::FeatureFrame;
use signalbot_core::model::{ModelError, Prepared, SignalPredictor};

use crate::metrics::{max_drawdown, sharpe_ratio, step_returns, total_return, TradeSummary};

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BacktestError {
    #[error("insufficient data: {found} {context}, need at least {required}")]
    InsufficientData {
        context: &'static str,
        found: usize,
        required: usize,
    },

    #[error("model has not been trained")]
    NotTrained,

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_capital: f64,
    /// A transition fires only when confidence is strictly above this.
    pub confidence_threshold: f64,
    /// Bars required before cleaning.
    pub min_bars: usize,
    /// Bars with complete features required after cleaning.
    pub min_clean_bars: usize,
    /// Annualisation constant for the Sharpe ratio.
    pub periods_per_year: f64,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            confidence_threshold: 0.6,
            min_bars: 50,
            min_clean_bars: 30,
            periods_per_year: 252.0,
        }
    }
}

impl BacktestSettings {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(BacktestError::InvalidSettings(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if !(0.0..1.0).contains(&self.confidence_threshold) {
            return Err(BacktestError::InvalidSettings(format!(
                "confidence_threshold must be in [0, 1), got {}",
                self.confidence_threshold
            )));
        }
        if self.periods_per_year <= 0.0 {
            return Err(BacktestError::InvalidSettings(
                "periods_per_year must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub trades: Vec<Trade>,
    /// One valuation per clean bar.
    pub portfolio_curve: Vec<f64>,
    /// Bar timestamp of each curve point.
    pub timestamps: Vec<NaiveDateTime>,
    /// Step returns of the curve (one fewer than curve points).
    pub returns: Vec<f64>,
    /// Position held after the last bar.
    pub final_position: Position,
    pub input_bars: usize,
    pub clean_bars: usize,
    pub dataset_hash: String,
    pub settings: BacktestSettings,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn trade_summary(&self) -> TradeSummary {
        TradeSummary::compute(&self.trades)
    }

    pub fn dropped_bars(&self) -> usize {
        self.input_bars - self.clean_bars
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.timestamps.first().copied()
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }
}

/// Runs backtests with fixed settings. Holds no state between runs.
#[derive(Debug, Clone, Default)]
pub struct Backtester {
    settings: BacktestSettings,
}

impl Backtester {
    pub fn new(settings: BacktestSettings) -> Result<Self, BacktestError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &BacktestSettings {
        &self.settings
    }

    /// Simulate `model` over every clean bar of `frame`.
    ///
    /// Checks, in order: raw bar count, clean bar count, trained model, prediction count.
    pub fn run(
        &self,
        frame: &FeatureFrame,
        model: &dyn SignalPredictor,
    ) -> Result<BacktestResult, BacktestError> {
        let s = &self.settings;
        if frame.len() < s.min_bars {
            return Err(BacktestError::InsufficientData {
                context: "bars",
                found: frame.len(),
                required: s.min_bars,
            });
        }

        let prepared = Prepared::build(frame, &model.feature_columns())?;
        if prepared.len() < s.min_clean_bars {
            return Err(BacktestError::InsufficientData {
                context: "bars with complete features",
                found: prepared.len(),
                required: s.min_clean_bars,
            });
        }

        if !model.is_trained() {
            return Err(BacktestError::NotTrained);
        }

        let predictions = model.predict_rows(&prepared.rows)?;
        if predictions.len() != prepared.len() {
            return Err(ModelError::Prediction(format!(
                "{} predictions for {} rows",
                predictions.len(),
                prepared.len()
            ))
            .into());
        }

        let (trades, curve, final_position) =
            simulate(frame, &prepared.bar_indices, &predictions, s);
        let bars = frame.bars();
        let timestamps = prepared
            .bar_indices
            .iter()
            .map(|&i| bars[i].timestamp)
            .collect();

        let returns = step_returns(&curve);
        let result = BacktestResult {
            schema_version: SCHEMA_VERSION,
            symbol: frame.symbol().to_string(),
            initial_capital: s.initial_capital,
            final_value: curve.last().copied().unwrap_or(s.initial_capital),
            total_return: total_return(&curve, s.initial_capital),
            sharpe_ratio: sharpe_ratio(&returns, s.periods_per_year),
            max_drawdown: max_drawdown(&curve),
            trades,
            portfolio_curve: curve,
            timestamps,
            returns,
            final_position,
            input_bars: frame.len(),
            clean_bars: prepared.len(),
            dataset_hash: dataset_hash(frame),
            settings: s.clone(),
        };

        info!(
            symbol = %result.symbol,
            bars = result.clean_bars,
            trades = result.trades.len(),
            total_return = result.total_return,
            "backtest complete"
        );
        Ok(result)
    }
}

/// The position state machine. `bar_indices[k]` is the frame bar of `predictions[k]`.
fn simulate(
    frame: &FeatureFrame,
    bar_indices: &[usize],
    predictions: &[Prediction],
    settings: &BacktestSettings,
) -> (Vec<Trade>, Vec<f64>, Position) {
    let bars = frame.bars();
    let mut capital = settings.initial_capital;
    let mut position = Position::Flat;
    let mut trades = Vec::new();
    let mut curve = Vec::with_capacity(bar_indices.len());

    for (&bar_index, prediction) in bar_indices.iter().zip(predictions) {
        let bar = &bars[bar_index];
        let price = bar.close;
        let confident = prediction.confidence > settings.confidence_threshold;

        match (position, prediction.direction) {
            (Position::Flat, Direction::Up) if confident => {
                let shares = capital / price;
                position = Position::Long {
                    entry_price: price,
                    shares,
                };
                debug!(bar_index, price, shares, "BUY");
                trades.push(Trade {
                    timestamp: bar.timestamp,
                    bar_index,
                    action: TradeAction::Buy,
                    price,
                    shares,
                    confidence: prediction.confidence,
                    pnl: None,
                });
            }
            (Position::Long { entry_price, shares }, Direction::Down) if confident => {
                let pnl = (price - entry_price) * shares;
                capital = shares * price;
                position = Position::Flat;
                debug!(bar_index, price, pnl, "SELL");
                trades.push(Trade {
                    timestamp: bar.timestamp,
                    bar_index,
                    action: TradeAction::Sell,
                    price,
                    shares,
                    confidence: prediction.confidence,
                    pnl: Some(pnl),
                });
            }
            _ => {}
        }

        curve.push(position.market_value(capital, price));
    }

    (trades, curve, position)
}

/// Fingerprint of the bars a result was computed from.
pub fn dataset_hash(frame: &FeatureFrame) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(frame.symbol().as_bytes());
    for bar in frame.bars() {
        hasher.update(bar.timestamp.to_string().as_bytes());
        for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
