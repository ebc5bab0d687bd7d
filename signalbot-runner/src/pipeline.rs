//! Glue between quote sources, the indicator engine and the model store.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use signalbot_core::data::{
    AlphaVantageSource, CircuitBreaker, DataError, Period, QuoteSource, RangeSpec, SyntheticSource,
};
use signalbot_core::features::FeatureFrame;
use signalbot_core::model::{
    ModelConfig, ModelError, ModelSaveError, ModelStore, SignalModel, TrainingReport,
};

use crate::config::DataSettings;

/// Daily bars required before the monitor will train a fresh model.
pub const MIN_TRAINING_BARS: usize = 50;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("failed to save model: {0}")]
    Save(#[from] ModelSaveError),

    #[error("only {found} daily bars for {symbol}, need at least {required} to train")]
    InsufficientHistory {
        symbol: String,
        found: usize,
        required: usize,
    },
}

/// How a model for a session was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOrigin {
    Loaded,
    Trained(TrainingReport),
}

/// The synthetic source, or Alpha Vantage with retry and breaker settings from `settings`.
pub fn build_source(
    settings: &DataSettings,
    api_key: Option<String>,
    synthetic: bool,
) -> Result<Box<dyn QuoteSource>, DataError> {
    if synthetic {
        return Ok(Box::new(SyntheticSource::new()));
    }
    let api_key = api_key.ok_or_else(|| {
        DataError::AuthenticationRequired(format!(
            "pass --api-key, set {} or add data.api_key to the config file",
            crate::config::API_KEY_ENV
        ))
    })?;
    let breaker = Arc::new(CircuitBreaker::new(
        Duration::from_secs(settings.breaker_cooldown_secs),
        settings.breaker_failure_threshold,
    ));
    let source = AlphaVantageSource::new(api_key, breaker)?.with_retry(
        settings.max_retries,
        Duration::from_millis(settings.retry_base_delay_ms),
    );
    Ok(Box::new(source))
}

/// Fetch a series and compute every indicator column.
pub fn fetch_frame(
    source: &dyn QuoteSource,
    symbol: &str,
    range: RangeSpec,
) -> Result<FeatureFrame, DataError> {
    let series = source.fetch_series(symbol, range)?;
    Ok(FeatureFrame::annotate(series))
}

/// Train on `frame` and persist the result under `symbol`.
pub fn train_and_save(
    frame: &FeatureFrame,
    store: &ModelStore,
    config: &ModelConfig,
) -> Result<(SignalModel, TrainingReport), PipelineError> {
    let mut model = SignalModel::new(config.clone());
    let report = model.train(frame)?;
    store.save(frame.symbol(), &model)?;
    Ok((model, report))
}

/// The stored model for `symbol`, or a fresh one trained on a year of daily bars.
///
/// A missing or unreadable model file is logged, not fatal.
pub fn load_or_train(
    source: &dyn QuoteSource,
    store: &ModelStore,
    symbol: &str,
    config: &ModelConfig,
) -> Result<(SignalModel, ModelOrigin), PipelineError> {
    match store.load(symbol) {
        Ok(model) => {
            info!(symbol, path = %store.path_for(symbol).display(), "loaded model");
            return Ok((model, ModelOrigin::Loaded));
        }
        Err(e) => warn!(symbol, error = %e, "no usable stored model, training a new one"),
    }

    let frame = fetch_frame(source, symbol, RangeSpec::Period(Period::OneYear))?;
    if frame.len() < MIN_TRAINING_BARS {
        return Err(PipelineError::InsufficientHistory {
            symbol: symbol.to_string(),
            found: frame.len(),
            required: MIN_TRAINING_BARS,
        });
    }
    let (model, report) = train_and_save(&frame, store, config)?;
    Ok((model, ModelOrigin::Trained(report)))
}
