//! Next-bar direction model: scaler + random forest behind one interface.
//!
//! Training and prediction share the feature schema in `crate::schema` and the
//! scaler fitted at training time, so both paths see identically built rows.

pub mod forest;
pub mod prepare;
pub mod scaler;
pub mod signal;
pub mod store;
pub mod tree;

pub use forest::{ForestConfig, RandomForest};
pub use prepare::{prepare, select_columns, Prepared, MIN_CLEAN_ROWS};
pub use scaler::StandardScaler;
pub use signal::{ClassMetrics, ModelConfig, SignalModel, TrainingReport};
pub use store::{ModelLoadError, ModelSaveError, ModelStore};
pub use tree::DecisionTree;

use crate::domain::Prediction;
use crate::features::FeatureFrame;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("model has not been trained")]
    NotTrained,

    #[error("insufficient data: {found} {context}, need at least {required}")]
    InsufficientData {
        context: &'static str,
        found: usize,
        required: usize,
    },

    #[error("only {available} feature columns available, need at least {required}")]
    MissingFeatures { available: usize, required: usize },

    #[error("frame is missing model feature columns: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// Anything that maps clean feature rows to predictions.
///
/// The backtest engine and the live monitor depend on this trait rather than on
/// `SignalModel`, so tests can drive them with scripted predictions.
pub trait SignalPredictor: Send + Sync {
    fn is_trained(&self) -> bool;

    /// Columns (in order) each row passed to `predict_rows` must contain.
    fn feature_columns(&self) -> Vec<String>;

    /// One prediction per row, in order.
    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<Prediction>, ModelError>;

    /// Predict from the most recent bar with a complete feature row.
    ///
    /// Returns the bar index the prediction was made at.
    fn predict_latest(&self, frame: &FeatureFrame) -> Result<(usize, Prediction), ModelError> {
        if !self.is_trained() {
            return Err(ModelError::NotTrained);
        }
        let columns = self.feature_columns();
        let prepared = Prepared::build(frame, &columns)?;
        let (Some(&index), Some(row)) = (prepared.bar_indices.last(), prepared.rows.last()) else {
            return Err(ModelError::InsufficientData {
                context: "complete feature rows",
                found: 0,
                required: 1,
            });
        };
        let prediction = self
            .predict_rows(std::slice::from_ref(row))?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Prediction("model returned no prediction".into()))?;
        Ok((index, prediction))
    }
}
