//! SignalModel: trains on a feature frame, predicts next-bar direction.

use super::forest::{ForestConfig, RandomForest};
use super::prepare::prepare;
use super::scaler::StandardScaler;
use super::{ModelError, SignalPredictor};
use crate::domain::Prediction;
use crate::features::FeatureFrame;
use crate::schema::default_columns;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub forest: ForestConfig,
    /// Fraction of labeled rows held out (from the end) for evaluation.
    pub test_fraction: f64,
    /// Minimum labeled rows. The last clean row has no label, so this needs
    /// `min_train_samples + 1` clean rows.
    pub min_train_samples: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            test_fraction: 0.2,
            min_train_samples: 50,
        }
    }
}

/// Fitted state: the columns, scaler and classifier that must travel together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub columns: Vec<String>,
    pub scaler: StandardScaler,
    pub forest: RandomForest,
}

/// Precision/recall/F1 for one class on the held-out split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub symbol: String,
    pub columns: Vec<String>,
    pub train_samples: usize,
    pub test_samples: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    /// Indexed by class label: `[down, up]`.
    pub classes: [ClassMetrics; 2],
    /// `(column, importance)` sorted by descending importance.
    pub feature_importances: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Default)]
pub struct SignalModel {
    config: ModelConfig,
    fitted: Option<FittedModel>,
}

impl SignalModel {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn from_fitted(config: ModelConfig, fitted: FittedModel) -> Self {
        Self {
            config,
            fitted: Some(fitted),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn fitted(&self) -> Option<&FittedModel> {
        self.fitted.as_ref()
    }

    /// Fit scaler and forest on the chronological head of the labeled rows.
    ///
    /// The last `ceil(test_fraction * n)` labeled rows are held out. The scaler
    /// only sees training rows. Re-training replaces any previous fit.
    pub fn train(&mut self, frame: &FeatureFrame) -> Result<TrainingReport, ModelError> {
        let prepared = prepare(frame, &default_columns())?;
        let (x, y) = prepared.labeled();
        let n = x.len();
        if n < self.config.min_train_samples {
            return Err(ModelError::InsufficientData {
                context: "labeled samples",
                found: n,
                required: self.config.min_train_samples,
            });
        }

        let n_test = ((n as f64) * self.config.test_fraction).ceil() as usize;
        let n_test = n_test.min(n - 1);
        let split = n - n_test;
        let (x_train, x_test) = x.split_at(split);
        let (y_train, y_test) = y.split_at(split);

        let scaler = StandardScaler::fit(x_train);
        let x_train = scaler.transform(x_train);
        let x_test = scaler.transform(x_test);
        let forest = RandomForest::fit(&x_train, y_train, &self.config.forest);

        let train_pred: Vec<u8> = x_train.iter().map(|r| classify(&forest, r)).collect();
        let test_pred: Vec<u8> = x_test.iter().map(|r| classify(&forest, r)).collect();

        let mut feature_importances: Vec<(String, f64)> = prepared
            .columns
            .iter()
            .cloned()
            .zip(forest.feature_importances())
            .collect();
        feature_importances.sort_by(|a, b| b.1.total_cmp(&a.1));

        let report = TrainingReport {
            symbol: frame.symbol().to_string(),
            columns: prepared.columns.clone(),
            train_samples: split,
            test_samples: n_test,
            train_accuracy: accuracy(y_train, &train_pred),
            test_accuracy: accuracy(y_test, &test_pred),
            classes: [
                class_metrics(y_test, &test_pred, 0),
                class_metrics(y_test, &test_pred, 1),
            ],
            feature_importances,
        };

        info!(
            symbol = %report.symbol,
            train = report.train_samples,
            test = report.test_samples,
            train_accuracy = report.train_accuracy,
            test_accuracy = report.test_accuracy,
            "model trained"
        );

        self.fitted = Some(FittedModel {
            columns: prepared.columns,
            scaler,
            forest,
        });
        Ok(report)
    }

    /// Prediction for the latest bar with complete features.
    pub fn predict(&self, frame: &FeatureFrame) -> Result<Prediction, ModelError> {
        self.predict_latest(frame).map(|(_, p)| p)
    }
}

impl SignalPredictor for SignalModel {
    fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    fn feature_columns(&self) -> Vec<String> {
        self.fitted
            .as_ref()
            .map_or_else(default_columns, |f| f.columns.clone())
    }

    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<Prediction>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotTrained)?;
        rows.iter()
            .map(|row| {
                if row.len() != fitted.scaler.width() {
                    return Err(ModelError::Prediction(format!(
                        "row has {} features, model expects {}",
                        row.len(),
                        fitted.scaler.width()
                    )));
                }
                let scaled = fitted.scaler.transform_row(row);
                Ok(Prediction::from_probabilities(
                    fitted.forest.predict_proba(&scaled),
                ))
            })
            .collect()
    }
}

fn classify(forest: &RandomForest, row: &[f64]) -> u8 {
    Prediction::from_probabilities(forest.predict_proba(row))
        .direction
        .label()
}

fn accuracy(truth: &[u8], predicted: &[u8]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    hits as f64 / truth.len() as f64
}

fn class_metrics(truth: &[u8], predicted: &[u8], class: u8) -> ClassMetrics {
    let tp = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| **t == class && **p == class)
        .count() as f64;
    let predicted_pos = predicted.iter().filter(|p| **p == class).count() as f64;
    let support = truth.iter().filter(|t| **t == class).count();

    let precision = if predicted_pos > 0.0 { tp / predicted_pos } else { 0.0 };
    let recall = if support > 0 { tp / support as f64 } else { 0.0 };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    ClassMetrics {
        precision,
        recall,
        f1,
        support,
    }
}
