//! Shared fixtures: hand-built frames and a predictor that replays scripted predictions.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use signalbot_core::domain::{Bar, Direction, Prediction, Series};
use signalbot_core::features::FeatureFrame;
use signalbot_core::indicators::IndicatorValues;
use signalbot_core::model::{ModelError, SignalPredictor};

pub const FEATURE: &str = "scripted";

pub fn day(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::days(i as i64)
}

/// A frame over `closes` with one feature column, undefined for the first `warmup` bars.
pub fn frame(closes: &[f64], warmup: usize) -> FeatureFrame {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar {
            timestamp: day(i),
            open: c,
            high: c,
            low: c,
            close: c,
            volume: 1_000.0,
        })
        .collect();
    let series = Series::new("TEST", bars).unwrap();
    let mut values = IndicatorValues::new();
    values.insert(
        FEATURE,
        (0..closes.len())
            .map(|i| if i < warmup { f64::NAN } else { i as f64 })
            .collect(),
    );
    FeatureFrame::from_parts(series, values).unwrap()
}

/// Replays predictions in order, one per clean row.
pub struct Scripted {
    pub predictions: Vec<Prediction>,
    pub trained: bool,
}

impl Scripted {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions,
            trained: true,
        }
    }

    /// `(direction_is_up, confidence)` pairs.
    pub fn from_pairs(pairs: &[(bool, f64)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|&(up, c)| {
                    Prediction::new(if up { Direction::Up } else { Direction::Down }, c)
                })
                .collect(),
        )
    }
}

impl SignalPredictor for Scripted {
    fn is_trained(&self) -> bool {
        self.trained
    }

    fn feature_columns(&self) -> Vec<String> {
        vec![FEATURE.to_string()]
    }

    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<Prediction>, ModelError> {
        Ok(self.predictions.iter().take(rows.len()).cloned().collect())
    }
}
