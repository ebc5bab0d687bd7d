//! FeatureFrame: a bar series annotated with indicator columns.

use crate::domain::{Bar, Series};
use crate::indicators::IndicatorValues;
use crate::schema::indicator_set;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("column '{column}' has {found} values for {expected} bars")]
    LengthMismatch {
        column: String,
        found: usize,
        expected: usize,
    },
}

/// A series plus one value per bar for every indicator column.
///
/// Undefined values (warm-up, division by zero) are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    series: Series,
    values: IndicatorValues,
}

impl FeatureFrame {
    /// Compute every indicator column in the schema for `series`.
    pub fn annotate(series: Series) -> Self {
        let mut values = IndicatorValues::new();
        for (column, indicator) in indicator_set() {
            let computed = indicator.compute(series.bars());
            debug_assert_eq!(computed.len(), series.len(), "indicator {column}");
            values.insert(column, computed);
        }
        debug!(
            symbol = series.symbol(),
            bars = series.len(),
            columns = values.len(),
            "annotated series"
        );
        Self { series, values }
    }

    /// Assemble a frame from precomputed columns, checking their lengths.
    pub fn from_parts(series: Series, values: IndicatorValues) -> Result<Self, FeatureError> {
        for name in values.names() {
            let found = values.get_series(name).map_or(0, |s| s.len());
            if found != series.len() {
                return Err(FeatureError::LengthMismatch {
                    column: name.to_string(),
                    found,
                    expected: series.len(),
                });
            }
        }
        Ok(Self { series, values })
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn bars(&self) -> &[Bar] {
        self.series.bars()
    }

    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }

    pub fn values(&self) -> &IndicatorValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The subset of `columns` present in this frame, in the given order.
    pub fn available_columns(&self, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .filter(|c| self.values.contains(c))
            .cloned()
            .collect()
    }

    /// Feature row at `index`, or `None` if any column is missing or non-finite.
    pub fn row(&self, index: usize, columns: &[String]) -> Option<Vec<f64>> {
        columns
            .iter()
            .map(|c| self.values.get(c, index).filter(|v| v.is_finite()))
            .collect()
    }

    /// Indices of bars whose every requested column is defined.
    pub fn complete_rows(&self, columns: &[String]) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.row(i, columns).is_some())
            .collect()
    }

    /// The most recent bar with a complete feature row.
    pub fn latest_complete_row(&self, columns: &[String]) -> Option<(usize, Vec<f64>)> {
        (0..self.len())
            .rev()
            .find_map(|i| self.row(i, columns).map(|row| (i, row)))
    }
}
