//! The `Indicator` trait and the column store the feature frame is built on.

use crate::domain::Bar;
use std::collections::BTreeMap;

/// A causal transform from bars to one value per bar.
///
/// Output has the same length as the input. Positions before `lookback()` and
/// any position whose window touches a NaN input are NaN. The value at bar `t`
/// reads only `bars[..=t]`.
///
/// Indicators are unnamed; the feature schema assigns column names.
pub trait Indicator: Send + Sync {
    /// Index of the first bar that can hold a value.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

pub(crate) fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Indicator columns keyed by schema name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorValues {
    columns: BTreeMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.columns.insert(name.into(), values);
    }

    /// Value of `name` at `bar_index`; NaN values are returned as-is.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.columns.get(name)?.get(bar_index).copied()
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
