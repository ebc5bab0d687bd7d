//! Feature matrix construction: column selection, row cleaning, next-bar labels.

use super::ModelError;
use crate::features::FeatureFrame;
use crate::schema::MIN_FEATURE_COLUMNS;

/// Minimum number of complete rows a frame must yield for training.
pub const MIN_CLEAN_ROWS: usize = 30;

/// Clean feature rows extracted from a frame.
///
/// `labels[k]` is 1 if the close of the next clean row is above the close of row k,
/// 0 otherwise. The final row has no successor and is unlabeled.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    pub columns: Vec<String>,
    /// Bar index in the source frame of each clean row.
    pub bar_indices: Vec<usize>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<Option<u8>>,
}

impl Prepared {
    /// Keep only bars where every one of `columns` is defined.
    ///
    /// Every column must exist in the frame.
    pub fn build(frame: &FeatureFrame, columns: &[String]) -> Result<Self, ModelError> {
        let missing: Vec<String> = columns
            .iter()
            .filter(|c| !frame.values().contains(c))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::SchemaMismatch { missing });
        }

        let mut bar_indices = Vec::new();
        let mut rows = Vec::new();
        for i in 0..frame.len() {
            if let Some(row) = frame.row(i, columns) {
                bar_indices.push(i);
                rows.push(row);
            }
        }

        let bars = frame.bars();
        let labels = (0..bar_indices.len())
            .map(|k| {
                bar_indices
                    .get(k + 1)
                    .map(|&next| u8::from(bars[next].close > bars[bar_indices[k]].close))
            })
            .collect();

        Ok(Self {
            columns: columns.to_vec(),
            bar_indices,
            rows,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows that have a label, with the labels.
    pub fn labeled(&self) -> (Vec<Vec<f64>>, Vec<u8>) {
        self.rows
            .iter()
            .zip(&self.labels)
            .filter_map(|(row, label)| label.map(|l| (row.clone(), l)))
            .unzip()
    }
}

/// The present subset of `requested`, failing when fewer than the minimum remain.
pub fn select_columns(frame: &FeatureFrame, requested: &[String]) -> Result<Vec<String>, ModelError> {
    let available = frame.available_columns(requested);
    if available.len() < MIN_FEATURE_COLUMNS {
        return Err(ModelError::MissingFeatures {
            available: available.len(),
            required: MIN_FEATURE_COLUMNS,
        });
    }
    Ok(available)
}

/// Select columns, clean rows and label them, requiring at least `MIN_CLEAN_ROWS` rows.
pub fn prepare(frame: &FeatureFrame, requested: &[String]) -> Result<Prepared, ModelError> {
    let columns = select_columns(frame, requested)?;
    let prepared = Prepared::build(frame, &columns)?;
    if prepared.len() < MIN_CLEAN_ROWS {
        return Err(ModelError::InsufficientData {
            context: "clean feature rows",
            found: prepared.len(),
            required: MIN_CLEAN_ROWS,
        });
    }
    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Series};
    use crate::indicators::IndicatorValues;
    use chrono::NaiveDate;

    fn frame_with(closes: &[f64], columns: &[(&str, Vec<f64>)]) -> FeatureFrame {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect();
        let mut values = IndicatorValues::new();
        for (name, v) in columns {
            values.insert(*name, v.clone());
        }
        FeatureFrame::from_parts(Series::new("T", bars).unwrap(), values).unwrap()
    }

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn labels_follow_next_clean_close() {
        let f = frame_with(
            &[10.0, 11.0, 9.0, 12.0],
            &[("a", vec![f64::NAN, 1.0, 2.0, 3.0])],
        );
        let p = Prepared::build(&f, &names(&["a"])).unwrap();
        assert_eq!(p.bar_indices, vec![1, 2, 3]);
        assert_eq!(p.labels, vec![Some(0), Some(1), None]);
        let (x, y) = p.labeled();
        assert_eq!(x.len(), 2);
        assert_eq!(y, vec![0, 1]);
    }

    #[test]
    fn gap_rows_are_skipped_when_labelling() {
        // Row 2 is incomplete: row 1's successor is row 3.
        let f = frame_with(
            &[10.0, 11.0, 50.0, 10.5],
            &[("a", vec![1.0, 1.0, f64::NAN, 1.0])],
        );
        let p = Prepared::build(&f, &names(&["a"])).unwrap();
        assert_eq!(p.bar_indices, vec![0, 1, 3]);
        assert_eq!(p.labels, vec![Some(1), Some(0), None]);
    }

    #[test]
    fn equal_close_labels_down() {
        let f = frame_with(&[10.0, 10.0], &[("a", vec![1.0, 1.0])]);
        let p = Prepared::build(&f, &names(&["a"])).unwrap();
        assert_eq!(p.labels[0], Some(0));
    }

    #[test]
    fn missing_column_is_schema_mismatch() {
        let f = frame_with(&[1.0], &[("a", vec![1.0])]);
        let err = Prepared::build(&f, &names(&["a", "b"])).unwrap_err();
        assert!(matches!(err, ModelError::SchemaMismatch { missing } if missing == vec!["b".to_string()]));
    }

    #[test]
    fn fewer_than_five_columns_is_missing_features() {
        let cols: Vec<(&str, Vec<f64>)> = ["a", "b", "c", "d"]
            .iter()
            .map(|n| (*n, vec![1.0; 40]))
            .collect();
        let f = frame_with(&[1.0; 40], &cols);
        let err = prepare(&f, &names(&["a", "b", "c", "d", "e"])).unwrap_err();
        assert!(matches!(err, ModelError::MissingFeatures { available: 4, required: 5 }));
    }

    #[test]
    fn too_few_clean_rows() {
        let cols: Vec<(&str, Vec<f64>)> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|n| (*n, vec![1.0; 29]))
            .collect();
        let f = frame_with(&[1.0; 29], &cols);
        let err = prepare(&f, &names(&["a", "b", "c", "d", "e"])).unwrap_err();
        assert!(matches!(err, ModelError::InsufficientData { found: 29, required: 30, .. }));
    }
}
