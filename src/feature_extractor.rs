//! Feature/target splitting of the transaction table.
//!
//! Every column except the label becomes a feature, in table order. The
//! label column becomes the binary target vector.

use crate::error::{AnalysisError, Result};
use crate::types::dataset::{ClassBalance, ContaminationRatio, FeatureMatrix, LabelVector};
use crate::types::transaction::TransactionTable;
use ndarray::Array2;
use tracing::info;

/// Splits a table into a feature matrix and a label vector.
pub struct FeatureExtractor {
    label_column: String,
}

impl FeatureExtractor {
    /// Create a new extractor for the given label column.
    pub fn new(label_column: &str) -> Self {
        Self {
            label_column: label_column.to_string(),
        }
    }

    /// Feature column names, in the order they appear in the matrix.
    pub fn feature_names(&self, table: &TransactionTable) -> Vec<String> {
        table
            .columns()
            .iter()
            .filter(|c| **c != self.label_column)
            .cloned()
            .collect()
    }

    /// Partition the table. Fails with a schema error when the label column
    /// is absent or holds anything but 0 and 1.
    pub fn split(&self, table: &TransactionTable) -> Result<(FeatureMatrix, LabelVector)> {
        let label_idx = table.column_index(&self.label_column).ok_or_else(|| {
            AnalysisError::schema(format!("label column '{}' is absent", self.label_column))
        })?;

        let n_rows = table.row_count();
        let n_features = table.column_count() - 1;

        let mut values = Vec::with_capacity(n_rows * n_features);
        let mut labels = Vec::with_capacity(n_rows);

        for (i, row) in table.rows().iter().enumerate() {
            let label = row[label_idx];
            labels.push(match label {
                l if l == 0.0 => 0u8,
                l if l == 1.0 => 1u8,
                other => {
                    return Err(AnalysisError::schema(format!(
                        "row {}: label {} is not 0 or 1",
                        i, other
                    )))
                }
            });
            values.extend(
                row.iter()
                    .enumerate()
                    .filter(|(j, _)| *j != label_idx)
                    .map(|(_, v)| *v),
            );
        }

        let matrix = Array2::from_shape_vec((n_rows, n_features), values)
            .map_err(|e| AnalysisError::schema(e.to_string()))?;
        let features = FeatureMatrix::new(self.feature_names(table), matrix);
        let labels = LabelVector::new(labels)?;

        info!(
            features = ?(features.n_rows(), features.n_features()),
            labels = labels.len(),
            "Split features and target"
        );

        Ok((features, labels))
    }

    /// Count fraud and valid rows and derive the contamination ratio.
    pub fn class_balance(&self, labels: &LabelVector) -> Result<(ClassBalance, ContaminationRatio)> {
        let balance = ClassBalance::from_labels(labels);
        let ratio = ContaminationRatio::from_balance(&balance)?;

        info!(
            fraud_cases = balance.fraud,
            valid_transactions = balance.valid,
            outlier_fraction = ratio.value(),
            "Class balance"
        );

        Ok((balance, ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<f64>>) -> TransactionTable {
        TransactionTable::new(
            vec!["Time".to_string(), "Class".to_string(), "Amount".to_string()],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_split_excludes_label_and_keeps_order() {
        let table = table(vec![
            vec![0.0, 0.0, 10.0],
            vec![1.0, 1.0, 999.0],
            vec![2.0, 0.0, 5.0],
        ]);
        let extractor = FeatureExtractor::new("Class");

        let (features, labels) = extractor.split(&table).unwrap();

        assert_eq!(features.names(), ["Time", "Amount"]);
        assert_eq!(features.n_rows(), table.row_count());
        assert_eq!(labels.len(), table.row_count());
        assert_eq!(labels.as_slice(), &[0, 1, 0]);
        assert_eq!(features.row(1).to_vec(), vec![1.0, 999.0]);
    }

    #[test]
    fn test_split_missing_label_is_schema_error() {
        let table = table(vec![vec![0.0, 0.0, 1.0]]);
        let err = FeatureExtractor::new("Fraud").split(&table).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(_)));
    }

    #[test]
    fn test_split_non_binary_label_is_schema_error() {
        let table = table(vec![vec![0.0, 0.0, 1.0], vec![1.0, 0.5, 2.0]]);
        let err = FeatureExtractor::new("Class").split(&table).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(_)));
    }

    #[test]
    fn test_class_balance() {
        let mut rows = Vec::new();
        for i in 0..1000 {
            let class = if i < 5 { 1.0 } else { 0.0 };
            rows.push(vec![i as f64, class, 1.0]);
        }
        let extractor = FeatureExtractor::new("Class");
        let (_, labels) = extractor.split(&table(rows)).unwrap();

        let (balance, ratio) = extractor.class_balance(&labels).unwrap();

        assert_eq!(balance.fraud, 5);
        assert_eq!(balance.valid, 995);
        assert!((ratio.value() - 5.0 / 995.0).abs() < 1e-12);
    }
}
