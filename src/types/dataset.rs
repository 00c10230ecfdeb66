//! Derived views of the transaction table consumed by the detectors

use crate::error::{AnalysisError, Result};
use ndarray::{Array2, ArrayView1};

/// Feature columns of the table, label excluded. Row order follows the table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Self {
        debug_assert_eq!(names.len(), values.ncols());
        Self { names, values }
    }

    /// Build from row vectors with generated column names (`f0`, `f1`, ...)
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let ncols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != ncols) {
            return Err(AnalysisError::fit("feature rows have differing lengths"));
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let values = Array2::from_shape_vec((rows.len(), ncols), flat)
            .map_err(|e| AnalysisError::fit(e.to_string()))?;
        let names = (0..ncols).map(|i| format!("f{}", i)).collect();
        Ok(Self { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Reject matrices no detector can fit: empty or holding NaN/inf.
    pub fn ensure_fittable(&self) -> Result<()> {
        if self.n_rows() == 0 || self.n_features() == 0 {
            return Err(AnalysisError::fit(format!(
                "feature matrix is empty ({} rows x {} features)",
                self.n_rows(),
                self.n_features()
            )));
        }
        if let Some(((row, col), _)) = self.values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnalysisError::fit(format!(
                "non-numeric value at row {} feature {}",
                row,
                self.names.get(col).map(String::as_str).unwrap_or("?")
            )));
        }
        Ok(())
    }
}

/// Binary labels, 0 = valid and 1 = fraud
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVector(Vec<u8>);

impl LabelVector {
    pub fn new(labels: Vec<u8>) -> Result<Self> {
        if let Some(pos) = labels.iter().position(|&l| l > 1) {
            return Err(AnalysisError::schema(format!(
                "label {} at row {} is not 0 or 1",
                labels[pos], pos
            )));
        }
        Ok(Self(labels))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fraud and valid row counts of a label vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassBalance {
    pub fraud: usize,
    pub valid: usize,
}

impl ClassBalance {
    pub fn from_labels(labels: &LabelVector) -> Self {
        let fraud = labels.as_slice().iter().filter(|&&l| l == 1).count();
        Self {
            fraud,
            valid: labels.len() - fraud,
        }
    }
}

/// Prior estimate of anomaly prevalence: fraud count / valid count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContaminationRatio(f64);

impl ContaminationRatio {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn from_balance(balance: &ClassBalance) -> Result<Self> {
        if balance.valid == 0 {
            return Err(AnalysisError::schema(
                "no valid (label 0) rows; contamination ratio is undefined",
            ));
        }
        Ok(Self(balance.fraud as f64 / balance.valid as f64))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Detectors threshold at this percentile, so it must be in (0, 0.5].
    pub fn ensure_usable(&self) -> Result<()> {
        if !(self.0 > 0.0 && self.0 <= 0.5) {
            return Err(AnalysisError::fit(format!(
                "contamination {} must be in (0, 0.5]",
                self.0
            )));
        }
        Ok(())
    }
}
