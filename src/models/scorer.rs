//! Uniform fit-and-score contract over the outlier detection strategies

use crate::config::{DetectionConfig, DetectorKind};
use crate::error::{AnalysisError, Result};
use crate::models::density::LocalOutlierFactor;
use crate::models::isolation::IsolationForest;
use crate::types::dataset::{ContaminationRatio, FeatureMatrix};

/// Native prediction for a normal row
pub const INLIER: i8 = 1;
/// Native prediction for an anomalous row
pub const OUTLIER: i8 = -1;

/// Output of one strategy in its native convention.
///
/// `predictions` hold +1 (normal) or -1 (anomaly); `scores` are continuous
/// and lower means more anomalous.
#[derive(Debug, Clone, PartialEq)]
pub struct RawScores {
    pub predictions: Vec<i8>,
    pub scores: Vec<f64>,
}

impl RawScores {
    pub fn outlier_count(&self) -> usize {
        self.predictions.iter().filter(|&&p| p == OUTLIER).count()
    }
}

/// Per-row dataset label (0 valid, 1 fraud) with the strategy's anomaly score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreAssignment {
    pub labels: Vec<u8>,
    pub scores: Vec<f64>,
}

/// A strategy that flags outliers in a feature matrix.
pub trait OutlierScorer {
    /// Display name used in logs and reports
    fn name(&self) -> &'static str;

    /// Fit on `features` and label every row, flagging roughly
    /// `contamination` of them as anomalies.
    fn score(&self, features: &FeatureMatrix, contamination: ContaminationRatio)
        -> Result<RawScores>;
}

/// Build the scorer for a configured strategy
pub fn build_scorer(kind: DetectorKind, config: &DetectionConfig) -> Box<dyn OutlierScorer> {
    match kind {
        DetectorKind::IsolationForest => {
            let c = &config.isolation_forest;
            Box::new(IsolationForest::new(c.n_estimators, c.max_samples, c.seed))
        }
        DetectorKind::LocalOutlierFactor => {
            Box::new(LocalOutlierFactor::new(config.local_outlier_factor.n_neighbors))
        }
    }
}

/// Percentile with linear interpolation between closest ranks, `q` in [0, 100].
pub(crate) fn percentile(values: &[f64], q: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(AnalysisError::fit("percentile of an empty score vector"));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Score below which rows are flagged, so that about `contamination` of the
/// rows fall under it.
pub(crate) fn contamination_offset(scores: &[f64], contamination: ContaminationRatio) -> Result<f64> {
    percentile(scores, 100.0 * contamination.value())
}

/// Label rows strictly below `offset` as outliers.
pub(crate) fn predict_below(scores: &[f64], offset: f64) -> Vec<i8> {
    scores
        .iter()
        .map(|&s| if s < offset { OUTLIER } else { INLIER })
        .collect()
}
