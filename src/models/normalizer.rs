//! Mapping between native detector output (+1 normal, -1 anomaly) and
//! dataset labels (0 valid, 1 fraud).

use crate::error::{AnalysisError, Result};
use crate::models::scorer::{RawScores, ScoreAssignment, INLIER, OUTLIER};

/// +1 → 0, -1 → 1. Any other value is a validation error.
pub fn normalize(predictions: &[i8]) -> Result<Vec<u8>> {
    predictions
        .iter()
        .enumerate()
        .map(|(i, &p)| match p {
            INLIER => Ok(0),
            OUTLIER => Ok(1),
            other => Err(AnalysisError::validation(format!(
                "prediction {} at row {} is neither +1 nor -1",
                other, i
            ))),
        })
        .collect()
}

/// 0 → +1, 1 → -1. Inverse of [`normalize`].
pub fn denormalize(labels: &[u8]) -> Result<Vec<i8>> {
    labels
        .iter()
        .enumerate()
        .map(|(i, &l)| match l {
            0 => Ok(INLIER),
            1 => Ok(OUTLIER),
            other => Err(AnalysisError::validation(format!(
                "label {} at row {} is neither 0 nor 1",
                other, i
            ))),
        })
        .collect()
}

/// Convert a strategy's raw output into dataset-convention labels.
pub fn assign(raw: RawScores) -> Result<ScoreAssignment> {
    Ok(ScoreAssignment {
        labels: normalize(&raw.predictions)?,
        scores: raw.scores,
    })
}
