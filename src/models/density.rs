//! Local Outlier Factor: density-based outlier scoring.
//!
//! Each point's local reachability density is compared with that of its k
//! nearest neighbours. Points sitting in much sparser regions than their
//! neighbours get a large outlier factor. Fitting and predicting happen in
//! one step; there is no model to reuse on unseen points.

use crate::error::{AnalysisError, Result};
use crate::models::scorer::{contamination_offset, predict_below, OutlierScorer, RawScores};
use crate::types::dataset::{ContaminationRatio, FeatureMatrix};
use ndarray::ArrayView1;
use std::cmp::Ordering;
use tracing::debug;

/// Guards the density of exact duplicates against division by zero
const DENSITY_EPSILON: f64 = 1e-10;

pub struct LocalOutlierFactor {
    n_neighbors: usize,
}

/// k nearest neighbours of one point, closest first
struct Neighborhood {
    indices: Vec<usize>,
    distances: Vec<f64>,
}

impl Neighborhood {
    /// Distance to the k-th nearest neighbour
    fn k_distance(&self) -> f64 {
        self.distances.last().copied().unwrap_or(0.0)
    }
}

fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn by_distance_then_index(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

impl LocalOutlierFactor {
    pub fn new(n_neighbors: usize) -> Self {
        Self { n_neighbors }
    }

    /// Brute-force k-nearest-neighbour search, ties broken by row index.
    fn neighborhoods(&self, features: &FeatureMatrix) -> Vec<Neighborhood> {
        let n = features.n_rows();
        let k = self.n_neighbors;
        let mut candidates: Vec<(usize, f64)> = Vec::with_capacity(n - 1);

        (0..n)
            .map(|i| {
                let point = features.row(i);
                candidates.clear();
                candidates.extend(
                    (0..n)
                        .filter(|&j| j != i)
                        .map(|j| (j, euclidean(point, features.row(j)))),
                );
                candidates.select_nth_unstable_by(k - 1, by_distance_then_index);
                let nearest = &mut candidates[..k];
                nearest.sort_by(by_distance_then_index);

                Neighborhood {
                    indices: nearest.iter().map(|&(j, _)| j).collect(),
                    distances: nearest.iter().map(|&(_, d)| d).collect(),
                }
            })
            .collect()
    }

    /// Negative local outlier factor per row; lower means more anomalous.
    pub fn negative_outlier_factor(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        features.ensure_fittable()?;
        if self.n_neighbors == 0 {
            return Err(AnalysisError::fit("n_neighbors must be at least 1"));
        }
        if features.n_rows() <= self.n_neighbors {
            return Err(AnalysisError::fit(format!(
                "insufficient neighbors: {} rows cannot supply {} neighbors per point",
                features.n_rows(),
                self.n_neighbors
            )));
        }

        let neighborhoods = self.neighborhoods(features);
        let k_distances: Vec<f64> = neighborhoods.iter().map(Neighborhood::k_distance).collect();

        // reach_dist(p, o) = max(k_distance(o), d(p, o))
        let lrd: Vec<f64> = neighborhoods
            .iter()
            .map(|hood| {
                let total: f64 = hood
                    .indices
                    .iter()
                    .zip(&hood.distances)
                    .map(|(&o, &d)| d.max(k_distances[o]))
                    .sum();
                1.0 / (total / hood.indices.len() as f64 + DENSITY_EPSILON)
            })
            .collect();

        let nof = neighborhoods
            .iter()
            .enumerate()
            .map(|(p, hood)| {
                let neighbor_lrd: f64 = hood.indices.iter().map(|&o| lrd[o]).sum();
                -(neighbor_lrd / hood.indices.len() as f64) / lrd[p]
            })
            .collect();

        Ok(nof)
    }
}

impl OutlierScorer for LocalOutlierFactor {
    fn name(&self) -> &'static str {
        "Local Outlier Factor"
    }

    fn score(
        &self,
        features: &FeatureMatrix,
        contamination: ContaminationRatio,
    ) -> Result<RawScores> {
        contamination.ensure_usable()?;
        let scores = self.negative_outlier_factor(features)?;
        let offset = contamination_offset(&scores, contamination)?;
        let predictions = predict_below(&scores, offset);

        debug!(
            n_neighbors = self.n_neighbors,
            offset = offset,
            rows = scores.len(),
            "Local outlier factor scored"
        );

        Ok(RawScores {
            predictions,
            scores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scorer::{INLIER, OUTLIER};

    /// 5x5 grid with unit spacing plus one far-away point at index 25
    fn grid_with_outlier() -> FeatureMatrix {
        let mut rows = Vec::new();
        for x in 0..5 {
            for y in 0..5 {
                rows.push(vec![x as f64, y as f64]);
            }
        }
        rows.push(vec![30.0, 30.0]);
        FeatureMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_fewer_rows_than_neighbors_is_fit_error() {
        let rows: Vec<Vec<f64>> = (0..19).map(|i| vec![i as f64, 1.0]).collect();
        let features = FeatureMatrix::from_rows(&rows).unwrap();
        let lof = LocalOutlierFactor::new(20);

        let err = lof.score(&features, ContaminationRatio::new(0.1)).unwrap_err();
        assert!(matches!(err, AnalysisError::Fit(_)));
        assert!(err.to_string().contains("insufficient neighbors"));
    }

    #[test]
    fn test_empty_matrix_is_fit_error() {
        let features = FeatureMatrix::from_rows(&[]).unwrap();
        let err = LocalOutlierFactor::new(3)
            .score(&features, ContaminationRatio::new(0.1))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Fit(_)));
    }

    #[test]
    fn test_isolated_point_has_lowest_score() {
        let features = grid_with_outlier();
        let nof = LocalOutlierFactor::new(5).negative_outlier_factor(&features).unwrap();

        let (worst, _) = nof
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(worst, 25);
        assert!(nof[25] < -2.0);
        // grid interior points sit close to an outlier factor of 1
        assert!((nof[12] + 1.0).abs() < 0.2);
    }

    #[test]
    fn test_score_flags_isolated_point() {
        let features = grid_with_outlier();
        let raw = LocalOutlierFactor::new(5)
            .score(&features, ContaminationRatio::new(1.0 / 25.0))
            .unwrap();

        assert_eq!(raw.predictions.len(), 26);
        assert_eq!(raw.predictions[25], OUTLIER);
        assert_eq!(raw.outlier_count(), 1);
        assert!(raw.predictions[..25].iter().all(|&p| p == INLIER));
    }

    #[test]
    fn test_duplicate_points_stay_finite() {
        let mut rows = vec![vec![1.0, 1.0]; 10];
        rows.push(vec![5.0, 5.0]);
        let features = FeatureMatrix::from_rows(&rows).unwrap();

        let nof = LocalOutlierFactor::new(3).negative_outlier_factor(&features).unwrap();
        assert!(nof.iter().all(|v| v.is_finite()));
    }
}
