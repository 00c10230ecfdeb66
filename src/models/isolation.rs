//! Isolation Forest: partition-based outlier scoring.
//!
//! An ensemble of random trees recursively splits the data on a random
//! feature at a random value between the node's min and max. Anomalies are
//! isolated after few splits, so a short average path length across the
//! ensemble means a likely anomaly. Fitting builds the ensemble; scoring
//! walks it, for training rows or unseen ones.

use crate::error::{AnalysisError, Result};
use crate::models::scorer::{contamination_offset, predict_below, OutlierScorer, RawScores};
use crate::types::dataset::{ContaminationRatio, FeatureMatrix};
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search among `n` points,
/// used to normalize path lengths and to extend paths ending in
/// non-singleton leaves.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Isolation Forest parameters; `fit` produces a [`FittedForest`].
pub struct IsolationForest {
    n_estimators: usize,
    /// Rows drawn per tree; `None` uses every row
    max_samples: Option<usize>,
    seed: u64,
}

enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn path_length(&self, x: ArrayView1<'_, f64>) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

/// Tree construction state shared across the recursion
struct TreeBuilder<'a> {
    features: &'a FeatureMatrix,
    max_depth: usize,
    rng: &'a mut StdRng,
}

impl TreeBuilder<'_> {
    fn build(&mut self, indices: Vec<usize>, depth: usize) -> Node {
        if depth >= self.max_depth || indices.len() <= 1 {
            return Node::Leaf {
                size: indices.len(),
            };
        }

        // Try features in random order until one varies inside this node
        let n_features = self.features.n_features();
        let order = rand::seq::index::sample(&mut *self.rng, n_features, n_features);
        for feature in order.iter() {
            let (min, max) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                let v = self.features.values()[[i, feature]];
                (lo.min(v), hi.max(v))
            });
            if min >= max {
                continue;
            }

            let threshold = self.rng.gen_range(min..max);
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| self.features.values()[[i, feature]] <= threshold);

            return Node::Split {
                feature,
                threshold,
                left: Box::new(self.build(left, depth + 1)),
                right: Box::new(self.build(right, depth + 1)),
            };
        }

        Node::Leaf {
            size: indices.len(),
        }
    }
}

/// A fitted ensemble with its contamination-derived decision offset
pub struct FittedForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    n_features: usize,
    offset: f64,
}

impl IsolationForest {
    pub fn new(n_estimators: usize, max_samples: Option<usize>, seed: u64) -> Self {
        Self {
            n_estimators,
            max_samples,
            seed,
        }
    }

    /// Build the ensemble and calibrate the decision offset so that about
    /// `contamination` of the training rows fall below it.
    pub fn fit(
        &self,
        features: &FeatureMatrix,
        contamination: ContaminationRatio,
    ) -> Result<FittedForest> {
        features.ensure_fittable()?;
        contamination.ensure_usable()?;
        if self.n_estimators == 0 {
            return Err(AnalysisError::fit("n_estimators must be at least 1"));
        }

        let n_rows = features.n_rows();
        let sample_size = self.max_samples.unwrap_or(n_rows).min(n_rows);
        if sample_size < 2 {
            return Err(AnalysisError::fit(format!(
                "isolation trees need at least 2 samples, got {}",
                sample_size
            )));
        }
        let max_depth = (sample_size as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trees = Vec::with_capacity(self.n_estimators);
        for t in 0..self.n_estimators {
            let indices = rand::seq::index::sample(&mut rng, n_rows, sample_size).into_vec();
            let mut builder = TreeBuilder {
                features,
                max_depth,
                rng: &mut rng,
            };
            trees.push(IsolationTree {
                root: builder.build(indices, 0),
            });
            debug!(tree = t, "Isolation tree built");
        }

        let mut forest = FittedForest {
            trees,
            sample_size,
            n_features: features.n_features(),
            offset: 0.0,
        };
        let training_scores = forest.score_samples(features)?;
        forest.offset = contamination_offset(&training_scores, contamination)?;

        info!(
            trees = self.n_estimators,
            sample_size = sample_size,
            max_depth = max_depth,
            offset = forest.offset,
            "Isolation forest fitted"
        );

        Ok(forest)
    }
}

impl FittedForest {
    fn check_width(&self, features: &FeatureMatrix) -> Result<()> {
        if features.n_features() != self.n_features {
            return Err(AnalysisError::fit(format!(
                "forest was fitted on {} features, got {}",
                self.n_features,
                features.n_features()
            )));
        }
        Ok(())
    }

    /// Opposite of the normalized anomaly score: values near -1 are
    /// anomalous, values near -0.5 or above are normal.
    pub fn score_samples(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        self.check_width(features)?;
        let norm = average_path_length(self.sample_size);

        Ok((0..features.n_rows())
            .map(|i| {
                let row = features.row(i);
                let mean_depth = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>()
                    / self.trees.len() as f64;
                -(2f64.powf(-mean_depth / norm))
            })
            .collect())
    }

    /// `score_samples` shifted by the offset; negative means anomalous.
    pub fn decision_function(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        Ok(self
            .score_samples(features)?
            .into_iter()
            .map(|s| s - self.offset)
            .collect())
    }

    /// Native predictions: -1 for anomalies, +1 otherwise.
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i8>> {
        Ok(predict_below(&self.decision_function(features)?, 0.0))
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl OutlierScorer for IsolationForest {
    fn name(&self) -> &'static str {
        "Isolation Forest"
    }

    fn score(
        &self,
        features: &FeatureMatrix,
        contamination: ContaminationRatio,
    ) -> Result<RawScores> {
        let forest = self.fit(features, contamination)?;
        let scores = forest.decision_function(features)?;
        let predictions = predict_below(&scores, 0.0);

        debug!(
            trees = forest.tree_count(),
            offset = forest.offset(),
            "Scored training rows against fitted forest"
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
    use crate::models::scorer::OUTLIER;

    fn cluster_with_outlier() -> FeatureMatrix {
        let mut rows = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                rows.push(vec![i as f64 * 0.1, j as f64 * 0.1, ((i + j) % 3) as f64 * 0.05]);
            }
        }
        rows.push(vec![25.0, -25.0, 40.0]);
        FeatureMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!((average_path_length(256) - 10.2448).abs() < 1e-3);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let features = cluster_with_outlier();
        let contamination = ContaminationRatio::new(0.05);

        let first = IsolationForest::new(50, None, 42).score(&features, contamination).unwrap();
        let second = IsolationForest::new(50, None, 42).score(&features, contamination).unwrap();

        assert_eq!(first.predictions, second.predictions);
        assert_eq!(first.scores, second.scores);
    }

    #[test]
    fn test_isolates_far_point() {
        let features = cluster_with_outlier();
        let raw = IsolationForest::new(100, None, 1)
            .score(&features, ContaminationRatio::new(0.01))
            .unwrap();

        assert_eq!(raw.predictions.len(), features.n_rows());
        assert_eq!(raw.predictions[100], OUTLIER);
        let lowest = raw
            .scores
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(lowest, Some(100));
    }

    #[test]
    fn test_scores_unseen_points() {
        let features = cluster_with_outlier();
        let forest = IsolationForest::new(100, None, 7)
            .fit(&features, ContaminationRatio::new(0.05))
            .unwrap();

        // the second point sits next to the training outlier
        let unseen = FeatureMatrix::from_rows(&[vec![0.45, 0.45, 0.05], vec![24.0, -24.0, 39.0]])
            .unwrap();
        let scores = forest.score_samples(&unseen).unwrap();
        assert!(scores[1] < scores[0]);
        assert!(scores.iter().all(|s| (-1.0..=0.0).contains(s)));

        let predictions = forest.predict(&unseen).unwrap();
        assert_eq!(predictions[1], OUTLIER);
    }

    #[test]
    fn test_max_samples_subsample() {
        let features = cluster_with_outlier();
        let forest = IsolationForest::new(100, Some(64), 3)
            .fit(&features, ContaminationRatio::new(0.05))
            .unwrap();
        assert_eq!(forest.tree_count(), 100);

        let scores = forest.score_samples(&features).unwrap();
        assert_eq!(scores.len(), features.n_rows());
        assert!(scores.iter().all(|s| (-1.0..=0.0).contains(s)));
    }

    #[test]
    fn test_feature_width_mismatch_is_fit_error() {
        let features = cluster_with_outlier();
        let forest = IsolationForest::new(10, None, 1)
            .fit(&features, ContaminationRatio::new(0.05))
            .unwrap();

        let narrow = FeatureMatrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        assert!(matches!(forest.score_samples(&narrow), Err(AnalysisError::Fit(_))));
    }

    #[test]
    fn test_degenerate_input_is_fit_error() {
        let empty = FeatureMatrix::from_rows(&[]).unwrap();
        let forest = IsolationForest::new(10, None, 1);
        assert!(matches!(
            forest.score(&empty, ContaminationRatio::new(0.1)),
            Err(AnalysisError::Fit(_))
        ));

        let inf = FeatureMatrix::from_rows(&[vec![1.0], vec![f64::INFINITY]]).unwrap();
        assert!(matches!(
            forest.score(&inf, ContaminationRatio::new(0.1)),
            Err(AnalysisError::Fit(_))
        ));
    }

    #[test]
    fn test_constant_features_do_not_split() {
        let rows = vec![vec![3.0, 3.0]; 16];
        let features = FeatureMatrix::from_rows(&rows).unwrap();
        let forest = IsolationForest::new(5, None, 1)
            .fit(&features, ContaminationRatio::new(0.1))
            .unwrap();

        let scores = forest.score_samples(&features).unwrap();
        // every row lands in the root leaf, so all scores are equal
        assert!(scores.windows(2).all(|w| w[0] == w[1]));
        assert!(forest.predict(&features).unwrap().iter().all(|&p| p == 1));
    }
}
