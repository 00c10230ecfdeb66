//! Detection engine: runs every configured strategy over the shared inputs

use crate::config::{DetectionConfig, DetectorKind};
use crate::error::Result;
use crate::metrics::evaluate;
use crate::models::normalizer;
use crate::models::scorer::{build_scorer, OutlierScorer, ScoreAssignment};
use crate::types::dataset::{ContaminationRatio, FeatureMatrix, LabelVector};
use crate::types::report::StrategyReport;
use chrono::Utc;
use std::time::Instant;
use tracing::info;

/// Output of one strategy: its report plus the per-row assignment
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub report: StrategyReport,
    pub assignment: ScoreAssignment,
}

/// Runs each configured strategy independently: score → normalize → evaluate
pub struct DetectionEngine {
    scorers: Vec<Box<dyn OutlierScorer>>,
}

impl DetectionEngine {
    /// Create a detection engine from configuration
    pub fn new(config: &DetectionConfig) -> Self {
        let scorers = config
            .strategies
            .iter()
            .map(|&kind| build_scorer(kind, config))
            .collect::<Vec<_>>();

        info!(
            strategies = ?config.strategies,
            "Detection engine initialized"
        );

        Self { scorers }
    }

    /// Create a detection engine from already-built scorers
    pub fn with_scorers(scorers: Vec<Box<dyn OutlierScorer>>) -> Self {
        Self { scorers }
    }

    /// Create an engine running a single strategy
    pub fn single(kind: DetectorKind, config: &DetectionConfig) -> Self {
        Self::with_scorers(vec![build_scorer(kind, config)])
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.scorers.iter().map(|s| s.name()).collect()
    }

    /// Run one strategy to completion; any failure aborts it entirely.
    pub fn run_strategy(
        &self,
        scorer: &dyn OutlierScorer,
        features: &FeatureMatrix,
        labels: &LabelVector,
        contamination: ContaminationRatio,
    ) -> Result<StrategyOutcome> {
        let start = Instant::now();
        info!(strategy = scorer.name(), rows = features.n_rows(), "Running strategy");

        let raw = scorer.score(features, contamination)?;
        let outliers_flagged = raw.outlier_count();
        let assignment = normalizer::assign(raw)?;
        let evaluation = evaluate(labels, &assignment.labels)?;
        let elapsed = start.elapsed();

        info!(
            strategy = scorer.name(),
            mismatches = evaluation.mismatches,
            accuracy = evaluation.accuracy,
            flagged = outliers_flagged,
            elapsed_ms = elapsed.as_millis() as u64,
            "Strategy evaluated"
        );

        Ok(StrategyOutcome {
            report: StrategyReport {
                strategy: scorer.name().to_string(),
                mismatches: evaluation.mismatches,
                accuracy: evaluation.accuracy,
                outliers_flagged,
                classification: evaluation.report,
                elapsed_ms: elapsed.as_millis() as u64,
                generated_at: Utc::now(),
            },
            assignment,
        })
    }

    /// Run every strategy in configured order. The first failure aborts the run.
    pub fn run(
        &self,
        features: &FeatureMatrix,
        labels: &LabelVector,
        contamination: ContaminationRatio,
    ) -> Result<Vec<StrategyOutcome>> {
        self.scorers
            .iter()
            .map(|scorer| self.run_strategy(scorer.as_ref(), features, labels, contamination))
            .collect()
    }
}
