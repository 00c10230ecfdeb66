//! Fraud Outlier Pipeline Library
//!
//! Batch, unsupervised fraud screening over a labeled transaction table:
//! seeded subsampling, feature/target split, Local Outlier Factor and
//! Isolation Forest scoring, and precision/recall evaluation per strategy.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::{AnalysisError, Result};
pub use feature_extractor::FeatureExtractor;
pub use loader::DatasetLoader;
pub use models::engine::DetectionEngine;
pub use types::{report::StrategyReport, transaction::TransactionTable};

use tracing::info;

/// Run the whole analysis described by `config`: load and sample the
/// dataset, split it, and evaluate every configured strategy.
pub fn run_pipeline(config: &AppConfig) -> Result<Vec<StrategyReport>> {
    let loader = DatasetLoader::new(&config.dataset)?;
    let table = loader.load_sampled(&config.dataset.path)?;

    let extractor = FeatureExtractor::new(&config.dataset.label_column);
    let (features, labels) = extractor.split(&table)?;
    let (balance, contamination) = extractor.class_balance(&labels)?;

    info!(
        fraud = balance.fraud,
        valid = balance.valid,
        contamination = contamination.value(),
        "Prepared features for detection"
    );

    let engine = DetectionEngine::new(&config.detection);
    let outcomes = engine.run(&features, &labels, contamination)?;

    Ok(outcomes.into_iter().map(|o| o.report).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_run_pipeline_end_to_end() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Time,V1,V2,Amount,Class").unwrap();
        for i in 0..400 {
            let class = if i % 100 == 0 { 1 } else { 0 };
            let (v1, v2, amount) = if class == 1 {
                (30.0 + i as f64 * 0.01, -25.0, 5000.0)
            } else {
                (((i * 7) % 13) as f64 * 0.1, ((i * 3) % 11) as f64 * 0.1, 20.0 + (i % 17) as f64)
            };
            writeln!(file, "{},{},{},{},{}", i, v1, v2, amount, class).unwrap();
        }
        file.flush().unwrap();

        let mut config = AppConfig::default();
        config.dataset.path = file.path().display().to_string();
        config.dataset.sample_fraction = 1.0;
        config.detection.isolation_forest.n_estimators = 25;

        let reports = run_pipeline(&config).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].strategy, "Isolation Forest");
        assert_eq!(reports[1].strategy, "Local Outlier Factor");
        for report in &reports {
            assert_eq!(report.classification.total, 400);
            assert_eq!(report.classification.class(1).unwrap().support, 4);
            assert!(report.accuracy > 0.9);
        }
    }
}
