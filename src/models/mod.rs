//! Outlier detection strategies and the engine that runs them

pub mod density;
pub mod engine;
pub mod isolation;
pub mod normalizer;
pub mod scorer;

pub use density::LocalOutlierFactor;
pub use engine::{DetectionEngine, StrategyOutcome};
pub use isolation::{FittedForest, IsolationForest};
pub use scorer::{build_scorer, OutlierScorer, RawScores, ScoreAssignment};
